//! UI layer: app shell, pages, upload wizard, and dialog primitives.

pub mod app;
pub mod dialog;
pub mod shell;
pub mod wizard;

pub use app::ScilitApp;
