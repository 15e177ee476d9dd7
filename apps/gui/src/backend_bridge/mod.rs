//! Backend bridge: command queue from the UI thread and the worker runtime behind it.

pub mod commands;
pub mod runtime;
