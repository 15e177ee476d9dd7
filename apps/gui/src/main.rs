use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod ui;

use anyhow::anyhow;
use clap::Parser;
use client_core::{load_settings, navigation::APP_NAME, ClientSettings};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::{commands::BackendCommand, runtime};
use crate::controller::events::UiEvent;
use crate::ui::ScilitApp;

#[derive(Debug, Parser)]
#[command(name = "scilit_gui", about = "SciLit2.0 desktop client")]
struct Args {
    /// Backend base URL, e.g. http://127.0.0.1:8080
    #[arg(long)]
    server_url: Option<String>,
    /// Username prefilled on the login screen
    #[arg(long)]
    username: Option<String>,
    /// Settings file (defaults to ./scilit.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn apply(self, mut settings: ClientSettings) -> ClientSettings {
        if let Some(server_url) = self.server_url {
            settings.server_url = server_url;
        }
        if let Some(username) = self.username {
            settings.username = Some(username);
        }
        settings
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let settings = load_settings(args.config.as_deref());
    let settings = args.apply(settings);
    tracing::info!(server_url = %settings.server_url, "starting desktop client");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    runtime::launch(settings.clone(), cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_NAME)
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([760.0, 520.0]),
        ..Default::default()
    };
    eframe::run_native(
        APP_NAME,
        options,
        Box::new(move |_cc| Ok(Box::new(ScilitApp::new(settings, cmd_tx, ui_rx)))),
    )
    .map_err(|err| anyhow!("desktop shell exited with an error: {err}"))
}
