use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    drive_upload, load_settings, AuthProvider, ClientSettings, PaperUpload, ScilitClient,
    UploadProgressController, UploadSession, UploadTransport, WizardStep, WizardView,
};
use shared::domain::Stage;
use tracing_subscriber::EnvFilter;

/// Upload a paper to SciLit2.0 and follow its processing.
#[derive(Parser, Debug)]
#[command(name = "scilit_cli")]
struct Args {
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    username: Option<String>,
    /// PDF to upload
    #[arg(long)]
    file: PathBuf,
    /// Settings file (defaults to ./scilit.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn settings(&self, mut settings: ClientSettings) -> ClientSettings {
        if let Some(server_url) = &self.server_url {
            settings.server_url = server_url.clone();
        }
        if let Some(username) = &self.username {
            settings.username = Some(username.clone());
        }
        settings
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = args.settings(load_settings(args.config.as_deref()));
    let username = settings
        .username
        .clone()
        .context("a username is required (--username, SCILIT_USERNAME or scilit.toml)")?;

    let client = ScilitClient::from_settings(&settings).context("failed to build http client")?;
    let profile = client
        .login(&settings.server_url, &username)
        .await
        .with_context(|| format!("login to {} failed", settings.server_url))?;
    println!("Logged in as {} (user_id={})", profile.name, profile.user_id);

    let upload = PaperUpload::from_path(&args.file).await?;
    let mut controller = UploadProgressController::new(upload.file_name.clone());
    let upload_id = client
        .start_upload(upload)
        .await
        .context("upload was rejected")?;
    controller.mark_accepted(upload_id);
    println!("{}", progress_line(controller.snapshot()));

    let events = client
        .progress_events(upload_id)
        .await
        .context("could not follow processing progress")?;
    drive_upload(&mut controller, events, |session| {
        println!("{}", progress_line(session));
    })
    .await;

    let session = controller.snapshot();
    println!("{}", summary(session));
    Ok(if session.stage() == Stage::Complete {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn progress_line(session: &UploadSession) -> String {
    let view = WizardView::project(session);
    let mut line = format!(
        "[{}/{}] {:<10} {:>4}  {}",
        view.step.index() + 1,
        WizardStep::ALL.len(),
        session.stage(),
        view.percent_label,
        view.headline
    );
    if let Some(detail) = &view.detail {
        line.push_str(" - ");
        line.push_str(detail);
    }
    line
}

fn summary(session: &UploadSession) -> String {
    let ids = session.identifiers();
    let mut lines = vec![
        format!("file:   {}", session.file_name()),
        format!("stage:  {}", session.stage()),
        format!("doi:    {}", ids.doi.as_deref().unwrap_or("-")),
        format!("isbn:   {}", ids.isbn.as_deref().unwrap_or("-")),
        format!("chunks: {}", session.chunk_count()),
    ];
    if let Some(message) = session.error_message() {
        lines.push(format!("error:  {message}"));
    }
    lines.join("\n")
}
