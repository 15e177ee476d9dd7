//! Runtime bridge between UI command queue and backend event intake.

use std::{collections::HashMap, path::PathBuf, sync::Arc, thread};

use client_core::{
    pump_events, AuthProvider, ClientSettings, FeedItem, PaperUpload, ScilitClient, UploadError,
    UploadEventStream, UploadTransport,
};
use crossbeam_channel::{Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::backend_bridge::commands::{BackendCommand, UploadTicket};
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(settings: ClientSettings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run_worker(settings, cmd_rx, ui_tx));
    });
}

async fn run_worker(
    settings: ClientSettings,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    let client = match ScilitClient::from_settings(&settings) {
        Ok(client) => client,
        Err(err) => {
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                UiErrorContext::BackendStartup,
                format!("backend worker startup failure: {err}"),
            )));
            error!("failed to build http client: {err}");
            return;
        }
    };
    let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

    let mut uploads: HashMap<UploadTicket, JoinHandle<()>> = HashMap::new();
    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            BackendCommand::Login {
                server_url,
                username,
            } => match client.login(&server_url, &username).await {
                Ok(profile) => {
                    let _ = ui_tx.try_send(UiEvent::LoggedIn(profile));
                }
                Err(err) => {
                    warn!(%server_url, "login failed: {err}");
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_upload_error(
                        UiErrorContext::Login,
                        &err,
                    )));
                }
            },
            BackendCommand::Logout => {
                for (_, task) in uploads.drain() {
                    task.abort();
                }
                client.logout().await;
                let _ = ui_tx.try_send(UiEvent::LoggedOut);
            }
            BackendCommand::UploadPaper { ticket, path } => {
                uploads.retain(|_, task| !task.is_finished());
                let task = tokio::spawn(run_upload(
                    Arc::clone(&client),
                    ticket,
                    path,
                    ui_tx.clone(),
                ));
                if let Some(previous) = uploads.insert(ticket, task) {
                    previous.abort();
                }
            }
            BackendCommand::DiscardUpload { ticket } => {
                if let Some(task) = uploads.remove(&ticket) {
                    task.abort();
                    debug!(ticket = ticket.0, "discarded upload task");
                }
            }
        }
    }
    info!("ui command queue closed; backend worker exiting");
}

async fn run_upload(
    client: Arc<ScilitClient>,
    ticket: UploadTicket,
    path: PathBuf,
    ui_tx: Sender<UiEvent>,
) {
    let opened: Result<UploadEventStream, UploadError> = async {
        let upload = PaperUpload::from_path(&path).await?;
        let upload_id = client.start_upload(upload).await?;
        let _ = ui_tx.try_send(UiEvent::UploadAccepted { ticket, upload_id });
        client.progress_events(upload_id).await
    }
    .await;

    let events = match opened {
        Ok(events) => events,
        Err(err) => {
            warn!(ticket = ticket.0, path = %path.display(), "upload failed to start: {err}");
            if err.requires_reauth() {
                deliver_final(
                    &ui_tx,
                    UiEvent::Error(UiError::from_upload_error(UiErrorContext::Upload, &err)),
                )
                .await;
            }
            deliver_final(
                &ui_tx,
                UiEvent::UploadFailed {
                    ticket,
                    message: err.to_string(),
                },
            )
            .await;
            return;
        }
    };

    forward_progress(ticket, events, &ui_tx).await;
}

/// Forwards progress to the UI. Intermediate events are dropped when the UI
/// queue is full; the final event always arrives so the wizard can settle.
async fn forward_progress(
    ticket: UploadTicket,
    events: UploadEventStream,
    ui_tx: &Sender<UiEvent>,
) {
    let mut last = None;
    pump_events(events, |item| {
        let is_final = match &item {
            FeedItem::Event(event) => event.is_terminal(),
            FeedItem::Failed(_) => true,
        };
        let event = match item {
            FeedItem::Event(event) => UiEvent::UploadProgress { ticket, event },
            FeedItem::Failed(message) => UiEvent::UploadFailed { ticket, message },
        };
        if is_final {
            last = Some(event);
        } else if ui_tx.try_send(event).is_err() {
            warn!(ticket = ticket.0, "ui event queue unavailable; dropping upload event");
        }
    })
    .await;

    if let Some(event) = last {
        deliver_final(ui_tx, event).await;
    }
}

async fn deliver_final(ui_tx: &Sender<UiEvent>, event: UiEvent) {
    let ui_tx = ui_tx.clone();
    match tokio::task::spawn_blocking(move || ui_tx.send(event)).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => debug!("ui event queue closed before the final upload event"),
        Err(err) => warn!("failed to deliver final upload event: {err}"),
    }
}
