//! Upload progress state machine.
//!
//! The controller owns one [`UploadSession`] and folds backend
//! [`UploadEvent`]s into it one at a time. Rejected events never touch the
//! session, so rendering can always project the latest snapshot as-is.

use futures::{Stream, StreamExt};
use shared::{
    domain::{DocumentIdentifiers, Stage, UnknownStage, UploadId},
    protocol::UploadEvent,
};
use tracing::{debug, info, warn};

use crate::error::{ProcessingFailure, UploadError};

pub const DEFAULT_FAILURE_MESSAGE: &str = "processing failed without a reason";
pub const STREAM_CLOSED_MESSAGE: &str =
    "connection to the processing service closed before processing finished";

/// Clamps a reported percentage into `0..=100`.
pub fn clamp_progress(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    file_name: String,
    upload_id: Option<UploadId>,
    stage: Stage,
    progress: u8,
    identifiers: DocumentIdentifiers,
    chunk_count: usize,
    error_message: Option<String>,
    failed_stage: Option<Stage>,
}

impl UploadSession {
    fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            upload_id: None,
            stage: Stage::Idle,
            progress: 0,
            identifiers: DocumentIdentifiers::default(),
            chunk_count: 0,
            error_message: None,
            failed_stage: None,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn upload_id(&self) -> Option<UploadId> {
        self.upload_id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn identifiers(&self) -> &DocumentIdentifiers {
        &self.identifiers
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Stage that was active when the session failed.
    pub fn failed_stage(&self) -> Option<Stage> {
        self.failed_stage
    }

    pub fn is_finished(&self) -> bool {
        self.stage.is_terminal()
    }

    pub fn failure(&self) -> Option<ProcessingFailure> {
        if self.stage != Stage::Error {
            return None;
        }
        Some(ProcessingFailure(
            self.error_message
                .clone()
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    SessionFinished(Stage),
    UnknownStage(String),
    StageRegressed { from: Stage, to: Stage },
    ProgressRegressed { stage: Stage, current: u8, reported: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Applied,
    Ignored(IgnoreReason),
}

impl EventOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EventOutcome::Applied)
    }
}

#[derive(Debug, Clone)]
pub struct UploadProgressController {
    session: UploadSession,
}

impl UploadProgressController {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            session: UploadSession::new(file_name),
        }
    }

    /// Drops the current session and starts over for a newly selected file.
    pub fn begin(&mut self, file_name: impl Into<String>) {
        self.session = UploadSession::new(file_name);
    }

    pub fn snapshot(&self) -> &UploadSession {
        &self.session
    }

    /// Records the backend id once the upload request has been accepted.
    pub fn mark_accepted(&mut self, upload_id: UploadId) -> EventOutcome {
        if self.session.is_finished() {
            return EventOutcome::Ignored(IgnoreReason::SessionFinished(self.session.stage));
        }
        self.session.upload_id = Some(upload_id);
        if self.session.stage == Stage::Idle {
            self.session.stage = Stage::Uploading;
            self.session.progress = 0;
        }
        debug!(upload_id = upload_id.0, file = %self.session.file_name, "upload accepted");
        EventOutcome::Applied
    }

    pub fn apply(&mut self, event: &UploadEvent) -> EventOutcome {
        let current = self.session.stage;
        if current.is_terminal() {
            return EventOutcome::Ignored(IgnoreReason::SessionFinished(current));
        }

        let target = match event.stage.parse::<Stage>() {
            Ok(stage) => stage,
            Err(UnknownStage(name)) => {
                return EventOutcome::Ignored(IgnoreReason::UnknownStage(name));
            }
        };

        if target == Stage::Error {
            let message = event
                .message
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_FAILURE_MESSAGE);
            self.enter_error(message.to_string());
            return EventOutcome::Applied;
        }

        if target < current {
            return EventOutcome::Ignored(IgnoreReason::StageRegressed {
                from: current,
                to: target,
            });
        }

        let reported = clamp_progress(event.progress);
        if target == current && reported < self.session.progress {
            return EventOutcome::Ignored(IgnoreReason::ProgressRegressed {
                stage: current,
                current: self.session.progress,
                reported,
            });
        }

        self.session.stage = target;
        self.session.progress = if target == Stage::Complete {
            100
        } else {
            reported
        };
        if let Some(identifiers) = &event.identifiers {
            self.session.identifiers.merge(identifiers);
        }
        if let Some(chunks) = &event.chunks {
            self.session.chunk_count = chunks.len();
        }

        if target != current {
            info!(
                file = %self.session.file_name,
                from = %current,
                to = %target,
                progress = self.session.progress,
                "upload stage advanced"
            );
        }
        EventOutcome::Applied
    }

    /// Moves the session to `Error` for a failure observed on the client side.
    pub fn fail(&mut self, message: impl Into<String>) -> EventOutcome {
        if self.session.is_finished() {
            return EventOutcome::Ignored(IgnoreReason::SessionFinished(self.session.stage));
        }
        self.enter_error(message.into());
        EventOutcome::Applied
    }

    // Progress, identifiers and chunk count stay frozen for diagnostics.
    fn enter_error(&mut self, message: String) {
        warn!(
            file = %self.session.file_name,
            stage = %self.session.stage,
            progress = self.session.progress,
            %message,
            "upload processing failed"
        );
        self.session.failed_stage = Some(self.session.stage);
        self.session.stage = Stage::Error;
        self.session.error_message = Some(message);
    }
}

/// One item forwarded from a backend progress stream.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    Event(UploadEvent),
    Failed(String),
}

/// Forwards a progress stream until a terminal event, a transport failure,
/// or the end of the stream.
///
/// Malformed payloads are skipped. A stream that ends without a terminal
/// event is reported as a failure.
pub async fn pump_events<S>(mut events: S, mut emit: impl FnMut(FeedItem))
where
    S: Stream<Item = Result<UploadEvent, UploadError>> + Unpin,
{
    while let Some(item) = events.next().await {
        match item {
            Ok(event) => {
                let terminal = event.is_terminal();
                emit(FeedItem::Event(event));
                if terminal {
                    return;
                }
            }
            Err(UploadError::Protocol(reason)) => {
                warn!(%reason, "skipping malformed upload event");
            }
            Err(err) => {
                emit(FeedItem::Failed(err.to_string()));
                return;
            }
        }
    }
    emit(FeedItem::Failed(STREAM_CLOSED_MESSAGE.to_string()));
}

/// Feeds a progress stream into `controller`, calling `on_update` after every
/// applied change.
pub async fn drive_upload<S>(
    controller: &mut UploadProgressController,
    events: S,
    mut on_update: impl FnMut(&UploadSession),
) where
    S: Stream<Item = Result<UploadEvent, UploadError>> + Unpin,
{
    pump_events(events, |item| {
        let outcome = match item {
            FeedItem::Event(event) => controller.apply(&event),
            FeedItem::Failed(message) => controller.fail(message),
        };
        match outcome {
            EventOutcome::Applied => on_update(controller.snapshot()),
            EventOutcome::Ignored(reason) => debug!(?reason, "ignored upload event"),
        }
    })
    .await;
}

#[cfg(test)]
#[path = "tests/upload_tests.rs"]
mod tests;
