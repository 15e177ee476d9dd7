//! Render model for the upload wizard.
//!
//! [`WizardView::project`] is a pure function of the session snapshot; the
//! GUI and the CLI both render from it.

use shared::domain::Stage;

use crate::upload::UploadSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    SelectFile,
    Upload,
    Process,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::SelectFile,
        WizardStep::Upload,
        WizardStep::Process,
        WizardStep::Review,
    ];

    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Idle => WizardStep::SelectFile,
            Stage::Uploading => WizardStep::Upload,
            Stage::Processing | Stage::Extracting | Stage::Chunking => WizardStep::Process,
            Stage::Complete => WizardStep::Review,
            // Callers resolve Error through the failed stage; this is the fallback.
            Stage::Error => WizardStep::Process,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::SelectFile => "Select PDF",
            WizardStep::Upload => "Upload",
            WizardStep::Process => "Process",
            WizardStep::Review => "Review",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WizardView {
    pub step: WizardStep,
    pub headline: String,
    pub detail: Option<String>,
    pub fraction: f32,
    pub percent_label: String,
    pub identifiers: Vec<IdentifierRow>,
    pub chunk_count: usize,
    pub error: Option<String>,
    pub is_busy: bool,
    /// The session reached `Complete` or `Error`; nothing is left to cancel.
    pub is_finished: bool,
    pub close_label: &'static str,
}

impl WizardView {
    pub fn project(session: &UploadSession) -> Self {
        let stage = session.stage();
        let step = match (stage, session.failed_stage()) {
            (Stage::Error, Some(failed)) => WizardStep::for_stage(failed),
            _ => WizardStep::for_stage(stage),
        };
        let progress = session.progress();

        let headline = match stage {
            Stage::Idle => format!("Ready to upload {}", session.file_name()),
            Stage::Uploading => format!("Uploading {}", session.file_name()),
            Stage::Processing => "Processing document".to_string(),
            Stage::Extracting => "Extracting identifiers".to_string(),
            Stage::Chunking => "Splitting document into chunks".to_string(),
            Stage::Complete => "Upload complete".to_string(),
            Stage::Error => "Processing failed".to_string(),
        };

        let detail = match stage {
            Stage::Error => session
                .failed_stage()
                .map(|failed| format!("Stopped while {}", stage_activity(failed))),
            _ if session.chunk_count() > 0 => Some(chunk_summary(session.chunk_count())),
            _ => None,
        };

        let mut identifiers = Vec::new();
        if let Some(doi) = &session.identifiers().doi {
            identifiers.push(IdentifierRow {
                label: "DOI",
                value: doi.clone(),
            });
        }
        if let Some(isbn) = &session.identifiers().isbn {
            identifiers.push(IdentifierRow {
                label: "ISBN",
                value: isbn.clone(),
            });
        }

        let is_busy = !stage.is_terminal() && stage != Stage::Idle;

        Self {
            step,
            headline,
            detail,
            fraction: f32::from(progress) / 100.0,
            percent_label: format!("{progress}%"),
            identifiers,
            chunk_count: session.chunk_count(),
            error: session.error_message().map(str::to_string),
            is_busy,
            is_finished: session.is_finished(),
            close_label: if is_busy { "Cancel" } else { "Close" },
        }
    }
}

fn stage_activity(stage: Stage) -> &'static str {
    match stage {
        Stage::Idle => "preparing the upload",
        Stage::Uploading => "uploading",
        Stage::Processing => "processing",
        Stage::Extracting => "extracting identifiers",
        Stage::Chunking => "chunking",
        Stage::Complete | Stage::Error => "finishing",
    }
}

fn chunk_summary(count: usize) -> String {
    if count == 1 {
        "1 chunk created".to_string()
    } else {
        format!("{count} chunks created")
    }
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
