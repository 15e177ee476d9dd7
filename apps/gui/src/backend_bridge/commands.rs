//! Backend commands queued from UI to backend worker.

use std::path::PathBuf;

/// Local handle for one upload attempt. Events carrying a stale ticket belong
/// to a discarded session and are dropped by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UploadTicket(pub u64);

#[derive(Debug)]
pub enum BackendCommand {
    Login {
        server_url: String,
        username: String,
    },
    Logout,
    UploadPaper {
        ticket: UploadTicket,
        path: PathBuf,
    },
    DiscardUpload {
        ticket: UploadTicket,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Login { .. } => "login",
            BackendCommand::Logout => "logout",
            BackendCommand::UploadPaper { .. } => "upload_paper",
            BackendCommand::DiscardUpload { .. } => "discard_upload",
        }
    }
}
