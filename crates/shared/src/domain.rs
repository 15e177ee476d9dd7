use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(UploadId);

/// Phase of the upload/processing pipeline, in pipeline order.
///
/// `Error` sorts last but is not part of the forward order; callers treat it
/// as reachable from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Idle,
    Uploading,
    Processing,
    Extracting,
    Chunking,
    Complete,
    Error,
}

impl Stage {
    pub const PIPELINE: [Stage; 6] = [
        Stage::Idle,
        Stage::Uploading,
        Stage::Processing,
        Stage::Extracting,
        Stage::Chunking,
        Stage::Complete,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Complete | Stage::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Uploading => "uploading",
            Stage::Processing => "processing",
            Stage::Extracting => "extracting",
            Stage::Chunking => "chunking",
            Stage::Complete => "complete",
            Stage::Error => "error",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown upload stage '{0}'")]
pub struct UnknownStage(pub String);

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        Stage::PIPELINE
            .into_iter()
            .chain(std::iter::once(Stage::Error))
            .find(|stage| stage.as_str() == normalized)
            .ok_or_else(|| UnknownStage(raw.to_string()))
    }
}

/// Bibliographic identifiers recognised inside an uploaded document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIdentifiers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
}

impl DocumentIdentifiers {
    pub fn is_empty(&self) -> bool {
        self.doi.is_none() && self.isbn.is_none()
    }

    /// Overwrites each field the update reports and keeps the rest.
    pub fn merge(&mut self, update: &DocumentIdentifiers) {
        if let Some(doi) = non_blank(update.doi.as_deref()) {
            self.doi = Some(doi);
        }
        if let Some(isbn) = non_blank(update.isbn.as_deref()) {
            self.isbn = Some(isbn);
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub name: String,
}
