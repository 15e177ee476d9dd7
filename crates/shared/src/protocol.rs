use serde::{Deserialize, Serialize};

use crate::domain::{DocumentIdentifiers, Stage, UploadId};

/// Progress/extraction notification pushed by the processing backend.
///
/// `stage` stays a raw string on the wire so an unrecognised stage can be
/// reported and skipped by the consumer instead of failing the whole stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadEvent {
    pub progress: i64,
    pub stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifiers: Option<DocumentIdentifiers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UploadEvent {
    pub fn new(stage: Stage, progress: i64) -> Self {
        Self {
            progress,
            stage: stage.as_str().to_string(),
            identifiers: None,
            chunks: None,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(Stage::Error, 0)
        }
    }

    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.identifiers.get_or_insert_with(Default::default).doi = Some(doi.into());
        self
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.identifiers.get_or_insert_with(Default::default).isbn = Some(isbn.into());
        self
    }

    pub fn with_chunks(mut self, chunks: Vec<serde_json::Value>) -> Self {
        self.chunks = Some(chunks);
        self
    }

    /// True for stage names the stream should stop after.
    pub fn is_terminal(&self) -> bool {
        self.stage
            .parse::<Stage>()
            .map(Stage::is_terminal)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperUploadResponse {
    pub upload_id: UploadId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_minimal_event_without_optional_fields() {
        let event: UploadEvent =
            serde_json::from_value(json!({ "progress": 140, "stage": "uploading" }))
                .expect("decode");
        assert_eq!(event.progress, 140);
        assert_eq!(event.stage, "uploading");
        assert!(event.identifiers.is_none());
        assert!(event.chunks.is_none());
    }

    #[test]
    fn decodes_identifiers_and_chunk_array() {
        let event: UploadEvent = serde_json::from_value(json!({
            "progress": 60,
            "stage": "chunking",
            "identifiers": { "doi": "10.1/x" },
            "chunks": [{ "index": 0 }, { "index": 1 }, { "index": 2 }]
        }))
        .expect("decode");
        assert_eq!(
            event.identifiers.and_then(|ids| ids.doi).as_deref(),
            Some("10.1/x")
        );
        assert_eq!(event.chunks.map(|c| c.len()), Some(3));
    }

    #[test]
    fn terminal_detection_tolerates_unknown_stage() {
        assert!(UploadEvent::new(Stage::Complete, 100).is_terminal());
        assert!(UploadEvent::failed("boom").is_terminal());
        let mut unknown = UploadEvent::new(Stage::Processing, 10);
        unknown.stage = "indexing".into();
        assert!(!unknown.is_terminal());
    }
}
