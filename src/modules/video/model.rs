use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of a video job. Transitions are one-directional:
/// PROCESSING -> READY or PROCESSING -> ERROR, never out of a terminal state.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
pub enum VideoStatus {
    PROCESSING,
    READY,
    ERROR,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::PROCESSING => "PROCESSING",
            VideoStatus::READY => "READY",
            VideoStatus::ERROR => "ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::READY | VideoStatus::ERROR)
    }
}

impl From<String> for VideoStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "READY" => VideoStatus::READY,
            "ERROR" => VideoStatus::ERROR,
            // Anything unrecognized is treated as still in flight, which keeps
            // it invisible to playback.
            _ => VideoStatus::PROCESSING,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, ToSchema)]
pub struct Video {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub slug: String,
    pub status: String, // Stored as string in DB
    pub folder_path: String,
    pub renditions: Option<Vec<String>>,
    #[schema(value_type = String, format = Date)]
    pub created_at: OffsetDateTime,
    #[schema(value_type = String, format = Date)]
    pub updated_at: OffsetDateTime,
}

impl Video {
    pub fn status(&self) -> VideoStatus {
        VideoStatus::from(self.status.clone())
    }

    pub fn is_ready(&self) -> bool {
        self.status() == VideoStatus::READY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_strings() {
        for status in [
            VideoStatus::PROCESSING,
            VideoStatus::READY,
            VideoStatus::ERROR,
        ] {
            assert_eq!(VideoStatus::from(status.as_str().to_string()), status);
        }
    }

    #[test]
    fn unknown_status_reads_as_processing() {
        assert_eq!(
            VideoStatus::from("garbage".to_string()),
            VideoStatus::PROCESSING
        );
    }

    #[test]
    fn only_ready_and_error_are_terminal() {
        assert!(!VideoStatus::PROCESSING.is_terminal());
        assert!(VideoStatus::READY.is_terminal());
        assert!(VideoStatus::ERROR.is_terminal());
    }
}
