use serde::{Deserialize, Serialize};

pub const TRANSCODE_QUEUE: &str = "transcoding_tasks";

/// Queue payload for one transcode. Published durably before the upload
/// response is sent, so an accepted job survives a process restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeJob {
    pub slug: String,
    pub input_path: String,
}
