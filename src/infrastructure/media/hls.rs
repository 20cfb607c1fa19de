use std::io;
use std::path::Path;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::common::artifacts::{ArtifactStore, MASTER_PLAYLIST};

use super::renditions::{AUDIO_CODEC, KEYFRAME_INTERVAL, RENDITIONS, SEGMENT_SECONDS};

/// How much captured stderr to keep on failure. ffmpeg is chatty and only the
/// tail carries the actual error.
const STDERR_TAIL: usize = 4096;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("ffmpeg binary not found on PATH")]
    FfmpegNotFound,
    #[error("ffmpeg exited with {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Packages one raw upload into the fixed HLS ladder inside the video's own
/// artifact subtree. One ffmpeg process per job; concurrent jobs need no
/// coordination because they never share an output directory.
pub struct HlsTranscoder;

impl HlsTranscoder {
    /// Assembles the full multi-variant invocation: one input decoded once,
    /// fanned out to every rendition in the catalog, segmented into fixed
    /// 6-second chunks under an unbounded VOD playlist.
    pub fn build_args(input: &Path, artifacts: &ArtifactStore, slug: &str) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-preset".to_string(),
            "veryfast".to_string(),
            "-g".to_string(),
            KEYFRAME_INTERVAL.to_string(),
            "-sc_threshold".to_string(),
            "0".to_string(),
        ];

        // One video/audio pair per rendition, all from the primary streams.
        for _ in RENDITIONS.iter() {
            args.extend([
                "-map".to_string(),
                "0:v:0".to_string(),
                "-map".to_string(),
                "0:a:0".to_string(),
            ]);
        }

        for (i, r) in RENDITIONS.iter().enumerate() {
            args.extend([
                format!("-s:v:{i}"),
                r.resolution(),
                format!("-c:v:{i}"),
                r.codec.to_string(),
                format!("-b:v:{i}"),
                r.video_bitrate.to_string(),
                format!("-b:a:{i}"),
                r.audio_bitrate.to_string(),
            ]);
        }

        let var_stream_map = (0..RENDITIONS.len())
            .map(|i| format!("v:{i},a:{i}"))
            .collect::<Vec<_>>()
            .join(" ");

        args.extend([
            "-c:a".to_string(),
            AUDIO_CODEC.to_string(),
            "-master_pl_name".to_string(),
            MASTER_PLAYLIST.to_string(),
            "-f".to_string(),
            "hls".to_string(),
            "-hls_time".to_string(),
            SEGMENT_SECONDS.to_string(),
            "-hls_list_size".to_string(),
            "0".to_string(),
            "-hls_segment_filename".to_string(),
            artifacts.segment_target(slug).to_string_lossy().to_string(),
            "-var_stream_map".to_string(),
            var_stream_map,
            artifacts
                .variant_playlist_target(slug)
                .to_string_lossy()
                .to_string(),
        ]);

        args
    }

    /// Runs ffmpeg to completion. Exactly one outcome per call: Ok once the
    /// whole ladder is on disk, Err for anything else (bad input, missing
    /// audio stream, encoder crash, full disk). No timeout is applied here.
    pub async fn run(
        input: &Path,
        artifacts: &ArtifactStore,
        slug: &str,
    ) -> Result<(), TranscodeError> {
        let args = Self::build_args(input, artifacts, slug);
        debug!("ffmpeg {}", args.join(" "));

        let output = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    TranscodeError::FfmpegNotFound
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let mut tail_start = stderr.len().saturating_sub(STDERR_TAIL);
            while !stderr.is_char_boundary(tail_start) {
                tail_start += 1;
            }
            return Err(TranscodeError::Failed {
                code: output.status.code(),
                stderr: stderr[tail_start..].to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::artifacts::ArtifactStore;
    use std::path::PathBuf;

    fn args_for(slug: &str) -> Vec<String> {
        let store = ArtifactStore::new("/srv/uploads");
        HlsTranscoder::build_args(&PathBuf::from("/srv/uploads/abc/raw-in.mp4"), &store, slug)
    }

    fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    #[test]
    fn keyframe_and_segment_parameters_are_fixed() {
        let args = args_for("abc123de");
        assert!(has_pair(&args, "-g", "48"));
        assert!(has_pair(&args, "-sc_threshold", "0"));
        assert!(has_pair(&args, "-hls_time", "6"));
        assert!(has_pair(&args, "-hls_list_size", "0"));
        assert!(has_pair(&args, "-preset", "veryfast"));
    }

    #[test]
    fn every_rendition_is_mapped_and_sized() {
        let args = args_for("abc123de");
        let maps = args.iter().filter(|a| *a == "-map").count();
        assert_eq!(maps, 6); // three video + three audio pairs

        assert!(has_pair(&args, "-s:v:0", "1920x1080"));
        assert!(has_pair(&args, "-b:v:0", "4500k"));
        assert!(has_pair(&args, "-s:v:1", "1280x720"));
        assert!(has_pair(&args, "-b:v:1", "2500k"));
        assert!(has_pair(&args, "-s:v:2", "854x480"));
        assert!(has_pair(&args, "-b:v:2", "1000k"));
        assert!(has_pair(&args, "-c:v:0", "libx264"));
    }

    #[test]
    fn variant_streams_pair_video_with_audio() {
        let args = args_for("abc123de");
        assert!(has_pair(&args, "-var_stream_map", "v:0,a:0 v:1,a:1 v:2,a:2"));
        assert!(has_pair(&args, "-c:a", "aac"));
    }

    #[test]
    fn outputs_stay_inside_the_job_subtree() {
        let args = args_for("abc123de");
        assert!(has_pair(&args, "-master_pl_name", "master.m3u8"));
        assert!(args
            .iter()
            .any(|a| a.ends_with("abc123de/v%v_seg%d.ts")));
        assert_eq!(args.last().unwrap(), "/srv/uploads/abc123de/v%v.m3u8");
    }
}
