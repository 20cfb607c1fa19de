/// One fixed-quality output tier: the ladder is declared here once and the
/// invoker derives every ffmpeg mapping from it. Nothing is probed from the
/// input video.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rendition {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub video_bitrate: &'static str,
    pub audio_bitrate: &'static str,
    pub codec: &'static str,
}

impl Rendition {
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

pub const RENDITIONS: [Rendition; 3] = [
    Rendition {
        label: "1080p",
        width: 1920,
        height: 1080,
        video_bitrate: "4500k",
        audio_bitrate: "128k",
        codec: "libx264",
    },
    Rendition {
        label: "720p",
        width: 1280,
        height: 720,
        video_bitrate: "2500k",
        audio_bitrate: "128k",
        codec: "libx264",
    },
    Rendition {
        label: "480p",
        width: 854,
        height: 480,
        video_bitrate: "1000k",
        audio_bitrate: "96k",
        codec: "libx264",
    },
];

pub const AUDIO_CODEC: &str = "aac";

/// Keyframe every 48 frames with scene-cut insertion disabled, so segment
/// boundaries land on the same timestamps in every rendition.
pub const KEYFRAME_INTERVAL: u32 = 48;
pub const SEGMENT_SECONDS: u32 = 6;

/// Quality labels persisted on the video record once transcoding succeeds.
pub fn labels() -> Vec<String> {
    RENDITIONS.iter().map(|r| r.label.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_has_three_descending_tiers() {
        assert_eq!(RENDITIONS.len(), 3);
        for pair in RENDITIONS.windows(2) {
            assert!(pair[0].width > pair[1].width);
            assert!(pair[0].height > pair[1].height);
        }
    }

    #[test]
    fn labels_follow_ladder_order() {
        assert_eq!(labels(), vec!["1080p", "720p", "480p"]);
    }

    #[test]
    fn resolutions_render_as_ffmpeg_size_strings() {
        assert_eq!(RENDITIONS[0].resolution(), "1920x1080");
        assert_eq!(RENDITIONS[2].resolution(), "854x480");
    }
}
