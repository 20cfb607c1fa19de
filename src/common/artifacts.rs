use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Top-level playlist referencing one media playlist per rendition.
pub const MASTER_PLAYLIST: &str = "master.m3u8";
/// ffmpeg substitutes the variant index for `%v` when writing per-rendition files.
pub const VARIANT_PLAYLIST_PATTERN: &str = "v%v.m3u8";
pub const SEGMENT_PATTERN: &str = "v%v_seg%d.ts";

const RAW_PREFIX: &str = "raw-";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact directory for '{slug}' already exists")]
    Collision { slug: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Maps a video slug to its isolated directory subtree under the upload root.
/// Every file a job produces (raw upload, playlists, segments) lives inside
/// its own subtree, so concurrent jobs never share paths.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, slug: &str) -> PathBuf {
        self.root.join(slug)
    }

    /// Creates the subtree for a brand-new video. Pre-existence means the
    /// slug collided with an earlier job, so the caller must pick a new one
    /// rather than write into someone else's directory.
    pub fn create_new(&self, slug: &str) -> Result<PathBuf, ArtifactError> {
        fs::create_dir_all(&self.root)?;
        let dir = self.dir(slug);
        match fs::create_dir(&dir) {
            Ok(()) => Ok(dir),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(ArtifactError::Collision {
                slug: slug.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Idempotent variant for callers that only need the directory to exist.
    pub fn ensure(&self, slug: &str) -> io::Result<PathBuf> {
        let dir = self.dir(slug);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Where the raw upload is parked until transcoding succeeds. Only the
    /// final path component of the client-supplied filename is kept.
    pub fn raw_path(&self, slug: &str, original_filename: &str) -> PathBuf {
        let name = Path::new(original_filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin");
        self.dir(slug).join(format!("{RAW_PREFIX}{name}"))
    }

    pub fn master_playlist(&self, slug: &str) -> PathBuf {
        self.dir(slug).join(MASTER_PLAYLIST)
    }

    pub fn variant_playlist_target(&self, slug: &str) -> PathBuf {
        self.dir(slug).join(VARIANT_PLAYLIST_PATTERN)
    }

    pub fn segment_target(&self, slug: &str) -> PathBuf {
        self.dir(slug).join(SEGMENT_PATTERN)
    }

    /// Best-effort rollback when intake fails after the directory was made.
    pub fn remove(&self, slug: &str) -> io::Result<()> {
        fs::remove_dir_all(self.dir(slug))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, ArtifactStore) {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path().join("uploads"));
        (tmp, store)
    }

    #[test]
    fn create_new_makes_root_and_subtree() {
        let (_tmp, store) = store();
        let dir = store.create_new("abc123de").unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir, store.root().join("abc123de"));
    }

    #[test]
    fn create_new_flags_collisions() {
        let (_tmp, store) = store();
        store.create_new("abc123de").unwrap();
        match store.create_new("abc123de") {
            Err(ArtifactError::Collision { slug }) => assert_eq!(slug, "abc123de"),
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn ensure_is_idempotent() {
        let (_tmp, store) = store();
        let first = store.ensure("abc123de").unwrap();
        let second = store.ensure("abc123de").unwrap();
        assert_eq!(first, second);
        assert!(second.is_dir());
    }

    #[test]
    fn subtrees_are_disjoint_per_slug() {
        let (_tmp, store) = store();
        let a = store.create_new("aaaaaaaa").unwrap();
        let b = store.create_new("bbbbbbbb").unwrap();
        assert_ne!(a, b);
        assert!(!store.master_playlist("aaaaaaaa").starts_with(&b));
    }

    #[test]
    fn raw_path_keeps_only_the_filename() {
        let (_tmp, store) = store();
        let path = store.raw_path("abc123de", "../../etc/sample.mp4");
        assert_eq!(
            path,
            store.root().join("abc123de").join("raw-sample.mp4")
        );
    }

    #[test]
    fn playlist_and_segment_conventions() {
        let (_tmp, store) = store();
        let dir = store.dir("abc123de");
        assert_eq!(store.master_playlist("abc123de"), dir.join("master.m3u8"));
        assert_eq!(
            store.variant_playlist_target("abc123de"),
            dir.join("v%v.m3u8")
        );
        assert_eq!(store.segment_target("abc123de"), dir.join("v%v_seg%d.ts"));
    }
}
