//! Scratch files for uploaded reference clips.
//!
//! An upload lives on disk only for the synthesis call that needs it. The
//! [`StagedAudioFile`] handle owns the file: it is removed by
//! [`StagedAudioFile::release`] or, on any other exit path, when the handle is
//! dropped.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

const DEFAULT_UPLOAD_NAME: &str = "audio_prompt.wav";
/// Longest stem and extension kept from a client filename, in bytes.
const MAX_STEM_LEN: usize = 64;
const MAX_EXTENSION_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct AudioStager {
    dir: PathBuf,
}

impl AudioStager {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to a fresh file named after `original_filename`.
    ///
    /// The whole payload is on disk when this returns.
    pub fn stage(&self, bytes: &[u8], original_filename: &str) -> io::Result<StagedAudioFile> {
        fs::create_dir_all(&self.dir)?;

        let name = format!(
            "temp_{}_{}",
            uuid::Uuid::new_v4().simple(),
            sanitize_filename(original_filename)
        );
        let path = self.dir.join(name);

        // create_new: never clobber another request's file.
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        let staged = StagedAudioFile { path };
        // On error `staged` drops here and removes the partial file.
        file.write_all(bytes)?;
        file.sync_all()?;

        tracing::debug!("Staged {} bytes at {}", bytes.len(), staged.path.display());
        Ok(staged)
    }
}

/// Keep only the final path component and a conservative character set.
fn sanitize_filename(original: &str) -> String {
    let last = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        return DEFAULT_UPLOAD_NAME.to_string();
    }

    // `cleaned` is ASCII, so byte slicing stays on char boundaries.
    match cleaned.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() <= MAX_EXTENSION_LEN => {
            format!("{}.{ext}", &stem[..stem.len().min(MAX_STEM_LEN)])
        }
        _ => cleaned[..cleaned.len().min(MAX_STEM_LEN)].to_string(),
    }
}

/// An uploaded clip on transient storage, owned by one request.
#[derive(Debug)]
pub struct StagedAudioFile {
    path: PathBuf,
}

impl StagedAudioFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file now. Dropping the handle has the same effect.
    pub fn release(self) {
        // Drop does the work.
    }

    fn remove(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Released staged file {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove staged file {}: {e}", self.path.display()),
        }
    }
}

impl Drop for StagedAudioFile {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_stage_writes_full_payload() {
        let dir = tempdir().unwrap();
        let stager = AudioStager::new(dir.path());
        let staged = stager.stage(b"reference-bytes", "a.wav").unwrap();

        assert_eq!(fs::read(staged.path()).unwrap(), b"reference-bytes");
        let name = staged.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("temp_"));
        assert!(name.ends_with("_a.wav"));
    }

    #[test]
    fn test_release_removes_file() {
        let dir = tempdir().unwrap();
        let staged = AudioStager::new(dir.path()).stage(b"x", "a.wav").unwrap();
        let path = staged.path().to_path_buf();

        staged.release();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_file() {
        let dir = tempdir().unwrap();
        let path = {
            let staged = AudioStager::new(dir.path()).stage(b"x", "a.wav").unwrap();
            staged.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_release_after_external_removal() {
        let dir = tempdir().unwrap();
        let staged = AudioStager::new(dir.path()).stage(b"x", "a.wav").unwrap();
        fs::remove_file(staged.path()).unwrap();
        staged.release();
    }

    #[test]
    fn test_same_filename_gets_distinct_paths() {
        let dir = tempdir().unwrap();
        let stager = AudioStager::new(dir.path());
        let first = stager.stage(b"1", "clip.wav").unwrap();
        let second = stager.stage(b"2", "clip.wav").unwrap();

        assert_ne!(first.path(), second.path());
        assert_eq!(fs::read(first.path()).unwrap(), b"1");
        assert_eq!(fs::read(second.path()).unwrap(), b"2");
    }

    #[test]
    fn test_creates_missing_scratch_dir() {
        let dir = tempdir().unwrap();
        let stager = AudioStager::new(dir.path().join("nested/scratch"));
        let staged = stager.stage(b"x", "a.wav").unwrap();
        assert!(staged.path().starts_with(dir.path().join("nested/scratch")));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a.wav"), "a.wav");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\clips\\my voice.wav"), "my_voice.wav");
        assert_eq!(sanitize_filename(""), DEFAULT_UPLOAD_NAME);
        assert_eq!(sanitize_filename(".."), DEFAULT_UPLOAD_NAME);
    }

    #[test]
    fn test_long_filename_is_truncated() {
        let long = format!("{}.wav", "a".repeat(250));
        let cleaned = sanitize_filename(&long);
        assert_eq!(cleaned, format!("{}.wav", "a".repeat(MAX_STEM_LEN)));

        let no_ext = "b".repeat(300);
        assert_eq!(sanitize_filename(&no_ext).len(), MAX_STEM_LEN);

        let dir = tempdir().unwrap();
        let staged = AudioStager::new(dir.path()).stage(b"x", &long).unwrap();
        let name = staged.path().file_name().unwrap().to_str().unwrap();
        assert!(name.len() < 255);
        assert!(name.ends_with(".wav"));
        assert_eq!(fs::read(staged.path()).unwrap(), b"x");
    }
}
