//! Pre-recorded reference voices stored on disk.
//!
//! The catalog is a directory with one subdirectory per [`VoiceCategory`]
//! (`Man/`, `Woman/`); every `.wav` file inside is a voice named after its
//! file stem. Nothing is cached, so voices added or removed on disk show up on
//! the next call.

use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const VOICE_EXTENSION: &str = "wav";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VoiceCategory {
    Man,
    Woman,
}

impl VoiceCategory {
    pub const ALL: [VoiceCategory; 2] = [VoiceCategory::Man, VoiceCategory::Woman];

    /// Directory name under the catalog base.
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceCategory::Man => "Man",
            VoiceCategory::Woman => "Woman",
        }
    }
}

impl fmt::Display for VoiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bring a client-supplied category label to the catalog's directory casing:
/// first character upper-case, the rest lower-case (`"man"` -> `"Man"`).
pub fn canonical_category(label: &str) -> String {
    let mut chars = label.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceEntry {
    pub name: String,
    pub category: String,
    pub path: PathBuf,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Voice '{name}' not found for gender '{category}'")]
    NotFound { name: String, category: String },
}

#[derive(Debug, Clone)]
pub struct VoiceCatalog {
    base: PathBuf,
}

impl VoiceCatalog {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Voice names per category, sorted. A missing category directory is an
    /// empty list.
    pub fn list_voices(&self) -> BTreeMap<VoiceCategory, Vec<String>> {
        VoiceCategory::ALL
            .iter()
            .map(|&category| (category, self.voices_in(category)))
            .collect()
    }

    fn voices_in(&self, category: VoiceCategory) -> Vec<String> {
        let dir = self.base.join(category.as_str());
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Voice directory {} unavailable: {e}", dir.display());
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_voice_extension(path))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        names
    }

    /// Find `<base>/<Category>/<name>.wav`, normalizing the category label.
    pub fn lookup(&self, name: &str, category_label: &str) -> Result<VoiceEntry, CatalogError> {
        let category = canonical_category(category_label);
        let not_found = || CatalogError::NotFound {
            name: name.to_string(),
            category: category.clone(),
        };

        if !is_plain_component(name) || !is_plain_component(&category) {
            return Err(not_found());
        }

        let path = self
            .base
            .join(&category)
            .join(format!("{name}.{VOICE_EXTENSION}"));
        if path.is_file() {
            Ok(VoiceEntry {
                name: name.to_string(),
                category,
                path,
            })
        } else {
            Err(not_found())
        }
    }
}

fn has_voice_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == VOICE_EXTENSION)
}

// A name must stay inside its category directory.
fn is_plain_component(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"RIFF").unwrap();
    }

    #[test]
    fn test_canonical_category() {
        assert_eq!(canonical_category("man"), "Man");
        assert_eq!(canonical_category("WOMAN"), "Woman");
        assert_eq!(canonical_category("Man"), "Man");
        assert_eq!(canonical_category(""), "");
    }

    #[test]
    fn test_list_voices_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("Man/zed.wav"));
        touch(&dir.path().join("Man/bob.wav"));
        touch(&dir.path().join("Man/notes.txt"));
        touch(&dir.path().join("Woman/alice.wav"));

        let voices = VoiceCatalog::new(dir.path()).list_voices();
        assert_eq!(voices[&VoiceCategory::Man], vec!["bob", "zed"]);
        assert_eq!(voices[&VoiceCategory::Woman], vec!["alice"]);
    }

    #[test]
    fn test_list_voices_missing_directories() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("Woman/alice.wav"));

        let voices = VoiceCatalog::new(dir.path()).list_voices();
        assert!(voices[&VoiceCategory::Man].is_empty());
        assert_eq!(voices[&VoiceCategory::Woman], vec!["alice"]);

        let nowhere = VoiceCatalog::new(dir.path().join("does-not-exist")).list_voices();
        assert_eq!(nowhere.len(), 2);
        assert!(nowhere.values().all(Vec::is_empty));
    }

    #[test]
    fn test_list_voices_sees_new_files() {
        let dir = tempdir().unwrap();
        let catalog = VoiceCatalog::new(dir.path());
        assert!(catalog.list_voices()[&VoiceCategory::Man].is_empty());

        touch(&dir.path().join("Man/bob.wav"));
        assert_eq!(catalog.list_voices()[&VoiceCategory::Man], vec!["bob"]);
    }

    #[test]
    fn test_lookup_normalizes_category() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("Man/bob.wav"));

        let entry = VoiceCatalog::new(dir.path()).lookup("bob", "man").unwrap();
        assert_eq!(entry.category, "Man");
        assert_eq!(entry.path, dir.path().join("Man").join("bob.wav"));
    }

    #[test]
    fn test_lookup_not_found_names_voice_and_category() {
        let dir = tempdir().unwrap();
        let err = VoiceCatalog::new(dir.path()).lookup("nope", "man").unwrap_err();
        let CatalogError::NotFound { name, category } = &err;
        assert_eq!(name, "nope");
        assert_eq!(category, "Man");
        assert!(err.to_string().contains("nope"));
        assert!(err.to_string().contains("Man"));
    }

    #[test]
    fn test_lookup_rejects_path_escapes() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("secret.wav"));
        let catalog = VoiceCatalog::new(dir.path().join("voices"));
        touch(&dir.path().join("voices/Man/bob.wav"));

        assert!(catalog.lookup("../../secret", "man").is_err());
        assert!(catalog.lookup("bob", "..").is_err());
    }
}
