//! Picks the reference clip for a request.
//!
//! Precedence is fixed: an uploaded clip wins, then a complete
//! `voice_name` + `gender` pair from the catalog, then the model's own default
//! voice.

use std::{io, path::Path};

use thiserror::Error;

use crate::catalog::{CatalogError, VoiceCatalog, VoiceEntry};
use crate::staging::{AudioStager, StagedAudioFile};

/// Raw upload as received from the client.
#[derive(Debug, Clone)]
pub struct UploadedClip {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub enum ResolvedReference {
    Uploaded(StagedAudioFile),
    Catalog(VoiceEntry),
    Default,
}

impl ResolvedReference {
    /// Path handed to the synthesizer, `None` for the model default.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ResolvedReference::Uploaded(staged) => Some(staged.path()),
            ResolvedReference::Catalog(entry) => Some(&entry.path),
            ResolvedReference::Default => None,
        }
    }

    /// Give back anything staged for this reference.
    pub fn release(self) {
        if let ResolvedReference::Uploaded(staged) = self {
            staged.release();
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ResolvedReference::Uploaded(_) => "upload",
            ResolvedReference::Catalog(_) => "catalog",
            ResolvedReference::Default => "default",
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    NotFound(#[from] CatalogError),

    #[error("Failed to stage uploaded audio: {0}")]
    Staging(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    catalog: VoiceCatalog,
    stager: AudioStager,
}

impl ReferenceResolver {
    pub fn new(catalog: VoiceCatalog, stager: AudioStager) -> Self {
        Self { catalog, stager }
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    /// Named-voice fields are ignored whenever an upload is present. A name
    /// without a gender (or the reverse) falls back to the default voice.
    pub fn resolve(
        &self,
        upload: Option<&UploadedClip>,
        voice_name: Option<&str>,
        gender: Option<&str>,
    ) -> Result<ResolvedReference, ResolveError> {
        if let Some(clip) = upload {
            let staged = self.stager.stage(&clip.bytes, &clip.filename)?;
            return Ok(ResolvedReference::Uploaded(staged));
        }

        fn non_empty(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }
        match (non_empty(voice_name), non_empty(gender)) {
            (Some(name), Some(gender)) => {
                let entry = self.catalog.lookup(name, gender)?;
                Ok(ResolvedReference::Catalog(entry))
            }
            _ => Ok(ResolvedReference::Default),
        }
    }
}
