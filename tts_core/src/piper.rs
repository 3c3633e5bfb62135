//! Piper ONNX voices as a [`SpeechSynthesizer`].
//!
//! Piper speaks with the single voice baked into its model, so reference clips
//! are only checked for readability, and nucleus sampling controls have no
//! counterpart. Loudness normalization is applied here.
//!
//! The VITS graph samples its own noise inside the ONNX session, so the
//! request seed cannot reach it and seeded output is not reproducible.

use std::{
    fs,
    path::{Path, PathBuf},
};

use piper_rs::synth::{PiperSpeechStreamParallel, PiperSpeechSynthesizer};
use rand::RngCore;

use crate::loudness::{normalize_loudness, DEFAULT_TARGET_DBFS};
use crate::synth::{SamplingParams, SpeechSynthesizer, SynthesisError, SynthesisResult};
use crate::wav::probe_wav;

pub struct PiperSynthesizer {
    synth: PiperSpeechSynthesizer,
    sample_rate: u32,
    config_path: PathBuf,
}

impl std::fmt::Debug for PiperSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PiperSynthesizer")
            .field("synth", &"<PiperSpeechSynthesizer>")
            .field("sample_rate", &self.sample_rate)
            .field("config_path", &self.config_path)
            .finish()
    }
}

impl PiperSynthesizer {
    pub const HONOURS_SEED: bool = false;

    /// Load the voice described by a Piper `.onnx.json` config.
    pub fn from_config_path<P: AsRef<Path>>(cfg_path: P) -> Result<Self, SynthesisError> {
        let cfg_path = cfg_path.as_ref();
        let sample_rate = read_sample_rate(cfg_path)?;
        let model = piper_rs::from_config_path(cfg_path)
            .map_err(|e| SynthesisError::Backend(format!("piper load error: {e}")))?;
        let synth = PiperSpeechSynthesizer::new(model)
            .map_err(|e| SynthesisError::Backend(format!("piper init error: {e}")))?;

        Ok(Self {
            synth,
            sample_rate,
            config_path: cfg_path.to_path_buf(),
        })
    }
}

fn read_sample_rate(cfg_path: &Path) -> Result<u32, SynthesisError> {
    let text = fs::read_to_string(cfg_path).map_err(|e| {
        SynthesisError::Backend(format!("Failed to read config file {}: {e}", cfg_path.display()))
    })?;
    let json: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| SynthesisError::Backend(format!("Config file is not valid JSON: {e}")))?;

    json.get("audio")
        .and_then(|a| a.get("sample_rate"))
        .and_then(|sr| sr.as_u64())
        .and_then(|sr| u32::try_from(sr).ok())
        .ok_or_else(|| {
            SynthesisError::Backend("Missing or invalid 'audio.sample_rate' in config".to_string())
        })
}

impl SpeechSynthesizer for PiperSynthesizer {
    fn name(&self) -> &str {
        "piper"
    }

    fn honours_seed(&self) -> bool {
        Self::HONOURS_SEED
    }

    fn generate(
        &mut self,
        text: &str,
        reference: Option<&Path>,
        params: &SamplingParams,
        _rng: &mut dyn RngCore,
    ) -> Result<SynthesisResult, SynthesisError> {
        if text.trim().is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        if let Some(path) = reference {
            let bytes = fs::read(path).map_err(|e| SynthesisError::ReferenceAudio {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            probe_wav(&bytes).map_err(|e| SynthesisError::ReferenceAudio {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            tracing::warn!("Piper voices cannot be cloned; ignoring reference {}", path.display());
        }

        tracing::debug!(
            "piper synthesis: temperature={} top_p={} top_k={} repetition_penalty={} (not used by piper)",
            params.temperature,
            params.top_p,
            params.top_k,
            params.repetition_penalty
        );

        let iter: PiperSpeechStreamParallel = self
            .synth
            .synthesize_parallel(text.to_string(), None)
            .map_err(|e| SynthesisError::Backend(format!("piper synth error: {e}")))?;

        let mut samples: Vec<f32> = Vec::new();
        for part in iter {
            samples.extend(
                part.map_err(|e| SynthesisError::Backend(format!("chunk error: {e}")))?
                    .into_vec(),
            );
        }

        if params.normalize_loudness {
            normalize_loudness(&mut samples, DEFAULT_TARGET_DBFS);
        }

        Ok(SynthesisResult::mono(samples, self.sample_rate))
    }
}
