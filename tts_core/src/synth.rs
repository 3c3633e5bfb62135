//! The synthesis contract.
//!
//! The model that turns text into audio is opaque to the rest of the
//! service. It is reached only through [`SpeechSynthesizer`], which takes the
//! text, an optional reference clip and the sampling controls, and hands back
//! raw samples with their sample rate.

use std::path::Path;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sampling controls forwarded verbatim to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: usize,
    pub repetition_penalty: f32,
    pub normalize_loudness: bool,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            top_p: 0.95,
            top_k: 1000,
            repetition_penalty: 1.2,
            normalize_loudness: true,
        }
    }
}

/// Raw audio produced by one synthesis call.
///
/// Samples are interleaved when `channels > 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl SynthesisResult {
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: 1,
            sample_rate,
        }
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.frames() as u64 * 1000) / u64::from(self.sample_rate)
    }
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("text to synthesize is empty")]
    EmptyText,

    #[error("unusable reference audio {path}: {reason}")]
    ReferenceAudio { path: String, reason: String },

    #[error("synthesis backend failed: {0}")]
    Backend(String),
}

/// A loaded text-to-speech model.
///
/// Calls are blocking and may run for a long time. Implementations that
/// report [`honours_seed`](Self::honours_seed) must draw every random decision
/// from `rng`, so that a seeded generator yields bit-identical output for
/// identical inputs.
pub trait SpeechSynthesizer: Send {
    /// Short label reported on the health endpoint.
    fn name(&self) -> &str;

    /// Whether output is a function of the inputs and `rng` alone. Backends
    /// with randomness of their own return `false`.
    fn honours_seed(&self) -> bool {
        true
    }

    fn generate(
        &mut self,
        text: &str,
        reference: Option<&Path>,
        params: &SamplingParams,
        rng: &mut dyn RngCore,
    ) -> Result<SynthesisResult, SynthesisError>;
}
