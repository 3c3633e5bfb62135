//! Building blocks for serving a voice-cloning text-to-speech model.
//!
//! A request flows through these pieces in order: [`resolver`] picks the
//! reference clip (staging uploads through [`staging`] or looking voices up in
//! [`catalog`]), [`seed`] builds the random generator, a
//! [`SpeechSynthesizer`] produces samples and [`wav`] packs them for the
//! client.

pub mod catalog;
pub mod loudness;
#[cfg(feature = "piper")]
pub mod piper;
pub mod resolver;
pub mod seed;
pub mod staging;
pub mod synth;
pub mod wav;

pub use catalog::{canonical_category, CatalogError, VoiceCatalog, VoiceCategory, VoiceEntry};
#[cfg(feature = "piper")]
pub use piper::PiperSynthesizer;
pub use resolver::{ReferenceResolver, ResolveError, ResolvedReference, UploadedClip};
pub use seed::{seeded_rng, NON_DETERMINISTIC};
pub use staging::{AudioStager, StagedAudioFile};
pub use synth::{SamplingParams, SpeechSynthesizer, SynthesisError, SynthesisResult};
pub use wav::{encode_wav, probe_wav, WavInfo};
