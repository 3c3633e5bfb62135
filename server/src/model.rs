//! Ownership of the loaded synthesis model.
//!
//! The model is loaded once, after the listener is already up, and then shared
//! by every request. Until it is installed the slot is empty and generation
//! answers `NotReady`.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use tts_core::SpeechSynthesizer;

use crate::config::ServerConfig;
use crate::error::ApiError;

/// A loaded model behind its request lock.
///
/// Seeding and synthesis happen while holding the lock, so concurrent
/// requests reach the model one at a time.
#[derive(Clone)]
pub struct LoadedModel {
    name: String,
    synth: Arc<Mutex<Box<dyn SpeechSynthesizer>>>,
}

impl LoadedModel {
    pub fn new(synth: Box<dyn SpeechSynthesizer>) -> Self {
        Self {
            name: synth.name().to_string(),
            synth: Arc::new(Mutex::new(synth)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Box<dyn SpeechSynthesizer>>, ApiError> {
        self.synth.lock().map_err(|_| {
            ApiError::Internal(
                "Synthesizer lock poisoned - a previous generation panicked. Please restart the server."
                    .to_string(),
            )
        })
    }
}

#[derive(Clone, Default)]
pub struct ModelSlot {
    inner: Arc<OnceLock<LoadedModel>>,
}

impl ModelSlot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn ready(synth: Box<dyn SpeechSynthesizer>) -> Self {
        let slot = Self::empty();
        slot.install(synth);
        slot
    }

    /// Returns false if a model was already installed.
    pub fn install(&self, synth: Box<dyn SpeechSynthesizer>) -> bool {
        self.inner.set(LoadedModel::new(synth)).is_ok()
    }

    pub fn get(&self) -> Option<LoadedModel> {
        self.inner.get().cloned()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// Build the configured backend. Blocking; run it off the async workers.
#[cfg(feature = "piper")]
pub fn load_synthesizer(config: &ServerConfig) -> anyhow::Result<Box<dyn SpeechSynthesizer>> {
    let path = config
        .piper_config
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("PIPER_CONFIG must point at a Piper .onnx.json voice config"))?;
    tracing::info!("Loading Piper voice from {} on {}", path.display(), config.device);
    let synth = tts_core::PiperSynthesizer::from_config_path(path)?;
    Ok(Box::new(synth))
}

/// Build the configured backend. Blocking; run it off the async workers.
#[cfg(not(feature = "piper"))]
pub fn load_synthesizer(config: &ServerConfig) -> anyhow::Result<Box<dyn SpeechSynthesizer>> {
    anyhow::bail!(
        "no synthesis backend compiled in for model '{}'; rebuild with `--features piper`",
        config.model_name
    )
}

/// Load the model in the background and install it into `slot`.
pub fn spawn_model_loader(slot: ModelSlot, config: ServerConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("--- Loading {} on {} ---", config.model_name, config.device);
        let loaded = tokio::task::spawn_blocking(move || load_synthesizer(&config)).await;
        match loaded {
            Ok(Ok(synth)) => {
                let name = synth.name().to_string();
                if slot.install(synth) {
                    tracing::info!("--- Model {name} loaded successfully ---");
                } else {
                    tracing::warn!("Model already installed, discarding {name}");
                }
            }
            Ok(Err(e)) => tracing::error!("--- Error loading model: {e:#} ---"),
            Err(join_err) => tracing::error!("Model loading task failed: {join_err}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;
    use std::path::Path;
    use tts_core::{SamplingParams, SynthesisError, SynthesisResult};

    struct Silent;

    impl SpeechSynthesizer for Silent {
        fn name(&self) -> &str {
            "silent"
        }

        fn generate(
            &mut self,
            _text: &str,
            _reference: Option<&Path>,
            _params: &SamplingParams,
            _rng: &mut dyn RngCore,
        ) -> Result<SynthesisResult, SynthesisError> {
            Ok(SynthesisResult::mono(vec![0.0; 4], 8_000))
        }
    }

    #[test]
    fn test_slot_lifecycle() {
        let slot = ModelSlot::empty();
        assert!(!slot.is_ready());
        assert!(slot.get().is_none());

        assert!(slot.install(Box::new(Silent)));
        assert!(slot.is_ready());
        assert_eq!(slot.get().unwrap().name(), "silent");

        assert!(!slot.install(Box::new(Silent)));
    }

    #[test]
    fn test_clones_share_the_slot() {
        let slot = ModelSlot::empty();
        let observer = slot.clone();
        slot.install(Box::new(Silent));
        assert!(observer.is_ready());
    }

    #[cfg(not(feature = "piper"))]
    #[test]
    fn test_load_without_backend_fails() {
        assert!(load_synthesizer(&ServerConfig::default()).is_err());
    }
}
