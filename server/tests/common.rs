//! Common utilities for integration tests

#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use axum::{body::Body, http::Request, Router};
use rand::{Rng, RngCore};
use server::{build_router, config::ServerConfig, model::ModelSlot, AppState};
use tempfile::TempDir;
use tts_core::{SamplingParams, SpeechSynthesizer, SynthesisError, SynthesisResult};

pub const SAMPLE_RATE: u32 = 24_000;

/// References the stub saw, and whether each existed at synthesis time.
pub type SeenReferences = Arc<Mutex<Vec<(Option<PathBuf>, bool)>>>;

/// Draws its samples from the RNG it is handed.
pub struct StubSynth {
    pub seen: SeenReferences,
    pub fail: bool,
}

impl SpeechSynthesizer for StubSynth {
    fn name(&self) -> &str {
        "stub"
    }

    fn generate(
        &mut self,
        text: &str,
        reference: Option<&Path>,
        _params: &SamplingParams,
        rng: &mut dyn RngCore,
    ) -> Result<SynthesisResult, SynthesisError> {
        self.seen.lock().unwrap().push((
            reference.map(Path::to_path_buf),
            reference.is_some_and(Path::exists),
        ));
        if self.fail {
            return Err(SynthesisError::Backend("stub failure".into()));
        }
        if text.is_empty() {
            return Err(SynthesisError::EmptyText);
        }
        let samples = (0..text.len() * 100)
            .map(|_| rng.gen_range(-0.5f32..0.5))
            .collect();
        Ok(SynthesisResult::mono(samples, SAMPLE_RATE))
    }
}

pub struct TestApp {
    pub router: Router,
    pub voices: TempDir,
    pub scratch: TempDir,
    pub seen: SeenReferences,
}

impl TestApp {
    pub fn scratch_files(&self) -> Vec<PathBuf> {
        fs::read_dir(self.scratch.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    pub fn seen(&self) -> Vec<(Option<PathBuf>, bool)> {
        self.seen.lock().unwrap().clone()
    }
}

pub enum Model {
    Missing,
    Working,
    Failing,
}

/// Create a test app with a catalog holding `Man/bob.wav`
pub fn create_test_app(model: Model) -> TestApp {
    create_test_app_with(model, |_| {})
}

/// Like [`create_test_app`], with a hook to adjust the config first
pub fn create_test_app_with(model: Model, configure: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let voices = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    fs::create_dir_all(voices.path().join("Man")).unwrap();
    fs::write(voices.path().join("Man").join("bob.wav"), b"RIFF").unwrap();

    let seen = SeenReferences::default();
    let slot = match model {
        Model::Missing => ModelSlot::empty(),
        Model::Working | Model::Failing => ModelSlot::ready(Box::new(StubSynth {
            seen: seen.clone(),
            fail: matches!(model, Model::Failing),
        })),
    };

    let mut config = ServerConfig {
        voices_dir: voices.path().to_path_buf(),
        staging_dir: scratch.path().to_path_buf(),
        model_name: "stub".to_string(),
        cors_allowed_origins: Some(vec!["http://localhost:3000".to_string()]),
        ..ServerConfig::default()
    };
    configure(&mut config);

    TestApp {
        router: build_router(AppState::new(config, slot)),
        voices,
        scratch,
        seen,
    }
}

const BOUNDARY: &str = "----tts-test-boundary";

/// A part of a multipart/form-data body
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

pub fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: audio/wav\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
