//! `POST /generate`: one request from form to WAV.
//!
//! Everything after the form is read runs as a single blocking task:
//! resolve the reference (staging an upload), seed, synthesize, encode. The
//! staged file belongs to that task and is released before the task returns,
//! whichever way it ends, so the caller only ever sees a finished WAV buffer
//! or an error.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
};
use tts_core::{encode_wav, seeded_rng, ReferenceResolver, NON_DETERMINISTIC};
use tracing::Instrument;

use crate::error::ApiError;
use crate::form::GenerateForm;
use crate::model::LoadedModel;
use crate::validation::validate_sampling;
use crate::{AppState, REQUEST_ID_HEADER};

/// A finished WAV buffer plus what the metrics want to know about it
#[derive(Debug)]
pub struct GeneratedAudio {
    pub wav: Vec<u8>,
    pub frames: usize,
    pub sample_rate: u32,
    pub reference_kind: &'static str,
    pub synthesis_ms: u64,
    /// A non-zero seed was given and the backend draws only from it.
    pub reproducible: bool,
}

impl IntoResponse for GeneratedAudio {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, "audio/wav"),
                (header::CONTENT_DISPOSITION, "attachment; filename=output.wav"),
            ],
            Body::from(self.wav),
        )
            .into_response()
    }
}

pub async fn generate_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<GeneratedAudio, ApiError> {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let span = tracing::info_span!("generate", request_id = %request_id);

    let start = Instant::now();
    let result = handle_generate(&state, multipart).instrument(span).await;
    match &result {
        Ok(audio) => {
            state.metrics.generate.record_success(start.elapsed().as_millis() as u64);
            state
                .metrics
                .synthesis
                .record(audio.synthesis_ms, audio.frames, audio.reference_kind);
        }
        Err(_) => state.metrics.generate.record_error(),
    }
    result
}

async fn handle_generate(state: &AppState, multipart: Multipart) -> Result<GeneratedAudio, ApiError> {
    let model = state.model.get().ok_or(ApiError::NotReady)?;

    let form = GenerateForm::from_multipart(multipart, state.config.max_upload_bytes).await?;
    validate_sampling(&form.params)?;
    tracing::info!(
        "Generate request: text length={}, upload={}, voice={:?}/{:?}, seed={}",
        form.text.len(),
        form.audio_prompt.is_some(),
        form.voice_name,
        form.gender,
        form.seed
    );

    let resolver = state.resolver.clone();
    let span = tracing::Span::current();
    let audio = tokio::task::spawn_blocking(move || {
        let _enter = span.enter();
        run_generation(&resolver, &model, form)
    })
    .await
    .map_err(|join_err| {
        tracing::error!("Generation task join error: {join_err}");
        ApiError::Internal(format!("Generation task failed: {join_err}"))
    })??;

    tracing::info!(
        "Generated {} frames at {} Hz in {}ms ({} reference)",
        audio.frames,
        audio.sample_rate,
        audio.synthesis_ms,
        audio.reference_kind
    );
    Ok(audio)
}

/// Resolve, seed, synthesize and encode. Blocking.
///
/// Any staged upload is gone by the time this returns.
pub fn run_generation(
    resolver: &ReferenceResolver,
    model: &LoadedModel,
    form: GenerateForm,
) -> Result<GeneratedAudio, ApiError> {
    tracing::debug!("resolving reference");
    let reference = resolver.resolve(
        form.audio_prompt.as_ref(),
        form.voice_name.as_deref(),
        form.gender.as_deref(),
    )?;
    let reference_kind = reference.kind();

    let started = Instant::now();
    let mut reproducible = false;
    let synthesized = match model.lock() {
        Ok(mut synth) => {
            if form.seed != NON_DETERMINISTIC {
                reproducible = synth.honours_seed();
                if !reproducible {
                    tracing::warn!(
                        "{} does not honour seeds; seed {} will not reproduce this output",
                        synth.name(),
                        form.seed
                    );
                }
            }
            tracing::debug!("seeding with {}", form.seed);
            let mut rng = seeded_rng(form.seed);
            tracing::debug!("synthesizing with {} reference", reference_kind);
            synth
                .generate(&form.text, reference.path(), &form.params, &mut rng)
                .map_err(ApiError::from)
        }
        Err(e) => Err(e),
    };
    let synthesis_ms = started.elapsed().as_millis() as u64;
    reference.release();
    let audio = synthesized?;

    tracing::debug!("encoding {} samples", audio.samples.len());
    let wav = encode_wav(&audio).map_err(|e| ApiError::Encoding(e.to_string()))?;

    Ok(GeneratedAudio {
        wav,
        frames: audio.frames(),
        sample_rate: audio.sample_rate,
        reference_kind,
        synthesis_ms,
        reproducible,
    })
}
