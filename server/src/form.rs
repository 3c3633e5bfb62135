//! The multipart form accepted by `POST /generate`.

use std::str::FromStr;

use axum::{
    extract::{multipart::MultipartError, Multipart},
    http::StatusCode,
};
use tts_core::{SamplingParams, UploadedClip};

use crate::error::ApiError;

const DEFAULT_UPLOAD_NAME: &str = "audio_prompt.wav";

#[derive(Debug, Clone)]
pub struct GenerateForm {
    pub text: String,
    pub audio_prompt: Option<UploadedClip>,
    pub voice_name: Option<String>,
    pub gender: Option<String>,
    /// 0 means non-deterministic
    pub seed: u64,
    pub params: SamplingParams,
}

impl GenerateForm {
    /// A form carrying only text, everything else at its default.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            audio_prompt: None,
            voice_name: None,
            gender: None,
            seed: 0,
            params: SamplingParams::default(),
        }
    }

    /// Read every field of the form. Unknown fields are skipped; blank
    /// optional fields count as absent. `limit` is the body limit in force,
    /// reported when the body is cut off.
    pub async fn from_multipart(mut multipart: Multipart, limit: usize) -> Result<Self, ApiError> {
        let mut text: Option<String> = None;
        let mut form = Self::with_text(String::new());

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, "parse multipart form", limit))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == "audio_prompt" {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|f| !f.is_empty())
                    .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, "read audio_prompt", limit))?;
                // Browsers send an empty part when no file was picked.
                if !bytes.is_empty() {
                    form.audio_prompt = Some(UploadedClip {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| multipart_error(e, &format!("read {name} field"), limit))?;
            let blank = value.trim().is_empty();

            match name.as_str() {
                "text" => text = Some(value),
                "voice_name" if !blank => form.voice_name = Some(value),
                "gender" if !blank => form.gender = Some(value),
                "temperature" if !blank => form.params.temperature = parse_field(&name, &value)?,
                "top_p" if !blank => form.params.top_p = parse_field(&name, &value)?,
                "top_k" if !blank => form.params.top_k = parse_field(&name, &value)?,
                "repetition_penalty" if !blank => {
                    form.params.repetition_penalty = parse_field(&name, &value)?
                }
                "seed" if !blank => form.seed = parse_field(&name, &value)?,
                "norm_loudness" if !blank => form.params.normalize_loudness = parse_bool(&name, &value)?,
                _ => {}
            }
        }

        form.text = text.ok_or_else(|| {
            ApiError::InvalidInput("Missing required 'text' field in multipart form".to_string())
        })?;
        Ok(form)
    }
}

fn multipart_error(e: MultipartError, action: &str, limit: usize) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit }
    } else {
        ApiError::InvalidInput(format!("Failed to {action}: {}", e.body_text()))
    }
}

fn parse_field<T>(name: &str, value: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ApiError::InvalidInput(format!("Invalid {name} value '{value}': {e}")))
}

/// Accepts the usual HTML form spellings of a boolean.
pub fn parse_bool(name: &str, value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Ok(true),
        "false" | "0" | "no" | "off" | "f" | "n" => Ok(false),
        _ => Err(ApiError::InvalidInput(format!(
            "Invalid {name} value '{value}': expected a boolean"
        ))),
    }
}
