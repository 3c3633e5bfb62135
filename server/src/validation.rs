use tts_core::SamplingParams;

use crate::error::ApiError;

/// Validate sampling controls before they reach the model
pub fn validate_sampling(params: &SamplingParams) -> Result<(), ApiError> {
    if !params.temperature.is_finite() || params.temperature <= 0.0 {
        return Err(ApiError::InvalidInput(format!(
            "temperature must be a positive number, got {}",
            params.temperature
        )));
    }
    if !params.top_p.is_finite() || params.top_p <= 0.0 || params.top_p > 1.0 {
        return Err(ApiError::InvalidInput(format!(
            "top_p must be in (0, 1], got {}",
            params.top_p
        )));
    }
    if params.top_k == 0 {
        return Err(ApiError::InvalidInput("top_k must be at least 1".to_string()));
    }
    if !params.repetition_penalty.is_finite() || params.repetition_penalty <= 0.0 {
        return Err(ApiError::InvalidInput(format!(
            "repetition_penalty must be a positive number, got {}",
            params.repetition_penalty
        )));
    }
    Ok(())
}
