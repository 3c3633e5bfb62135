// Configuration for the server, read from the environment

use std::{path::PathBuf, str::FromStr, time::Duration};

/// Upload limit for the whole multipart body (32 MiB)
const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 << 20;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub voices_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub device: String,
    pub model_name: String,
    pub piper_config: Option<PathBuf>,
    pub max_upload_bytes: usize,
    pub request_timeout_secs: Option<u64>,
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            voices_dir: PathBuf::from("cloned_voices"),
            staging_dir: std::env::temp_dir(),
            device: "cpu".to_string(),
            model_name: default_model_name().to_string(),
            piper_config: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            request_timeout_secs: None,
            cors_allowed_origins: None,
        }
    }
}

fn default_model_name() -> &'static str {
    if cfg!(feature = "piper") {
        "piper"
    } else {
        "none"
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            });

        Self {
            port: env_parse("PORT").unwrap_or(defaults.port),
            voices_dir: env_string("VOICES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.voices_dir),
            staging_dir: env_string("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.staging_dir),
            device: env_string("TTS_DEVICE").unwrap_or(defaults.device),
            model_name: env_string("TTS_MODEL").unwrap_or(defaults.model_name),
            piper_config: env_string("PIPER_CONFIG").map(PathBuf::from),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS").filter(|&secs: &u64| secs > 0),
            cors_allowed_origins,
        }
    }

    /// Deployment-level timeout; `None` leaves requests unbounded.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
