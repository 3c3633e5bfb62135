// Metrics collection and tracking

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

/// Latency samples kept for percentiles
const LATENCY_WINDOW: usize = 1000;

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Start the uptime clock. Later calls are no-ops.
pub fn mark_start() {
    let _ = START_TIME.get_or_init(Instant::now);
}

/// Request/error counts and latency for the generate endpoint
#[derive(Debug)]
pub struct EndpointMetrics {
    request_count: AtomicU64,
    error_count: AtomicU64,
    total_latency_ms: AtomicU64,
    min_latency_ms: AtomicU64,
    max_latency_ms: AtomicU64,
    latency_samples: Mutex<VecDeque<u64>>,
}

impl Default for EndpointMetrics {
    fn default() -> Self {
        Self {
            request_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            min_latency_ms: AtomicU64::new(u64::MAX),
            max_latency_ms: AtomicU64::new(0),
            latency_samples: Mutex::new(VecDeque::with_capacity(LATENCY_WINDOW)),
        }
    }
}

impl EndpointMetrics {
    pub fn record_success(&self, latency_ms: u64) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.min_latency_ms.fetch_min(latency_ms, Ordering::Relaxed);
        self.max_latency_ms.fetch_max(latency_ms, Ordering::Relaxed);

        if let Ok(mut samples) = self.latency_samples.lock() {
            if samples.len() == LATENCY_WINDOW {
                samples.pop_front();
            }
            samples.push_back(latency_ms);
        }
    }

    pub fn record_error(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    fn percentile(&self, p: usize) -> u64 {
        let Ok(samples) = self.latency_samples.lock() else {
            return 0;
        };
        if samples.is_empty() {
            return 0;
        }
        let mut sorted: Vec<u64> = samples.iter().copied().collect();
        sorted.sort_unstable();
        sorted[(sorted.len() * p / 100).min(sorted.len() - 1)]
    }

    pub fn snapshot(&self) -> EndpointStats {
        let requests = self.request_count.load(Ordering::Relaxed);
        let errors = self.error_count.load(Ordering::Relaxed);
        let successes = requests.saturating_sub(errors);
        let total = self.total_latency_ms.load(Ordering::Relaxed);
        let min = self.min_latency_ms.load(Ordering::Relaxed);

        EndpointStats {
            request_count: requests,
            error_count: errors,
            avg_latency_ms: if successes == 0 { 0.0 } else { total as f64 / successes as f64 },
            min_latency_ms: if min == u64::MAX { 0 } else { min },
            max_latency_ms: self.max_latency_ms.load(Ordering::Relaxed),
            p50_latency_ms: self.percentile(50),
            p95_latency_ms: self.percentile(95),
            p99_latency_ms: self.percentile(99),
        }
    }
}

/// What the model did, and with which kind of reference
#[derive(Debug, Default)]
pub struct SynthesisMetrics {
    synthesis_count: AtomicU64,
    total_synthesis_time_ms: AtomicU64,
    total_frames: AtomicU64,
    upload_references: AtomicU64,
    catalog_references: AtomicU64,
    default_references: AtomicU64,
}

impl SynthesisMetrics {
    pub fn record(&self, time_ms: u64, frames: usize, reference_kind: &str) {
        self.synthesis_count.fetch_add(1, Ordering::Relaxed);
        self.total_synthesis_time_ms.fetch_add(time_ms, Ordering::Relaxed);
        self.total_frames.fetch_add(frames as u64, Ordering::Relaxed);
        let counter = match reference_kind {
            "upload" => &self.upload_references,
            "catalog" => &self.catalog_references,
            _ => &self.default_references,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SynthesisStats {
        let count = self.synthesis_count.load(Ordering::Relaxed);
        let total = self.total_synthesis_time_ms.load(Ordering::Relaxed);
        SynthesisStats {
            synthesis_count: count,
            avg_synthesis_time_ms: if count == 0 { 0.0 } else { total as f64 / count as f64 },
            total_frames: self.total_frames.load(Ordering::Relaxed),
            upload_references: self.upload_references.load(Ordering::Relaxed),
            catalog_references: self.catalog_references.load(Ordering::Relaxed),
            default_references: self.default_references.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppMetrics {
    pub generate: Arc<EndpointMetrics>,
    pub synthesis: Arc<SynthesisMetrics>,
}

#[derive(Debug, Serialize)]
pub struct EndpointStats {
    pub request_count: u64,
    pub error_count: u64,
    pub avg_latency_ms: f64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    pub p50_latency_ms: u64,
    pub p95_latency_ms: u64,
    pub p99_latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct SynthesisStats {
    pub synthesis_count: u64,
    pub avg_synthesis_time_ms: f64,
    pub total_frames: u64,
    pub upload_references: u64,
    pub catalog_references: u64,
    pub default_references: u64,
}

#[derive(Serialize)]
pub struct SystemMetrics {
    pub cpu_usage_percent: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub memory_usage_percent: f32,
    pub uptime_seconds: u64,
    pub system_load: Option<f64>,
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub timestamp: DateTime<Utc>,
    pub model_ready: bool,
    pub system: SystemMetrics,
    pub generate: EndpointStats,
    pub synthesis: SynthesisStats,
}

fn system_metrics() -> SystemMetrics {
    let mut system = sysinfo::System::new();
    system.refresh_cpu();
    system.refresh_memory();

    let memory_used = system.used_memory();
    let memory_total = system.total_memory();
    let memory_usage_percent = if memory_total > 0 {
        (memory_used as f64 / memory_total as f64 * 100.0) as f32
    } else {
        0.0
    };

    SystemMetrics {
        cpu_usage_percent: system.global_cpu_info().cpu_usage(),
        memory_used_mb: memory_used / 1024 / 1024,
        memory_total_mb: memory_total / 1024 / 1024,
        memory_usage_percent,
        uptime_seconds: START_TIME.get().map(|start| start.elapsed().as_secs()).unwrap_or(0),
        system_load: Some(sysinfo::System::load_average().one),
    }
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        timestamp: Utc::now(),
        model_ready: state.model.is_ready(),
        system: system_metrics(),
        generate: state.metrics.generate.snapshot(),
        synthesis: state.metrics.synthesis.snapshot(),
    })
}
