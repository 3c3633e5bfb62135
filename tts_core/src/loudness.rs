/// Default loudness target in dBFS (RMS).
pub const DEFAULT_TARGET_DBFS: f32 = -20.0;

// Below this RMS the signal is treated as silence.
const SILENCE_RMS: f32 = 1e-6;

pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum / samples.len() as f64).sqrt() as f32
}

/// Scale `samples` in place so their RMS level hits `target_dbfs`.
///
/// Gain is capped so the loudest sample stays within [-1.0, 1.0]. Silent input
/// is left untouched. Returns the applied linear gain.
pub fn normalize_loudness(samples: &mut [f32], target_dbfs: f32) -> f32 {
    let current = rms(samples);
    if current < SILENCE_RMS {
        return 1.0;
    }

    let target = 10f32.powf(target_dbfs / 20.0);
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    let gain = (target / current).min(1.0 / peak);

    for s in samples.iter_mut() {
        *s *= gain;
    }
    gain
}
