//! Intensity scaling.
//!
//! Blends a profile's sampling parameters toward a fixed neutral baseline.
//! At intensity `0.0` the result is the baseline, at `1.0` it is the
//! profile. `max_tokens` has no baseline and passes through untouched.

use super::definition::{StateParameters, DEFAULT_TEMPERATURE};

/// Neutral sampling parameters every profile is blended against.
pub const BASELINE_TEMPERATURE: f64 = DEFAULT_TEMPERATURE;
pub const BASELINE_TOP_P: f64 = 1.0;
pub const BASELINE_FREQUENCY_PENALTY: f64 = 0.0;
pub const BASELINE_PRESENCE_PENALTY: f64 = 0.0;

/// Linearly interpolate `profile` toward the baseline by `intensity`.
///
/// `intensity` is clamped to `[0, 1]`; a NaN intensity is treated as `0`.
/// Fields the profile omits fall back to the baseline constant, so the
/// result always carries all four scaled fields.
pub fn scale(profile: &StateParameters, intensity: f64) -> StateParameters {
    let t = if intensity.is_nan() {
        0.0
    } else {
        intensity.clamp(0.0, 1.0)
    };

    StateParameters {
        temperature: lerp(BASELINE_TEMPERATURE, profile.temperature, t),
        top_p: Some(lerp(BASELINE_TOP_P, profile.top_p.unwrap_or(BASELINE_TOP_P), t)),
        frequency_penalty: Some(lerp(
            BASELINE_FREQUENCY_PENALTY,
            profile.frequency_penalty.unwrap_or(BASELINE_FREQUENCY_PENALTY),
            t,
        )),
        presence_penalty: Some(lerp(
            BASELINE_PRESENCE_PENALTY,
            profile.presence_penalty.unwrap_or(BASELINE_PRESENCE_PENALTY),
            t,
        )),
        max_tokens: profile.max_tokens,
    }
}

/// [`scale`], with every float rounded to two decimal places.
///
/// Zero stays `Some(0.0)`: a scaled field is an explicit value, not a
/// request for the provider default.
pub fn scale_intensity(profile: &StateParameters, intensity: f64) -> StateParameters {
    let scaled = scale(profile, intensity);
    StateParameters {
        temperature: round2(scaled.temperature),
        top_p: scaled.top_p.map(round2),
        frequency_penalty: scaled.frequency_penalty.map(round2),
        presence_penalty: scaled.presence_penalty.map(round2),
        max_tokens: scaled.max_tokens,
    }
}

// Written as a weighted sum so both endpoints are exact in floating point.
fn lerp(baseline: f64, value: f64, t: f64) -> f64 {
    baseline * (1.0 - t) + value * t
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
