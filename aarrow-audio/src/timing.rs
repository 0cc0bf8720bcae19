//! Step duration: how many samples one arpeggio step lasts.

use aarrow_types::{ArpParams, TransportInfo};

/// Free-running step length in samples.
///
/// Maps speed 0..1 onto roughly 0.275 s down to 0.025 s at any sample rate.
pub fn free_running_samples(speed: f64, sample_rate: f64) -> f64 {
    sample_rate * 0.25 * (0.1 + (1.0 - speed))
}

/// Note-value divisor for synced mode: speed 0.90 is a whole step, each
/// hundredth above halves it (0.91 → 1/2, 0.92 → 1/4, ...).
pub fn sync_speed(speed: f64) -> f64 {
    1.0 / 2f64.powf(speed * 100.0 - 90.0)
}

/// Host-synced step length in samples.
pub fn synced_samples(speed: f64, sample_rate: f64, tempo_bpm: f64, numerator: u32) -> f64 {
    sample_rate * 0.25 * (tempo_bpm / 60.0) * numerator as f64 * sync_speed(speed)
}

/// Dotted (×1.5, rounded up) then triplet (×2/3, rounded down).
pub fn apply_modifiers(samples: u32, dotted: bool, triplet: bool) -> u32 {
    let mut d = samples as u64;
    if dotted {
        d = (d * 3).div_ceil(2);
    }
    if triplet {
        d = d * 2 / 3;
    }
    d.clamp(1, u32::MAX as u64) as u32
}

/// Step duration for this block, always at least one sample.
///
/// Sync mode needs both tempo and time-signature numerator from the host;
/// without them the free-running curve is used instead.
pub fn step_duration(params: &ArpParams, sample_rate: f64, transport: &TransportInfo) -> u32 {
    let raw = match transport.usable() {
        Some((tempo, numerator)) if params.sync => {
            synced_samples(params.speed, sample_rate, tempo, numerator)
        }
        _ => free_running_samples(params.speed, sample_rate),
    };
    apply_modifiers(to_samples(raw), params.dotted, params.triplet)
}

fn to_samples(raw: f64) -> u32 {
    let ceiled = raw.ceil();
    if !ceiled.is_finite() || ceiled < 1.0 {
        1
    } else if ceiled >= u32::MAX as f64 {
        u32::MAX
    } else {
        ceiled as u32
    }
}
