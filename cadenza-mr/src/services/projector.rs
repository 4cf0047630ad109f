//! Fingerprint-to-embedding projection
//!
//! Pure, deterministic, and stable under any permutation of the peak list.
//! The layout is fixed so every index backend shares one vector space:
//! components [0, 20) hold the frequency histogram, [20, 30) the time
//! histogram, [30, 33) magnitude statistics (mean, max, min), and the rest
//! is zero padding up to the configured dimension.

use crate::types::Fingerprint;

/// Number of frequency histogram bins
pub const FREQUENCY_BINS: usize = 20;

/// Number of time histogram bins
pub const TIME_BINS: usize = 10;

/// Number of magnitude statistic components (mean, max, min)
pub const MAGNITUDE_STATS: usize = 3;

/// Upper bound of the frequency axis in Hz
pub const MAX_FREQUENCY_HZ: f32 = 20_000.0;

/// Project a fingerprint into an embedding of exactly `dimensions`
/// components. An empty peak list projects to the zero vector.
pub fn project(fingerprint: &Fingerprint, dimensions: usize) -> Vec<f32> {
    let peaks = &fingerprint.peaks;
    let mut embedding = Vec::with_capacity(dimensions.max(FREQUENCY_BINS + TIME_BINS + MAGNITUDE_STATS));

    // Frequency histogram, magnitude-weighted
    let mut freq_histogram = [0.0f32; FREQUENCY_BINS];
    for peak in peaks {
        let bin = bin_index(peak.frequency / MAX_FREQUENCY_HZ, FREQUENCY_BINS);
        freq_histogram[bin] += peak.magnitude;
    }
    normalize_by_max(&mut freq_histogram);
    embedding.extend_from_slice(&freq_histogram);

    // Time histogram over the clip duration
    let duration = fingerprint.duration_or_default() as f32;
    let mut time_histogram = [0.0f32; TIME_BINS];
    for peak in peaks {
        let bin = bin_index(peak.time / duration, TIME_BINS);
        time_histogram[bin] += peak.magnitude;
    }
    normalize_by_max(&mut time_histogram);
    embedding.extend_from_slice(&time_histogram);

    // Magnitude statistics; defined only for non-empty input
    if !peaks.is_empty() {
        let mut sum = 0.0f32;
        let mut max = f32::MIN;
        let mut min = f32::MAX;
        for peak in peaks {
            sum += peak.magnitude;
            max = max.max(peak.magnitude);
            min = min.min(peak.magnitude);
        }
        embedding.extend_from_slice(&[sum / peaks.len() as f32, max, min]);
    }

    embedding.resize(dimensions, 0.0);
    embedding
}

/// Map a fraction of the axis to a histogram bin, clamping overshoot into
/// the last bin.
fn bin_index(fraction: f32, bins: usize) -> usize {
    ((fraction * bins as f32) as usize).min(bins - 1)
}

/// Scale so the maximum component becomes 1.0. All-zero input stays
/// all-zero; the guard matters because magnitudes of zero are legal.
fn normalize_by_max(histogram: &mut [f32]) {
    let max = histogram.iter().fold(0.0f32, |acc, &v| acc.max(v));
    if max > 0.0 {
        for value in histogram.iter_mut() {
            *value /= max;
        }
    }
}
