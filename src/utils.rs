// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use core::f64;

use num_complex::Complex64;

pub fn normalize_phase(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    let out = match value < 0.0 {
        true => {
            value + ((-value / 2.0 / f64::consts::PI) as i64 + 1) as f64 * 2.0 * f64::consts::PI
        }
        false => value,
    };
    out % (2.0 * f64::consts::PI)
}

/// Normalize an f64 value to bits, normalizing NaN and -0.0 to 0.0.
///
/// Content addressing hashes sample bits; without this, a rotation that
/// produces -0.0 would re-key a waveform that is value-equal to an
/// existing one.
pub fn normalize_f64(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0.0_f64.to_bits()
    } else {
        value.to_bits()
    }
}

/// Whether every sample equals the first one, by exact value comparison.
///
/// Empty slices are not considered constant: they carry no sample that a
/// time-amplitude entry could repeat.
pub fn is_constant(samples: &[Complex64]) -> bool {
    match samples.first() {
        Some(first) => samples.iter().all(|s| s == first),
        None => false,
    }
}
