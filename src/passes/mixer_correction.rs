// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! IQ-mixer imbalance correction.
//!
//! An analog IQ mixer has amplitude and phase imbalance between its I and Q
//! ports. The parameter map carries, per physical IQ pair, a 2x2 real
//! correction matrix `T` that pre-distorts the waveforms so the mixer
//! output is balanced. The correction is applied to every waveform of the
//! channel's library slice; link-list entries are untouched since they
//! reference waveforms by key only.

use crate::config::MixerCorrection;
use crate::waveform_library::WaveformSlice;

pub(crate) fn correct_mixer(slice: &mut WaveformSlice, correction: &MixerCorrection) {
    for samples in slice.values_mut() {
        for sample in samples.iter_mut() {
            *sample = correction.apply(*sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform_library::waveform_key;
    use num_complex::Complex64;

    #[test]
    fn test_identity_leaves_waveforms_untouched() {
        let shape = vec![Complex64::new(0.3, -0.1), Complex64::new(0.0, 0.9)];
        let mut slice = WaveformSlice::new();
        slice.insert(waveform_key(&shape), shape.clone());
        correct_mixer(
            &mut slice,
            &MixerCorrection([[1.0, 0.0], [0.0, 1.0]]),
        );
        assert_eq!(slice.values().next().unwrap(), &shape);
    }

    #[test]
    fn test_correction_mixes_i_and_q() {
        let shape = vec![Complex64::new(1.0, 2.0)];
        let mut slice = WaveformSlice::new();
        slice.insert(waveform_key(&shape), shape);
        correct_mixer(
            &mut slice,
            &MixerCorrection([[1.0, 0.5], [0.0, 2.0]]),
        );
        let corrected = slice.values().next().unwrap();
        assert_eq!(corrected[0], Complex64::new(1.0 + 0.5 * 2.0, 2.0 * 2.0));
    }
}
