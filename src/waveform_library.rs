// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Content-addressed store of waveform sample arrays, partitioned by
//! logical channel.
//!
//! Two waveforms share a key if and only if their sample arrays are exactly
//! value-equal. Keys are derived from a SHA-1 digest over the sample bytes,
//! truncated to 64 bits; within the practical input domain (at most a few
//! thousand distinct waveforms per channel) the collision probability is
//! negligible, and the digest is stable across runs and platforms since it
//! runs over the little-endian encoding of each sample (with -0.0
//! normalized to 0.0 so that value-equal arrays always share a key).
//!
//! The library is append-only for the duration of a compilation run, and
//! insertion is idempotent: re-interning an existing waveform returns the
//! existing key and does not grow the partition.

use crate::pulse::ChannelUid;
use crate::utils::normalize_f64;
use indexmap::IndexMap;
use num_complex::Complex64;
use sha1::{Digest, Sha1};
use std::sync::OnceLock;

pub type WaveformKey = u64;

/// Waveform samples held by one library partition.
pub type WaveformSlice = IndexMap<WaveformKey, Vec<Complex64>>;

/// Content hash of a sample array.
pub fn waveform_key(samples: &[Complex64]) -> WaveformKey {
    let mut hasher = Sha1::new();
    for sample in samples {
        hasher.update(normalize_f64(sample.re).to_le_bytes());
        hasher.update(normalize_f64(sample.im).to_le_bytes());
    }
    let digest = hasher.finalize();
    u64::from_le_bytes(digest[..8].try_into().expect("SHA-1 digest is 20 bytes"))
}

/// The canonical one-sample all-zero waveform backing every idle-fill entry.
pub fn idle_waveform() -> Vec<Complex64> {
    vec![Complex64::new(0.0, 0.0)]
}

/// Reserved key of the canonical idle-zero waveform.
///
/// Idle-fill entries of any `length` reference this key, so an idle gap
/// never materializes a zero array of its own.
pub fn idle_key() -> WaveformKey {
    static KEY: OnceLock<WaveformKey> = OnceLock::new();
    *KEY.get_or_init(|| waveform_key(&idle_waveform()))
}

#[derive(Debug, Clone, Default)]
pub struct WaveformLibrary {
    channels: IndexMap<ChannelUid, WaveformSlice>,
}

impl WaveformLibrary {
    pub fn new() -> Self {
        WaveformLibrary {
            channels: IndexMap::new(),
        }
    }

    /// Create the partition for `channel` if it does not exist yet,
    /// pre-registering the idle-zero waveform.
    pub fn ensure_channel(&mut self, channel: &ChannelUid) {
        if !self.channels.contains_key(channel) {
            let mut slice = WaveformSlice::new();
            slice.insert(idle_key(), idle_waveform());
            self.channels.insert(channel.clone(), slice);
        }
    }

    pub fn contains_channel(&self, channel: &ChannelUid) -> bool {
        self.channels.contains_key(channel)
    }

    /// Intern `samples` into the partition of `channel` and return its key.
    ///
    /// A waveform already present under the computed key is left untouched.
    pub fn intern(&mut self, channel: &ChannelUid, samples: &[Complex64]) -> WaveformKey {
        self.ensure_channel(channel);
        let key = waveform_key(samples);
        let slice = self
            .channels
            .get_mut(channel)
            .expect("partition created by ensure_channel");
        slice.entry(key).or_insert_with(|| samples.to_vec());
        key
    }

    pub fn get(&self, channel: &ChannelUid, key: WaveformKey) -> Option<&[Complex64]> {
        self.channels
            .get(channel)
            .and_then(|slice| slice.get(&key))
            .map(|samples| samples.as_slice())
    }

    /// Number of waveforms stored for `channel`.
    pub fn channel_len(&self, channel: &ChannelUid) -> usize {
        self.channels.get(channel).map_or(0, |slice| slice.len())
    }

    /// The full partition of `channel`, if present.
    pub fn channel_slice(&self, channel: &ChannelUid) -> Option<&WaveformSlice> {
        self.channels.get(channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = &ChannelUid> {
        self.channels.keys()
    }
}
