// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Link-list entries, the per-channel playback instructions emitted by the
//! compiler.
//!
//! An entry never owns sample data; it references a waveform in the
//! [`crate::waveform_library::WaveformLibrary`] by key. The total duration
//! of a link list is the sum of `length * repeat` over its entries, and
//! entry order is significant.

use crate::waveform_library::{idle_key, WaveformKey};
use crate::Samples;

#[derive(Debug, Clone, PartialEq)]
pub struct LinkListEntry {
    /// Key of the referenced waveform in the owning channel's partition.
    pub key: WaveformKey,
    /// Playback length in samples.
    pub length: Samples,
    /// Number of times the waveform is played back to back.
    pub repeat: u64,
    /// Constant-valued waveform collapsed to a single sample.
    pub is_time_amplitude: bool,
    pub has_trigger: bool,
    pub trigger_delay1: Samples,
    pub trigger_delay2: Samples,
    /// Phase applied to the waveform in radians.
    pub phase: f64,
    /// Reference-frame advance after this entry, in radians.
    pub frame_change: f64,
}

impl LinkListEntry {
    /// Entry playing the waveform under `key` once at its natural length.
    pub fn new(key: WaveformKey, length: Samples, phase: f64, frame_change: f64) -> Self {
        LinkListEntry {
            key,
            length,
            repeat: 1,
            is_time_amplitude: false,
            has_trigger: false,
            trigger_delay1: 0,
            trigger_delay2: 0,
            phase,
            frame_change,
        }
    }

    /// Idle-fill entry of the given length, referencing the canonical
    /// idle-zero waveform.
    pub fn idle(length: Samples) -> Self {
        LinkListEntry {
            key: idle_key(),
            length,
            repeat: 1,
            is_time_amplitude: true,
            has_trigger: false,
            trigger_delay1: 0,
            trigger_delay2: 0,
            phase: 0.0,
            frame_change: 0.0,
        }
    }

    pub fn duration(&self) -> Samples {
        self.length * self.repeat
    }
}

/// The compiled output of one sequence for one channel.
pub type LinkList = Vec<LinkListEntry>;

/// Total playback duration of a link list in samples.
pub fn total_duration(link_list: &LinkList) -> Samples {
    link_list.iter().map(|entry| entry.duration()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_entry() {
        let entry = LinkListEntry::idle(30);
        assert_eq!(entry.key, idle_key());
        assert_eq!(entry.length, 30);
        assert!(entry.is_time_amplitude);
        assert_eq!(entry.phase, 0.0);
        assert_eq!(entry.frame_change, 0.0);
    }

    #[test]
    fn test_total_duration_accounts_for_repeats() {
        let mut list = vec![LinkListEntry::idle(10), LinkListEntry::idle(5)];
        list[1].repeat = 4;
        assert_eq!(total_duration(&list), 10 + 5 * 4);
        assert_eq!(total_duration(&LinkList::new()), 0);
    }
}
