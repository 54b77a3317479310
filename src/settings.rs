// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Module for defining settings for the link-list compiler.
use crate::Samples;

/// Fixed margin added on top of the longest link list when equalizing
/// channel durations, and the length of the idle link list synthesized for
/// unmapped physical sub-channels.
pub const SEQUENCE_PADDING: Samples = 500;

/// Padding length below which a gap is folded into the waveform itself
/// instead of being emitted as a separate idle-fill entry.
pub const DEFAULT_MERGE_CUTOFF: Samples = 12;

#[derive(Debug, Clone)]
pub struct CompilerSettings {
    /// Merge cutoff for the alignment engine, in samples.
    pub merge_cutoff: Samples,
    /// Margin appended to the global length target, in samples.
    pub sequence_padding: Samples,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        CompilerSettings {
            merge_cutoff: DEFAULT_MERGE_CUTOFF,
            sequence_padding: SEQUENCE_PADDING,
        }
    }
}
