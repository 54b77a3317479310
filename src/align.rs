// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! The alignment engine: fits one pulse into a target block length by
//! padding or splitting, producing one or more link-list entries.
//!
//! Small gaps are folded into the waveform itself to keep the entry count
//! low; large gaps instead emit a separate idle-fill entry referencing the
//! canonical idle-zero waveform, trading one extra table entry for not
//! materializing a zero-padded sample array.

use crate::linklist::LinkListEntry;
use crate::pulse::{AlignmentMode, Pulse};
use crate::waveform_library::waveform_key;
use crate::{Error, Result, Samples};
use num_complex::Complex64;

/// Result of aligning one pulse into a block.
///
/// `shape` is the final sample array the pulse entry references. It must be
/// interned into the owning channel's library partition; its content hash
/// equals the pulse entry's `key`.
#[derive(Debug)]
pub struct AlignedPulse {
    pub shape: Vec<Complex64>,
    pub entries: Vec<LinkListEntry>,
}

fn zeros(count: Samples) -> Vec<Complex64> {
    vec![Complex64::new(0.0, 0.0); count as usize]
}

fn merged(shape: Vec<Complex64>, block_length: Samples, pulse: &Pulse) -> AlignedPulse {
    let entry = LinkListEntry::new(
        waveform_key(&shape),
        block_length,
        pulse.phase,
        pulse.frame_change,
    );
    AlignedPulse {
        shape,
        entries: vec![entry],
    }
}

/// Align `pulse` into a block of `block_length` samples.
///
/// `pad_length = block_length - pulse.sample_count()` must be non-negative;
/// a pulse longer than its enclosing block is a contract violation of the
/// shape provider. Gaps shorter than `cutoff` (or `2 * cutoff` for center
/// alignment) are merged into the waveform; larger gaps become separate
/// idle-fill entries ordered according to the alignment mode.
pub fn align(
    pulse: &Pulse,
    block_length: Samples,
    mode: AlignmentMode,
    cutoff: Samples,
) -> Result<AlignedPulse> {
    let sample_count = pulse.sample_count();
    if sample_count > block_length {
        return Err(Error::new(&format!(
            "Pulse on channel '{}' is {} samples long but its block is only {} samples.",
            pulse.channel, sample_count, block_length
        )));
    }
    let pad_length = block_length - sample_count;
    if pad_length == 0 {
        return Ok(merged(pulse.samples.clone(), block_length, pulse));
    }
    if pad_length < cutoff && matches!(mode, AlignmentMode::Left | AlignmentMode::Right) {
        let mut shape = Vec::with_capacity(block_length as usize);
        match mode {
            AlignmentMode::Left => {
                shape.extend_from_slice(&pulse.samples);
                shape.extend(zeros(pad_length));
            }
            AlignmentMode::Right => {
                shape.extend(zeros(pad_length));
                shape.extend_from_slice(&pulse.samples);
            }
            AlignmentMode::Center => unreachable!(),
        }
        return Ok(merged(shape, block_length, pulse));
    }
    if pad_length < 2 * cutoff && mode == AlignmentMode::Center {
        let leading = pad_length / 2;
        let trailing = pad_length - leading;
        let mut shape = Vec::with_capacity(block_length as usize);
        shape.extend(zeros(leading));
        shape.extend_from_slice(&pulse.samples);
        shape.extend(zeros(trailing));
        return Ok(merged(shape, block_length, pulse));
    }
    // Gap too large to merge: keep the shape unmodified and emit idle-fill
    // entries alongside the pulse entry.
    let shape = pulse.samples.clone();
    let pulse_entry = LinkListEntry::new(
        waveform_key(&shape),
        sample_count,
        pulse.phase,
        pulse.frame_change,
    );
    let entries = match mode {
        AlignmentMode::Left => vec![pulse_entry, LinkListEntry::idle(pad_length)],
        AlignmentMode::Right => vec![LinkListEntry::idle(pad_length), pulse_entry],
        AlignmentMode::Center => {
            let leading = pad_length / 2;
            let trailing = pad_length - leading;
            vec![
                LinkListEntry::idle(leading),
                pulse_entry,
                LinkListEntry::idle(trailing),
            ]
        }
    };
    Ok(AlignedPulse { shape, entries })
}
