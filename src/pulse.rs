// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Value types for one timed control operation ([`Pulse`]) and one
//! time-aligned group of per-channel operations ([`PulseBlock`]).
//!
//! Pulses arrive from the shape-synthesis collaborator and are immutable
//! here. Before compilation every sequence entry is promoted to a
//! `PulseBlock` so that the compiler operates on a single shape throughout.

use crate::{Error, Result, Samples};
use indexmap::IndexMap;
use num_complex::Complex64;
use serde::Deserialize;
use std::str::FromStr;

/// Opaque identifier of a logical channel.
///
/// A combined (linked) channel is identified by the concatenation of its
/// constituent channel names.
pub type ChannelUid = String;

/// Padding strategy used to fit a pulse into its block length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentMode {
    Left,
    Right,
    Center,
}

impl FromStr for AlignmentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(AlignmentMode::Left),
            "right" => Ok(AlignmentMode::Right),
            "center" => Ok(AlignmentMode::Center),
            other => Err(Error::new(&format!(
                "Unrecognized alignment mode '{other}'. Expected 'left', 'right' or 'center'."
            ))),
        }
    }
}

/// One timed operation on a single logical channel, as produced by the
/// pulse-shape provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Pulse {
    pub channel: ChannelUid,
    /// Complex waveform samples. May be empty.
    pub samples: Vec<Complex64>,
    /// Phase of the pulse in radians.
    pub phase: f64,
    /// Reference-frame advance caused by this pulse, in radians.
    pub frame_change: f64,
}

impl Pulse {
    pub fn new(
        channel: impl Into<ChannelUid>,
        samples: Vec<Complex64>,
        phase: f64,
        frame_change: f64,
    ) -> Self {
        Pulse {
            channel: channel.into(),
            samples,
            phase,
            frame_change,
        }
    }

    pub fn sample_count(&self) -> Samples {
        self.samples.len() as Samples
    }
}

/// A time-aligned group of pulses, at most one per channel.
#[derive(Debug, Clone)]
pub struct PulseBlock {
    pub pulses: IndexMap<ChannelUid, Pulse>,
    pub alignment: AlignmentMode,
}

impl PulseBlock {
    pub fn new(alignment: AlignmentMode) -> Self {
        PulseBlock {
            pulses: IndexMap::new(),
            alignment,
        }
    }

    /// Add a pulse to the block. At most one pulse per channel.
    pub fn add_pulse(&mut self, pulse: Pulse) -> Result<()> {
        let channel = pulse.channel.clone();
        if self.pulses.insert(channel.clone(), pulse).is_some() {
            return Err(Error::new(&format!(
                "Channel '{channel}' appears more than once in a pulse block."
            )));
        }
        Ok(())
    }

    /// Block length in samples: the maximum sample count over its pulses.
    pub fn length(&self) -> Samples {
        self.pulses
            .values()
            .map(|p| p.sample_count())
            .max()
            .unwrap_or(0)
    }
}

/// One element of a logical sequence: either a bare pulse or a block.
#[derive(Debug, Clone)]
pub enum SequenceEntry {
    Pulse(Pulse),
    Block(PulseBlock),
}

impl SequenceEntry {
    /// Normalize to a [`PulseBlock`]. A bare pulse becomes a
    /// single-channel, single-pulse block.
    pub fn promote(self) -> PulseBlock {
        match self {
            SequenceEntry::Block(block) => block,
            SequenceEntry::Pulse(pulse) => {
                let mut block = PulseBlock::new(AlignmentMode::Left);
                block.pulses.insert(pulse.channel.clone(), pulse);
                block
            }
        }
    }
}

impl From<Pulse> for SequenceEntry {
    fn from(pulse: Pulse) -> Self {
        SequenceEntry::Pulse(pulse)
    }
}

impl From<PulseBlock> for SequenceEntry {
    fn from(block: PulseBlock) -> Self {
        SequenceEntry::Block(block)
    }
}

/// An ordered list of operations to be compiled into one link list per
/// channel.
pub type Sequence = Vec<SequenceEntry>;
