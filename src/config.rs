// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! The two external configuration documents consumed by the compiler: the
//! channel map (logical channel name to instrument and IQ pair) and the
//! parameter map (IQ pair to delay and mixer correction).
//!
//! Both documents are JSON with statically declared schemas; unknown or
//! missing fields fail at load time rather than at point of use.

use crate::{Error, Result, Samples};
use anyhow::Context;
use indexmap::IndexMap;
use num_complex::Complex64;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// The closed set of instrument classes channels can be mapped to.
///
/// Each kind enumerates the physical IQ sub-channel pairs it drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum InstrumentKind {
    #[serde(rename = "APS")]
    Aps,
    #[serde(rename = "Tek5014")]
    Tek5014,
    #[serde(rename = "Alazar")]
    Alazar,
}

impl InstrumentKind {
    /// Identifiers of the physical IQ pairs on this instrument class.
    pub fn iq_pairs(&self) -> &'static [&'static str] {
        match self {
            // Four analog outputs grouped into two IQ pairs.
            InstrumentKind::Aps => &["12", "34"],
            InstrumentKind::Tek5014 => &["12", "34"],
            // Digitizer with a single acquisition pair.
            InstrumentKind::Alazar => &["1"],
        }
    }
}

/// One channel-map record: where a logical channel is played.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelMapEntry {
    /// Name of the target instrument.
    pub awg: String,
    /// Instrument class of the target.
    #[serde(rename = "type")]
    pub kind: InstrumentKind,
    /// Physical channel-pair identifier, `<instrument>_<pair>`.
    #[serde(rename = "IQkey")]
    pub iq_key: String,
}

/// Logical channel name to channel-map record.
pub type ChannelMap = IndexMap<String, ChannelMapEntry>;

/// 2x2 real correction matrix for IQ-mixer amplitude/phase imbalance.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MixerCorrection(pub [[f64; 2]; 2]);

impl MixerCorrection {
    pub fn identity() -> Self {
        MixerCorrection([[1.0, 0.0], [0.0, 1.0]])
    }

    /// Apply the correction to one sample, treating re/im as I/Q.
    pub fn apply(&self, sample: Complex64) -> Complex64 {
        let t = &self.0;
        Complex64::new(
            t[0][0] * sample.re + t[0][1] * sample.im,
            t[1][0] * sample.re + t[1][1] * sample.im,
        )
    }
}

/// One parameter-map record: playback corrections for a physical IQ pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamMapEntry {
    /// Channel delay in samples.
    pub delay: Samples,
    /// Mixer correction matrix.
    #[serde(rename = "T")]
    pub mixer: MixerCorrection,
}

/// Physical channel-pair identifier to parameter record.
pub type ParamMap = IndexMap<String, ParamMapEntry>;

fn load_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {what} '{}'", path.display()))?;
    let value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {what} '{}'", path.display()))?;
    Ok(value)
}

pub fn load_channel_map(path: impl AsRef<Path>) -> Result<ChannelMap> {
    load_json(path.as_ref(), "channel map")
}

pub fn load_param_map(path: impl AsRef<Path>) -> Result<ParamMap> {
    load_json(path.as_ref(), "parameter map")
}

/// Split a physical channel-pair identifier into instrument name and pair.
pub fn split_iq_key(iq_key: &str) -> Result<(&str, &str)> {
    iq_key.split_once('_').ok_or_else(|| {
        Error::new(&format!(
            "Invalid physical channel-pair identifier '{iq_key}': expected '<instrument>_<pair>'."
        ))
    })
}
