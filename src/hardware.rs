// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Resolution of logical channels to physical instrument sub-channels and
//! the full sequence-to-hardware pipeline.
//!
//! The channel map names, per logical channel, the target instrument, its
//! class and the physical IQ pair. Logical channels are grouped by
//! instrument, every mapped pair receives the channel's link lists and
//! library slice, and the remaining pairs of each instrument are filled
//! with a default idle link list so the hardware has something to play on
//! every output.

use crate::compiler::{compile_sequences, CompiledProgram};
use crate::config::{
    load_channel_map, load_param_map, split_iq_key, ChannelMap, InstrumentKind, ParamMap,
};
use crate::linklist::{LinkList, LinkListEntry};
use crate::passes::align_lengths::equalize_durations;
use crate::passes::handle_delays::apply_delay;
use crate::passes::mixer_correction::correct_mixer;
use crate::pulse::{AlignmentMode, Sequence};
use crate::settings::CompilerSettings;
use crate::waveform_library::{idle_key, idle_waveform, WaveformSlice};
use crate::{Error, Result, Samples};
use indexmap::IndexMap;
use std::path::Path;

/// Hardware-ready data for one physical IQ sub-channel.
#[derive(Debug)]
pub struct HardwareChannel {
    pub link_lists: Vec<LinkList>,
    pub library: WaveformSlice,
}

impl HardwareChannel {
    /// Default content for a sub-channel no logical channel maps to: one
    /// idle link list and a library holding only the canonical zero.
    fn idle(length: Samples) -> Self {
        let mut library = WaveformSlice::new();
        library.insert(idle_key(), idle_waveform());
        HardwareChannel {
            link_lists: vec![vec![LinkListEntry::idle(length)]],
            library,
        }
    }
}

/// All sub-channels of one instrument.
#[derive(Debug)]
pub struct InstrumentChannels {
    pub kind: InstrumentKind,
    /// IQ-pair identifier to channel data, one entry per pair of the kind.
    pub channels: IndexMap<String, HardwareChannel>,
}

/// Instrument name to its per-sub-channel output.
pub type HardwareProgram = IndexMap<String, InstrumentChannels>;

/// Group the compiled program by instrument and physical IQ pair.
///
/// Fails if a required channel-map entry is missing, inconsistent with the
/// instrument class, or if two logical channels claim the same pair.
pub fn map_logical_to_physical(
    program: &CompiledProgram,
    channel_map: &ChannelMap,
) -> Result<HardwareProgram> {
    let mut instruments = HardwareProgram::new();
    for (channel, link_lists) in &program.link_lists {
        let entry = channel_map.get(channel).ok_or_else(|| {
            Error::new(&format!(
                "No channel-map entry for logical channel '{channel}'."
            ))
        })?;
        let (instrument, pair) = split_iq_key(&entry.iq_key)?;
        if instrument != entry.awg {
            return Err(Error::new(&format!(
                "Channel-map entry for '{channel}' is inconsistent: IQkey '{}' does not belong to instrument '{}'.",
                entry.iq_key, entry.awg
            )));
        }
        if !entry.kind.iq_pairs().contains(&pair) {
            return Err(Error::new(&format!(
                "Instrument '{}' ({:?}) has no sub-channel pair '{pair}'.",
                entry.awg, entry.kind
            )));
        }
        let instrument_channels = instruments
            .entry(entry.awg.clone())
            .or_insert_with(|| InstrumentChannels {
                kind: entry.kind,
                channels: IndexMap::new(),
            });
        if instrument_channels.kind != entry.kind {
            return Err(Error::new(&format!(
                "Instrument '{}' is declared with conflicting classes in the channel map.",
                entry.awg
            )));
        }
        let library = program
            .library
            .channel_slice(channel)
            .cloned()
            .unwrap_or_default();
        let hardware_channel = HardwareChannel {
            link_lists: link_lists.clone(),
            library,
        };
        if instrument_channels
            .channels
            .insert(pair.to_string(), hardware_channel)
            .is_some()
        {
            return Err(Error::new(&format!(
                "Physical sub-channel '{}' is claimed by more than one logical channel.",
                entry.iq_key
            )));
        }
    }
    Ok(instruments)
}

/// Fill every sub-channel without a mapped logical channel with an idle
/// link list of `idle_length` samples.
fn fill_idle_channels(instruments: &mut HardwareProgram, idle_length: Samples) {
    for instrument_channels in instruments.values_mut() {
        for pair in instrument_channels.kind.iq_pairs() {
            if !instrument_channels.channels.contains_key(*pair) {
                log::debug!("Filling unmapped sub-channel pair '{pair}' with idle output.");
                instrument_channels
                    .channels
                    .insert(pair.to_string(), HardwareChannel::idle(idle_length));
            }
        }
    }
}

/// Run the full pipeline with already-parsed configuration documents.
pub fn compile_to_hardware_with_maps(
    seqs: Vec<Sequence>,
    channel_map: &ChannelMap,
    param_map: &ParamMap,
    align_mode: AlignmentMode,
    settings: &CompilerSettings,
) -> Result<HardwareProgram> {
    let mut program = compile_sequences(seqs, settings)?;
    equalize_durations(
        &mut program.link_lists,
        align_mode,
        settings.sequence_padding,
    );
    let mut instruments = map_logical_to_physical(&program, channel_map)?;

    // Per-channel playback corrections. Resolve every parameter entry
    // before touching any channel so a missing entry aborts without
    // producing partial hardware output.
    let mut corrections = Vec::new();
    for (instrument, instrument_channels) in &instruments {
        for pair in instrument_channels.channels.keys() {
            let iq_key = format!("{instrument}_{pair}");
            let params = param_map.get(&iq_key).ok_or_else(|| {
                Error::new(&format!(
                    "No parameter-map entry for physical channel pair '{iq_key}'."
                ))
            })?;
            corrections.push((instrument.clone(), pair.clone(), params.clone()));
        }
    }
    for (instrument, pair, params) in corrections {
        let channel = instruments
            .get_mut(&instrument)
            .and_then(|i| i.channels.get_mut(&pair))
            .expect("channel enumerated above");
        apply_delay(&mut channel.link_lists, params.delay);
        correct_mixer(&mut channel.library, &params.mixer);
    }

    fill_idle_channels(&mut instruments, settings.sequence_padding);
    Ok(instruments)
}

/// Compile sequences all the way to hardware-ready structures, loading the
/// channel map and parameter map from JSON documents.
pub fn compile_to_hardware(
    seqs: Vec<Sequence>,
    channel_map_path: impl AsRef<Path>,
    param_map_path: impl AsRef<Path>,
    align_mode: AlignmentMode,
) -> Result<HardwareProgram> {
    let channel_map = load_channel_map(channel_map_path)?;
    let param_map = load_param_map(param_map_path)?;
    compile_to_hardware_with_maps(
        seqs,
        &channel_map,
        &param_map,
        align_mode,
        &CompilerSettings::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linklist::total_duration;
    use crate::pulse::Pulse;
    use crate::settings::SEQUENCE_PADDING;
    use num_complex::Complex64;

    fn ramp_pulse(channel: &str, len: usize) -> Pulse {
        let samples = (0..len)
            .map(|i| Complex64::new(0.2 + i as f64 * 0.01, 0.0))
            .collect();
        Pulse::new(channel, samples, 0.0, 0.0)
    }

    fn channel_map() -> ChannelMap {
        serde_json::from_str(
            r#"{
                "q1": {"awg": "BBNAPS1", "type": "APS", "IQkey": "BBNAPS1_12"},
                "q2": {"awg": "BBNAPS1", "type": "APS", "IQkey": "BBNAPS1_34"}
            }"#,
        )
        .unwrap()
    }

    fn param_map(delay: u64) -> ParamMap {
        serde_json::from_str(&format!(
            r#"{{
                "BBNAPS1_12": {{"delay": {delay}, "T": [[1.0, 0.0], [0.0, 1.0]]}},
                "BBNAPS1_34": {{"delay": 0, "T": [[1.0, 0.0], [0.0, 1.0]]}}
            }}"#
        ))
        .unwrap()
    }

    fn two_channel_seqs() -> Vec<Sequence> {
        vec![
            vec![
                ramp_pulse("q1", 64).into(),
                ramp_pulse("q2", 32).into(),
            ],
            vec![
                ramp_pulse("q1", 16).into(),
                ramp_pulse("q2", 128).into(),
            ],
        ]
    }

    #[test]
    fn test_cross_channel_equalization_is_exact() {
        let hardware = compile_to_hardware_with_maps(
            two_channel_seqs(),
            &channel_map(),
            &param_map(0),
            AlignmentMode::Right,
            &CompilerSettings::default(),
        )
        .unwrap();
        let instrument = &hardware["BBNAPS1"];
        // Longest link list: q2's second sequence at 16 + 128 samples.
        let target = 16 + 128 + SEQUENCE_PADDING;
        for pair in ["12", "34"] {
            for link_list in &instrument.channels[pair].link_lists {
                assert_eq!(total_duration(link_list), target);
            }
        }
    }

    #[test]
    fn test_delay_shifts_only_the_configured_pair() {
        let hardware = compile_to_hardware_with_maps(
            two_channel_seqs(),
            &channel_map(),
            &param_map(24),
            AlignmentMode::Right,
            &CompilerSettings::default(),
        )
        .unwrap();
        let instrument = &hardware["BBNAPS1"];
        let target = 16 + 128 + SEQUENCE_PADDING;
        for link_list in &instrument.channels["12"].link_lists {
            assert_eq!(total_duration(link_list), target + 24);
        }
        for link_list in &instrument.channels["34"].link_lists {
            assert_eq!(total_duration(link_list), target);
        }
    }

    #[test]
    fn test_unmapped_pair_gets_idle_output() {
        let mut map = channel_map();
        map.shift_remove("q2");
        let seqs: Vec<Sequence> = vec![vec![ramp_pulse("q1", 64).into()]];
        let param_map: ParamMap = serde_json::from_str(
            r#"{"BBNAPS1_12": {"delay": 0, "T": [[1.0, 0.0], [0.0, 1.0]]}}"#,
        )
        .unwrap();
        let hardware = compile_to_hardware_with_maps(
            seqs,
            &map,
            &param_map,
            AlignmentMode::Right,
            &CompilerSettings::default(),
        )
        .unwrap();
        let idle = &hardware["BBNAPS1"].channels["34"];
        assert_eq!(idle.link_lists.len(), 1);
        assert_eq!(total_duration(&idle.link_lists[0]), SEQUENCE_PADDING);
        assert_eq!(idle.library.len(), 1);
        assert!(idle.library.contains_key(&idle_key()));
    }

    #[test]
    fn test_missing_channel_map_entry_is_fatal() {
        let mut map = channel_map();
        map.shift_remove("q2");
        let result = compile_to_hardware_with_maps(
            two_channel_seqs(),
            &map,
            &param_map(0),
            AlignmentMode::Right,
            &CompilerSettings::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_param_map_entry_is_fatal() {
        let param_map: ParamMap = serde_json::from_str(
            r#"{"BBNAPS1_12": {"delay": 0, "T": [[1.0, 0.0], [0.0, 1.0]]}}"#,
        )
        .unwrap();
        let result = compile_to_hardware_with_maps(
            two_channel_seqs(),
            &channel_map(),
            &param_map,
            AlignmentMode::Right,
            &CompilerSettings::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_mismatched_iq_key_is_fatal() {
        let map: ChannelMap = serde_json::from_str(
            r#"{"q1": {"awg": "BBNAPS1", "type": "APS", "IQkey": "OTHER_12"}}"#,
        )
        .unwrap();
        let seqs: Vec<Sequence> = vec![vec![ramp_pulse("q1", 64).into()]];
        let result = compile_to_hardware_with_maps(
            seqs,
            &map,
            &param_map(0),
            AlignmentMode::Right,
            &CompilerSettings::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_pair_claim_is_fatal() {
        let map: ChannelMap = serde_json::from_str(
            r#"{
                "q1": {"awg": "BBNAPS1", "type": "APS", "IQkey": "BBNAPS1_12"},
                "q2": {"awg": "BBNAPS1", "type": "APS", "IQkey": "BBNAPS1_12"}
            }"#,
        )
        .unwrap();
        let result = compile_to_hardware_with_maps(
            two_channel_seqs(),
            &map,
            &param_map(0),
            AlignmentMode::Right,
            &CompilerSettings::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_mixer_correction_reaches_the_library() {
        let map: ChannelMap = serde_json::from_str(
            r#"{"q1": {"awg": "BBNAPS1", "type": "APS", "IQkey": "BBNAPS1_12"}}"#,
        )
        .unwrap();
        let params: ParamMap = serde_json::from_str(
            r#"{
                "BBNAPS1_12": {"delay": 0, "T": [[2.0, 0.0], [0.0, 2.0]]},
                "BBNAPS1_34": {"delay": 0, "T": [[1.0, 0.0], [0.0, 1.0]]}
            }"#,
        )
        .unwrap();
        let seqs: Vec<Sequence> = vec![vec![ramp_pulse("q1", 64).into()]];
        let hardware = compile_to_hardware_with_maps(
            seqs,
            &map,
            &params,
            AlignmentMode::Right,
            &CompilerSettings::default(),
        )
        .unwrap();
        let channel = &hardware["BBNAPS1"].channels["12"];
        let first_sample = channel.library[&idle_key()][0];
        // The idle zero is invariant, but the ramp waveform is scaled.
        assert_eq!(first_sample, Complex64::new(0.0, 0.0));
        let scaled = channel
            .library
            .values()
            .find(|samples| samples.len() > 1)
            .expect("ramp waveform present");
        assert_eq!(scaled[0], Complex64::new(0.4, 0.0));
    }
}
