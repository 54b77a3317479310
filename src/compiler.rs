// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Lowering of logical sequences into per-channel link lists.
//!
//! A sequence is normalized to pulse blocks, each block is aligned into
//! link-list entries per channel (channels silent in a block receive an
//! idle fill of the block length so that all channels stay synchronized
//! block by block) and the frame tracking pass bakes cumulative phase into
//! the waveforms. Multiple sequences are compiled against one shared,
//! growing waveform library so that identical waveforms deduplicate across
//! sequences.

use crate::align::align;
use crate::linklist::{LinkList, LinkListEntry};
use crate::passes::handle_frames::apply_frame_tracking;
use crate::pulse::{ChannelUid, Sequence};
use crate::settings::CompilerSettings;
use crate::waveform_library::WaveformLibrary;
use crate::{Error, Result};
use indexmap::{IndexMap, IndexSet};

/// The compiled artifact of a multi-sequence run: per channel, one link
/// list per input sequence, plus the shared waveform library.
#[derive(Debug, Default)]
pub struct CompiledProgram {
    pub link_lists: IndexMap<ChannelUid, Vec<LinkList>>,
    pub library: WaveformLibrary,
}

impl CompiledProgram {
    pub fn channels(&self) -> impl Iterator<Item = &ChannelUid> {
        self.link_lists.keys()
    }
}

/// Compile one sequence into a link list per channel, growing `library`.
pub fn compile_sequence(
    seq: Sequence,
    library: &mut WaveformLibrary,
    settings: &CompilerSettings,
) -> Result<IndexMap<ChannelUid, LinkList>> {
    let blocks: Vec<_> = seq.into_iter().map(|entry| entry.promote()).collect();

    // Channel union over all blocks, in first-seen order.
    let channels: IndexSet<ChannelUid> = blocks
        .iter()
        .flat_map(|block| block.pulses.keys().cloned())
        .collect();
    for channel in &channels {
        library.ensure_channel(channel);
    }

    let mut link_lists: IndexMap<ChannelUid, LinkList> = channels
        .iter()
        .map(|channel| (channel.clone(), LinkList::new()))
        .collect();

    for block in &blocks {
        let block_length = block.length();
        if block_length == 0 {
            // Zero-length blocks produce no entries on any channel.
            continue;
        }
        for channel in &channels {
            let link_list = link_lists
                .get_mut(channel)
                .expect("link list created for every channel in the union");
            match block.pulses.get(channel) {
                Some(pulse) => {
                    let aligned =
                        align(pulse, block_length, block.alignment, settings.merge_cutoff)?;
                    library.intern(channel, &aligned.shape);
                    link_list.extend(aligned.entries);
                }
                None => {
                    // Keep the silent channel synchronized with the block.
                    link_list.push(LinkListEntry::idle(block_length));
                }
            }
        }
    }

    for (channel, link_list) in link_lists.iter_mut() {
        apply_frame_tracking(channel, link_list, library)?;
    }
    Ok(link_lists)
}

fn channel_set_mismatch(prototype: &IndexSet<&ChannelUid>, other: &IndexSet<&ChannelUid>) -> bool {
    prototype.len() != other.len() || !prototype.iter().all(|channel| other.contains(*channel))
}

/// Compile a list of sequences against one shared waveform library.
///
/// The first sequence's channel set is the prototype for the whole call;
/// a later sequence whose channel set differs is rejected, since silently
/// dropping or misaligning its channels would desynchronize playback.
pub fn compile_sequences(
    seqs: Vec<Sequence>,
    settings: &CompilerSettings,
) -> Result<CompiledProgram> {
    let mut seqs = seqs.into_iter();
    let Some(first) = seqs.next() else {
        return Err(Error::new("Cannot compile an empty list of sequences."));
    };
    let mut library = WaveformLibrary::new();
    let prototype_lists = compile_sequence(first, &mut library, settings)?;
    let mut link_lists: IndexMap<ChannelUid, Vec<LinkList>> = prototype_lists
        .into_iter()
        .map(|(channel, link_list)| (channel, vec![link_list]))
        .collect();

    for (index, seq) in seqs.enumerate() {
        let compiled = compile_sequence(seq, &mut library, settings)?;
        let prototype: IndexSet<&ChannelUid> = link_lists.keys().collect();
        let current: IndexSet<&ChannelUid> = compiled.keys().collect();
        if channel_set_mismatch(&prototype, &current) {
            return Err(Error::new(&format!(
                "Sequence {} uses a different channel set than the first sequence: [{}] vs [{}].",
                index + 1,
                current
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                prototype
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            )));
        }
        for (channel, link_list) in compiled {
            link_lists
                .get_mut(&channel)
                .expect("channel set validated against the prototype")
                .push(link_list);
        }
    }
    Ok(CompiledProgram {
        link_lists,
        library,
    })
}
