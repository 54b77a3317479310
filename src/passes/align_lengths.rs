// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Cross-channel length equalization.
//!
//! Hardware playback is lock-stepped across channels, so every link list of
//! a compiled program must sum to the same total duration; a channel that
//! finishes early desynchronizes the experiment. The pass finds the longest
//! link list across all channels and sequences, adds a fixed padding margin
//! and fills every link list up to that target with idle entries placed
//! according to the alignment mode.

use crate::linklist::{total_duration, LinkList, LinkListEntry};
use crate::pulse::{AlignmentMode, ChannelUid};
use crate::Samples;
use indexmap::IndexMap;

fn pad_link_list(link_list: &mut LinkList, target: Samples, mode: AlignmentMode) {
    let pad_length = target - total_duration(link_list);
    if pad_length == 0 {
        return;
    }
    match mode {
        AlignmentMode::Left => link_list.push(LinkListEntry::idle(pad_length)),
        AlignmentMode::Right => link_list.insert(0, LinkListEntry::idle(pad_length)),
        AlignmentMode::Center => {
            let leading = pad_length / 2;
            let trailing = pad_length - leading;
            if leading > 0 {
                link_list.insert(0, LinkListEntry::idle(leading));
            }
            link_list.push(LinkListEntry::idle(trailing));
        }
    }
}

/// Pad every link list to the duration of the longest one plus `padding`.
///
/// Returns the common target duration.
pub(crate) fn equalize_durations(
    link_lists: &mut IndexMap<ChannelUid, Vec<LinkList>>,
    mode: AlignmentMode,
    padding: Samples,
) -> Samples {
    let longest = link_lists
        .values()
        .flatten()
        .map(|link_list| total_duration(link_list))
        .max()
        .unwrap_or(0);
    let target = longest + padding;
    log::debug!("Equalizing all link lists to {target} samples (longest was {longest}).");
    for channel_lists in link_lists.values_mut() {
        for link_list in channel_lists.iter_mut() {
            pad_link_list(link_list, target, mode);
        }
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform_library::idle_key;

    fn program(durations: &[(&str, &[Samples])]) -> IndexMap<ChannelUid, Vec<LinkList>> {
        durations
            .iter()
            .map(|(channel, lists)| {
                (
                    channel.to_string(),
                    lists.iter().map(|&d| vec![LinkListEntry::idle(d)]).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_every_link_list_reaches_the_target() {
        let mut link_lists = program(&[("q1", &[100, 250]), ("q2", &[40, 90])]);
        let target = equalize_durations(&mut link_lists, AlignmentMode::Left, 500);
        assert_eq!(target, 250 + 500);
        for lists in link_lists.values() {
            for list in lists {
                assert_eq!(total_duration(list), target);
            }
        }
    }

    #[test]
    fn test_right_mode_prepends_padding() {
        let mut link_lists = program(&[("q1", &[100]), ("q2", &[300])]);
        equalize_durations(&mut link_lists, AlignmentMode::Right, 0);
        let list = &link_lists["q1"][0];
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].key, idle_key());
        assert_eq!(list[0].length, 200);
    }

    #[test]
    fn test_center_mode_splits_padding() {
        let mut link_lists = program(&[("q1", &[100]), ("q2", &[301])]);
        equalize_durations(&mut link_lists, AlignmentMode::Center, 0);
        let list = &link_lists["q1"][0];
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].length, 100); // floor(201 / 2)
        assert_eq!(list[2].length, 101);
    }

    #[test]
    fn test_longest_list_only_receives_the_margin() {
        let mut link_lists = program(&[("q1", &[250])]);
        equalize_durations(&mut link_lists, AlignmentMode::Left, 500);
        let list = &link_lists["q1"][0];
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].length, 500);
    }
}
