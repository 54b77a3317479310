// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Per-channel delay compensation.
//!
//! Cabling and instrument pipelines skew channels against each other; the
//! parameter map assigns every physical IQ pair a sample delay that shifts
//! its playback in time. The shift is realized as a leading idle-fill
//! entry on every link list of the channel.

use crate::linklist::{LinkList, LinkListEntry};
use crate::Samples;

pub(crate) fn apply_delay(link_lists: &mut [LinkList], delay: Samples) {
    if delay == 0 {
        return;
    }
    for link_list in link_lists.iter_mut() {
        link_list.insert(0, LinkListEntry::idle(delay));
    }
}
