// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Cumulative-phase (frame) tracking pass.
//!
//! Walks one channel's link list in order, rotating every referenced
//! waveform by the entry phase plus the accumulated frame, and collapsing
//! constant-valued waveforms into single-sample time-amplitude entries.
//! The pass is strictly order-dependent within a channel (the frame
//! accumulator carries state from entry to entry) and fully independent
//! across channels.

use crate::linklist::LinkList;
use crate::pulse::ChannelUid;
use crate::utils::{is_constant, normalize_phase};
use crate::waveform_library::WaveformLibrary;
use crate::{Error, Result};
use num_complex::Complex64;

/// Apply frame tracking to `link_list`, rebinding entry keys to the
/// rotated (and possibly collapsed) waveforms interned into `library`.
pub(crate) fn apply_frame_tracking(
    channel: &ChannelUid,
    link_list: &mut LinkList,
    library: &mut WaveformLibrary,
) -> Result<()> {
    let mut frame: f64 = 0.0;
    for entry in link_list.iter_mut() {
        let shape = library.get(channel, entry.key).ok_or_else(|| {
            Error::new(&format!(
                "Internal error: link-list entry on channel '{channel}' references waveform {:#018x} which is not in the library.",
                entry.key
            ))
        })?;
        // Keep the rotation angle in [0, 2pi) as the frame accumulates.
        let rotation = Complex64::from_polar(1.0, normalize_phase(entry.phase + frame));
        let mut rotated: Vec<Complex64> = shape.iter().map(|s| s * rotation).collect();
        if is_constant(&rotated) {
            entry.is_time_amplitude = true;
            rotated.truncate(1);
        }
        entry.key = library.intern(channel, &rotated);
        frame += entry.frame_change;
    }
    Ok(())
}
