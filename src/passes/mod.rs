// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

pub(crate) mod align_lengths;
pub(crate) mod handle_delays;
pub(crate) mod handle_frames;
pub(crate) mod mixer_correction;
