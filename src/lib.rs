// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Compiler from logical pulse sequences to hardware-executable waveform
//! link lists for AWGs and digitizers.
//!
//! A sequence of timed control operations is lowered into, per logical
//! channel, an ordered list of link-list entries referencing a
//! content-addressed waveform library. Logical channels are then resolved
//! to physical instrument sub-channels and the per-channel output is
//! length-equalized, delayed and mixer-corrected for playback.

pub mod align;
pub mod compiler;
pub mod config;
pub mod hardware;
pub mod linklist;
pub(crate) mod passes;
pub mod pulse;
pub mod settings;
pub(crate) mod utils;
pub mod waveform_library;

pub use compiler::{compile_sequence, compile_sequences, CompiledProgram};
pub use hardware::{compile_to_hardware, compile_to_hardware_with_maps};

/// Number of samples, the time unit of the compiler.
pub type Samples = u64;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn new(msg: &str) -> Self {
        Error::Anyhow(anyhow::anyhow!(msg.to_string()))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
