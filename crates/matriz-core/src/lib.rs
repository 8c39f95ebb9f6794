//! Matriz Core - real-time audio/MIDI routing matrix
//!
//! This crate provides the routing core for a graph-node audio engine: a
//! source × destination connection matrix that the render thread consults
//! every audio block, and that control threads (GUI, MIDI dispatch) can
//! replace at arbitrary times without clicks, dropouts, or torn state.
//!
//! # Core Abstractions
//!
//! ## Routing
//!
//! - [`ToggleGrid`] - fixed-dimension boolean connectivity table
//! - [`MatrixState`] - value-object snapshot of a routing configuration
//! - [`RouterNode`] - the render-time state machine driving crossfaded
//!   transitions between an active and a pending grid
//!
//! ## Transitions
//!
//! - [`LinearFade`] - sample-accurate per-direction gain ramp
//!
//! A routing change never mutates the grid the render thread is reading.
//! The new configuration is built off the render path, staged wholesale as
//! a pending grid, and blended in over a short crossfade (1 ms by default).
//! Sources connected in both grids pass at unit gain; sources leaving the
//! routing fade out; sources entering fade in. When both ramps complete,
//! the pending grid is promoted and the node returns to steady state.
//!
//! ## Programs
//!
//! - [`Program`] / [`ProgramBank`] - named matrix snapshots selectable by
//!   index or by incoming MIDI Program Change number
//!
//! ## Buffers & MIDI
//!
//! - [`ChannelBuffer`] - N-channel block buffer for the render entry point
//! - [`MidiEvent`] - raw MIDI event, forwarded unmodified through the
//!   router's MIDI pipe; only Program Change numbers are ever extracted
//!
//! # Example
//!
//! ```rust
//! use matriz_core::{ChannelBuffer, MatrixState, RouterNode};
//!
//! let mut router = RouterNode::new(4, 4);
//! router.set_sample_rate(48000.0);
//!
//! let mut state = MatrixState::new(4, 4);
//! state.connect(0, 0).unwrap();
//! state.connect(1, 1).unwrap();
//! router.set_matrix(&state).unwrap();
//!
//! let input = ChannelBuffer::new(4, 256);
//! let mut output = ChannelBuffer::new(4, 256);
//! let mut midi_out = Vec::new();
//! router.render(&input, &mut output, &[], &mut midi_out);
//! ```
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible for embedded audio applications.
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! matriz-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: no allocation and no locking on the render path
//! - **Whole-grid replacement**: the render thread only ever sees fully
//!   formed grids, never a half-edited one
//! - **Control-side validation**: every fallible check happens before a
//!   configuration is staged; the render path has no failure mode

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod buffer;
pub mod fade;
pub mod grid;
pub mod matrix;
pub mod midi;
pub mod program;
pub mod router;

// Re-export main types at crate root
pub use buffer::ChannelBuffer;
pub use fade::{FadeDirection, LinearFade};
pub use grid::ToggleGrid;
pub use matrix::MatrixState;
pub use midi::MidiEvent;
pub use program::{Program, ProgramBank};
pub use router::{RouterError, RouterNode};
