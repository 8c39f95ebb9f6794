//! Matriz Bridge - thread-safe handoff between control and render threads.
//!
//! The routing core ([`matriz_core::RouterNode`]) is a single-owner object:
//! mutation and rendering both take `&mut self`, so they can never run
//! concurrently. This crate provides the pieces that connect the two sides
//! across real threads without ever blocking the audio callback:
//!
//! - [`RouterShared`] - the atomic bridge. Control threads lock a command
//!   queue to push; the render side drains it with `try_lock` (a contended
//!   block just retries next time). Routing snapshots are published through
//!   `ArcSwap` for wait-free reads, and completion flags travel through
//!   atomics.
//! - [`RouterProcessor`] - owned by the audio callback. Each block it
//!   drains pending commands, applies them to the node (rejects are logged
//!   and skipped, active routing untouched), renders, and republishes the
//!   snapshot when anything changed.
//! - [`RouterControl`] - the control-thread handle. Validates every edit
//!   against the fixed channel counts *before* queueing, so dimension
//!   errors surface synchronously and nothing invalid ever reaches the
//!   render thread. Also hosts change listeners, dispatched from
//!   [`poll_events()`](RouterControl::poll_events) on the control side —
//!   user callbacks never run on the render thread.
//! - [`BatchEdit`] - a scoped edit session that coalesces many cell edits
//!   into one staged matrix. Replaces the "caller must already hold the
//!   lock" batch-edit contract with a guard object the type system checks.
//!
//! # Example
//!
//! ```rust
//! use matriz_bridge::{RouterControl, RouterProcessor, RouterShared};
//! use matriz_core::ChannelBuffer;
//!
//! let shared = RouterShared::new(4, 4);
//! let control = RouterControl::new(shared.clone());
//! let mut processor = RouterProcessor::new(shared);
//!
//! // Control thread: batch-edit the routing.
//! let mut edit = control.begin_edit();
//! edit.set(0, 0, true).unwrap();
//! edit.set(1, 1, true).unwrap();
//! edit.commit();
//!
//! // Audio thread: drain, apply, render.
//! let input = ChannelBuffer::new(4, 256);
//! let mut output = ChannelBuffer::new(4, 256);
//! let mut midi_out = Vec::new();
//! processor.process_block(&input, &mut output, &[], &mut midi_out);
//!
//! // Control thread: observe the applied routing.
//! assert!(control.snapshot().matrix.is_connected(0, 0));
//! ```

pub mod control;
pub mod processor;
pub mod shared;

pub use control::{BatchEdit, ListenerId, RouterControl, RouterEvent};
pub use processor::RouterProcessor;
pub use shared::{RouterCommand, RouterShared, RouterSnapshot};
