//! Thread-safe shared state between control threads and the render thread.
//!
//! [`RouterShared`] is the atomic bridge. Mutation requests flow through a
//! `Mutex<VecDeque>` that the render side drains with `try_lock` — the
//! audio callback never waits on a control thread. The applied routing is
//! published back through an `ArcSwap` snapshot for wait-free reads, and
//! completion flags travel through atomics with take-and-clear semantics.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use matriz_core::{MatrixState, ProgramBank};

/// A mutation request sent from a control thread to the render side.
///
/// Commands are validated against the fixed channel counts before they are
/// queued (see [`RouterControl`](crate::RouterControl)); the render side
/// re-validates on apply and skips anything stale.
#[derive(Debug, Clone)]
pub enum RouterCommand {
    /// Replace the whole routing matrix.
    SetMatrix(MatrixState),
    /// Edit a single connection.
    SetToggle {
        /// Source channel index.
        source: usize,
        /// Destination channel index.
        destination: usize,
        /// Connect or disconnect.
        on: bool,
    },
    /// Disconnect everything.
    ClearMatrix,
    /// Snapshot the current routing as a new program.
    AddProgram {
        /// Display name for the new program.
        name: String,
        /// MIDI Program Change number it responds to, if any.
        midi_program: Option<u8>,
    },
    /// Overwrite a stored program's matrix.
    EditProgram {
        /// Program index.
        index: usize,
        /// Replacement matrix.
        state: MatrixState,
    },
    /// Delete a stored program.
    RemoveProgram {
        /// Program index.
        index: usize,
    },
    /// Activate a stored program.
    SetCurrentProgram {
        /// Program index.
        index: usize,
    },
    /// Incoming MIDI Program Change number.
    ProgramChange {
        /// The 7-bit program number.
        number: u8,
    },
    /// Host sample-rate notification.
    SetSampleRate {
        /// New sample rate in Hz.
        sample_rate: f32,
    },
    /// Session restore: replace the bank and active routing wholesale.
    Restore {
        /// The restored program bank.
        bank: ProgramBank,
        /// The restored active matrix.
        active: MatrixState,
    },
}

/// Wait-free published view of the applied routing state.
///
/// Republished by the render side after it applies mutations or completes
/// a transition; control threads read it without any locking.
#[derive(Debug, Clone)]
pub struct RouterSnapshot {
    /// The routing target currently applied (or being faded in).
    pub matrix: MatrixState,
    /// Display names of the stored programs, in bank order.
    pub program_names: Vec<String>,
    /// The current program index.
    pub current_program: usize,
    /// True while a crossfade is still in flight.
    pub transitioning: bool,
}

/// Inner storage behind `Arc` so `RouterShared` can be cheaply cloned.
struct RouterSharedData {
    sources: usize,
    destinations: usize,
    /// Pending mutation requests from control threads.
    commands: Mutex<VecDeque<RouterCommand>>,
    /// Applied-state snapshot, published atomically by the render side.
    snapshot: ArcSwap<RouterSnapshot>,
    /// Set by the render side when a transition completes.
    routing_applied: AtomicBool,
    /// Set by the render side when the program bank is mutated.
    bank_changed: AtomicBool,
}

/// Shared state accessible from all threads.
///
/// # Thread Safety
///
/// - **Commands**: `Mutex` — control threads lock to push, the render side
///   `try_lock`s to drain.
/// - **Snapshot**: `ArcSwap::load()` — wait-free reads.
/// - **Change flags**: `AtomicBool` — render side sets, control side drains.
#[derive(Clone)]
pub struct RouterShared {
    inner: Arc<RouterSharedData>,
}

impl RouterShared {
    /// Creates shared state for a router with the given fixed channel counts.
    pub fn new(sources: usize, destinations: usize) -> Self {
        Self {
            inner: Arc::new(RouterSharedData {
                sources,
                destinations,
                commands: Mutex::new(VecDeque::new()),
                snapshot: ArcSwap::from_pointee(RouterSnapshot {
                    matrix: MatrixState::new(sources, destinations),
                    program_names: Vec::new(),
                    current_program: 0,
                    transitioning: false,
                }),
                routing_applied: AtomicBool::new(false),
                bank_changed: AtomicBool::new(false),
            }),
        }
    }

    /// The fixed `(sources, destinations)` channel counts.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.inner.sources, self.inner.destinations)
    }

    // ── Command queue ────────────────────────────────────────────────────

    /// Queues a mutation request from a control thread.
    pub fn push_command(&self, command: RouterCommand) {
        self.inner.commands.lock().push_back(command);
    }

    /// Drains all pending commands (render side, non-blocking).
    ///
    /// Returns `None` if the lock is contended (a control thread is mid
    /// push); the caller simply retries next block.
    pub fn try_drain_commands(&self) -> Option<VecDeque<RouterCommand>> {
        self.inner
            .commands
            .try_lock()
            .map(|mut queue| queue.drain(..).collect())
    }

    /// Number of commands waiting to be applied.
    pub fn pending_commands(&self) -> usize {
        self.inner.commands.lock().len()
    }

    // ── Snapshot ─────────────────────────────────────────────────────────

    /// Loads the current snapshot (wait-free).
    pub fn load_snapshot(&self) -> Arc<RouterSnapshot> {
        self.inner.snapshot.load_full()
    }

    /// Publishes a new snapshot (render side, after mutations apply).
    pub fn store_snapshot(&self, snapshot: RouterSnapshot) {
        self.inner.snapshot.store(Arc::new(snapshot));
    }

    // ── Change flags ─────────────────────────────────────────────────────

    /// Marks a completed routing transition (render side).
    pub fn set_routing_applied(&self) {
        self.inner.routing_applied.store(true, Ordering::Release);
    }

    /// Atomically reads and clears the routing-applied flag (control side).
    pub fn take_routing_applied(&self) -> bool {
        self.inner.routing_applied.swap(false, Ordering::AcqRel)
    }

    /// Marks a program-bank mutation (render side).
    pub fn set_bank_changed(&self) {
        self.inner.bank_changed.store(true, Ordering::Release);
    }

    /// Atomically reads and clears the bank-changed flag (control side).
    pub fn take_bank_changed(&self) -> bool {
        self.inner.bank_changed.swap(false, Ordering::AcqRel)
    }
}
