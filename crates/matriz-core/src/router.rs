//! The render-time routing state machine.
//!
//! [`RouterNode`] owns the *active* [`ToggleGrid`] the render thread sums
//! through, plus an optional *pending* grid staged by a mutation. While a
//! pending grid is in flight the node is transitioning: connections leaving
//! the routing ride a fade-out ramp, connections entering ride a fade-in
//! ramp, and connections present in both pass at unit gain. When both ramps
//! complete, the pending grid is promoted to active and the node returns to
//! steady state.
//!
//! The node is mutated on the control side and rendered on the audio side,
//! but never concurrently: it is a single-owner object (`&mut self` on both
//! paths), and the cross-thread handoff lives one layer up in the bridge
//! crate, which applies queued mutations on the render thread between
//! blocks. Exclusive access is enforced by the borrow checker rather than a
//! documented lock contract.
//!
//! At most one transition is ever in flight. A mutation that arrives while
//! one is running replaces the pending grid and restarts both ramps from
//! their endpoints; intermediate targets are never rendered.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::buffer::ChannelBuffer;
use crate::fade::{FadeDirection, LinearFade};
use crate::grid::ToggleGrid;
use crate::matrix::MatrixState;
use crate::midi::MidiEvent;
use crate::program::ProgramBank;

/// Default crossfade duration for routing transitions, in seconds.
pub const DEFAULT_FADE_SECONDS: f32 = 0.001;

/// Errors from the routing core's control-side entry points.
///
/// All validation happens before anything is published to the render path;
/// a returned error always means the active routing was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterError {
    /// A supplied matrix's declared channel counts disagree with the
    /// router's fixed counts.
    DimensionMismatch {
        /// The router's fixed `(sources, destinations)`.
        expected: (usize, usize),
        /// The dimensions the caller supplied.
        got: (usize, usize),
    },
    /// A channel or program index is outside the valid bounds.
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The exclusive upper bound it was checked against.
        len: usize,
    },
}

#[cfg(feature = "std")]
impl std::fmt::Display for RouterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DimensionMismatch { expected, got } => write!(
                f,
                "matrix dimensions {}x{} do not match router dimensions {}x{}",
                got.0, got.1, expected.0, expected.1
            ),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range (len {len})")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RouterError {}

/// Real-time audio router: a crossfading source × destination matrix with
/// a bank of named programs.
///
/// Channel counts are fixed at construction. The render entry point is
/// allocation-free and lock-free; every fallible check lives on the
/// mutation entry points.
pub struct RouterNode {
    sources: usize,
    destinations: usize,
    /// The grid the render loop reads in steady state.
    active: ToggleGrid,
    /// Staged replacement; occupied while a transition is in flight.
    pending: Option<ToggleGrid>,
    fade_in: LinearFade,
    fade_out: LinearFade,
    fade_seconds: f32,
    sample_rate: f32,
    /// UI-visible state; tracks the staged target, not the blend.
    state: MatrixState,
    programs: ProgramBank,
    routing_applied: bool,
}

impl RouterNode {
    /// Creates a router with all connections off.
    pub fn new(sources: usize, destinations: usize) -> Self {
        Self {
            sources,
            destinations,
            active: ToggleGrid::new(sources, destinations),
            pending: None,
            fade_in: LinearFade::new(FadeDirection::In),
            fade_out: LinearFade::new(FadeDirection::Out),
            fade_seconds: DEFAULT_FADE_SECONDS,
            sample_rate: 44100.0,
            state: MatrixState::new(sources, destinations),
            programs: ProgramBank::new(),
            routing_applied: false,
        }
    }

    /// Returns the fixed `(sources, destinations)` channel counts.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.sources, self.destinations)
    }

    /// Returns the number of source channels.
    pub fn sources(&self) -> usize {
        self.sources
    }

    /// Returns the number of destination channels.
    pub fn destinations(&self) -> usize {
        self.destinations
    }

    /// Returns the sample rate used to size transition ramps.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Updates the sample rate; the fade length in samples is recomputed
    /// when the next transition is armed.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Crossfade duration for routing transitions.
    pub fn fade_seconds(&self) -> f32 {
        self.fade_seconds
    }

    /// Overrides the crossfade duration (applies from the next transition).
    pub fn set_fade_seconds(&mut self, seconds: f32) {
        self.fade_seconds = seconds;
    }

    /// Current transition length in samples at the current sample rate.
    pub fn fade_length_samples(&self) -> u32 {
        LinearFade::length_for(self.fade_seconds, self.sample_rate)
    }

    /// True while a staged grid is being blended in.
    pub fn is_transitioning(&self) -> bool {
        self.pending.is_some()
    }

    /// The UI-visible routing state (the staged target during a transition).
    pub fn matrix_state(&self) -> &MatrixState {
        &self.state
    }

    /// Drains the transition-completed flag.
    ///
    /// Set when a pending grid is promoted to active; the bridge polls this
    /// after each block to raise change notifications for observers.
    pub fn take_routing_applied(&mut self) -> bool {
        core::mem::take(&mut self.routing_applied)
    }

    // --- Mutation entry points (control side) ---

    /// Replaces the routing with `state`, crossfading to it if it differs
    /// from the current target.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::DimensionMismatch`] when `state`'s declared
    /// counts disagree with the router's fixed counts; the active routing
    /// is left untouched.
    pub fn set_matrix(&mut self, state: &MatrixState) -> Result<(), RouterError> {
        let expected = (self.sources, self.destinations);
        if state.dimensions() != expected {
            return Err(RouterError::DimensionMismatch {
                expected,
                got: state.dimensions(),
            });
        }
        self.stage(ToggleGrid::from(state));
        Ok(())
    }

    /// Edits a single connection, crossfading if the routing changes.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::IndexOutOfRange`] for indices past the fixed
    /// channel counts.
    pub fn set_toggle(
        &mut self,
        source: usize,
        destination: usize,
        on: bool,
    ) -> Result<(), RouterError> {
        let mut next = self
            .pending
            .clone()
            .unwrap_or_else(|| self.active.clone());
        next.set(source, destination, on)?;
        self.stage(next);
        Ok(())
    }

    /// Disconnects everything, crossfading to silence.
    pub fn clear_matrix(&mut self) {
        self.stage(ToggleGrid::new(self.sources, self.destinations));
    }

    /// Stages `next` as the pending grid if it differs from the current
    /// effective target (the in-flight pending grid, else the active one).
    ///
    /// Rapid successive calls coalesce: the latest grid wholly replaces any
    /// in-flight one and restarts both ramps from their endpoints.
    fn stage(&mut self, next: ToggleGrid) {
        let target = self.pending.as_ref().unwrap_or(&self.active);
        if *target == next {
            return;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            connections = next.count_on(),
            retarget = self.pending.is_some(),
            "router_stage: staged new grid"
        );
        self.state = MatrixState::from(&next);
        self.pending = Some(next);
        let length = self.fade_length_samples();
        self.fade_out.start(length);
        self.fade_in.start(length);
    }

    /// Cancels any in-flight transition, snapping straight to its target.
    ///
    /// For non-streaming contexts (session teardown, offline reconfigure);
    /// a snap while audio runs would click.
    pub fn reset(&mut self) {
        if let Some(next) = self.pending.take() {
            self.active = next;
            self.state = MatrixState::from(&self.active);
            self.routing_applied = true;
        }
        self.fade_in.start(0);
        self.fade_out.start(0);
    }

    // --- Program management (control side) ---

    /// Snapshots the current routing as a new program; returns its index.
    pub fn add_program(&mut self, name: impl Into<String>, midi_program: Option<u8>) -> usize {
        let snapshot = self.state.clone();
        let index = self.programs.add(name, midi_program, snapshot);
        #[cfg(feature = "tracing")]
        tracing::debug!(index, "router_program: added");
        index
    }

    /// Overwrites a stored program's matrix.
    ///
    /// # Errors
    ///
    /// [`RouterError::DimensionMismatch`] for a wrong-shaped matrix,
    /// [`RouterError::IndexOutOfRange`] for a bad index.
    pub fn edit_program(&mut self, index: usize, state: &MatrixState) -> Result<(), RouterError> {
        let expected = (self.sources, self.destinations);
        if state.dimensions() != expected {
            return Err(RouterError::DimensionMismatch {
                expected,
                got: state.dimensions(),
            });
        }
        self.programs.edit(index, state.clone())
    }

    /// Deletes a stored program.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::IndexOutOfRange`] for a bad index.
    pub fn remove_program(&mut self, index: usize) -> Result<(), RouterError> {
        self.programs.remove(index).map(|_| ())
    }

    /// Activates the stored program at `index`: its matrix is staged via
    /// [`set_matrix`](Self::set_matrix) and `current_program` is updated.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::IndexOutOfRange`] for a bad index.
    pub fn set_current_program(&mut self, index: usize) -> Result<(), RouterError> {
        self.programs.set_current(index)?;
        let matrix = self
            .programs
            .get(index)
            .map(|p| p.matrix.clone());
        if let Some(matrix) = matrix {
            // Program matrices are dimension-checked on entry.
            self.set_matrix(&matrix)?;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(index, "router_program: activated");
        Ok(())
    }

    /// Handles an incoming MIDI Program Change number.
    ///
    /// Matches stored programs' declared MIDI numbers first, then falls
    /// back to positional index. An unknown number is a no-op — the last
    /// valid routing persists. Returns whether a program was activated.
    pub fn handle_program_change(&mut self, number: u8) -> bool {
        match self.programs.find_midi_program(number) {
            Some(index) => self.set_current_program(index).is_ok(),
            None => false,
        }
    }

    /// Number of programs as reported to hosts (at least 1).
    pub fn num_programs(&self) -> usize {
        self.programs.len().max(1)
    }

    /// The current program index.
    pub fn current_program(&self) -> usize {
        self.programs.current()
    }

    /// Display name for a program slot.
    pub fn program_name(&self, index: usize) -> String {
        self.programs.name(index)
    }

    /// Read-only view of the program bank.
    pub fn bank(&self) -> &ProgramBank {
        &self.programs
    }

    /// Replaces the program bank and active routing wholesale (session
    /// restore). The active matrix is staged through the normal crossfade
    /// path, so a restore mid-stream does not click.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::DimensionMismatch`] if the active matrix or
    /// any stored program disagrees with the router's channel counts;
    /// nothing is replaced on error.
    pub fn restore(&mut self, bank: ProgramBank, active: &MatrixState) -> Result<(), RouterError> {
        let expected = (self.sources, self.destinations);
        for program in bank.iter() {
            if program.matrix.dimensions() != expected {
                return Err(RouterError::DimensionMismatch {
                    expected,
                    got: program.matrix.dimensions(),
                });
            }
        }
        self.set_matrix(active)?;
        self.programs = bank;
        #[cfg(feature = "tracing")]
        tracing::debug!(programs = self.programs.len(), "router_restore: state restored");
        Ok(())
    }

    // --- Render entry point (audio side) ---

    /// Renders one audio block and forwards MIDI.
    ///
    /// Sums each connected source into its destination channels, blending
    /// between the active and pending grids while a transition is in
    /// flight. Destination channels are fully overwritten (unconnected
    /// destinations render silence). MIDI events pass through unmodified,
    /// independent of the audio matrix.
    ///
    /// Allocation-free except for `midi_out` growth; callers reuse a
    /// cleared `Vec` with reserved capacity across blocks.
    ///
    /// The block length is the smaller of the two buffers' block sizes;
    /// `input` must carry at least `sources()` channels and `output` at
    /// least `destinations()`.
    pub fn render(
        &mut self,
        input: &ChannelBuffer,
        output: &mut ChannelBuffer,
        midi_in: &[MidiEvent],
        midi_out: &mut Vec<MidiEvent>,
    ) {
        debug_assert!(input.channel_count() >= self.sources);
        debug_assert!(output.channel_count() >= self.destinations);
        let frames = input.block_size().min(output.block_size());

        for d in 0..self.destinations {
            output.channel_mut(d)[..frames].fill(0.0);
        }

        if self.pending.is_some() {
            self.render_transition(input, output, frames);
            if !self.fade_in.is_active() && !self.fade_out.is_active() {
                self.promote_pending();
            }
        } else {
            self.render_steady(input, output, frames);
        }

        midi_out.extend_from_slice(midi_in);
    }

    /// Steady state: every connected source at unit gain.
    fn render_steady(&self, input: &ChannelBuffer, output: &mut ChannelBuffer, frames: usize) {
        for d in 0..self.destinations {
            let dst = output.channel_mut(d);
            for s in 0..self.sources {
                if self.active.is_on(s, d) {
                    let src = input.channel(s);
                    for i in 0..frames {
                        dst[i] += src[i];
                    }
                }
            }
        }
    }

    /// Transition: per frame, advance both ramps once and weight each
    /// connection by where it sits in the active/pending pair.
    fn render_transition(
        &mut self,
        input: &ChannelBuffer,
        output: &mut ChannelBuffer,
        frames: usize,
    ) {
        let Some(pending) = self.pending.as_ref() else {
            return;
        };
        for i in 0..frames {
            let g_out = self.fade_out.next_sample();
            let g_in = self.fade_in.next_sample();
            for d in 0..self.destinations {
                let mut acc = 0.0;
                for s in 0..self.sources {
                    let in_active = self.active.is_on(s, d);
                    let in_pending = pending.is_on(s, d);
                    let gain = match (in_active, in_pending) {
                        // Routing unchanged for this pair: no fade needed.
                        (true, true) => 1.0,
                        (true, false) => g_out,
                        (false, true) => g_in,
                        (false, false) => continue,
                    };
                    acc += input.channel(s)[i] * gain;
                }
                output.channel_mut(d)[i] += acc;
            }
        }
    }

    /// Commits a completed transition: pending becomes active.
    fn promote_pending(&mut self) {
        if let Some(next) = self.pending.take() {
            self.active = next;
            self.state = MatrixState::from(&self.active);
            self.routing_applied = true;
            #[cfg(feature = "tracing")]
            tracing::debug!("router_commit: pending grid promoted to active");
        }
    }
}
