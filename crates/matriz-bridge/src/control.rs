//! Control-thread handle: validated mutations and change notifications.
//!
//! [`RouterControl`] is what the GUI and the MIDI dispatcher hold. Every
//! mutation is validated against the router's fixed channel counts *before*
//! it is queued, so dimension mismatches and bad indices surface
//! synchronously as `Result`s on the calling thread — nothing invalid is
//! ever handed to the render side. Observers register callbacks that fire
//! from [`poll_events()`](RouterControl::poll_events) on a control thread.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use matriz_core::{MatrixState, MidiEvent, ProgramBank, RouterError};

use crate::shared::{RouterCommand, RouterShared, RouterSnapshot};

/// A change notification delivered to registered observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterEvent {
    /// A routing transition completed; the active grid changed.
    RoutingApplied,
    /// The program bank was mutated (add/edit/remove/select).
    BankChanged,
}

/// Handle returned by [`RouterControl::subscribe`]; pass it back to
/// [`RouterControl::unsubscribe`] to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type ListenerFn = Box<dyn Fn(RouterEvent) + Send + Sync>;

/// Control-thread handle for mutating and observing a router.
///
/// Cheap to construct from a [`RouterShared`] clone. One control should be
/// the single consumer of change events; the wait-free
/// [`snapshot()`](Self::snapshot) read is safe from anywhere.
pub struct RouterControl {
    shared: RouterShared,
    listeners: Mutex<Vec<(u64, ListenerFn)>>,
    next_listener: AtomicU64,
}

impl RouterControl {
    /// Creates a control handle over the given shared state.
    pub fn new(shared: RouterShared) -> Self {
        Self {
            shared,
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
        }
    }

    /// The router's fixed `(sources, destinations)` channel counts.
    pub fn dimensions(&self) -> (usize, usize) {
        self.shared.dimensions()
    }

    /// Wait-free read of the last published routing state.
    pub fn snapshot(&self) -> std::sync::Arc<RouterSnapshot> {
        self.shared.load_snapshot()
    }

    // ── Matrix edits ─────────────────────────────────────────────────────

    /// Queues a whole-matrix replacement.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::DimensionMismatch`] synchronously if `state`
    /// does not match the router's channel counts; nothing is queued.
    pub fn set_matrix(&self, state: MatrixState) -> Result<(), RouterError> {
        self.check_dimensions(&state)?;
        self.shared.push_command(RouterCommand::SetMatrix(state));
        Ok(())
    }

    /// Queues a single-connection edit.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::IndexOutOfRange`] synchronously for indices
    /// past the fixed channel counts.
    pub fn set_toggle(
        &self,
        source: usize,
        destination: usize,
        on: bool,
    ) -> Result<(), RouterError> {
        let (sources, destinations) = self.shared.dimensions();
        if source >= sources {
            return Err(RouterError::IndexOutOfRange {
                index: source,
                len: sources,
            });
        }
        if destination >= destinations {
            return Err(RouterError::IndexOutOfRange {
                index: destination,
                len: destinations,
            });
        }
        self.shared.push_command(RouterCommand::SetToggle {
            source,
            destination,
            on,
        });
        Ok(())
    }

    /// Queues a disconnect-everything edit.
    pub fn clear_matrix(&self) {
        self.shared.push_command(RouterCommand::ClearMatrix);
    }

    /// Opens a batch edit session seeded from the current snapshot.
    ///
    /// Edits accumulate locally and are staged as one coalesced matrix on
    /// [`commit()`](BatchEdit::commit) — one crossfade for the whole batch.
    pub fn begin_edit(&self) -> BatchEdit<'_> {
        BatchEdit {
            control: self,
            state: self.shared.load_snapshot().matrix.clone(),
        }
    }

    // ── Programs ─────────────────────────────────────────────────────────

    /// Queues a snapshot of the current routing as a new program.
    pub fn add_program(&self, name: impl Into<String>, midi_program: Option<u8>) {
        self.shared.push_command(RouterCommand::AddProgram {
            name: name.into(),
            midi_program,
        });
    }

    /// Queues an overwrite of a stored program's matrix.
    ///
    /// # Errors
    ///
    /// Dimension mismatches and indices past the published bank length are
    /// rejected synchronously. The render side re-validates the index on
    /// apply (the bank may have changed in between).
    pub fn edit_program(&self, index: usize, state: MatrixState) -> Result<(), RouterError> {
        self.check_dimensions(&state)?;
        self.check_program_index(index)?;
        self.shared
            .push_command(RouterCommand::EditProgram { index, state });
        Ok(())
    }

    /// Queues the deletion of a stored program.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::IndexOutOfRange`] for indices past the
    /// published bank length — destructive operations never clamp.
    pub fn remove_program(&self, index: usize) -> Result<(), RouterError> {
        self.check_program_index(index)?;
        self.shared
            .push_command(RouterCommand::RemoveProgram { index });
        Ok(())
    }

    /// Queues the activation of a stored program.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::IndexOutOfRange`] for indices past the
    /// published bank length.
    pub fn set_current_program(&self, index: usize) -> Result<(), RouterError> {
        self.check_program_index(index)?;
        self.shared
            .push_command(RouterCommand::SetCurrentProgram { index });
        Ok(())
    }

    /// Queues an incoming MIDI program number (unknown numbers no-op).
    pub fn program_change(&self, number: u8) {
        self.shared
            .push_command(RouterCommand::ProgramChange { number });
    }

    /// Feeds one MIDI event from the dispatcher; queues a program change
    /// if the event carries one. Returns whether it did.
    pub fn handle_midi(&self, event: &MidiEvent) -> bool {
        match event.program_change() {
            Some(number) => {
                self.program_change(number);
                true
            }
            None => false,
        }
    }

    // ── Host notifications & session restore ─────────────────────────────

    /// Queues a sample-rate change from the host.
    pub fn set_sample_rate(&self, sample_rate: f32) {
        self.shared
            .push_command(RouterCommand::SetSampleRate { sample_rate });
    }

    /// Queues a wholesale bank + active-matrix restore (session load).
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::DimensionMismatch`] if the active matrix or
    /// any stored program disagrees with the router's channel counts.
    pub fn restore(&self, bank: ProgramBank, active: MatrixState) -> Result<(), RouterError> {
        self.check_dimensions(&active)?;
        for program in bank.iter() {
            self.check_dimensions(&program.matrix)?;
        }
        self.shared
            .push_command(RouterCommand::Restore { bank, active });
        Ok(())
    }

    // ── Observers ────────────────────────────────────────────────────────

    /// Registers a change listener; returns a handle for unsubscribing.
    ///
    /// Callbacks run on the thread that calls
    /// [`poll_events()`](Self::poll_events), never on the render thread.
    pub fn subscribe(&self, listener: impl Fn(RouterEvent) + Send + Sync + 'static) -> ListenerId {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, Box::new(listener)));
        ListenerId(id)
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id.0);
        listeners.len() != before
    }

    /// Drains the render side's change flags and dispatches events to
    /// every registered listener. Call from a GUI tick or similar.
    pub fn poll_events(&self) {
        let routing = self.shared.take_routing_applied();
        let bank = self.shared.take_bank_changed();
        if !routing && !bank {
            return;
        }
        let listeners = self.listeners.lock();
        for (_, listener) in listeners.iter() {
            if routing {
                listener(RouterEvent::RoutingApplied);
            }
            if bank {
                listener(RouterEvent::BankChanged);
            }
        }
    }

    // ── Validation helpers ───────────────────────────────────────────────

    fn check_dimensions(&self, state: &MatrixState) -> Result<(), RouterError> {
        let expected = self.shared.dimensions();
        if state.dimensions() != expected {
            return Err(RouterError::DimensionMismatch {
                expected,
                got: state.dimensions(),
            });
        }
        Ok(())
    }

    fn check_program_index(&self, index: usize) -> Result<(), RouterError> {
        let len = self.shared.load_snapshot().program_names.len();
        if index >= len {
            return Err(RouterError::IndexOutOfRange { index, len });
        }
        Ok(())
    }
}

/// Scoped batch edit session over the routing matrix.
///
/// Edits accumulate on a local copy; [`commit()`](Self::commit) stages the
/// whole batch as one matrix replacement (one crossfade). Dropping the
/// session without committing discards it.
pub struct BatchEdit<'a> {
    control: &'a RouterControl,
    state: MatrixState,
}

impl BatchEdit<'_> {
    /// Edits one connection in the pending batch.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::IndexOutOfRange`] for out-of-range indices.
    pub fn set(&mut self, source: usize, destination: usize, on: bool) -> Result<(), RouterError> {
        if on {
            self.state.connect(source, destination)
        } else {
            self.state.disconnect(source, destination)
        }
    }

    /// Reads a connection from the pending batch.
    pub fn is_connected(&self, source: usize, destination: usize) -> bool {
        self.state.is_connected(source, destination)
    }

    /// Queues the accumulated batch as a single matrix replacement.
    pub fn commit(self) {
        self.control
            .shared
            .push_command(RouterCommand::SetMatrix(self.state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use crate::processor::RouterProcessor;
    use matriz_core::ChannelBuffer;

    fn run_blocks(processor: &mut RouterProcessor, shared: &RouterShared, blocks: usize) {
        let (sources, destinations) = shared.dimensions();
        let mut input = ChannelBuffer::new(sources, 64);
        for c in 0..sources {
            input.fill_channel(c, &[1.0; 64]);
        }
        let mut output = ChannelBuffer::new(destinations, 64);
        let mut midi_out = Vec::new();
        for _ in 0..blocks {
            midi_out.clear();
            processor.process_block(&input, &mut output, &[], &mut midi_out);
        }
    }

    #[test]
    fn dimension_mismatch_is_rejected_before_queueing() {
        let shared = RouterShared::new(4, 4);
        let control = RouterControl::new(shared.clone());

        let err = control.set_matrix(MatrixState::new(2, 2)).unwrap_err();
        assert!(matches!(err, RouterError::DimensionMismatch { .. }));
        assert_eq!(shared.pending_commands(), 0);

        assert!(control.set_toggle(4, 0, true).is_err());
        assert!(control.set_toggle(0, 4, true).is_err());
        assert_eq!(shared.pending_commands(), 0);
    }

    #[test]
    fn program_index_is_checked_against_published_bank() {
        let shared = RouterShared::new(2, 2);
        let control = RouterControl::new(shared.clone());

        // Empty bank: every index is out of range.
        assert!(control.remove_program(0).is_err());
        assert!(control.set_current_program(0).is_err());
        assert_eq!(shared.pending_commands(), 0);

        // After a program lands and the snapshot is published, index 0 is
        // valid.
        let mut processor = RouterProcessor::new(shared.clone());
        control.add_program("A", None);
        run_blocks(&mut processor, &shared, 2);
        assert!(control.set_current_program(0).is_ok());
        assert!(control.remove_program(1).is_err());
    }

    #[test]
    fn batch_edit_coalesces_into_one_command() {
        let shared = RouterShared::new(4, 4);
        let control = RouterControl::new(shared.clone());

        let mut edit = control.begin_edit();
        edit.set(0, 0, true).unwrap();
        edit.set(1, 1, true).unwrap();
        edit.set(0, 0, false).unwrap();
        assert!(edit.set(9, 0, true).is_err());
        assert!(!edit.is_connected(0, 0));
        assert!(edit.is_connected(1, 1));
        edit.commit();

        assert_eq!(shared.pending_commands(), 1);
        let drained = shared.try_drain_commands().unwrap();
        match &drained[0] {
            RouterCommand::SetMatrix(state) => {
                assert!(state.is_connected(1, 1));
                assert!(!state.is_connected(0, 0));
            }
            other => panic!("expected SetMatrix, got {other:?}"),
        }
    }

    #[test]
    fn dropped_batch_edit_queues_nothing() {
        let shared = RouterShared::new(2, 2);
        let control = RouterControl::new(shared.clone());

        let mut edit = control.begin_edit();
        edit.set(0, 0, true).unwrap();
        drop(edit);
        assert_eq!(shared.pending_commands(), 0);
    }

    #[test]
    fn listeners_fire_from_poll_only() {
        let shared = RouterShared::new(2, 2);
        let control = RouterControl::new(shared.clone());
        let mut processor = RouterProcessor::new(shared.clone());

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let id = control.subscribe(move |event| sink.lock().push(event));

        let mut state = MatrixState::new(2, 2);
        state.connect(0, 0).unwrap();
        control.set_matrix(state).unwrap();
        control.add_program("A", None);

        // Nothing fires until the control side polls.
        run_blocks(&mut processor, &shared, 4);
        assert!(events.lock().is_empty());

        control.poll_events();
        {
            let fired = events.lock();
            assert!(fired.contains(&RouterEvent::RoutingApplied));
            assert!(fired.contains(&RouterEvent::BankChanged));
        }

        // Flags drain: polling again with no changes fires nothing.
        events.lock().clear();
        control.poll_events();
        assert!(events.lock().is_empty());

        assert!(control.unsubscribe(id));
        assert!(!control.unsubscribe(id));
    }

    #[test]
    fn unsubscribed_listener_stops_firing() {
        let shared = RouterShared::new(2, 2);
        let control = RouterControl::new(shared.clone());

        let count = Arc::new(AtomicUsize::new(0));
        let sink = count.clone();
        let id = control.subscribe(move |_| {
            sink.fetch_add(1, Ordering::Relaxed);
        });
        control.unsubscribe(id);

        shared.set_routing_applied();
        control.poll_events();
        assert_eq!(count.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn midi_dispatch_extracts_program_changes() {
        let shared = RouterShared::new(2, 2);
        let control = RouterControl::new(shared.clone());

        let note_on = MidiEvent::new(0, [0x90, 60, 100], 3);
        assert!(!control.handle_midi(&note_on));
        assert_eq!(shared.pending_commands(), 0);

        let pc = MidiEvent::program_change_on(2, 31);
        assert!(control.handle_midi(&pc));
        let drained = shared.try_drain_commands().unwrap();
        assert!(matches!(
            drained[0],
            RouterCommand::ProgramChange { number: 31 }
        ));
    }

    #[test]
    fn restore_validates_every_program() {
        let shared = RouterShared::new(2, 2);
        let control = RouterControl::new(shared.clone());

        let mut bad_bank = ProgramBank::new();
        bad_bank.add("bad", None, MatrixState::new(3, 3));
        assert!(
            control
                .restore(bad_bank, MatrixState::new(2, 2))
                .is_err()
        );
        assert_eq!(shared.pending_commands(), 0);

        let mut good_bank = ProgramBank::new();
        good_bank.add("good", Some(1), MatrixState::new(2, 2));
        control
            .restore(good_bank, MatrixState::new(2, 2))
            .unwrap();
        assert_eq!(shared.pending_commands(), 1);
    }
}
