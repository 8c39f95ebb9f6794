//! Render-side owner of the routing node.
//!
//! [`RouterProcessor`] lives inside the audio callback. Once per block it
//! drains queued commands without blocking, applies them to the node,
//! renders, and republishes the shared snapshot when anything changed.
//! A command that fails at apply time (stale program index, wrong-shaped
//! matrix from an old session) is logged and skipped — the active routing
//! is never disturbed by a bad request.

use matriz_core::{ChannelBuffer, MidiEvent, RouterError, RouterNode};

use crate::shared::{RouterCommand, RouterShared, RouterSnapshot};

/// Owns the [`RouterNode`] on the audio thread and drives it from the
/// shared command queue.
pub struct RouterProcessor {
    node: RouterNode,
    shared: RouterShared,
}

impl RouterProcessor {
    /// Creates the processor for the given shared state, with an initially
    /// empty routing.
    pub fn new(shared: RouterShared) -> Self {
        let (sources, destinations) = shared.dimensions();
        Self {
            node: RouterNode::new(sources, destinations),
            shared,
        }
    }

    /// Read access to the underlying node (tests, offline tooling).
    pub fn node(&self) -> &RouterNode {
        &self.node
    }

    /// Mutable access to the underlying node.
    ///
    /// Offline use only — on a live stream all mutations must flow through
    /// the command queue so they serialize with rendering.
    pub fn node_mut(&mut self) -> &mut RouterNode {
        &mut self.node
    }

    /// Drains pending commands, renders one block, and republishes shared
    /// state if anything changed.
    ///
    /// Never blocks: a contended command queue is retried next block, and
    /// the render itself is lock- and allocation-free.
    pub fn process_block(
        &mut self,
        input: &ChannelBuffer,
        output: &mut ChannelBuffer,
        midi_in: &[MidiEvent],
        midi_out: &mut Vec<MidiEvent>,
    ) {
        let mut applied_any = false;
        if let Some(mut commands) = self.shared.try_drain_commands() {
            for command in commands.drain(..) {
                match self.apply(command) {
                    Ok(()) => applied_any = true,
                    Err(err) => {
                        tracing::warn!(%err, "router command rejected, routing unchanged");
                    }
                }
            }
        }

        self.node.render(input, output, midi_in, midi_out);

        let completed = self.node.take_routing_applied();
        if completed {
            self.shared.set_routing_applied();
        }
        if applied_any || completed {
            self.publish_snapshot();
        }
    }

    /// Applies one command to the node.
    fn apply(&mut self, command: RouterCommand) -> Result<(), RouterError> {
        match command {
            RouterCommand::SetMatrix(state) => self.node.set_matrix(&state),
            RouterCommand::SetToggle {
                source,
                destination,
                on,
            } => self.node.set_toggle(source, destination, on),
            RouterCommand::ClearMatrix => {
                self.node.clear_matrix();
                Ok(())
            }
            RouterCommand::AddProgram { name, midi_program } => {
                self.node.add_program(name, midi_program);
                self.shared.set_bank_changed();
                Ok(())
            }
            RouterCommand::EditProgram { index, state } => {
                self.node.edit_program(index, &state)?;
                self.shared.set_bank_changed();
                Ok(())
            }
            RouterCommand::RemoveProgram { index } => {
                self.node.remove_program(index)?;
                self.shared.set_bank_changed();
                Ok(())
            }
            RouterCommand::SetCurrentProgram { index } => {
                self.node.set_current_program(index)?;
                self.shared.set_bank_changed();
                Ok(())
            }
            RouterCommand::ProgramChange { number } => {
                // Unknown numbers are a deliberate no-op, not an error.
                if self.node.handle_program_change(number) {
                    self.shared.set_bank_changed();
                }
                Ok(())
            }
            RouterCommand::SetSampleRate { sample_rate } => {
                self.node.set_sample_rate(sample_rate);
                Ok(())
            }
            RouterCommand::Restore { bank, active } => {
                self.node.restore(bank, &active)?;
                self.shared.set_bank_changed();
                Ok(())
            }
        }
    }

    /// Publishes the node's current state to the wait-free snapshot.
    fn publish_snapshot(&self) {
        let bank = self.node.bank();
        self.shared.store_snapshot(RouterSnapshot {
            matrix: self.node.matrix_state().clone(),
            program_names: (0..bank.len()).map(|i| bank.name(i)).collect(),
            current_program: self.node.current_program(),
            transitioning: self.node.is_transitioning(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matriz_core::MatrixState;

    fn dc_input(channels: usize, frames: usize) -> ChannelBuffer {
        let mut input = ChannelBuffer::new(channels, frames);
        for c in 0..channels {
            input.fill_channel(c, &vec![1.0; frames]);
        }
        input
    }

    fn run_blocks(processor: &mut RouterProcessor, blocks: usize, frames: usize) -> ChannelBuffer {
        let (sources, destinations) = processor.shared.dimensions();
        let input = dc_input(sources, frames);
        let mut output = ChannelBuffer::new(destinations, frames);
        let mut midi_out = Vec::new();
        for _ in 0..blocks {
            midi_out.clear();
            processor.process_block(&input, &mut output, &[], &mut midi_out);
        }
        output
    }

    #[test]
    fn queued_matrix_is_applied_and_published() {
        let shared = RouterShared::new(2, 2);
        let mut processor = RouterProcessor::new(shared.clone());

        let mut state = MatrixState::new(2, 2);
        state.connect(0, 0).unwrap();
        shared.push_command(RouterCommand::SetMatrix(state.clone()));

        let output = run_blocks(&mut processor, 4, 64);
        assert!(output.channel(0).iter().all(|&x| x == 1.0));
        assert!(shared.take_routing_applied());

        let snap = shared.load_snapshot();
        assert_eq!(snap.matrix, state);
        assert!(!snap.transitioning);
    }

    #[test]
    fn rejected_command_leaves_routing_untouched() {
        let shared = RouterShared::new(2, 2);
        let mut processor = RouterProcessor::new(shared.clone());

        let mut good = MatrixState::new(2, 2);
        good.connect(1, 1).unwrap();
        shared.push_command(RouterCommand::SetMatrix(good.clone()));
        run_blocks(&mut processor, 4, 64);

        // Wrong-shaped matrix (e.g. from a stale session) is skipped.
        shared.push_command(RouterCommand::SetMatrix(MatrixState::new(3, 3)));
        // Stale program index likewise.
        shared.push_command(RouterCommand::RemoveProgram { index: 5 });
        let output = run_blocks(&mut processor, 2, 64);

        assert!(output.channel(1).iter().all(|&x| x == 1.0));
        assert_eq!(shared.load_snapshot().matrix, good);
    }

    #[test]
    fn program_commands_flow_through_the_queue() {
        let shared = RouterShared::new(2, 2);
        let mut processor = RouterProcessor::new(shared.clone());

        let mut first = MatrixState::new(2, 2);
        first.connect(0, 0).unwrap();
        shared.push_command(RouterCommand::SetMatrix(first));
        run_blocks(&mut processor, 4, 64);

        shared.push_command(RouterCommand::AddProgram {
            name: "straight".to_owned(),
            midi_program: Some(12),
        });
        let mut second = MatrixState::new(2, 2);
        second.connect(1, 0).unwrap();
        shared.push_command(RouterCommand::SetMatrix(second));
        run_blocks(&mut processor, 4, 64);
        assert!(shared.take_bank_changed());

        // Recall the stored program by its MIDI number.
        shared.push_command(RouterCommand::ProgramChange { number: 12 });
        run_blocks(&mut processor, 4, 64);

        let snap = shared.load_snapshot();
        assert_eq!(snap.program_names, ["straight"]);
        assert_eq!(snap.current_program, 0);
        assert!(snap.matrix.is_connected(0, 0));
        assert!(!snap.matrix.is_connected(1, 0));
    }

    #[test]
    fn unknown_program_change_is_a_noop() {
        let shared = RouterShared::new(2, 2);
        let mut processor = RouterProcessor::new(shared.clone());

        let mut state = MatrixState::new(2, 2);
        state.connect(0, 1).unwrap();
        shared.push_command(RouterCommand::SetMatrix(state.clone()));
        run_blocks(&mut processor, 4, 64);
        shared.take_bank_changed();

        shared.push_command(RouterCommand::ProgramChange { number: 42 });
        run_blocks(&mut processor, 2, 64);

        assert!(!shared.take_bank_changed());
        assert_eq!(shared.load_snapshot().matrix, state);
    }

    #[test]
    fn midi_passes_through_the_processor() {
        let shared = RouterShared::new(2, 2);
        let mut processor = RouterProcessor::new(shared);

        let input = dc_input(2, 32);
        let mut output = ChannelBuffer::new(2, 32);
        let events = [MidiEvent::program_change_on(1, 9)];
        let mut midi_out = Vec::new();
        processor.process_block(&input, &mut output, &events, &mut midi_out);
        assert_eq!(midi_out.as_slice(), &events);
    }

    /// A control thread hammers the queue while the "audio thread" keeps
    /// processing; the last write wins and nothing tears.
    #[test]
    fn concurrent_edits_settle_on_last_target() {
        let shared = RouterShared::new(4, 4);
        let mut processor = RouterProcessor::new(shared.clone());
        shared.push_command(RouterCommand::SetSampleRate {
            sample_rate: 48000.0,
        });

        let writer = {
            let shared = shared.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    let mut state = MatrixState::new(4, 4);
                    state.connect(i % 4, (i + 1) % 4).unwrap();
                    shared.push_command(RouterCommand::SetMatrix(state));
                }
            })
        };

        let input = dc_input(4, 32);
        let mut output = ChannelBuffer::new(4, 32);
        let mut midi_out = Vec::new();
        while !writer.is_finished() {
            midi_out.clear();
            processor.process_block(&input, &mut output, &[], &mut midi_out);
        }
        writer.join().unwrap();

        // Drain whatever is left, then settle.
        let output = run_blocks(&mut processor, 8, 64);

        // Last command was i = 199: source 3 → destination 0.
        assert!(output.channel(0).iter().all(|&x| x == 1.0));
        for d in 1..4 {
            assert!(output.channel(d).iter().all(|&x| x == 0.0));
        }
        assert!(shared.load_snapshot().matrix.is_connected(3, 0));
    }
}
