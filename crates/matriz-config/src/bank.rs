//! Serializable mirrors of the routing core's state, and the opaque
//! session-state block.
//!
//! The live types in `matriz-core` carry no serde derives; this module owns
//! the stored representations and the checked conversions between the two.
//! Host sessions persist a [`StoredBank`] as an opaque byte block via
//! [`save_state`]/[`load_state`] — the block round-trips the program bank,
//! the current program index, and the active matrix exactly. Anything
//! corrupt (out-of-range cells, wrong dimensions, dangling indices) is
//! rejected before the router is touched.

use serde::{Deserialize, Serialize};

use matriz_core::{MatrixState, Program, ProgramBank, RouterNode};

use crate::error::BankError;

/// Stored form of a [`MatrixState`]: declared dimensions plus the list of
/// connected `(source, destination)` cells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredMatrix {
    /// Declared source channel count.
    pub sources: usize,
    /// Declared destination channel count.
    pub destinations: usize,
    /// Connected cells as `[source, destination]` pairs.
    #[serde(default)]
    pub cells: Vec<(usize, usize)>,
}

impl StoredMatrix {
    /// Captures a live matrix state.
    pub fn from_state(state: &MatrixState) -> Self {
        Self {
            sources: state.sources(),
            destinations: state.destinations(),
            cells: state.connections().collect(),
        }
    }

    /// Rebuilds the live matrix state, validating every stored cell.
    ///
    /// # Errors
    ///
    /// Returns [`BankError::CellOutOfRange`] when a stored connection
    /// points outside the declared dimensions.
    pub fn to_state(&self) -> Result<MatrixState, BankError> {
        let mut state = MatrixState::new(self.sources, self.destinations);
        for &(s, d) in &self.cells {
            state.connect(s, d).map_err(|_| BankError::CellOutOfRange {
                source_channel: s,
                destination_channel: d,
                sources: self.sources,
                destinations: self.destinations,
            })?;
        }
        Ok(state)
    }
}

/// Stored form of a [`Program`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredProgram {
    /// Display name.
    pub name: String,
    /// MIDI Program Change number, if the program responds to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_program: Option<u8>,
    /// The stored routing configuration.
    pub matrix: StoredMatrix,
}

impl StoredProgram {
    fn from_program(program: &Program) -> Self {
        Self {
            name: program.name.clone(),
            midi_program: program.midi_program,
            matrix: StoredMatrix::from_state(&program.matrix),
        }
    }
}

/// The complete persisted state of a router: program bank, current program
/// index, and the active routing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredBank {
    /// Stored programs in bank order.
    #[serde(default)]
    pub programs: Vec<StoredProgram>,
    /// Current program index at save time.
    #[serde(default)]
    pub current: usize,
    /// The active routing at save time.
    pub active: StoredMatrix,
}

impl StoredBank {
    /// Captures a router's complete persistable state.
    pub fn capture(node: &RouterNode) -> Self {
        Self {
            programs: node.bank().iter().map(StoredProgram::from_program).collect(),
            current: node.current_program(),
            active: StoredMatrix::from_state(node.matrix_state()),
        }
    }

    /// Applies the stored state to a router.
    ///
    /// The active matrix is staged through the router's normal crossfade
    /// path, so restoring mid-stream does not click. Nothing is applied if
    /// any part of the stored state is invalid.
    ///
    /// # Errors
    ///
    /// Returns [`BankError::CellOutOfRange`] or
    /// [`BankError::CurrentOutOfRange`] for corrupt stored data, and
    /// [`BankError::Router`] when dimensions disagree with the router's
    /// fixed channel counts.
    pub fn apply(&self, node: &mut RouterNode) -> Result<(), BankError> {
        let mut bank = ProgramBank::new();
        for stored in &self.programs {
            bank.add(
                stored.name.clone(),
                stored.midi_program,
                stored.matrix.to_state()?,
            );
        }
        if self.current != 0 {
            bank.set_current(self.current)
                .map_err(|_| BankError::CurrentOutOfRange {
                    index: self.current,
                    len: self.programs.len(),
                })?;
        }
        let active = self.active.to_state()?;
        node.restore(bank, &active)?;
        Ok(())
    }

    /// Encodes the stored state as an opaque byte block.
    pub fn to_bytes(&self) -> Result<Vec<u8>, BankError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a stored state from an opaque byte block.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BankError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Serializes a router's program bank and active matrix for session save.
pub fn save_state(node: &RouterNode) -> Result<Vec<u8>, BankError> {
    StoredBank::capture(node).to_bytes()
}

/// Restores a router from a byte block produced by [`save_state`].
///
/// # Errors
///
/// Corrupt or wrong-shaped data is rejected with the router untouched.
pub fn load_state(node: &mut RouterNode, bytes: &[u8]) -> Result<(), BankError> {
    StoredBank::from_bytes(bytes)?.apply(node)
}
