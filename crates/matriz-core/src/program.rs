//! Named routing programs selectable by index or MIDI program number.
//!
//! A [`Program`] is a named snapshot of a [`MatrixState`]; a [`ProgramBank`]
//! is the ordered collection the router owns. Programs are created, edited,
//! and removed from control threads only — the render thread never walks the
//! bank, it only ever sees the grid of whichever program was last activated.

#[cfg(not(feature = "std"))]
use alloc::{
    format,
    string::{String, ToString},
    vec::Vec,
};

use crate::matrix::MatrixState;
use crate::router::RouterError;

/// A named, MIDI-selectable snapshot of a routing configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    /// Display name.
    pub name: String,
    /// MIDI Program Change number this program responds to, if any.
    pub midi_program: Option<u8>,
    /// The stored routing configuration.
    pub matrix: MatrixState,
}

/// Ordered collection of [`Program`]s with a current-program index.
#[derive(Clone, Debug, Default)]
pub struct ProgramBank {
    programs: Vec<Program>,
    current: usize,
}

impl ProgramBank {
    /// Creates an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a program and returns its index.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        midi_program: Option<u8>,
        matrix: MatrixState,
    ) -> usize {
        self.programs.push(Program {
            name: name.into(),
            midi_program,
            matrix,
        });
        self.programs.len() - 1
    }

    /// Overwrites the stored matrix of the program at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::IndexOutOfRange`] for an invalid index.
    pub fn edit(&mut self, index: usize, matrix: MatrixState) -> Result<(), RouterError> {
        let len = self.programs.len();
        let program = self
            .programs
            .get_mut(index)
            .ok_or(RouterError::IndexOutOfRange { index, len })?;
        program.matrix = matrix;
        Ok(())
    }

    /// Removes and returns the program at `index`.
    ///
    /// The current-program index is pulled back if it pointed at or past
    /// the removed slot.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::IndexOutOfRange`] for an invalid index —
    /// destructive operations never clamp.
    pub fn remove(&mut self, index: usize) -> Result<Program, RouterError> {
        if index >= self.programs.len() {
            return Err(RouterError::IndexOutOfRange {
                index,
                len: self.programs.len(),
            });
        }
        let removed = self.programs.remove(index);
        if self.current >= index && self.current > 0 {
            self.current -= 1;
        }
        Ok(removed)
    }

    /// Returns the program at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Program> {
        self.programs.get(index)
    }

    /// Returns the number of stored programs.
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// True when no program is stored.
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Display name for the program at `index`.
    ///
    /// Falls back to `"Route N"` for out-of-range indices so hosts can
    /// always label a program slot (query helpers clamp for display safety).
    pub fn name(&self, index: usize) -> String {
        self.programs
            .get(index)
            .map(|p| p.name.to_string())
            .unwrap_or_else(|| format!("Route {}", index + 1))
    }

    /// The current program index (0 when the bank is empty).
    pub fn current(&self) -> usize {
        self.current
    }

    /// Sets the current program index.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::IndexOutOfRange`] for an invalid index.
    pub fn set_current(&mut self, index: usize) -> Result<(), RouterError> {
        if index >= self.programs.len() {
            return Err(RouterError::IndexOutOfRange {
                index,
                len: self.programs.len(),
            });
        }
        self.current = index;
        Ok(())
    }

    /// Resolves an incoming MIDI program number to a bank index.
    ///
    /// Programs with a matching `midi_program` win; otherwise the number is
    /// treated as a positional index. `None` when nothing matches — the
    /// caller treats that as a no-op and keeps the last valid routing.
    pub fn find_midi_program(&self, number: u8) -> Option<usize> {
        if let Some(index) = self
            .programs
            .iter()
            .position(|p| p.midi_program == Some(number))
        {
            return Some(index);
        }
        let positional = number as usize;
        (positional < self.programs.len()).then_some(positional)
    }

    /// Iterates the stored programs in order.
    pub fn iter(&self) -> impl Iterator<Item = &Program> {
        self.programs.iter()
    }
}
