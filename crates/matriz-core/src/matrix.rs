//! Serializable-shape value object for one routing configuration.
//!
//! [`MatrixState`] is the externally-visible representation of a
//! [`ToggleGrid`]: the declared dimensions plus the set of connected
//! `(source, destination)` pairs. The GUI edits these, programs store them,
//! and the persistence layer mirrors them to disk. A `MatrixState` is
//! converted to a `ToggleGrid` before it ever reaches the render thread.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::grid::ToggleGrid;
use crate::router::RouterError;

/// Value object mirroring a [`ToggleGrid`]'s connections and dimensions.
///
/// Connections are kept sorted by `(source, destination)` so equality is
/// order-independent and conversion round-trips are exact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatrixState {
    sources: usize,
    destinations: usize,
    connections: Vec<(usize, usize)>,
}

impl MatrixState {
    /// Creates an empty state with the given dimensions.
    pub fn new(sources: usize, destinations: usize) -> Self {
        Self {
            sources,
            destinations,
            connections: Vec::new(),
        }
    }

    /// Returns `(sources, destinations)`.
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

    /// Adds a connection, bounds-checked. Connecting an already-connected
    /// pair is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::IndexOutOfRange`] if either index exceeds the
    /// declared dimensions.
    pub fn connect(&mut self, source: usize, destination: usize) -> Result<(), RouterError> {
        self.check(source, destination)?;
        let pair = (source, destination);
        if let Err(pos) = self.connections.binary_search(&pair) {
            self.connections.insert(pos, pair);
        }
        Ok(())
    }

    /// Removes a connection, bounds-checked. Disconnecting an absent pair
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::IndexOutOfRange`] if either index exceeds the
    /// declared dimensions.
    pub fn disconnect(&mut self, source: usize, destination: usize) -> Result<(), RouterError> {
        self.check(source, destination)?;
        if let Ok(pos) = self.connections.binary_search(&(source, destination)) {
            self.connections.remove(pos);
        }
        Ok(())
    }

    /// True when `(source, destination)` is connected.
    ///
    /// Out-of-range indices read as not connected (query helper; mutation
    /// APIs are the ones that fail loudly).
    pub fn is_connected(&self, source: usize, destination: usize) -> bool {
        self.connections.binary_search(&(source, destination)).is_ok()
    }

    /// Iterates the connected pairs in `(source, destination)` order.
    pub fn connections(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.connections.iter().copied()
    }

    /// Returns the number of connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// True when no pair is connected.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    fn check(&self, source: usize, destination: usize) -> Result<(), RouterError> {
        if source >= self.sources {
            return Err(RouterError::IndexOutOfRange {
                index: source,
                len: self.sources,
            });
        }
        if destination >= self.destinations {
            return Err(RouterError::IndexOutOfRange {
                index: destination,
                len: self.destinations,
            });
        }
        Ok(())
    }
}

impl From<&ToggleGrid> for MatrixState {
    /// Enumerates every enabled cell of the grid.
    fn from(grid: &ToggleGrid) -> Self {
        let (sources, destinations) = grid.dimensions();
        let mut state = MatrixState::new(sources, destinations);
        for s in 0..sources {
            for d in 0..destinations {
                if grid.is_on(s, d) {
                    state.connections.push((s, d));
                }
            }
        }
        state
    }
}

impl From<&MatrixState> for ToggleGrid {
    /// Re-applies every stored connection onto a fresh grid.
    fn from(state: &MatrixState) -> Self {
        let mut grid = ToggleGrid::new(state.sources, state.destinations);
        for (s, d) in state.connections() {
            // In-range by MatrixState's own invariant.
            let _ = grid.set(s, d, true);
        }
        grid
    }
}
