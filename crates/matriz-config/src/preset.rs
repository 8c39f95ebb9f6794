//! Routing preset file format and factory presets.
//!
//! Presets are single routing configurations stored as TOML files — the
//! on-disk cousin of the in-session program bank. They can be loaded from
//! files, created programmatically, and saved to disk.
//!
//! # TOML Format
//!
//! ```toml
//! name = "Swap Pairs"
//! description = "Crossed stereo pairs"
//!
//! [matrix]
//! sources = 4
//! destinations = 4
//! cells = [[0, 1], [1, 0], [2, 3], [3, 2]]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use matriz_core::MatrixState;

use crate::bank::StoredMatrix;
use crate::error::BankError;

/// A named routing configuration stored as a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoutingPreset {
    /// Name of the preset.
    pub name: String,

    /// Optional description of the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The stored routing configuration.
    pub matrix: StoredMatrix,
}

impl RoutingPreset {
    /// Creates a preset from a live matrix state.
    pub fn new(name: impl Into<String>, state: &MatrixState) -> Self {
        Self {
            name: name.into(),
            description: None,
            matrix: StoredMatrix::from_state(state),
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Rebuilds the live matrix state, validating stored cells.
    pub fn to_state(&self) -> Result<MatrixState, BankError> {
        self.matrix.to_state()
    }

    /// Loads a preset from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| BankError::read_file(path, e))?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads a preset from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, BankError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Saves the preset to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), BankError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| BankError::create_dir(parent, e))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| BankError::write_file(path, e))?;
        Ok(())
    }

    /// Converts the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, BankError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Built-in presets for a router of the given dimensions.
///
/// - **Passthrough** — identity diagonal, channel N to channel N
/// - **Swap Pairs** — adjacent channel pairs crossed (0↔1, 2↔3, ...)
/// - **Mono Sum** — every source summed into destination 0
pub fn factory_presets(sources: usize, destinations: usize) -> Vec<RoutingPreset> {
    let mut passthrough = MatrixState::new(sources, destinations);
    for c in 0..sources.min(destinations) {
        let _ = passthrough.connect(c, c);
    }

    let mut swapped = MatrixState::new(sources, destinations);
    for base in (0..sources.min(destinations)).step_by(2) {
        if base + 1 < sources.min(destinations) {
            let _ = swapped.connect(base, base + 1);
            let _ = swapped.connect(base + 1, base);
        } else {
            // Odd channel left straight.
            let _ = swapped.connect(base, base);
        }
    }

    let mut mono = MatrixState::new(sources, destinations);
    if destinations > 0 {
        for s in 0..sources {
            let _ = mono.connect(s, 0);
        }
    }

    vec![
        RoutingPreset::new("Passthrough", &passthrough)
            .with_description("Channel N to channel N"),
        RoutingPreset::new("Swap Pairs", &swapped)
            .with_description("Adjacent channel pairs crossed"),
        RoutingPreset::new("Mono Sum", &mono)
            .with_description("All sources summed into the first destination"),
    ]
}
