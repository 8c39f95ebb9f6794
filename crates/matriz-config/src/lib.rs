//! Matriz Config - persistence for the matriz routing core.
//!
//! The core's live types carry no serialization concerns; this crate owns
//! the stored representations and the conversions between the two:
//!
//! - [`StoredBank`] / [`save_state`] / [`load_state`] - the opaque byte
//!   block a host session saves and restores. Round-trips the program
//!   bank, the current program index, and the active matrix exactly; the
//!   byte layout is an implementation detail of this crate, versioned by
//!   the embedding application.
//! - [`RoutingPreset`] - single routing configurations as TOML files on
//!   disk, plus [`factory_presets`] for the built-ins.
//! - [`BankError`] - everything that can go wrong, with corrupt stored
//!   data rejected before the router is touched.
//!
//! # Example
//!
//! ```rust
//! use matriz_config::{load_state, save_state};
//! use matriz_core::{MatrixState, RouterNode};
//!
//! let mut router = RouterNode::new(4, 4);
//! let mut state = MatrixState::new(4, 4);
//! state.connect(0, 0).unwrap();
//! router.set_matrix(&state).unwrap();
//! router.add_program("straight", Some(1));
//!
//! let bytes = save_state(&router).unwrap();
//!
//! let mut restored = RouterNode::new(4, 4);
//! load_state(&mut restored, &bytes).unwrap();
//! assert_eq!(restored.bank().len(), 1);
//! ```

pub mod bank;
pub mod error;
pub mod preset;

pub use bank::{StoredBank, StoredMatrix, StoredProgram, load_state, save_state};
pub use error::BankError;
pub use preset::{RoutingPreset, factory_presets};
