//! State Contract — Backend State Interface for Shot-Based Quantum Simulation
//!
//! This crate defines the boundary between a simulation controller and the
//! interchangeable engines that hold a concrete quantum state (dense
//! statevector, density matrix, stabilizer tableau, tensor network, ...).
//! Any engine implements the [`State`] trait to be driven by a controller.
//!
//! # Overview
//!
//! The contract defines:
//! - A [`State`] trait with required and optional-with-default operations
//! - [`StateBase`] / [`StateExt`] for the bookkeeping every backend shares
//! - [`CapabilitySet`] to declare supported kinds, gates and snapshots
//! - [`Op`] / [`OpSet`] for the operations a circuit uses
//! - [`ClassicalRegister`] for per-shot classical bits
//! - [`OutputData`] / [`Counts`] for recorded results and snapshots
//! - [`StateError`] with categorized error variants
//! - [`Controller`] as the reference shot driver
//!
//! # The State Trait
//!
//! The trait is generic over the backend's representation through the
//! associated `Qreg` type:
//!
//! ```ignore
//! use state_contract::{CapabilitySet, Op, OutputData, RngEngine, State, StateBase, StateResult};
//!
//! struct MyState { caps: CapabilitySet, base: StateBase<MyAmplitudes> }
//!
//! impl State for MyState {
//!     type Qreg = MyAmplitudes;
//!     fn name(&self) -> &str { "my_state" }
//!     fn capabilities(&self) -> &CapabilitySet { &self.caps }
//!     // ... implement remaining methods
//! }
//! ```
//!
//! # Lifecycle
//!
//! ```text
//!   validate_opset() ──→ initialize_qreg() ──→ apply_ops() ──→ add_creg_to_data()
//!    (once/circuit)      initialize_creg()     (per shot)       (per shot)
//! ```

pub mod capability;
pub mod config;
pub mod controller;
pub mod creg;
pub mod error;
pub mod operation;
pub mod result;
pub mod rng;
pub mod snapshot;
pub mod state;

pub use capability::CapabilitySet;
pub use config::ControllerConfig;
pub use controller::{Circuit, Controller};
pub use creg::ClassicalRegister;
pub use error::{StateError, StateResult};
pub use operation::{Op, OpKind, OpSet};
pub use result::{Counts, OutputData, SnapshotData};
pub use rng::RngEngine;
pub use snapshot::SnapshotKind;
pub use state::{State, StateBase, StateExt};
