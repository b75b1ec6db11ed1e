//! The backend state contract.
//!
//! Every simulation backend (dense statevector, density matrix, stabilizer
//! tableau, tensor network, ...) implements [`State`] once for its own
//! representation type. The controller drives all of them the same way:
//!
//! ```text
//!   validate_opset() ──→ initialize_qreg() ──→ apply_ops() ──→ add_creg_to_data()
//!                        initialize_creg()     (per shot)      (per shot)
//! ```
//!
//! ## Layers
//!
//! - [`State`]: what each backend writes. Required methods cover execution,
//!   initialization, memory estimation and capability declaration. Two
//!   optional methods (`set_config`, `sample_measure`) have defaults.
//! - [`StateBase`]: the glue every backend embeds by value. It owns the
//!   quantum register, the [`ClassicalRegister`] and the parallelism hint,
//!   and implements classical-register and snapshot bookkeeping.
//! - [`StateExt`]: fixed behaviour available on every `State`. It is
//!   blanket-implemented, so backends cannot override it.
//!
//! ## Method table
//!
//! | Method | Layer | Required | Returns |
//! |--------|-------|----------|---------|
//! | `name()` | `State` | yes | `&str` |
//! | `capabilities()` | `State` | yes | `&CapabilitySet` |
//! | `apply_ops()` | `State` | yes | `StateResult<()>` |
//! | `initialize_qreg()` | `State` | yes | `()` |
//! | `initialize_qreg_from()` | `State` | yes | `StateResult<()>` |
//! | `required_memory_mb()` | `State` | yes | `usize` |
//! | `set_config()` | `State` | provided | `StateResult<()>` |
//! | `sample_measure()` | `State` | provided | `Vec<Vec<u8>>` |
//! | `validate_opset()` | `StateExt` | fixed | `bool` |
//! | `invalid_opset_message()` | `StateExt` | fixed | `String` |
//! | `initialize_creg*()`, `snapshot_*()`, `add_creg_to_data()` | `StateExt` | fixed | |
//!
//! ## Ownership
//!
//! A state is driven by one owner at a time; every mutating method takes
//! `&mut self` and nothing here locks. Separate instances share nothing, so
//! running one instance per thread is safe.

use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::debug;

use crate::capability::CapabilitySet;
use crate::creg::ClassicalRegister;
use crate::error::StateResult;
use crate::operation::{Op, OpKind, OpSet};
use crate::result::OutputData;
use crate::rng::RngEngine;

/// Default label of a classical memory snapshot.
pub const MEMORY_SNAPSHOT_LABEL: &str = "memory";
/// Default label of a classical register snapshot.
pub const REGISTER_SNAPSHOT_LABEL: &str = "register";

/// Shared data and bookkeeping embedded in every backend.
#[derive(Debug, Clone)]
pub struct StateBase<Q> {
    qreg: Q,
    creg: ClassicalRegister,
    threads: i32,
}

impl<Q: Default> Default for StateBase<Q> {
    fn default() -> Self {
        Self::new(Q::default())
    }
}

impl<Q> StateBase<Q> {
    /// Wrap an initial quantum register. The parallelism hint starts at 1.
    pub fn new(qreg: Q) -> Self {
        Self {
            qreg,
            creg: ClassicalRegister::new(),
            threads: 1,
        }
    }

    /// The quantum register.
    pub fn qreg(&self) -> &Q {
        &self.qreg
    }

    /// Mutable access to the quantum register.
    pub fn qreg_mut(&mut self) -> &mut Q {
        &mut self.qreg
    }

    /// The classical register.
    pub fn creg(&self) -> &ClassicalRegister {
        &self.creg
    }

    /// Mutable access to the classical register.
    pub fn creg_mut(&mut self) -> &mut ClassicalRegister {
        &mut self.creg
    }

    /// Reset classical memory and register to all zeros.
    pub fn initialize_creg(&mut self, num_memory: usize, num_register: usize) {
        debug!(num_memory, num_register, "initializing classical register");
        self.creg.initialize(num_memory, num_register);
    }

    /// Reset classical memory and register to the given hex values.
    pub fn initialize_creg_from_hex(
        &mut self,
        num_memory: usize,
        num_register: usize,
        memory_hex: &str,
        register_hex: &str,
    ) -> StateResult<()> {
        debug!(
            num_memory,
            num_register, memory_hex, register_hex, "initializing classical register from hex"
        );
        self.creg
            .initialize_from_hex(num_memory, num_register, memory_hex, register_hex)
    }

    /// Push the current classical bits of this shot into `data`.
    ///
    /// Zero-sized memory or register arrays produce no records.
    pub fn add_creg_to_data(&self, data: &mut OutputData) {
        if self.creg.memory_size() > 0 {
            let memory_hex = self.creg.memory_hex();
            data.add_memory_count(&memory_hex);
            data.add_memory_singleshot(&memory_hex);
        }
        if self.creg.register_size() > 0 {
            data.add_register_singleshot(&self.creg.register_hex());
        }
    }

    /// Record the classical memory as a snapshot.
    ///
    /// The label defaults to `"memory"` when absent or empty; the type tag is `op`'s first string
    /// parameter.
    pub fn snapshot_creg_memory(
        &self,
        op: &Op,
        data: &mut OutputData,
        label: Option<&str>,
    ) -> StateResult<()> {
        let label = label_or(label, MEMORY_SNAPSHOT_LABEL);
        data.add_singleshot_snapshot(label, op.first_string_param()?, &self.creg.memory_hex())
    }

    /// Record the classical register as a snapshot.
    ///
    /// The label defaults to `"register"` when absent or empty; the type tag
    /// is `op`'s first string parameter.
    pub fn snapshot_creg_register(
        &self,
        op: &Op,
        data: &mut OutputData,
        label: Option<&str>,
    ) -> StateResult<()> {
        let label = label_or(label, REGISTER_SNAPSHOT_LABEL);
        data.add_singleshot_snapshot(label, op.first_string_param()?, &self.creg.register_hex())
    }

    /// Set the worker-count hint for backend kernels. Negative means unrestricted.
    pub fn set_parallelization(&mut self, threads: i32) {
        self.threads = threads;
    }

    /// The worker-count hint.
    pub fn parallelization(&self) -> i32 {
        self.threads
    }
}

impl<Q: Serialize> StateBase<Q> {
    /// Record the full quantum register as a snapshot.
    ///
    /// The label defaults to `op.name` when absent or empty; the type tag is
    /// `op`'s first string parameter. The register is only read.
    pub fn snapshot_state(
        &self,
        op: &Op,
        data: &mut OutputData,
        label: Option<&str>,
    ) -> StateResult<()> {
        let label = label_or(label, &op.name);
        data.add_singleshot_snapshot(label, op.first_string_param()?, &self.qreg)
    }
}

fn label_or<'a>(label: Option<&'a str>, default: &'a str) -> &'a str {
    match label {
        Some(label) if !label.is_empty() => label,
        _ => default,
    }
}

/// Contract implemented by every simulation backend.
pub trait State {
    /// Concrete state representation (amplitudes, tableau, ...).
    type Qreg: Serialize;

    /// Stable identifier of the backend variant.
    fn name(&self) -> &str;

    /// Instructions this backend supports.
    ///
    /// MUST return the same set for the lifetime of the backend.
    fn capabilities(&self) -> &CapabilitySet;

    /// Shared bookkeeping embedded in the backend.
    fn base(&self) -> &StateBase<Self::Qreg>;

    /// Mutable access to the shared bookkeeping.
    fn base_mut(&mut self) -> &mut StateBase<Self::Qreg>;

    /// Apply `ops` to the current state, in order.
    ///
    /// The backend may execute the sequence however it likes as long as the
    /// observable result equals in-order application. MUST fail with a
    /// capability violation on any op outside [`capabilities`](State::capabilities).
    fn apply_ops(
        &mut self,
        ops: &[Op],
        data: &mut OutputData,
        rng: &mut RngEngine,
    ) -> StateResult<()>;

    /// Reset to the all-zero state on `num_qubits` qubits.
    fn initialize_qreg(&mut self, num_qubits: usize);

    /// Reset to a supplied state.
    ///
    /// MUST fail with [`StateError::DimensionMismatch`](crate::StateError::DimensionMismatch)
    /// if `state` does not describe `num_qubits` qubits.
    fn initialize_qreg_from(&mut self, num_qubits: usize, state: Self::Qreg) -> StateResult<()>;

    /// Estimated memory needed to run `ops` on `num_qubits` qubits.
    fn required_memory_mb(&self, num_qubits: usize, ops: &[Op]) -> usize;

    /// Load backend-specific settings. Does nothing by default.
    fn set_config(&mut self, _config: &serde_json::Value) -> StateResult<()> {
        Ok(())
    }

    /// Sample `shots` measurement outcomes of `qubits` without measuring.
    ///
    /// Each outcome holds one bit per entry of `qubits`, in the same order.
    /// The quantum state MUST be left exactly as it was. The default returns
    /// no samples, which tells the caller to measure shot by shot instead.
    fn sample_measure(
        &mut self,
        _qubits: &[usize],
        _shots: usize,
        _rng: &mut RngEngine,
    ) -> Vec<Vec<u8>> {
        Vec::new()
    }
}

/// Fixed behaviour shared by every [`State`].
pub trait StateExt: State {
    /// Allowed operation kinds.
    fn allowed_ops(&self) -> &FxHashSet<OpKind> {
        &self.capabilities().op_kinds
    }

    /// Allowed gate names.
    fn allowed_gates(&self) -> &FxHashSet<String> {
        &self.capabilities().gates
    }

    /// Allowed snapshot names.
    fn allowed_snapshots(&self) -> &FxHashSet<String> {
        &self.capabilities().snapshots
    }

    /// Return `true` if this backend supports everything in `opset`.
    fn validate_opset(&self, opset: &OpSet) -> bool {
        let valid = self.capabilities().validate(opset);
        if !valid {
            debug!(backend = self.name(), %opset, "op set not supported");
        }
        valid
    }

    /// Diagnostic naming what this backend does not support in `opset`.
    fn invalid_opset_message(&self, opset: &OpSet) -> String {
        self.capabilities().invalid_opset_message(opset)
    }

    /// Reset classical memory and register to all zeros.
    fn initialize_creg(&mut self, num_memory: usize, num_register: usize) {
        self.base_mut().initialize_creg(num_memory, num_register);
    }

    /// Reset classical memory and register to the given hex values.
    fn initialize_creg_from_hex(
        &mut self,
        num_memory: usize,
        num_register: usize,
        memory_hex: &str,
        register_hex: &str,
    ) -> StateResult<()> {
        self.base_mut()
            .initialize_creg_from_hex(num_memory, num_register, memory_hex, register_hex)
    }

    /// Push the current classical bits into `data`.
    fn add_creg_to_data(&self, data: &mut OutputData) {
        self.base().add_creg_to_data(data);
    }

    /// Snapshot the quantum register.
    fn snapshot_state(
        &self,
        op: &Op,
        data: &mut OutputData,
        label: Option<&str>,
    ) -> StateResult<()> {
        self.base().snapshot_state(op, data, label)
    }

    /// Snapshot the classical memory.
    fn snapshot_creg_memory(
        &self,
        op: &Op,
        data: &mut OutputData,
        label: Option<&str>,
    ) -> StateResult<()> {
        self.base().snapshot_creg_memory(op, data, label)
    }

    /// Snapshot the classical register.
    fn snapshot_creg_register(
        &self,
        op: &Op,
        data: &mut OutputData,
        label: Option<&str>,
    ) -> StateResult<()> {
        self.base().snapshot_creg_register(op, data, label)
    }

    /// Set the worker-count hint.
    fn set_parallelization(&mut self, threads: i32) {
        self.base_mut().set_parallelization(threads);
    }

    /// The worker-count hint.
    fn parallelization(&self) -> i32 {
        self.base().parallelization()
    }

    /// The quantum register.
    fn qreg(&self) -> &Self::Qreg {
        self.base().qreg()
    }

    /// The classical register.
    fn creg(&self) -> &ClassicalRegister {
        self.base().creg()
    }
}

impl<S: State + ?Sized> StateExt for S {}
