//! Deterministic computational-basis backend used by the integration tests.
//!
//! The state is one bit per qubit, so every gate it supports (`x`, `cx`,
//! `swap`, `id`) maps basis states to basis states and every measurement is
//! deterministic.

#![allow(dead_code)]

use state_contract::config;
use state_contract::{
    CapabilitySet, Op, OpKind, OutputData, RngEngine, SnapshotKind, State, StateBase, StateError,
    StateExt, StateResult,
};

pub const BASIS_SNAPSHOT: &str = "basis";

pub struct BasisState {
    caps: CapabilitySet,
    base: StateBase<Vec<u8>>,
    memory_mb: usize,
    sampling: bool,
    pub sample_calls: usize,
}

impl BasisState {
    pub fn new() -> Self {
        Self {
            caps: CapabilitySet::new(
                [
                    OpKind::Gate,
                    OpKind::Measure,
                    OpKind::Reset,
                    OpKind::Bfunc,
                    OpKind::Barrier,
                    OpKind::Snapshot,
                ],
                ["x", "cx", "swap", "id"],
                [
                    BASIS_SNAPSHOT,
                    SnapshotKind::Memory.as_str(),
                    SnapshotKind::Register.as_str(),
                ],
            ),
            base: StateBase::default(),
            memory_mb: 1,
            sampling: true,
            sample_calls: 0,
        }
    }

    fn bit(&self, qubit: usize) -> StateResult<u8> {
        self.base
            .qreg()
            .get(qubit)
            .copied()
            .ok_or_else(|| StateError::Backend(format!("qubit {qubit} out of range")))
    }

    fn set_bit(&mut self, qubit: usize, value: u8) -> StateResult<()> {
        let slot = self
            .base
            .qreg_mut()
            .get_mut(qubit)
            .ok_or_else(|| StateError::Backend(format!("qubit {qubit} out of range")))?;
        *slot = value;
        Ok(())
    }

    fn apply_gate(&mut self, op: &Op) -> StateResult<()> {
        match (op.name.as_str(), op.qubits.as_slice()) {
            ("id", _) => Ok(()),
            ("x", &[q]) => {
                let value = self.bit(q)?;
                self.set_bit(q, value ^ 1)
            }
            ("cx", &[c, t]) => {
                let value = self.bit(t)? ^ self.bit(c)?;
                self.set_bit(t, value)
            }
            ("swap", &[a, b]) => {
                let (va, vb) = (self.bit(a)?, self.bit(b)?);
                self.set_bit(a, vb)?;
                self.set_bit(b, va)
            }
            _ => Err(StateError::invalid_parameter(&op.name, "wrong number of qubits")),
        }
    }

    fn apply_op(&mut self, op: &Op, data: &mut OutputData) -> StateResult<()> {
        match op.kind {
            OpKind::Gate => self.apply_gate(op),
            OpKind::Measure => {
                let outcome = op
                    .qubits
                    .iter()
                    .map(|&q| self.bit(q))
                    .collect::<StateResult<Vec<u8>>>()?;
                self.base
                    .creg_mut()
                    .store_measure(&outcome, &op.memory, &op.registers)
            }
            OpKind::Reset => op.qubits.iter().try_for_each(|&q| self.set_bit(q, 0)),
            OpKind::Bfunc => self.base.creg_mut().apply_bfunc(op),
            OpKind::Barrier => Ok(()),
            OpKind::Snapshot => match op.name.as_str() {
                "memory" => self.snapshot_creg_memory(op, data, None),
                "register" => self.snapshot_creg_register(op, data, None),
                _ => self.snapshot_state(op, data, None),
            },
            OpKind::Matrix | OpKind::Kraus => Err(StateError::invalid_instructions(
                self.name(),
                format!("{} not representable in a basis state", op.kind),
            )),
        }
    }
}

impl State for BasisState {
    type Qreg = Vec<u8>;

    fn name(&self) -> &str {
        "basis"
    }

    fn capabilities(&self) -> &CapabilitySet {
        &self.caps
    }

    fn base(&self) -> &StateBase<Vec<u8>> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StateBase<Vec<u8>> {
        &mut self.base
    }

    fn apply_ops(
        &mut self,
        ops: &[Op],
        data: &mut OutputData,
        _rng: &mut RngEngine,
    ) -> StateResult<()> {
        for op in ops {
            self.caps.check_op(self.name(), op)?;
            if !self.base.creg().check_conditional(op)? {
                continue;
            }
            self.apply_op(op, data)?;
        }
        Ok(())
    }

    fn initialize_qreg(&mut self, num_qubits: usize) {
        *self.base.qreg_mut() = vec![0; num_qubits];
    }

    fn initialize_qreg_from(&mut self, num_qubits: usize, state: Vec<u8>) -> StateResult<()> {
        if state.len() != num_qubits {
            return Err(StateError::DimensionMismatch {
                expected: num_qubits,
                actual: state.len(),
            });
        }
        if state.iter().any(|&b| b > 1) {
            return Err(StateError::invalid_parameter("initialize_qreg", "bits must be 0 or 1"));
        }
        *self.base.qreg_mut() = state;
        Ok(())
    }

    fn required_memory_mb(&self, _num_qubits: usize, _ops: &[Op]) -> usize {
        self.memory_mb
    }

    fn set_config(&mut self, config: &serde_json::Value) -> StateResult<()> {
        if let Some(memory_mb) = config::get_value(config, "memory_mb")? {
            self.memory_mb = memory_mb;
        }
        if let Some(sampling) = config::get_value(config, "sampling")? {
            self.sampling = sampling;
        }
        Ok(())
    }

    fn sample_measure(
        &mut self,
        qubits: &[usize],
        shots: usize,
        _rng: &mut RngEngine,
    ) -> Vec<Vec<u8>> {
        if !self.sampling {
            return Vec::new();
        }
        self.sample_calls += 1;
        let outcome: Vec<u8> = qubits
            .iter()
            .map(|&q| self.base.qreg().get(q).copied().unwrap_or(0))
            .collect();
        vec![outcome; shots]
    }
}
