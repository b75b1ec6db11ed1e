//! Shot driver.
//!
//! [`Controller::run`] is the reference way to drive any [`State`]:
//!
//! 1. validate the circuit's [`OpSet`] against the backend,
//! 2. check the memory estimate against the configured limit,
//! 3. forward the parallelism hint,
//! 4. run the shots.
//!
//! Shots use the measurement-sampling fast path when the circuit allows it
//! and the backend provides samples; otherwise every shot re-initializes the
//! state and applies the whole circuit.

use std::time::Instant;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::ControllerConfig;
use crate::error::{StateError, StateResult};
use crate::operation::{Op, OpKind, OpSet};
use crate::result::OutputData;
use crate::rng::RngEngine;
use crate::state::{State, StateExt};

/// A circuit ready to execute.
///
/// The op list is fixed at construction so the derived [`OpSet`] always
/// describes it. Deserialization rebuilds the op set from the ops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CircuitFields")]
pub struct Circuit {
    /// Number of qubits.
    pub num_qubits: usize,
    /// Width of classical memory.
    pub num_memory: usize,
    /// Width of the classical register.
    pub num_registers: usize,
    ops: Vec<Op>,
    #[serde(skip)]
    opset: OpSet,
}

#[derive(Deserialize)]
struct CircuitFields {
    num_qubits: usize,
    num_memory: usize,
    num_registers: usize,
    ops: Vec<Op>,
}

impl From<CircuitFields> for Circuit {
    fn from(fields: CircuitFields) -> Self {
        Circuit::new(fields.num_qubits, fields.ops)
            .with_creg_sizes(fields.num_memory, fields.num_registers)
    }
}

impl Circuit {
    /// Create a circuit, sizing classical memory and register from the
    /// highest bit index the ops touch.
    pub fn new(num_qubits: usize, ops: Vec<Op>) -> Self {
        let num_memory = ops
            .iter()
            .flat_map(|op| op.memory.iter().copied())
            .max()
            .map_or(0, |bit| bit + 1);
        let num_registers = ops
            .iter()
            .flat_map(|op| op.registers.iter().copied().chain(op.conditional))
            .max()
            .map_or(0, |bit| bit + 1);
        let opset = OpSet::from_ops(&ops);
        Self {
            num_qubits,
            num_memory,
            num_registers,
            ops,
            opset,
        }
    }

    /// Override the classical widths.
    pub fn with_creg_sizes(mut self, num_memory: usize, num_registers: usize) -> Self {
        self.num_memory = num_memory;
        self.num_registers = num_registers;
        self
    }

    /// Operations in program order.
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Aggregate of [`Circuit::ops`].
    pub fn opset(&self) -> &OpSet {
        &self.opset
    }

    /// Consume the circuit, returning its ops.
    pub fn into_ops(self) -> Vec<Op> {
        self.ops
    }

    /// Index of the first measurement if the circuit can be sampled.
    ///
    /// Sampling requires every op from the first measurement on to be a
    /// measurement or barrier, and no op anywhere whose effect differs
    /// between shots or depends on classical bits (reset, bfunc, kraus,
    /// snapshot, conditional).
    pub fn measure_sampling_split(&self) -> Option<usize> {
        let disqualifying = [OpKind::Reset, OpKind::Bfunc, OpKind::Kraus, OpKind::Snapshot];
        if self
            .ops
            .iter()
            .any(|op| disqualifying.contains(&op.kind) || op.conditional.is_some())
        {
            return None;
        }
        let first = self.ops.iter().position(|op| op.kind == OpKind::Measure)?;
        self.ops[first..]
            .iter()
            .all(|op| matches!(op.kind, OpKind::Measure | OpKind::Barrier))
            .then_some(first)
    }
}

/// Drives a [`State`] through the shots of a circuit.
#[derive(Debug, Clone, Default)]
pub struct Controller {
    config: ControllerConfig,
}

impl Controller {
    /// Create a controller.
    pub fn new(config: ControllerConfig) -> Self {
        Self { config }
    }

    /// Create a controller from a JSON configuration object.
    pub fn from_json(config: &serde_json::Value) -> StateResult<Self> {
        ControllerConfig::from_json(config).map(Self::new)
    }

    /// Controller settings.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Fail with a capability violation if `state` cannot run `circuit`.
    pub fn validate<S: State + ?Sized>(&self, state: &S, circuit: &Circuit) -> StateResult<()> {
        if state.validate_opset(circuit.opset()) {
            return Ok(());
        }
        let message = state.invalid_opset_message(circuit.opset());
        warn!(backend = state.name(), %message, "circuit rejected");
        Err(StateError::invalid_instructions(state.name(), message))
    }

    /// Run `shots` shots of `circuit` on `state`.
    #[instrument(skip_all, fields(backend = state.name(), shots = shots))]
    pub fn run<S: State + ?Sized>(
        &self,
        state: &mut S,
        circuit: &Circuit,
        shots: usize,
        rng: &mut RngEngine,
    ) -> StateResult<OutputData> {
        let start = Instant::now();
        self.validate(&*state, circuit)?;

        if self.config.max_memory_mb > 0 {
            let required_mb = state.required_memory_mb(circuit.num_qubits, circuit.ops());
            if required_mb > self.config.max_memory_mb {
                return Err(StateError::InsufficientMemory {
                    required_mb,
                    limit_mb: self.config.max_memory_mb,
                });
            }
        }
        state.set_parallelization(self.config.max_parallel_threads);

        let mut data = OutputData::new();
        let sampled = match circuit.measure_sampling_split() {
            Some(split) if self.config.measure_sampling && shots > 1 => {
                run_sampled(state, circuit, split, shots, rng, &mut data)?
            }
            _ => false,
        };

        if !sampled {
            for shot in 0..shots {
                run_shot(state, circuit, rng, &mut data)?;
                if shot > 0 && shot % 1000 == 0 {
                    debug!("Completed {} shots", shot);
                }
            }
        }

        let elapsed = start.elapsed();
        debug!(sampled, "Run completed in {:?}", elapsed);
        Ok(data.with_execution_time(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)))
    }
}

fn run_shot<S: State + ?Sized>(
    state: &mut S,
    circuit: &Circuit,
    rng: &mut RngEngine,
    data: &mut OutputData,
) -> StateResult<()> {
    state.initialize_qreg(circuit.num_qubits);
    state.initialize_creg(circuit.num_memory, circuit.num_registers);
    state.apply_ops(circuit.ops(), data, rng)?;
    state.add_creg_to_data(data);
    Ok(())
}

/// Run the pre-measurement prefix once and sample the trailing measurements.
///
/// Returns `Ok(false)` without recording anything if the backend has no
/// sampling fast path.
fn run_sampled<S: State + ?Sized>(
    state: &mut S,
    circuit: &Circuit,
    split: usize,
    shots: usize,
    rng: &mut RngEngine,
    data: &mut OutputData,
) -> StateResult<bool> {
    let (prefix, measurements) = circuit.ops().split_at(split);
    let measurements: Vec<&Op> = measurements
        .iter()
        .filter(|op| op.kind == OpKind::Measure)
        .collect();

    let mut qubits = Vec::new();
    let mut position = FxHashMap::default();
    for &qubit in measurements.iter().flat_map(|op| op.qubits.iter()) {
        position.entry(qubit).or_insert_with(|| {
            qubits.push(qubit);
            qubits.len() - 1
        });
    }

    state.initialize_qreg(circuit.num_qubits);
    state.initialize_creg(circuit.num_memory, circuit.num_registers);
    state.apply_ops(prefix, data, rng)?;

    let samples = state.sample_measure(&qubits, shots, rng);
    if samples.is_empty() {
        debug!("no sampling fast path, measuring shot by shot");
        return Ok(false);
    }
    if samples.len() != shots {
        return Err(StateError::Backend(format!(
            "sample_measure returned {} outcomes for {shots} shots",
            samples.len()
        )));
    }
    debug!(qubits = qubits.len(), "using measurement sampling");

    for sample in &samples {
        state.initialize_creg(circuit.num_memory, circuit.num_registers);
        for op in &measurements {
            let outcome = op
                .qubits
                .iter()
                .map(|qubit| {
                    sample.get(position[qubit]).copied().ok_or_else(|| {
                        StateError::Backend(format!(
                            "sampled outcome has {} bits, expected {}",
                            sample.len(),
                            qubits.len()
                        ))
                    })
                })
                .collect::<StateResult<Vec<u8>>>()?;
            state
                .base_mut()
                .creg_mut()
                .store_measure(&outcome, &op.memory, &op.registers)?;
        }
        state.add_creg_to_data(data);
    }
    Ok(true)
}
