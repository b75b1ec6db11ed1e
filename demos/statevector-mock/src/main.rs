//! Minimal dense statevector backend implementing the state contract.
//!
//! This demo shows how to implement the `State` trait for a small
//! in-memory simulator and drive it through the reference `Controller`.
//!
//! Run with `RUST_LOG=debug` to see the controller's decisions.

use num_complex::Complex64;
use serde::Serialize;
use state_contract::config;
use state_contract::{
    CapabilitySet, Circuit, Controller, Op, OpKind, OutputData, RngEngine, SnapshotKind, State,
    StateBase, StateError, StateExt, StateResult,
};
use tracing::debug;

/// Widest register this backend allocates.
const MAX_QUBITS: usize = 30;

/// Amplitudes of an n-qubit state; index bit `q` is qubit `q`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
struct Statevector {
    amplitudes: Vec<Complex64>,
}

impl Statevector {
    /// The all-zero state, or `None` past [`MAX_QUBITS`].
    fn zero(num_qubits: usize) -> Option<Self> {
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); dimension(num_qubits)?];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Some(Self { amplitudes })
    }

    fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }
}

fn dimension(num_qubits: usize) -> Option<usize> {
    (num_qubits <= MAX_QUBITS).then(|| 1 << num_qubits)
}

/// In-memory statevector backend.
struct StatevectorState {
    caps: CapabilitySet,
    base: StateBase<Statevector>,
    num_qubits: usize,
    parallel_threshold: usize,
}

impl StatevectorState {
    fn new() -> Self {
        Self {
            caps: CapabilitySet::new(
                [
                    OpKind::Gate,
                    OpKind::Measure,
                    OpKind::Reset,
                    OpKind::Barrier,
                    OpKind::Snapshot,
                ],
                ["id", "x", "z", "h", "cx"],
                [
                    SnapshotKind::Statevector,
                    SnapshotKind::Probabilities,
                    SnapshotKind::Memory,
                    SnapshotKind::Register,
                ]
                .map(|kind| kind.as_str()),
            ),
            base: StateBase::default(),
            num_qubits: 0,
            parallel_threshold: 14,
        }
    }

    fn check_qubit(&self, qubit: usize) -> StateResult<usize> {
        if qubit < self.num_qubits {
            Ok(1 << qubit)
        } else {
            Err(StateError::Backend(format!(
                "qubit {qubit} out of range for {} qubits",
                self.num_qubits
            )))
        }
    }

    fn check_width(&self) -> StateResult<()> {
        if self.num_qubits > MAX_QUBITS {
            return Err(StateError::Backend(format!(
                "{} qubits exceeds the {MAX_QUBITS} qubit limit",
                self.num_qubits
            )));
        }
        Ok(())
    }

    fn amplitudes(&mut self) -> &mut Vec<Complex64> {
        &mut self.base.qreg_mut().amplitudes
    }

    fn apply_gate(&mut self, op: &Op) -> StateResult<()> {
        let masks = op
            .qubits
            .iter()
            .map(|&q| self.check_qubit(q))
            .collect::<StateResult<Vec<_>>>()?;
        match (op.name.as_str(), masks.as_slice()) {
            ("id", _) => {}
            ("x", &[mask]) => {
                for i in 0..self.amplitudes().len() {
                    if i & mask == 0 {
                        self.amplitudes().swap(i, i | mask);
                    }
                }
            }
            ("z", &[mask]) => {
                for (i, amp) in self.amplitudes().iter_mut().enumerate() {
                    if i & mask != 0 {
                        *amp = -*amp;
                    }
                }
            }
            ("h", &[mask]) => {
                let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
                let amps = self.amplitudes();
                for i in 0..amps.len() {
                    if i & mask == 0 {
                        let (a, b) = (amps[i], amps[i | mask]);
                        amps[i] = sqrt2_inv * (a + b);
                        amps[i | mask] = sqrt2_inv * (a - b);
                    }
                }
            }
            ("cx", &[ctrl, tgt]) => {
                let amps = self.amplitudes();
                for i in 0..amps.len() {
                    if i & ctrl != 0 && i & tgt == 0 {
                        amps.swap(i, i | tgt);
                    }
                }
            }
            _ => {
                return Err(StateError::invalid_parameter(
                    &op.name,
                    "wrong number of qubits",
                ));
            }
        }
        Ok(())
    }

    /// Measure one qubit, collapsing the state.
    fn measure_qubit(&mut self, qubit: usize, rng: &mut RngEngine) -> StateResult<u8> {
        let mask = self.check_qubit(qubit)?;
        let p1: f64 = self
            .base
            .qreg()
            .amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum();
        let outcome = u8::from(rng.rand() < p1);
        let norm = if outcome == 1 { p1 } else { 1.0 - p1 }.sqrt();
        for (i, amp) in self.amplitudes().iter_mut().enumerate() {
            if u8::from(i & mask != 0) == outcome {
                *amp /= norm;
            } else {
                *amp = Complex64::new(0.0, 0.0);
            }
        }
        Ok(outcome)
    }

    fn apply_op(&mut self, op: &Op, data: &mut OutputData, rng: &mut RngEngine) -> StateResult<()> {
        match op.kind {
            OpKind::Gate => self.apply_gate(op),
            OpKind::Measure => {
                let outcome = op
                    .qubits
                    .iter()
                    .map(|&q| self.measure_qubit(q, rng))
                    .collect::<StateResult<Vec<u8>>>()?;
                self.base
                    .creg_mut()
                    .store_measure(&outcome, &op.memory, &op.registers)
            }
            OpKind::Reset => {
                for &q in &op.qubits {
                    if self.measure_qubit(q, rng)? == 1 {
                        self.apply_gate(&Op::gate("x", vec![q]))?;
                    }
                }
                Ok(())
            }
            OpKind::Barrier => Ok(()),
            OpKind::Snapshot => match op.name.as_str() {
                "memory" => self.snapshot_creg_memory(op, data, None),
                "register" => self.snapshot_creg_register(op, data, None),
                "probabilities" => data.add_singleshot_snapshot(
                    &op.name,
                    op.first_string_param()?,
                    &self.base.qreg().probabilities(),
                ),
                _ => self.snapshot_state(op, data, None),
            },
            _ => Err(StateError::invalid_instructions(
                self.name(),
                format!("{} is not implemented", op.kind),
            )),
        }
    }
}

impl State for StatevectorState {
    type Qreg = Statevector;

    fn name(&self) -> &str {
        "statevector-mock"
    }

    fn capabilities(&self) -> &CapabilitySet {
        &self.caps
    }

    fn base(&self) -> &StateBase<Statevector> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StateBase<Statevector> {
        &mut self.base
    }

    fn apply_ops(
        &mut self,
        ops: &[Op],
        data: &mut OutputData,
        rng: &mut RngEngine,
    ) -> StateResult<()> {
        self.check_width()?;
        if self.num_qubits >= self.parallel_threshold {
            debug!(threads = self.parallelization(), "large state, kernels may parallelize");
        }
        for op in ops {
            self.caps.check_op(self.name(), op)?;
            if self.base.creg().check_conditional(op)? {
                self.apply_op(op, data, rng)?;
            }
        }
        Ok(())
    }

    fn initialize_qreg(&mut self, num_qubits: usize) {
        self.num_qubits = num_qubits;
        *self.base.qreg_mut() = Statevector::zero(num_qubits).unwrap_or_default();
    }

    fn initialize_qreg_from(&mut self, num_qubits: usize, state: Statevector) -> StateResult<()> {
        let expected = dimension(num_qubits).ok_or_else(|| {
            StateError::Backend(format!("{num_qubits} qubits exceeds the {MAX_QUBITS} qubit limit"))
        })?;
        if state.amplitudes.len() != expected {
            return Err(StateError::DimensionMismatch {
                expected,
                actual: state.amplitudes.len(),
            });
        }
        self.num_qubits = num_qubits;
        *self.base.qreg_mut() = state;
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn required_memory_mb(&self, num_qubits: usize, _ops: &[Op]) -> usize {
        let bytes = 16.0 * 2f64.powi(i32::try_from(num_qubits).unwrap_or(i32::MAX));
        (bytes / 1_048_576.0).ceil() as usize
    }

    fn set_config(&mut self, config: &serde_json::Value) -> StateResult<()> {
        if let Some(threshold) = config::get_value(config, "parallel_threshold")? {
            self.parallel_threshold = threshold;
        }
        Ok(())
    }

    fn sample_measure(
        &mut self,
        qubits: &[usize],
        shots: usize,
        rng: &mut RngEngine,
    ) -> Vec<Vec<u8>> {
        let probabilities = self.base.qreg().probabilities();
        (0..shots)
            .map(|_| {
                let index = rng.rand_int(&probabilities)?;
                Some(qubits.iter().map(|&q| ((index >> q) & 1) as u8).collect())
            })
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut state = StatevectorState::new();
    state.set_config(&serde_json::json!({"parallel_threshold": 20}))?;
    let controller = Controller::from_json(&serde_json::json!({"max_memory_mb": 1024}))?;
    let mut rng = RngEngine::with_seed(2024);

    println!("Backend: {}", state.name());
    println!("Gates:   {}", state.allowed_gates().len());
    println!();

    // Bell circuit
    let bell = Circuit::new(
        2,
        vec![
            Op::gate("h", vec![0]),
            Op::gate("cx", vec![0, 1]),
            Op::measure(vec![0, 1], vec![0, 1], vec![]),
        ],
    );
    println!("Valid: {}", state.validate_opset(bell.opset()));

    let result = controller.run(&mut state, &bell, 1000, &mut rng)?;
    println!("Time:  {}ms", result.execution_time_ms.unwrap_or(0));
    println!();

    println!("Results:");
    for (memory, count) in result.counts.sorted() {
        println!("  {memory}: {count}");
    }

    // A circuit this backend cannot run
    let with_t = Circuit::new(1, vec![Op::gate("h", vec![0]), Op::gate("t", vec![0])]);
    if !state.validate_opset(with_t.opset()) {
        println!("\nRejected: {}", state.invalid_opset_message(with_t.opset()));
    }

    Ok(())
}
