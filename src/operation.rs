//! Circuit operations and their aggregate operation set.
//!
//! An [`Op`] is one already-parsed circuit instruction. Parsing from an
//! exchange format happens elsewhere; this module only fixes the shape the
//! state layer reads: a kind tag, a name, qubit targets, classical targets,
//! and numeric/string parameters.
//!
//! An [`OpSet`] is the read-only summary of everything a circuit uses. It is
//! what backends are validated against before any shot runs.

use std::collections::BTreeSet;
use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{StateError, StateResult};

/// Kind tag of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    /// Named gate; checked individually against the allowed gate names.
    Gate,
    /// Measurement into classical memory and/or register bits.
    Measure,
    /// Reset of qubits to |0⟩.
    Reset,
    /// Boolean function on the classical register.
    Bfunc,
    /// Barrier (no effect on the state).
    Barrier,
    /// Named snapshot; checked individually against the allowed snapshot names.
    Snapshot,
    /// Arbitrary unitary matrix.
    Matrix,
    /// General Kraus channel.
    Kraus,
}

impl OpKind {
    /// Lowercase tag name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Gate => "gate",
            OpKind::Measure => "measure",
            OpKind::Reset => "reset",
            OpKind::Bfunc => "bfunc",
            OpKind::Barrier => "barrier",
            OpKind::Snapshot => "snapshot",
            OpKind::Matrix => "matrix",
            OpKind::Kraus => "kraus",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single circuit operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Op {
    /// Kind tag.
    pub kind: OpKind,
    /// Operation name (gate name, snapshot name, `"measure"`, ...).
    pub name: String,
    /// Qubit targets.
    #[serde(default)]
    pub qubits: Vec<usize>,
    /// Classical memory bits written by this op.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub memory: Vec<usize>,
    /// Classical register bits written by this op.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registers: Vec<usize>,
    /// Numeric parameters (rotation angles, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<f64>,
    /// String parameters. For snapshots the first entry is the type tag.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub string_params: Vec<String>,
    /// Register bit the op is conditioned on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<usize>,
}

impl Op {
    fn new(kind: OpKind, name: impl Into<String>, qubits: Vec<usize>) -> Self {
        Self {
            kind,
            name: name.into(),
            qubits,
            memory: vec![],
            registers: vec![],
            params: vec![],
            string_params: vec![],
            conditional: None,
        }
    }

    /// Create a named gate.
    pub fn gate(name: impl Into<String>, qubits: Vec<usize>) -> Self {
        Self::new(OpKind::Gate, name, qubits)
    }

    /// Create a measurement of `qubits` into the given memory and register bits.
    ///
    /// Either classical target list may be empty.
    pub fn measure(qubits: Vec<usize>, memory: Vec<usize>, registers: Vec<usize>) -> Self {
        Self {
            memory,
            registers,
            ..Self::new(OpKind::Measure, "measure", qubits)
        }
    }

    /// Create a reset.
    pub fn reset(qubits: Vec<usize>) -> Self {
        Self::new(OpKind::Reset, "reset", qubits)
    }

    /// Create a barrier.
    pub fn barrier(qubits: Vec<usize>) -> Self {
        Self::new(OpKind::Barrier, "barrier", qubits)
    }

    /// Create a snapshot named `name` carrying `type_tag` as its first string parameter.
    pub fn snapshot(
        name: impl Into<String>,
        type_tag: impl Into<String>,
        qubits: Vec<usize>,
    ) -> Self {
        Self {
            string_params: vec![type_tag.into()],
            ..Self::new(OpKind::Snapshot, name, qubits)
        }
    }

    /// Create an arbitrary-unitary op.
    pub fn matrix(qubits: Vec<usize>) -> Self {
        Self::new(OpKind::Matrix, "unitary", qubits)
    }

    /// Create a Kraus channel op.
    pub fn kraus(qubits: Vec<usize>) -> Self {
        Self::new(OpKind::Kraus, "kraus", qubits)
    }

    /// Create a boolean function `(register & mask) relation target`.
    ///
    /// The result is stored in register bit `register` and, if given, in
    /// memory bit `memory`.
    pub fn bfunc(
        mask: impl Into<String>,
        target: impl Into<String>,
        relation: impl Into<String>,
        register: usize,
        memory: Option<usize>,
    ) -> Self {
        Self {
            registers: vec![register],
            memory: memory.into_iter().collect(),
            string_params: vec![mask.into(), target.into(), relation.into()],
            ..Self::new(OpKind::Bfunc, "bfunc", vec![])
        }
    }

    /// Attach numeric parameters.
    pub fn with_params(mut self, params: Vec<f64>) -> Self {
        self.params = params;
        self
    }

    /// Condition the op on a classical register bit.
    pub fn with_condition(mut self, register_bit: usize) -> Self {
        self.conditional = Some(register_bit);
        self
    }

    /// First string parameter, or an error naming this op.
    pub fn first_string_param(&self) -> StateResult<&str> {
        self.string_params
            .first()
            .map(String::as_str)
            .ok_or_else(|| StateError::invalid_parameter(&self.name, "missing string parameter"))
    }
}

/// Aggregate of the kinds, gate names and snapshot names used by a circuit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpSet {
    /// Operation kinds present.
    pub optypes: FxHashSet<OpKind>,
    /// Gate names present.
    pub gates: FxHashSet<String>,
    /// Snapshot names present.
    pub snapshots: FxHashSet<String>,
}

impl OpSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the set for a sequence of ops.
    pub fn from_ops<'a>(ops: impl IntoIterator<Item = &'a Op>) -> Self {
        let mut set = Self::new();
        for op in ops {
            set.insert(op);
        }
        set
    }

    /// Record one op.
    pub fn insert(&mut self, op: &Op) {
        self.optypes.insert(op.kind);
        match op.kind {
            OpKind::Gate => {
                self.gates.insert(op.name.clone());
            }
            OpKind::Snapshot => {
                self.snapshots.insert(op.name.clone());
            }
            _ => {}
        }
    }

    /// Merge another set into this one.
    pub fn extend(&mut self, other: &OpSet) {
        self.optypes.extend(other.optypes.iter().copied());
        self.gates.extend(other.gates.iter().cloned());
        self.snapshots.extend(other.snapshots.iter().cloned());
    }

    /// Check if no op has been recorded.
    pub fn is_empty(&self) -> bool {
        self.optypes.is_empty()
    }

    /// Kinds present here but not in `allowed`, sorted.
    pub fn invalid_optypes(&self, allowed: &FxHashSet<OpKind>) -> Vec<OpKind> {
        let mut invalid: Vec<_> = self.optypes.difference(allowed).copied().collect();
        invalid.sort();
        invalid
    }

    /// Gate names present here but not in `allowed`, sorted.
    pub fn invalid_gates(&self, allowed: &FxHashSet<String>) -> Vec<String> {
        sorted_difference(&self.gates, allowed)
    }

    /// Snapshot names present here but not in `allowed`, sorted.
    pub fn invalid_snapshots(&self, allowed: &FxHashSet<String>) -> Vec<String> {
        sorted_difference(&self.snapshots, allowed)
    }
}

fn sorted_difference(set: &FxHashSet<String>, allowed: &FxHashSet<String>) -> Vec<String> {
    set.difference(allowed)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl<'a> FromIterator<&'a Op> for OpSet {
    fn from_iter<I: IntoIterator<Item = &'a Op>>(iter: I) -> Self {
        Self::from_ops(iter)
    }
}

impl fmt::Display for OpSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut optypes: Vec<_> = self.optypes.iter().map(OpKind::as_str).collect();
        optypes.sort_unstable();
        let gates: BTreeSet<_> = self.gates.iter().map(String::as_str).collect();
        let snapshots: BTreeSet<_> = self.snapshots.iter().map(String::as_str).collect();
        write!(
            f,
            "instructions={{{}}}, gates={{{}}}, snapshots={{{}}}",
            optypes.join(", "),
            gates.into_iter().collect::<Vec<_>>().join(", "),
            snapshots.into_iter().collect::<Vec<_>>().join(", "),
        )
    }
}
