//! Backend capability sets and op-set validation.
//!
//! A [`CapabilitySet`] is what a backend declares it can execute: a set of
//! operation kinds, a set of gate names and a set of snapshot names. It is
//! built once per backend and never mutated afterwards.
//!
//! Validation is a pure function of a capability set and an
//! [`OpSet`](crate::OpSet): the same inputs always produce the same verdict
//! and the same diagnostic.
//!
//! # Diagnostics
//!
//! Only gates and snapshots carry a discriminating name, so only they are
//! itemized. An unsupported kind with no unsupported gate or snapshot name
//! (for example `matrix` or `kraus`) is reported through a generic note
//! carrying the whole op-set summary instead.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{StateError, StateResult};
use crate::operation::{Op, OpKind, OpSet};
use crate::snapshot::SnapshotKind;

/// Instructions a backend declares it supports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    /// Allowed operation kinds.
    pub op_kinds: FxHashSet<OpKind>,
    /// Allowed gate names.
    pub gates: FxHashSet<String>,
    /// Allowed snapshot names.
    pub snapshots: FxHashSet<String>,
}

const STATEVECTOR_GATES: &[&str] = &[
    "u0", "u1", "u2", "u3", "cx", "cz", "cy", "cu1", "cu2", "cu3", "swap", "id", "x", "y", "z",
    "h", "s", "sdg", "t", "tdg", "rx", "ry", "rz", "ccx", "cswap", "mcx", "mcy", "mcz", "mcu1",
    "mcswap",
];

const DENSITY_MATRIX_GATES: &[&str] = &[
    "u1", "u2", "u3", "cx", "cz", "swap", "id", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "ccx",
];

const STABILIZER_GATES: &[&str] = &[
    "CX", "cx", "cz", "swap", "id", "x", "y", "z", "h", "s", "sdg",
];

const ALL_KINDS: [OpKind; 8] = [
    OpKind::Gate,
    OpKind::Measure,
    OpKind::Reset,
    OpKind::Bfunc,
    OpKind::Barrier,
    OpKind::Snapshot,
    OpKind::Matrix,
    OpKind::Kraus,
];

impl CapabilitySet {
    /// Create a capability set from its three components.
    pub fn new<G, S>(
        op_kinds: impl IntoIterator<Item = OpKind>,
        gates: impl IntoIterator<Item = G>,
        snapshots: impl IntoIterator<Item = S>,
    ) -> Self
    where
        G: Into<String>,
        S: Into<String>,
    {
        Self {
            op_kinds: op_kinds.into_iter().collect(),
            gates: gates.into_iter().map(Into::into).collect(),
            snapshots: snapshots.into_iter().map(Into::into).collect(),
        }
    }

    /// Capabilities of a dense statevector backend.
    pub fn statevector() -> Self {
        Self::new(
            ALL_KINDS,
            STATEVECTOR_GATES.iter().copied(),
            [
                SnapshotKind::Statevector,
                SnapshotKind::Memory,
                SnapshotKind::Register,
                SnapshotKind::Probabilities,
                SnapshotKind::ExpectationValuePauli,
                SnapshotKind::ExpectationValuePauliWithVariance,
                SnapshotKind::ExpectationValueMatrix,
                SnapshotKind::ExpectationValueMatrixWithVariance,
            ]
            .map(|kind| kind.as_str()),
        )
    }

    /// Capabilities of a density-matrix backend.
    pub fn density_matrix() -> Self {
        Self::new(
            ALL_KINDS,
            DENSITY_MATRIX_GATES.iter().copied(),
            [
                "density_matrix",
                SnapshotKind::Memory.as_str(),
                SnapshotKind::Register.as_str(),
                SnapshotKind::Probabilities.as_str(),
                SnapshotKind::ExpectationValuePauli.as_str(),
                SnapshotKind::ExpectationValueMatrix.as_str(),
            ],
        )
    }

    /// Capabilities of a stabilizer (Clifford) backend.
    ///
    /// No `matrix` or `kraus` support: arbitrary unitaries and channels are
    /// not representable in a tableau.
    pub fn stabilizer() -> Self {
        Self::new(
            [
                OpKind::Gate,
                OpKind::Measure,
                OpKind::Reset,
                OpKind::Bfunc,
                OpKind::Barrier,
                OpKind::Snapshot,
            ],
            STABILIZER_GATES.iter().copied(),
            [
                SnapshotKind::Stabilizer,
                SnapshotKind::Memory,
                SnapshotKind::Register,
                SnapshotKind::Probabilities,
                SnapshotKind::ExpectationValuePauli,
                SnapshotKind::ExpectationValuePauliWithVariance,
            ]
            .map(|kind| kind.as_str()),
        )
    }

    /// Add operation kinds.
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = OpKind>) -> Self {
        self.op_kinds.extend(kinds);
        self
    }

    /// Add gate names.
    pub fn with_gates<G: Into<String>>(mut self, gates: impl IntoIterator<Item = G>) -> Self {
        self.gates.extend(gates.into_iter().map(Into::into));
        self
    }

    /// Add snapshot names.
    pub fn with_snapshots<S: Into<String>>(
        mut self,
        snapshots: impl IntoIterator<Item = S>,
    ) -> Self {
        self.snapshots.extend(snapshots.into_iter().map(Into::into));
        self
    }

    /// Check if an operation kind is allowed.
    pub fn supports(&self, kind: OpKind) -> bool {
        self.op_kinds.contains(&kind)
    }

    /// Check if a gate name is allowed.
    pub fn contains_gate(&self, gate: &str) -> bool {
        self.gates.contains(gate)
    }

    /// Check if a snapshot name is allowed.
    pub fn contains_snapshot(&self, snapshot: &str) -> bool {
        self.snapshots.contains(snapshot)
    }

    /// Check a single op: its kind, and its name for gates and snapshots.
    pub fn allows(&self, op: &Op) -> bool {
        self.supports(op.kind)
            && match op.kind {
                OpKind::Gate => self.contains_gate(&op.name),
                OpKind::Snapshot => self.contains_snapshot(&op.name),
                _ => true,
            }
    }

    /// Fail with a capability violation if `op` is not allowed.
    ///
    /// Backends call this from `apply_ops` for content that reached them
    /// without prior validation.
    pub fn check_op(&self, backend: &str, op: &Op) -> StateResult<()> {
        if self.allows(op) {
            Ok(())
        } else {
            Err(StateError::invalid_instructions(
                backend,
                self.invalid_opset_message(&OpSet::from_ops([op])),
            ))
        }
    }

    /// Return `true` iff every kind, gate and snapshot in `opset` is allowed.
    pub fn validate(&self, opset: &OpSet) -> bool {
        opset.optypes.is_subset(&self.op_kinds)
            && opset.gates.is_subset(&self.gates)
            && opset.snapshots.is_subset(&self.snapshots)
    }

    /// Build a diagnostic naming what `opset` uses that is not allowed.
    ///
    /// Returns an empty string when `opset` is valid.
    pub fn invalid_opset_message(&self, opset: &OpSet) -> String {
        let invalid_optypes = opset.invalid_optypes(&self.op_kinds);
        let invalid_gates = opset.invalid_gates(&self.gates);
        let invalid_snapshots = opset.invalid_snapshots(&self.snapshots);

        let mut parts = Vec::new();
        if !invalid_gates.is_empty() {
            parts.push(format!("invalid gate instructions: {}", invalid_gates.join(", ")));
        }
        if !invalid_snapshots.is_empty() {
            parts.push(format!(
                "invalid snapshot instructions: {}",
                invalid_snapshots.join(", ")
            ));
        }
        // Kinds cannot be itemized by name; summarize the whole set instead.
        if !invalid_optypes.is_empty() && parts.is_empty() {
            parts.push(format!(
                "invalid non gate or snapshot instructions: opset={{{opset}}}"
            ));
        }
        parts.join("; ")
    }
}
