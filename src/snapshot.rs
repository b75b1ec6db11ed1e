//! Standard snapshot names.
//!
//! Backends declare the snapshot names they support through
//! [`CapabilitySet::snapshots`](crate::CapabilitySet). The names below are the
//! ones shared across backend variants; a backend is free to declare others.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::operation::Op;

/// Well-known snapshot names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    /// Full state vector.
    Statevector,
    /// Stabilizer tableau.
    Stabilizer,
    /// Classical memory as hex.
    Memory,
    /// Classical register as hex.
    Register,
    /// Measurement probabilities.
    Probabilities,
    /// Expectation value of a Pauli operator.
    ExpectationValuePauli,
    /// Expectation value and variance of a Pauli operator.
    ExpectationValuePauliWithVariance,
    /// Expectation value of a matrix operator.
    ExpectationValueMatrix,
    /// Expectation value and variance of a matrix operator.
    ExpectationValueMatrixWithVariance,
}

impl SnapshotKind {
    /// Every standard snapshot kind.
    pub const ALL: [SnapshotKind; 9] = [
        SnapshotKind::Statevector,
        SnapshotKind::Stabilizer,
        SnapshotKind::Memory,
        SnapshotKind::Register,
        SnapshotKind::Probabilities,
        SnapshotKind::ExpectationValuePauli,
        SnapshotKind::ExpectationValuePauliWithVariance,
        SnapshotKind::ExpectationValueMatrix,
        SnapshotKind::ExpectationValueMatrixWithVariance,
    ];

    /// Select the expectation-value snapshot for a Pauli or matrix operator.
    pub fn expectation_value(pauli: bool, variance: bool) -> Self {
        match (pauli, variance) {
            (true, false) => SnapshotKind::ExpectationValuePauli,
            (true, true) => SnapshotKind::ExpectationValuePauliWithVariance,
            (false, false) => SnapshotKind::ExpectationValueMatrix,
            (false, true) => SnapshotKind::ExpectationValueMatrixWithVariance,
        }
    }

    /// Snapshot name as declared in capability sets.
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Statevector => "statevector",
            SnapshotKind::Stabilizer => "stabilizer",
            SnapshotKind::Memory => "memory",
            SnapshotKind::Register => "register",
            SnapshotKind::Probabilities => "probabilities",
            SnapshotKind::ExpectationValuePauli => "expectation_value_pauli",
            SnapshotKind::ExpectationValuePauliWithVariance => {
                "expectation_value_pauli_with_variance"
            }
            SnapshotKind::ExpectationValueMatrix => "expectation_value_matrix",
            SnapshotKind::ExpectationValueMatrixWithVariance => {
                "expectation_value_matrix_with_variance"
            }
        }
    }

    /// Build a snapshot op of this kind.
    pub fn op(&self, type_tag: impl Into<String>, qubits: Vec<usize>) -> Op {
        Op::snapshot(self.as_str(), type_tag, qubits)
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnapshotKind {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| StateError::invalid_parameter("snapshot", format!("unknown kind '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OpKind;

    #[test]
    fn test_expectation_value_selection() {
        assert_eq!(
            SnapshotKind::expectation_value(true, false).as_str(),
            "expectation_value_pauli"
        );
        assert_eq!(
            SnapshotKind::expectation_value(true, true).as_str(),
            "expectation_value_pauli_with_variance"
        );
        assert_eq!(
            SnapshotKind::expectation_value(false, false).as_str(),
            "expectation_value_matrix"
        );
        assert_eq!(
            SnapshotKind::expectation_value(false, true).as_str(),
            "expectation_value_matrix_with_variance"
        );
    }

    #[test]
    fn test_from_str() {
        for kind in SnapshotKind::ALL {
            assert_eq!(kind.as_str().parse::<SnapshotKind>().unwrap(), kind);
        }
        assert!("density".parse::<SnapshotKind>().is_err());
    }

    #[test]
    fn test_snapshot_op() {
        let op = SnapshotKind::Stabilizer.op("after_h", vec![0, 1]);
        assert_eq!(op.kind, OpKind::Snapshot);
        assert_eq!(op.name, "stabilizer");
        assert_eq!(op.string_params, vec!["after_h"]);
    }
}
