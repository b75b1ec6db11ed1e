//! State error types.
//!
//! Errors are categorized by what the caller has to fix:
//!
//! | Category | Variants | Recovery |
//! |----------|----------|----------|
//! | **Capability** | `InvalidInstructions` | Choose another backend |
//! | **Input** | `DimensionMismatch`, `InvalidHex`, `RegisterIndex`, `InvalidParameter` | Fix input |
//! | **Resource** | `InsufficientMemory` | Reduce circuit size |
//! | **Config** | `Configuration`, `Serialization` | Fix configuration |
//! | **Backend** | `Backend` | Backend-specific |
//!
//! None of these are retried internally. A failure from a required state
//! operation is fatal to the current circuit run.

use thiserror::Error;

/// Errors that can occur while driving a simulation state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StateError {
    // ── Capability errors ────────────────────────────────────────────
    /// Operation kind, gate or snapshot not declared by the backend.
    #[error("Invalid instructions for {backend}: {message}")]
    InvalidInstructions {
        /// Name of the rejecting backend.
        backend: String,
        /// Human-readable list of what was rejected.
        message: String,
    },

    // ── Input errors ─────────────────────────────────────────────────
    /// Supplied state does not match the requested number of qubits.
    #[error("State dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension implied by the qubit count.
        expected: usize,
        /// Dimension of the supplied state.
        actual: usize,
    },

    /// Malformed or oversized hex string for a classical register.
    #[error("Invalid hex value: {0}")]
    InvalidHex(String),

    /// Classical bit index outside the initialized register.
    #[error("Classical bit {index} out of range for register of size {size}")]
    RegisterIndex {
        /// Offending bit index.
        index: usize,
        /// Size of the register.
        size: usize,
    },

    /// Missing or malformed operation parameter.
    #[error("Invalid parameter for '{op}': {reason}")]
    InvalidParameter {
        /// Name of the operation.
        op: String,
        /// What is wrong with it.
        reason: String,
    },

    // ── Resource errors ──────────────────────────────────────────────
    /// Estimated memory exceeds the configured limit.
    #[error("Insufficient memory: circuit requires {required_mb} MB, limit is {limit_mb} MB")]
    InsufficientMemory {
        /// Estimated requirement in megabytes.
        required_mb: usize,
        /// Configured limit in megabytes.
        limit_mb: usize,
    },

    // ── Config errors ────────────────────────────────────────────────
    /// Configuration error (fix configuration).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failure converting a value to or from JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic backend error.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl StateError {
    /// Create a capability violation for the named backend.
    pub fn invalid_instructions(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInstructions {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-parameter error for the named operation.
    pub fn invalid_parameter(op: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            op: op.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if the circuit asked for something the backend does not declare.
    pub fn is_capability_violation(&self) -> bool {
        matches!(self, Self::InvalidInstructions { .. })
    }

    /// Returns `true` if the error is caused by caller-supplied input.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. }
                | Self::InvalidHex(_)
                | Self::RegisterIndex { .. }
                | Self::InvalidParameter { .. }
        )
    }
}

/// Result type for state operations.
pub type StateResult<T> = Result<T, StateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert!(StateError::invalid_instructions("sv", "h").is_capability_violation());
        assert!(
            StateError::DimensionMismatch {
                expected: 4,
                actual: 8
            }
            .is_input_error()
        );
        assert!(StateError::InvalidHex("0xz".into()).is_input_error());
        assert!(!StateError::Backend("boom".into()).is_input_error());
        assert!(!StateError::Configuration("bad".into()).is_capability_violation());
    }

    #[test]
    fn test_error_display() {
        let err = StateError::DimensionMismatch {
            expected: 4,
            actual: 2,
        };
        assert_eq!(err.to_string(), "State dimension mismatch: expected 4, got 2");

        let err = StateError::invalid_instructions("stabilizer", "invalid gate instructions: t");
        assert_eq!(
            err.to_string(),
            "Invalid instructions for stabilizer: invalid gate instructions: t"
        );
    }
}
