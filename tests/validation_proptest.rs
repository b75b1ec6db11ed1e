//! Property-based tests for op-set validation.
//!
//! Checks that validation is exactly the subset relation on all three
//! components, and that the diagnostic is deterministic and empty only for
//! valid op sets.

use proptest::prelude::*;
use state_contract::{CapabilitySet, OpKind, OpSet};

const KINDS: [OpKind; 8] = [
    OpKind::Gate,
    OpKind::Measure,
    OpKind::Reset,
    OpKind::Bfunc,
    OpKind::Barrier,
    OpKind::Snapshot,
    OpKind::Matrix,
    OpKind::Kraus,
];

const GATES: [&str; 8] = ["x", "y", "z", "h", "s", "t", "cx", "ccx"];

const SNAPSHOTS: [&str; 5] = [
    "statevector",
    "stabilizer",
    "memory",
    "register",
    "probabilities",
];

fn arb_kinds() -> impl Strategy<Value = Vec<OpKind>> {
    prop::sample::subsequence(KINDS.to_vec(), 0..=KINDS.len())
}

fn arb_gates() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(GATES.to_vec(), 0..=GATES.len())
}

fn arb_snapshots() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(SNAPSHOTS.to_vec(), 0..=SNAPSHOTS.len())
}

fn arb_capabilities() -> impl Strategy<Value = CapabilitySet> {
    (arb_kinds(), arb_gates(), arb_snapshots())
        .prop_map(|(kinds, gates, snapshots)| CapabilitySet::new(kinds, gates, snapshots))
}

fn arb_opset() -> impl Strategy<Value = OpSet> {
    (arb_kinds(), arb_gates(), arb_snapshots()).prop_map(|(kinds, gates, snapshots)| OpSet {
        optypes: kinds.into_iter().collect(),
        gates: gates.into_iter().map(String::from).collect(),
        snapshots: snapshots.into_iter().map(String::from).collect(),
    })
}

proptest! {
    #[test]
    fn validate_is_subset_check(caps in arb_capabilities(), opset in arb_opset()) {
        let expected = opset.optypes.iter().all(|k| caps.op_kinds.contains(k))
            && opset.gates.iter().all(|g| caps.gates.contains(g))
            && opset.snapshots.iter().all(|s| caps.snapshots.contains(s));
        prop_assert_eq!(caps.validate(&opset), expected);
    }

    #[test]
    fn message_is_idempotent(caps in arb_capabilities(), opset in arb_opset()) {
        prop_assert_eq!(
            caps.invalid_opset_message(&opset),
            caps.invalid_opset_message(&opset.clone())
        );
    }

    #[test]
    fn message_empty_iff_valid(caps in arb_capabilities(), opset in arb_opset()) {
        prop_assert_eq!(caps.invalid_opset_message(&opset).is_empty(), caps.validate(&opset));
    }

    #[test]
    fn message_itemizes_every_bad_gate(caps in arb_capabilities(), opset in arb_opset()) {
        let msg = caps.invalid_opset_message(&opset);
        let bad_gates = opset.invalid_gates(&caps.gates);
        if !bad_gates.is_empty() {
            let expected = format!("invalid gate instructions: {}", bad_gates.join(", "));
            prop_assert!(msg.contains(&expected));
            prop_assert!(!msg.contains("non gate or snapshot"));
        }
    }
}
