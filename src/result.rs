//! Output recorder.
//!
//! [`OutputData`] collects everything a run produces: memory counts,
//! per-shot memory and register values, and single-shot snapshots. Counts
//! are keyed by the memory hex string written by
//! [`ClassicalRegister::memory_hex`](crate::ClassicalRegister::memory_hex).
//!
//! Snapshots are stored as JSON values grouped by type tag and then by
//! label, so the recorder does not depend on any backend's state type.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::StateResult;

/// Histogram of the memory hex values recorded across shots.
///
/// Serializes as a plain `{memory_hex: count}` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts(FxHashMap<String, u64>);

impl Counts {
    /// Count one shot that ended with `memory_hex`.
    pub fn record(&mut self, memory_hex: &str) {
        self.add(memory_hex, 1);
    }

    fn add(&mut self, memory_hex: &str, count: u64) {
        match self.0.get_mut(memory_hex) {
            Some(existing) => *existing += count,
            None => {
                self.0.insert(memory_hex.to_string(), count);
            }
        }
    }

    /// Shots that ended with `memory_hex`.
    pub fn get(&self, memory_hex: &str) -> u64 {
        self.0.get(memory_hex).copied().unwrap_or(0)
    }

    /// Number of shots counted.
    pub fn total_shots(&self) -> u64 {
        self.0.values().sum()
    }

    /// Entries by count descending, ties by memory hex.
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut items: Vec<_> = self.0.iter().map(|(k, &v)| (k.as_str(), v)).collect();
        items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        items
    }

    /// Add another histogram into this one.
    pub fn merge(&mut self, other: &Counts) {
        for (memory_hex, &count) in &other.0 {
            self.add(memory_hex, count);
        }
    }

    /// Number of distinct memory values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if no shot has been counted.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Snapshots of one type tag, keyed by label. Each label holds one value
/// per shot that emitted it.
pub type SnapshotData = FxHashMap<String, Vec<serde_json::Value>>;

/// Accumulated output of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputData {
    /// Memory counts.
    pub counts: Counts,
    /// Memory hex per shot, in shot order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub memory: Vec<String>,
    /// Register hex per shot, in shot order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub register: Vec<String>,
    /// Single-shot snapshots by type tag.
    #[serde(default, skip_serializing_if = "FxHashMap::is_empty")]
    pub snapshots: FxHashMap<String, SnapshotData>,
    /// Wall-clock execution time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    /// Additional metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl OutputData {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one snapshot value under `label` and `type_tag`.
    pub fn add_singleshot_snapshot<T: Serialize + ?Sized>(
        &mut self,
        label: &str,
        type_tag: &str,
        value: &T,
    ) -> StateResult<()> {
        let value = serde_json::to_value(value)?;
        self.snapshots
            .entry(type_tag.to_string())
            .or_default()
            .entry(label.to_string())
            .or_default()
            .push(value);
        Ok(())
    }

    /// Count one occurrence of a memory value.
    pub fn add_memory_count(&mut self, memory_hex: &str) {
        self.counts.record(memory_hex);
    }

    /// Record the memory value of one shot.
    pub fn add_memory_singleshot(&mut self, memory_hex: &str) {
        self.memory.push(memory_hex.to_string());
    }

    /// Record the register value of one shot.
    pub fn add_register_singleshot(&mut self, register_hex: &str) {
        self.register.push(register_hex.to_string());
    }

    /// Snapshot values recorded under `type_tag` and `label`.
    pub fn snapshot(&self, type_tag: &str, label: &str) -> Option<&[serde_json::Value]> {
        self.snapshots
            .get(type_tag)
            .and_then(|by_label| by_label.get(label))
            .map(Vec::as_slice)
    }

    /// Append another recorder's output to this one.
    ///
    /// Used to merge the output of independent state instances.
    pub fn combine(&mut self, other: OutputData) {
        self.counts.merge(&other.counts);
        self.memory.extend(other.memory);
        self.register.extend(other.register);
        for (type_tag, by_label) in other.snapshots {
            let entry = self.snapshots.entry(type_tag).or_default();
            for (label, values) in by_label {
                entry.entry(label).or_default().extend(values);
            }
        }
    }

    /// Set the execution time.
    pub fn with_execution_time(mut self, time_ms: u64) -> Self {
        self.execution_time_ms = Some(time_ms);
        self
    }

    /// Set metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Check if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
            && self.memory.is_empty()
            && self.register.is_empty()
            && self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_record_and_merge() {
        let mut counts = Counts::default();
        counts.record("0x0");
        counts.record("0x3");
        counts.record("0x3");

        let mut other = Counts::default();
        other.record("0x1");
        other.record("0x3");
        counts.merge(&other);

        assert_eq!(counts.get("0x3"), 3);
        assert_eq!(counts.get("0x2"), 0);
        assert_eq!(counts.len(), 3);
        assert_eq!(counts.total_shots(), 5);
    }

    #[test]
    fn test_counts_sorted_ties_by_key() {
        let mut counts = Counts::default();
        for hex in ["0x3", "0x1", "0x2", "0x2"] {
            counts.record(hex);
        }
        assert_eq!(counts.sorted(), vec![("0x2", 2), ("0x1", 1), ("0x3", 1)]);
    }

    #[test]
    fn test_snapshot_grouping() {
        let mut data = OutputData::new();
        data.add_singleshot_snapshot("final", "statevector", &vec![1.0, 0.0])
            .unwrap();
        data.add_singleshot_snapshot("final", "statevector", &vec![0.0, 1.0])
            .unwrap();
        data.add_singleshot_snapshot("memory", "creg", "0x1").unwrap();

        let values = data.snapshot("statevector", "final").unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[1], serde_json::json!([0.0, 1.0]));
        assert_eq!(
            data.snapshot("creg", "memory").unwrap(),
            &[serde_json::json!("0x1")]
        );
        assert!(data.snapshot("creg", "register").is_none());
    }

    #[test]
    fn test_memory_records() {
        let mut data = OutputData::new();
        assert!(data.is_empty());
        data.add_memory_count("0x1");
        data.add_memory_count("0x1");
        data.add_memory_singleshot("0x1");
        data.add_register_singleshot("0x0");
        assert_eq!(data.counts.get("0x1"), 2);
        assert_eq!(data.memory, vec!["0x1"]);
        assert_eq!(data.register, vec!["0x0"]);
    }

    #[test]
    fn test_combine() {
        let mut a = OutputData::new();
        a.add_memory_count("0x0");
        a.add_memory_singleshot("0x0");
        a.add_singleshot_snapshot("s", "t", &1).unwrap();

        let mut b = OutputData::new();
        b.add_memory_count("0x0");
        b.add_memory_count("0x1");
        b.add_memory_singleshot("0x1");
        b.add_singleshot_snapshot("s", "t", &2).unwrap();

        a.combine(b);
        assert_eq!(a.counts.get("0x0"), 2);
        assert_eq!(a.counts.total_shots(), 3);
        assert_eq!(a.memory, vec!["0x0", "0x1"]);
        assert_eq!(a.snapshot("t", "s").unwrap().len(), 2);
    }

    #[test]
    fn test_output_json() {
        let mut data = OutputData::new().with_execution_time(7);
        data.add_memory_count("0x2");
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["counts"]["0x2"], 1);
        assert_eq!(json["execution_time_ms"], 7);
        assert!(json.get("memory").is_none());
    }
}
