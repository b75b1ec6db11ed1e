//! Classical register.
//!
//! Holds the two classical bit arrays a shot writes to: `memory` (what ends
//! up in counts) and `register` (what conditional operations read). Both are
//! sized at initialization and never resized within a run.
//!
//! # Hex encoding
//!
//! Hex strings are `0x`-prefixed, lowercase, without leading zeros (`"0x0"`
//! for an all-zero register). Bit `i` of the register is bit `i` of the hex
//! value, so `"0x5"` on a 3-bit memory sets bits 0 and 2. The binary form
//! returned by [`ClassicalRegister::memory_bits`] is MSB first.

use std::cmp::Ordering;

use crate::error::{StateError, StateResult};
use crate::operation::Op;

/// Classical memory and register bits of one shot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassicalRegister {
    memory: Vec<bool>,
    register: Vec<bool>,
}

impl ClassicalRegister {
    /// Create an empty (zero-sized) register.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resize both arrays and set every bit to 0.
    pub fn initialize(&mut self, num_memory: usize, num_register: usize) {
        self.memory = vec![false; num_memory];
        self.register = vec![false; num_register];
    }

    /// Resize both arrays and load their values from hex strings.
    ///
    /// Fails if either string is not valid hex or sets a bit beyond the
    /// requested width. On failure the register is left unchanged.
    pub fn initialize_from_hex(
        &mut self,
        num_memory: usize,
        num_register: usize,
        memory_hex: &str,
        register_hex: &str,
    ) -> StateResult<()> {
        let memory = hex_to_bits(memory_hex, num_memory)?;
        let register = hex_to_bits(register_hex, num_register)?;
        self.memory = memory;
        self.register = register;
        Ok(())
    }

    /// Number of memory bits.
    pub fn memory_size(&self) -> usize {
        self.memory.len()
    }

    /// Number of register bits.
    pub fn register_size(&self) -> usize {
        self.register.len()
    }

    /// Memory as a hex string.
    pub fn memory_hex(&self) -> String {
        bits_to_hex(&self.memory)
    }

    /// Register as a hex string.
    pub fn register_hex(&self) -> String {
        bits_to_hex(&self.register)
    }

    /// Memory as a binary string, MSB first.
    pub fn memory_bits(&self) -> String {
        bits_to_binary(&self.memory)
    }

    /// Register as a binary string, MSB first.
    pub fn register_bits(&self) -> String {
        bits_to_binary(&self.register)
    }

    /// Value of one register bit.
    pub fn register_bit(&self, index: usize) -> StateResult<bool> {
        self.register
            .get(index)
            .copied()
            .ok_or(StateError::RegisterIndex {
                index,
                size: self.register.len(),
            })
    }

    /// Value of one memory bit.
    pub fn memory_bit(&self, index: usize) -> StateResult<bool> {
        self.memory.get(index).copied().ok_or(StateError::RegisterIndex {
            index,
            size: self.memory.len(),
        })
    }

    /// Store a measurement outcome.
    ///
    /// `outcome[i]` is the result for the i-th measured qubit and is written
    /// to `memory[i]` and `registers[i]`. Either target list may be empty;
    /// a non-empty list must have one entry per outcome.
    pub fn store_measure(
        &mut self,
        outcome: &[u8],
        memory: &[usize],
        registers: &[usize],
    ) -> StateResult<()> {
        for (targets, name) in [(memory, "memory"), (registers, "register")] {
            if !targets.is_empty() && targets.len() != outcome.len() {
                return Err(StateError::invalid_parameter(
                    "measure",
                    format!(
                        "{} {name} targets for {} outcomes",
                        targets.len(),
                        outcome.len()
                    ),
                ));
            }
        }
        for (&bit, &value) in memory.iter().zip(outcome) {
            set_bit(&mut self.memory, bit, value != 0)?;
        }
        for (&bit, &value) in registers.iter().zip(outcome) {
            set_bit(&mut self.register, bit, value != 0)?;
        }
        Ok(())
    }

    /// Return whether `op` should run given its register condition.
    ///
    /// Unconditioned ops always run.
    pub fn check_conditional(&self, op: &Op) -> StateResult<bool> {
        match op.conditional {
            Some(bit) => self.register_bit(bit),
            None => Ok(true),
        }
    }

    /// Evaluate a boolean function op and store its result.
    ///
    /// The op's string parameters are `[mask, target, relation]`; the result
    /// of `(register & mask) relation target` goes to the op's first register
    /// bit and, if present, its first memory bit.
    pub fn apply_bfunc(&mut self, op: &Op) -> StateResult<()> {
        let [mask, target, relation] = op.string_params.as_slice() else {
            return Err(StateError::invalid_parameter(
                &op.name,
                "expected [mask, target, relation]",
            ));
        };
        let width = self.register.len();
        let mask = hex_to_bits(mask, width)?;
        let target = hex_to_bits(target, width)?;
        let masked: Vec<bool> = self
            .register
            .iter()
            .zip(&mask)
            .map(|(&bit, &m)| bit && m)
            .collect();

        let ordering = compare_bits(&masked, &target);
        let outcome = match relation.as_str() {
            "==" => ordering == Ordering::Equal,
            "!=" => ordering != Ordering::Equal,
            "<" => ordering == Ordering::Less,
            "<=" => ordering != Ordering::Greater,
            ">" => ordering == Ordering::Greater,
            ">=" => ordering != Ordering::Less,
            other => {
                return Err(StateError::invalid_parameter(
                    &op.name,
                    format!("unknown relation '{other}'"),
                ));
            }
        };

        let register_bit = *op
            .registers
            .first()
            .ok_or_else(|| StateError::invalid_parameter(&op.name, "missing register target"))?;
        set_bit(&mut self.register, register_bit, outcome)?;
        if let Some(&memory_bit) = op.memory.first() {
            set_bit(&mut self.memory, memory_bit, outcome)?;
        }
        Ok(())
    }
}

fn set_bit(bits: &mut [bool], index: usize, value: bool) -> StateResult<()> {
    let size = bits.len();
    let slot = bits
        .get_mut(index)
        .ok_or(StateError::RegisterIndex { index, size })?;
    *slot = value;
    Ok(())
}

/// Compare two equal-width bit arrays as unsigned integers.
fn compare_bits(a: &[bool], b: &[bool]) -> Ordering {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .map(|(x, y)| x.cmp(y))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn bits_to_hex(bits: &[bool]) -> String {
    let digits: String = bits
        .chunks(4)
        .rev()
        .map(|nibble| {
            let value = nibble
                .iter()
                .enumerate()
                .fold(0u32, |acc, (i, &bit)| acc | (u32::from(bit) << i));
            char::from_digit(value, 16).unwrap_or('0')
        })
        .collect();
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{trimmed}")
    }
}

fn bits_to_binary(bits: &[bool]) -> String {
    bits.iter().rev().map(|&b| if b { '1' } else { '0' }).collect()
}

fn hex_to_bits(hex: &str, width: usize) -> StateResult<Vec<bool>> {
    let digits = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex);
    if digits.is_empty() {
        return Err(StateError::InvalidHex(format!("'{hex}' has no digits")));
    }

    let mut bits = vec![false; width];
    for (position, c) in digits.chars().rev().enumerate() {
        let value = c
            .to_digit(16)
            .ok_or_else(|| StateError::InvalidHex(format!("'{hex}' contains '{c}'")))?;
        for offset in 0..4 {
            if (value >> offset) & 1 == 0 {
                continue;
            }
            let index = position * 4 + offset;
            match bits.get_mut(index) {
                Some(slot) => *slot = true,
                None => {
                    return Err(StateError::InvalidHex(format!(
                        "'{hex}' does not fit in {width} bits"
                    )));
                }
            }
        }
    }
    Ok(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_zero() {
        let mut creg = ClassicalRegister::new();
        creg.initialize(3, 2);
        assert_eq!(creg.memory_size(), 3);
        assert_eq!(creg.register_size(), 2);
        assert_eq!(creg.memory_hex(), "0x0");
        assert_eq!(creg.register_hex(), "0x0");
        assert_eq!(creg.memory_bits(), "000");
        assert_eq!(creg.register_bits(), "00");
    }

    #[test]
    fn test_initialize_from_hex() {
        let mut creg = ClassicalRegister::new();
        creg.initialize_from_hex(3, 2, "0x5", "0x1").unwrap();
        assert_eq!(creg.memory_hex(), "0x5");
        assert_eq!(creg.register_hex(), "0x1");
        assert_eq!(creg.memory_bits(), "101");
        assert_eq!(creg.register_bits(), "01");
    }

    #[test]
    fn test_initialize_from_hex_rejects_overflow() {
        let mut creg = ClassicalRegister::new();
        creg.initialize(1, 1);
        let err = creg.initialize_from_hex(3, 2, "0x8", "0x0").unwrap_err();
        assert!(matches!(err, StateError::InvalidHex(_)));
        // Unchanged on failure.
        assert_eq!(creg.memory_size(), 1);
    }

    #[test]
    fn test_initialize_from_hex_rejects_garbage() {
        let mut creg = ClassicalRegister::new();
        assert!(creg.initialize_from_hex(4, 0, "0xg", "0x0").is_err());
        assert!(creg.initialize_from_hex(4, 0, "0x", "0x0").is_err());
    }

    #[test]
    fn test_leading_zeros_accepted() {
        let mut creg = ClassicalRegister::new();
        creg.initialize_from_hex(8, 0, "0x00A", "0").unwrap();
        assert_eq!(creg.memory_hex(), "0xa");
        assert_eq!(creg.memory_bits(), "00001010");
    }

    #[test]
    fn test_wide_register_hex() {
        let mut creg = ClassicalRegister::new();
        creg.initialize_from_hex(70, 0, "0x20000000000000001", "0x0").unwrap();
        assert_eq!(creg.memory_hex(), "0x20000000000000001");
        assert!(creg.memory_bit(0).unwrap());
        assert!(creg.memory_bit(65).unwrap());
    }

    #[test]
    fn test_store_measure() {
        let mut creg = ClassicalRegister::new();
        creg.initialize(3, 2);
        creg.store_measure(&[1, 0, 1], &[0, 1, 2], &[]).unwrap();
        assert_eq!(creg.memory_hex(), "0x5");
        creg.store_measure(&[1], &[], &[1]).unwrap();
        assert_eq!(creg.register_hex(), "0x2");
    }

    #[test]
    fn test_store_measure_errors() {
        let mut creg = ClassicalRegister::new();
        creg.initialize(1, 0);
        assert!(matches!(
            creg.store_measure(&[1], &[3], &[]),
            Err(StateError::RegisterIndex { index: 3, size: 1 })
        ));
        assert!(creg.store_measure(&[1, 0], &[0], &[]).is_err());
    }

    #[test]
    fn test_check_conditional() {
        let mut creg = ClassicalRegister::new();
        creg.initialize_from_hex(0, 2, "0x0", "0x2").unwrap();
        let x = Op::gate("x", vec![0]);
        assert!(creg.check_conditional(&x).unwrap());
        assert!(!creg.check_conditional(&x.clone().with_condition(0)).unwrap());
        assert!(creg.check_conditional(&x.clone().with_condition(1)).unwrap());
        assert!(creg.check_conditional(&x.with_condition(5)).is_err());
    }

    #[test]
    fn test_apply_bfunc() {
        let mut creg = ClassicalRegister::new();
        // register = 0b0110, result bit 3
        creg.initialize_from_hex(1, 4, "0x0", "0x6").unwrap();

        creg.apply_bfunc(&Op::bfunc("0x3", "0x2", "==", 3, Some(0))).unwrap();
        assert!(creg.register_bit(3).unwrap());
        assert!(creg.memory_bit(0).unwrap());

        creg.initialize_from_hex(1, 4, "0x0", "0x6").unwrap();
        creg.apply_bfunc(&Op::bfunc("0x7", "0x7", ">=", 3, None)).unwrap();
        assert!(!creg.register_bit(3).unwrap());
        assert!(!creg.memory_bit(0).unwrap());

        creg.apply_bfunc(&Op::bfunc("0x7", "0x7", "<", 3, None)).unwrap();
        assert!(creg.register_bit(3).unwrap());
    }

    #[test]
    fn test_apply_bfunc_bad_relation() {
        let mut creg = ClassicalRegister::new();
        creg.initialize(0, 2);
        let err = creg
            .apply_bfunc(&Op::bfunc("0x1", "0x1", "~", 0, None))
            .unwrap_err();
        assert!(err.is_input_error());
    }
}
