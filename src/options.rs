//! Shader Options & Permutation Expansion
//!
//! A shader source declares its compile-time options with pragma directives
//! (see [`crate::source`]). Each option spans a bit field inside a 64-bit
//! variant key; expanding the cartesian product of all option values yields
//! one [`OptionPermutation`] per combination.
//!
//! # Key packing
//!
//! Options are packed LSB-first in declaration order. Each option occupies
//! exactly enough bits for its value count: a bool takes one bit, an enum
//! with `n` variants takes `ceil(log2(n))` bits, an integer range `lo..hi`
//! takes `ceil(log2(hi - lo + 1))` bits. The same packing is reproduced by
//! the generated include header so applications can select a variant at
//! runtime.

use crate::defines::ShaderDefines;

/// The value domain of one declared shader option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionKind {
    /// An on/off switch. Defines `NAME=1` when on, nothing when off.
    Bool,
    /// A closed set of named variants. Defines `NAME=<index>` for the
    /// selected variant plus `NAME_<VARIANT>=<index>` for every variant.
    Enum {
        /// Variant names in declaration order
        values: Vec<String>,
    },
    /// An inclusive integer range. Defines `NAME=<value>`.
    Int {
        /// Smallest admissible value
        min: i64,
        /// Largest admissible value
        max: i64,
    },
}

/// One compile-time option declared by a shader source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderOption {
    /// Option name as declared
    pub name: String,
    /// Value domain
    pub kind: OptionKind,
}

impl ShaderOption {
    /// Number of distinct values this option can take.
    #[must_use]
    pub fn value_count(&self) -> u64 {
        match &self.kind {
            OptionKind::Bool => 2,
            OptionKind::Enum { values } => values.len() as u64,
            OptionKind::Int { min, max } => max.abs_diff(*min).saturating_add(1),
        }
    }

    /// Width of this option's bit field inside the variant key.
    #[must_use]
    pub fn bit_width(&self) -> u32 {
        let count = self.value_count();
        if count <= 1 {
            0
        } else {
            64 - (count - 1).leading_zeros()
        }
    }

    /// Append the defines selecting value number `value` of this option.
    fn append_defines(&self, value: u64, defines: &mut ShaderDefines) {
        match &self.kind {
            OptionKind::Bool => {
                if value != 0 {
                    defines.set(&self.name, "1");
                }
            }
            OptionKind::Enum { values } => {
                defines.set(&self.name, &value.to_string());
                for (index, variant) in values.iter().enumerate() {
                    defines.set(&format!("{}_{variant}", self.name), &index.to_string());
                }
            }
            OptionKind::Int { min, .. } => {
                defines.set(&self.name, &(min + value as i64).to_string());
            }
        }
    }
}

/// One concrete combination of option values.
#[derive(Debug, Clone)]
pub struct OptionPermutation {
    /// Uppercase-hex rendering of the bit-packed variant key
    pub key: String,
    /// The macro definitions selecting this combination
    pub defines: ShaderDefines,
}

/// Expand the declared options into every value combination.
///
/// Returns one permutation per combination; a shader without options yields
/// exactly one permutation with an empty define set and key `"0"`.
#[must_use]
pub fn permutate(options: &[ShaderOption]) -> Vec<OptionPermutation> {
    let counts: Vec<u64> = options.iter().map(ShaderOption::value_count).collect();
    let mut permutations = Vec::new();
    let mut values = vec![0u64; options.len()];

    loop {
        let mut key = 0u64;
        let mut shift = 0u32;
        let mut defines = ShaderDefines::new();
        for (option, &value) in options.iter().zip(&values) {
            let width = option.bit_width();
            if width > 0 {
                key |= value << shift;
                shift += width;
            }
            option.append_defines(value, &mut defines);
        }
        permutations.push(OptionPermutation {
            key: format!("{key:X}"),
            defines,
        });

        // Advance the odometer, first-declared option fastest.
        let mut index = 0;
        loop {
            if index == options.len() {
                return permutations;
            }
            values[index] += 1;
            if values[index] < counts[index] {
                break;
            }
            values[index] = 0;
            index += 1;
        }
    }
}
