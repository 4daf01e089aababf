//! The statement being proved: `y = base^exponent mod modulus`.
//!
//! Evaluation is fixed-shape. The loop always runs once per exponent bit and
//! the conditional multiply is an arithmetic blend, so the same sequence of
//! operations is executed for every input. [`crate::circuit`] encodes exactly
//! this sequence as constraints.

use crate::error::WitnessError;
use crate::field::FieldElement;

/// Iteration count of the square-and-multiply loop. Tracks the exponent width.
pub const EXPONENT_BITS: usize = u32::BITS as usize;

/// Number of public inputs the relation declares (`y`).
pub const PUBLIC_INPUT_COUNT: usize = 1;

/// Private values held by the prover.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Witness {
    base: u32,
    exponent: u32,
    modulus: u32,
}

impl Witness {
    pub fn new(base: u32, exponent: u32, modulus: u32) -> Result<Self, WitnessError> {
        if modulus == 0 {
            return Err(WitnessError::ZeroModulus);
        }
        Ok(Self {
            base,
            exponent,
            modulus,
        })
    }

    pub(crate) fn placeholder() -> Self {
        Self {
            base: 0,
            exponent: 0,
            modulus: 1,
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn exponent(&self) -> u32 {
        self.exponent
    }

    pub fn modulus(&self) -> u32 {
        self.modulus
    }

    /// The exponentiation result. Infallible: the modulus was checked on construction.
    pub fn evaluate(&self) -> u32 {
        fixed_shape_pow_mod(self.base, self.exponent, self.modulus)
    }

    /// The public input vector a proof for this witness is checked against.
    pub fn public_inputs(&self) -> Vec<FieldElement> {
        vec![public_input_of(self.evaluate())]
    }
}

/// `bit * a + (1 - bit) * b`, for `bit` in `{0, 1}`.
#[inline]
pub(crate) fn select(bit: u64, a: u64, b: u64) -> u64 {
    debug_assert!(bit <= 1, "select bit must be 0 or 1, got {}", bit);
    bit * a + (1 - bit) * b
}

/// `base^exponent mod modulus`, failing on a zero modulus.
pub fn mod_exp(base: u32, exponent: u32, modulus: u32) -> Result<u32, WitnessError> {
    Witness::new(base, exponent, modulus).map(|w| w.evaluate())
}

// Products of two values below 2^32 are held in u64 before reduction.
fn fixed_shape_pow_mod(base: u32, exponent: u32, modulus: u32) -> u32 {
    let m = u64::from(modulus);
    let mut base = u64::from(base) % m;
    let mut exponent = exponent;
    // 1 mod m, so that a modulus of one yields zero even for a zero exponent.
    let mut result = 1 % m;

    for _ in 0..EXPONENT_BITS {
        let bit = u64::from(exponent & 1);
        let candidate = (result * base) % m;
        result = select(bit, candidate, result);
        base = (base * base) % m;
        exponent >>= 1;
    }

    result as u32
}

/// Embed a relation output into the proving field.
pub fn public_input_of(result: u32) -> FieldElement {
    FieldElement::from(u64::from(result))
}
