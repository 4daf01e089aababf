//! The modular-exponentiation relation as an R1CS constraint system over BN254.
//!
//! Public input: `y`. Private: `base`, `exponent`, `modulus`.
//!
//! Every `x mod m` is witnessed as a quotient/remainder pair and checked with
//! `q * m + r == x`, `q < 2^64`, `r < 2^32` and `m - 1 - r` in `[0, 2^32)`.
//! All operands stay below 2^97, far under the field modulus, so these
//! equalities hold over the integers and not just modulo the field.

use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::field::FieldElement;
use crate::relation::{public_input_of, select, Witness, EXPONENT_BITS};

const WORD_BITS: usize = 32;
const PRODUCT_BITS: usize = 64;

/// A circuit variable together with the integer it is assigned.
///
/// The integer is tracked natively so quotient and remainder hints can be
/// computed even while the constraint system is in setup mode.
#[derive(Clone)]
struct Word {
    var: FpVar<FieldElement>,
    value: u64,
}

/// Circuit instance for one witness and its claimed public result.
#[derive(Clone, Debug)]
pub struct ModExpCircuit {
    witness: Witness,
    y: FieldElement,
}

impl ModExpCircuit {
    /// Circuit whose public input is the witness's own result.
    pub fn new(witness: Witness) -> Self {
        let y = public_input_of(witness.evaluate());
        Self { witness, y }
    }

    /// Circuit claiming an arbitrary public result, satisfied only if it is correct.
    pub fn with_claim(witness: Witness, y: FieldElement) -> Self {
        Self { witness, y }
    }

    /// Placeholder instance for key generation. Same shape as any other instance.
    pub fn blank() -> Self {
        Self::new(Witness::placeholder())
    }

    pub fn public_inputs(&self) -> Vec<FieldElement> {
        vec![self.y]
    }
}

fn alloc_bits(
    cs: &ConstraintSystemRef<FieldElement>,
    value: u64,
    width: usize,
) -> Result<Vec<Boolean<FieldElement>>, SynthesisError> {
    (0..width)
        .map(|i| Boolean::new_witness(cs.clone(), || Ok((value >> i) & 1 == 1)))
        .collect()
}

/// Little-endian recomposition of boolean variables.
fn pack(bits: &[Boolean<FieldElement>]) -> FpVar<FieldElement> {
    let mut acc = FpVar::<FieldElement>::zero();
    let mut weight = FieldElement::from(1u64);
    for bit in bits {
        acc += FpVar::from(bit.clone()) * weight;
        weight = weight + weight;
    }
    acc
}

/// Allocate a witness word constrained to `[0, 2^width)`.
fn alloc_word(
    cs: &ConstraintSystemRef<FieldElement>,
    value: u64,
    width: usize,
) -> Result<Word, SynthesisError> {
    let bits = alloc_bits(cs, value, width)?;
    Ok(Word {
        var: pack(&bits),
        value,
    })
}

/// `x mod m` for `x < 2^64` and `0 < m < 2^32`.
fn reduce(
    cs: &ConstraintSystemRef<FieldElement>,
    x: &Word,
    m: &Word,
) -> Result<Word, SynthesisError> {
    if m.value == 0 {
        return Err(SynthesisError::DivisionByZero);
    }
    let quotient = alloc_word(cs, x.value / m.value, PRODUCT_BITS)?;
    let remainder = alloc_word(cs, x.value % m.value, WORD_BITS)?;
    (&quotient.var * &m.var + &remainder.var).enforce_equal(&x.var)?;

    let gap = alloc_word(cs, m.value - 1 - remainder.value, WORD_BITS)?;
    (&gap.var + &remainder.var + FieldElement::from(1u64)).enforce_equal(&m.var)?;

    Ok(remainder)
}

fn multiply(a: &Word, b: &Word) -> Word {
    Word {
        var: &a.var * &b.var,
        value: a.value * b.value,
    }
}

impl ConstraintSynthesizer<FieldElement> for ModExpCircuit {
    fn generate_constraints(
        self,
        cs: ConstraintSystemRef<FieldElement>,
    ) -> Result<(), SynthesisError> {
        let y = FpVar::new_input(cs.clone(), || Ok(self.y))?;

        let modulus = alloc_word(&cs, self.witness.modulus().into(), WORD_BITS)?;
        modulus.var.enforce_not_equal(&FpVar::zero())?;
        let base = alloc_word(&cs, self.witness.base().into(), WORD_BITS)?;
        let exponent: u64 = self.witness.exponent().into();
        let exponent_bits = alloc_bits(&cs, exponent, EXPONENT_BITS)?;

        let mut base = reduce(&cs, &base, &modulus)?;
        let one = Word {
            var: FpVar::one(),
            value: 1,
        };
        let mut result = reduce(&cs, &one, &modulus)?;

        for (i, bit) in exponent_bits.iter().enumerate() {
            let bit_value = (exponent >> i) & 1;
            let candidate = reduce(&cs, &multiply(&result, &base), &modulus)?;

            let bit_var = FpVar::from(bit.clone());
            let not_bit = FpVar::one() - &bit_var;
            result = Word {
                var: &bit_var * &candidate.var + &not_bit * &result.var,
                value: select(bit_value, candidate.value, result.value),
            };

            base = reduce(&cs, &multiply(&base, &base), &modulus)?;
        }

        result.var.enforce_equal(&y)?;
        Ok(())
    }
}
