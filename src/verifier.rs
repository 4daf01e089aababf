// Verifier capability.
//
// A verifier answers one question: does this proof attest a satisfying
// witness for these public inputs. Implementations must not hold mutable
// state that a call can change; auditing lives in `recording`, which wraps
// any implementation of this trait.

use crate::error::VerifyError;
use crate::field::{self, FieldElement};
use crate::relation::PUBLIC_INPUT_COUNT;

pub trait Verifier: Send + Sync {
    /// `Ok(false)` rejects a well-formed proof. `Err` means the proof or
    /// inputs could not be interpreted at all.
    fn verify(&self, proof: &[u8], public_inputs: &[FieldElement]) -> Result<bool, VerifyError>;
}

/// Reject public input vectors that do not match the relation's declared arity.
pub fn check_arity(public_inputs: &[FieldElement]) -> Result<(), VerifyError> {
    if public_inputs.len() != PUBLIC_INPUT_COUNT {
        return Err(VerifyError::ArityMismatch {
            expected: PUBLIC_INPUT_COUNT,
            actual: public_inputs.len(),
        });
    }
    Ok(())
}

/// Verify against public inputs given in their boundary encoding.
pub fn verify_encoded(
    verifier: &dyn Verifier,
    proof: &[u8],
    public_inputs: &[u8],
) -> Result<bool, VerifyError> {
    let inputs = field::decode_all(public_inputs)?;
    verifier.verify(proof, &inputs)
}
