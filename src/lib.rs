//! Zero-knowledge proofs of modular exponentiation.
//!
//! A prover holding private `base`, `exponent` and `modulus` discloses only
//! `y = base^exponent mod modulus`, embedded in the BN254 scalar field, plus
//! a proof. Verification is a pluggable [`Verifier`]; [`RecordingVerifier`]
//! wraps any of them with a last-outcome record and an audit event.

pub mod backend;
pub mod circuit;
pub mod config;
pub mod error;
pub mod field;
pub mod groth16;
#[cfg(feature = "noir")]
pub mod noir;
pub mod prover;
pub mod recording;
pub mod relation;
pub mod routes;
pub mod types;
pub mod verifier;

pub use error::{ConfigError, KeyError, ProveError, VerifyError, WitnessError};
pub use field::FieldElement;
pub use prover::{ProofArtifact, Prover};
pub use recording::{AuditSink, RecordingVerifier, VerificationEvent, VerificationRecord};
pub use relation::{mod_exp, Witness};
pub use verifier::Verifier;
