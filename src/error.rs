use thiserror::Error;

/// A witness that cannot be proved at all. Raised before any proof exists.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WitnessError {
    #[error("cannot prove: modulus must be non-zero")]
    ZeroModulus,
}

/// The proof or its public inputs could not be interpreted.
///
/// This is distinct from a rejected proof, which is reported as `Ok(false)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("malformed proof: {0}")]
    MalformedProof(String),
    #[error("public input arity mismatch: expected {expected}, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("malformed public input: {0}")]
    MalformedPublicInput(String),
    #[error("incompatible verifying key: {0}")]
    IncompatibleKey(String),
    #[error("verifier backend failure: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum ProveError {
    #[error(transparent)]
    Witness(#[from] WitnessError),
    #[error("constraint synthesis failed: {0}")]
    Synthesis(String),
    #[error("proof serialization failed: {0}")]
    Serialization(String),
    #[error("prover backend failure: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("failed to read key file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write key file {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to decode key {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("key setup failed: {0}")]
    Setup(String),
    #[error("incomplete key directory {path}: {missing} is missing")]
    Incomplete { path: String, missing: &'static str },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("unknown proof backend: {0}")]
    UnknownBackend(String),
}
