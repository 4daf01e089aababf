use std::sync::Arc;

use crate::config::{BackendKind, Config};
use crate::error::KeyError;
use crate::groth16::{Groth16Keys, Groth16Prover, Groth16Verifier};
use crate::prover::Prover;
use crate::verifier::Verifier;

/// A matched prover/verifier pair for one proof system.
pub struct Backend {
    pub kind: BackendKind,
    pub prover: Arc<dyn Prover>,
    pub verifier: Arc<dyn Verifier>,
}

impl Backend {
    pub fn from_config(config: &Config) -> Result<Self, KeyError> {
        match config.backend {
            BackendKind::Groth16 => {
                let keys = Groth16Keys::load_or_setup(&config.keys_dir, config.setup_seed)?;
                Self::groth16(keys)
            }
            BackendKind::Noir => Self::noir(config),
        }
    }

    pub fn groth16(keys: Groth16Keys) -> Result<Self, KeyError> {
        let verifier = Groth16Verifier::new(&keys.verifying_key)
            .map_err(|e| KeyError::Setup(e.to_string()))?;
        Ok(Self {
            kind: BackendKind::Groth16,
            prover: Arc::new(Groth16Prover::new(keys.proving_key)),
            verifier: Arc::new(verifier),
        })
    }

    #[cfg(feature = "noir")]
    fn noir(config: &Config) -> Result<Self, KeyError> {
        use crate::noir::{NoirCircuit, NoirProver, NoirVerifier};

        let circuit = NoirCircuit::load(&config.circuits_dir)?;
        Ok(Self {
            kind: BackendKind::Noir,
            prover: Arc::new(NoirProver::new(circuit.clone())),
            verifier: Arc::new(NoirVerifier::new(circuit)),
        })
    }

    #[cfg(not(feature = "noir"))]
    fn noir(_config: &Config) -> Result<Self, KeyError> {
        Err(KeyError::Setup(
            "the noir backend requires the 'noir' feature. Build with: cargo build --features noir"
                .to_string(),
        ))
    }
}
