use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::ProveError;
use crate::field::{self, FieldElement};
use crate::relation::Witness;

/// Output of a proving backend: the opaque proof blob and the public inputs it binds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofArtifact {
    pub proof: Vec<u8>,
    pub public_inputs: Vec<FieldElement>,
}

impl ProofArtifact {
    pub fn proof_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.proof))
    }

    pub fn public_inputs_hex(&self) -> Vec<String> {
        self.public_inputs.iter().map(field::to_hex).collect()
    }
}

/// Turns a witness into a proof. Backends are opaque to the rest of the crate.
pub trait Prover: Send + Sync {
    fn prove(&self, witness: &Witness) -> Result<ProofArtifact, ProveError>;
}

/// Serializes proof generation behind a single async Mutex.
///
/// Proving is CPU and memory heavy, and the UltraHonk backend calls into
/// FFI with global state, so one proof is generated at a time. Scale out
/// with more processes rather than more concurrent requests.
pub struct ProverService {
    mutex: Mutex<()>,
    backend: Arc<dyn Prover>,
}

impl ProverService {
    pub fn new(backend: Arc<dyn Prover>) -> Self {
        Self {
            mutex: Mutex::new(()),
            backend,
        }
    }

    /// Check the witness, then generate a proof for it.
    ///
    /// A zero modulus is rejected here, before any backend work starts.
    pub async fn prove(
        &self,
        base: u32,
        exponent: u32,
        modulus: u32,
    ) -> Result<ProofArtifact, ProveError> {
        let witness = Witness::new(base, exponent, modulus)?;

        let _guard = self.mutex.lock().await;

        tracing::info!("Generating proof");
        let artifact = self.backend.prove(&witness)?;
        tracing::info!(
            "Proof generated: {} bytes, {} public inputs",
            artifact.proof.len(),
            artifact.public_inputs.len()
        );

        Ok(artifact)
    }
}
