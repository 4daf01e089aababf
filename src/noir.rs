//! UltraHonk backend over the Noir rendition of the relation (`circuits/modexp`).
//!
//! barretenberg keeps global mutable state behind its FFI and is not
//! thread-safe, so every call goes through the circuit's mutex.

use std::path::Path;
use std::sync::{Arc, Mutex};

use noir_rs::barretenberg::prove::prove_ultra_honk_keccak;
use noir_rs::barretenberg::srs::setup_srs_from_bytecode;
use noir_rs::barretenberg::verify::{
    get_ultra_honk_keccak_verification_key, verify_ultra_honk_keccak,
};
use noir_rs::witness::from_vec_str_to_witness_map;

use crate::error::{KeyError, ProveError, VerifyError};
use crate::field::{self, FieldElement, FIELD_ELEMENT_BYTES};
use crate::prover::{ProofArtifact, Prover};
use crate::relation::{Witness, PUBLIC_INPUT_COUNT};
use crate::verifier::{check_arity, Verifier};

/// Location of the compiled circuit inside the circuits directory.
pub const CIRCUIT_JSON: &str = "modexp/target/modexp.json";

/// Compiled bytecode and verification key for the modexp circuit.
pub struct NoirCircuit {
    bytecode: String,
    vk: Vec<u8>,
    ffi: Mutex<()>,
}

/// Extract bytecode string from a compiled Noir circuit JSON file.
fn load_bytecode_from_json(path: &Path) -> Result<String, KeyError> {
    let contents = std::fs::read_to_string(path).map_err(|source| KeyError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let json: serde_json::Value =
        serde_json::from_str(&contents).map_err(|e| KeyError::Decode {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    json["bytecode"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| KeyError::Decode {
            path: path.display().to_string(),
            reason: "no 'bytecode' field".to_string(),
        })
}

impl NoirCircuit {
    /// Load the compiled circuit, set up the SRS and derive the verification key.
    ///
    /// The SRS is downloaded on first use if it is not cached locally.
    pub fn load(circuits_dir: &Path) -> Result<Arc<Self>, KeyError> {
        let json_path = circuits_dir.join(CIRCUIT_JSON);
        tracing::info!("Loading Noir circuit from {}", json_path.display());
        let bytecode = load_bytecode_from_json(&json_path)?;

        tracing::info!("Setting up SRS");
        setup_srs_from_bytecode(bytecode.as_str(), None, false)
            .map_err(|e| KeyError::Setup(format!("SRS setup failed: {}", e)))?;

        tracing::info!("Generating UltraHonk verification key");
        let vk = get_ultra_honk_keccak_verification_key(bytecode.as_str(), false, false)
            .map_err(|e| KeyError::Setup(format!("VK generation failed: {}", e)))?;

        tracing::info!(
            "Noir circuit loaded: bytecode={} chars, vk={} bytes",
            bytecode.len(),
            vk.len()
        );

        Ok(Arc::new(Self {
            bytecode,
            vk,
            ffi: Mutex::new(()),
        }))
    }
}

pub struct NoirProver {
    circuit: Arc<NoirCircuit>,
}

impl NoirProver {
    pub fn new(circuit: Arc<NoirCircuit>) -> Self {
        Self { circuit }
    }
}

impl Prover for NoirProver {
    fn prove(&self, witness: &Witness) -> Result<ProofArtifact, ProveError> {
        // ABI order of `main`: base, exponent, modulus, y.
        let inputs = [
            witness.base().to_string(),
            witness.exponent().to_string(),
            witness.modulus().to_string(),
            witness.evaluate().to_string(),
        ];
        let input_refs: Vec<&str> = inputs.iter().map(|s| s.as_str()).collect();
        let witness_map = from_vec_str_to_witness_map(input_refs)
            .map_err(|e| ProveError::Backend(format!("witness generation failed: {}", e)))?;

        let _guard = self
            .circuit
            .ffi
            .lock()
            .map_err(|_| ProveError::Backend("barretenberg lock poisoned".to_string()))?;

        let output = prove_ultra_honk_keccak(
            self.circuit.bytecode.as_str(),
            witness_map,
            self.circuit.vk.clone(),
            false, // disable_zk = false (ZK mode ON)
            false, // low memory mode off
        )
        .map_err(|e| ProveError::Backend(format!("proof generation failed: {}", e)))?;

        // barretenberg emits the public inputs ahead of the proof proper.
        let prefix = PUBLIC_INPUT_COUNT * FIELD_ELEMENT_BYTES;
        if output.len() <= prefix {
            return Err(ProveError::Backend(format!(
                "proof output too small: {} bytes (expected > {})",
                output.len(),
                prefix
            )));
        }
        let public_inputs = field::decode_all(&output[..prefix])
            .map_err(|e| ProveError::Serialization(e.to_string()))?;

        Ok(ProofArtifact {
            proof: output[prefix..].to_vec(),
            public_inputs,
        })
    }
}

pub struct NoirVerifier {
    circuit: Arc<NoirCircuit>,
}

impl NoirVerifier {
    pub fn new(circuit: Arc<NoirCircuit>) -> Self {
        Self { circuit }
    }
}

impl Verifier for NoirVerifier {
    fn verify(&self, proof: &[u8], public_inputs: &[FieldElement]) -> Result<bool, VerifyError> {
        check_arity(public_inputs)?;
        if proof.is_empty() {
            return Err(VerifyError::MalformedProof("empty proof".to_string()));
        }

        let mut blob = field::encode_all(public_inputs);
        blob.extend_from_slice(proof);

        let _guard = self
            .circuit
            .ffi
            .lock()
            .map_err(|_| VerifyError::Backend("barretenberg lock poisoned".to_string()))?;

        verify_ultra_honk_keccak(blob, self.circuit.vk.clone(), false)
            .map_err(|e| VerifyError::MalformedProof(e.to_string()))
    }
}
