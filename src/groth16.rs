//! Groth16 proving backend for the relation circuit, over BN254.
//!
//! Keys are circuit-specific. They are loaded from a key directory, or
//! generated and written there on first start. Proofs travel in compressed
//! canonical encoding (128 bytes).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ark_bn254::Bn254;
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use rand::rngs::StdRng;
use rand::{CryptoRng, RngCore, SeedableRng};

use crate::circuit::ModExpCircuit;
use crate::error::{KeyError, ProveError, VerifyError};
use crate::field::FieldElement;
use crate::prover::{ProofArtifact, Prover};
use crate::relation::{Witness, PUBLIC_INPUT_COUNT};
use crate::verifier::{check_arity, Verifier};

pub const PROVING_KEY_FILE: &str = "modexp.pk";
pub const VERIFYING_KEY_FILE: &str = "modexp.vk";
const STAGING_EXTENSION: &str = "partial";

#[derive(Clone)]
pub struct Groth16Keys {
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
}

impl Groth16Keys {
    /// Run the circuit-specific setup. Whoever holds `rng`'s state can forge proofs.
    pub fn setup<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, KeyError> {
        let (proving_key, verifying_key) =
            Groth16::<Bn254>::circuit_specific_setup(ModExpCircuit::blank(), rng)
                .map_err(|e| KeyError::Setup(e.to_string()))?;
        Ok(Self {
            proving_key,
            verifying_key,
        })
    }

    pub fn load(dir: &Path) -> Result<Self, KeyError> {
        Ok(Self {
            proving_key: read_key(&dir.join(PROVING_KEY_FILE))?,
            verifying_key: read_key(&dir.join(VERIFYING_KEY_FILE))?,
        })
    }

    pub fn save(&self, dir: &Path) -> Result<(), KeyError> {
        std::fs::create_dir_all(dir).map_err(|source| KeyError::Write {
            path: dir.display().to_string(),
            source,
        })?;
        // Both files are staged before either is moved into place.
        let pk_staged = stage_key(&dir.join(PROVING_KEY_FILE), &self.proving_key)?;
        let vk_staged = match stage_key(&dir.join(VERIFYING_KEY_FILE), &self.verifying_key) {
            Ok(staged) => staged,
            Err(e) => {
                let _ = std::fs::remove_file(&pk_staged);
                return Err(e);
            }
        };
        commit_key(&pk_staged, &dir.join(PROVING_KEY_FILE))?;
        commit_key(&vk_staged, &dir.join(VERIFYING_KEY_FILE))
    }

    /// Load keys from `dir`, or run setup and persist them if neither file exists yet.
    ///
    /// A directory holding only one of the two files is an error: the
    /// survivor is never replaced by a fresh, unrelated key.
    ///
    /// With `seed` set the setup is reproducible, which is only suitable for
    /// development: anyone knowing the seed can recompute the toxic waste.
    pub fn load_or_setup(dir: &Path, seed: Option<u64>) -> Result<Self, KeyError> {
        let pk_path = dir.join(PROVING_KEY_FILE);
        let vk_path = dir.join(VERIFYING_KEY_FILE);
        match (pk_path.exists(), vk_path.exists()) {
            (true, true) => {
                tracing::info!("Loading Groth16 keys from {}", dir.display());
                let keys = Self::load(dir)?;
                tracing::info!(
                    "Groth16 keys loaded: {} public inputs",
                    keys.verifying_key.gamma_abc_g1.len().saturating_sub(1)
                );
                return Ok(keys);
            }
            (true, false) | (false, true) => {
                let missing = if vk_path.exists() {
                    PROVING_KEY_FILE
                } else {
                    VERIFYING_KEY_FILE
                };
                tracing::error!(
                    "{} missing from {}, refusing to run setup",
                    missing,
                    dir.display()
                );
                return Err(KeyError::Incomplete {
                    path: dir.display().to_string(),
                    missing,
                });
            }
            (false, false) => {}
        }

        let keys = match seed {
            Some(seed) => {
                tracing::warn!("Running Groth16 setup from a fixed seed, keys are not trustworthy");
                Self::setup(&mut StdRng::seed_from_u64(seed))?
            }
            None => {
                tracing::info!("No Groth16 keys in {}, running setup", dir.display());
                Self::setup(&mut rand::thread_rng())?
            }
        };
        keys.save(dir)?;
        tracing::info!("Groth16 keys written to {}", dir.display());
        Ok(keys)
    }
}

fn read_key<T: CanonicalDeserialize>(path: &Path) -> Result<T, KeyError> {
    let bytes = std::fs::read(path).map_err(|source| KeyError::Read {
        path: path.display().to_string(),
        source,
    })?;
    T::deserialize_compressed(bytes.as_slice()).map_err(|e| KeyError::Decode {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Write `key` next to `path` under a temporary name and return that name.
fn stage_key<T: CanonicalSerialize>(path: &Path, key: &T) -> Result<PathBuf, KeyError> {
    let mut bytes = Vec::with_capacity(key.compressed_size());
    key.serialize_compressed(&mut bytes)
        .map_err(|e| KeyError::Setup(e.to_string()))?;
    let staged = path.with_extension(STAGING_EXTENSION);
    std::fs::write(&staged, bytes).map_err(|source| KeyError::Write {
        path: staged.display().to_string(),
        source,
    })?;
    Ok(staged)
}

fn commit_key(staged: &Path, path: &Path) -> Result<(), KeyError> {
    std::fs::rename(staged, path).map_err(|source| KeyError::Write {
        path: path.display().to_string(),
        source,
    })
}

pub struct Groth16Prover {
    proving_key: Arc<ProvingKey<Bn254>>,
}

impl Groth16Prover {
    pub fn new(proving_key: ProvingKey<Bn254>) -> Self {
        Self {
            proving_key: Arc::new(proving_key),
        }
    }
}

impl Prover for Groth16Prover {
    fn prove(&self, witness: &Witness) -> Result<ProofArtifact, ProveError> {
        let circuit = ModExpCircuit::new(*witness);
        let public_inputs = circuit.public_inputs();

        let mut rng = rand::thread_rng();
        let proof = Groth16::<Bn254>::prove(self.proving_key.as_ref(), circuit, &mut rng)
            .map_err(|e| ProveError::Synthesis(e.to_string()))?;

        let mut bytes = Vec::with_capacity(proof.compressed_size());
        proof
            .serialize_compressed(&mut bytes)
            .map_err(|e| ProveError::Serialization(e.to_string()))?;

        Ok(ProofArtifact {
            proof: bytes,
            public_inputs,
        })
    }
}

pub struct Groth16Verifier {
    pvk: PreparedVerifyingKey<Bn254>,
}

impl Groth16Verifier {
    /// Fails if the key was generated for a circuit with a different public input count.
    pub fn new(verifying_key: &VerifyingKey<Bn254>) -> Result<Self, VerifyError> {
        let arity = verifying_key.gamma_abc_g1.len().saturating_sub(1);
        if arity != PUBLIC_INPUT_COUNT {
            return Err(VerifyError::IncompatibleKey(format!(
                "key expects {} public inputs, relation declares {}",
                arity, PUBLIC_INPUT_COUNT
            )));
        }
        let pvk = Groth16::<Bn254>::process_vk(verifying_key)
            .map_err(|e| VerifyError::IncompatibleKey(e.to_string()))?;
        Ok(Self { pvk })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VerifyError> {
        let vk = VerifyingKey::<Bn254>::deserialize_compressed(bytes)
            .map_err(|e| VerifyError::IncompatibleKey(e.to_string()))?;
        Self::new(&vk)
    }
}

/// Decode a compressed proof, rejecting trailing bytes.
fn decode_proof(bytes: &[u8]) -> Result<Proof<Bn254>, VerifyError> {
    let mut reader = bytes;
    let proof = Proof::<Bn254>::deserialize_compressed(&mut reader)
        .map_err(|e| VerifyError::MalformedProof(e.to_string()))?;
    if !reader.is_empty() {
        return Err(VerifyError::MalformedProof(format!(
            "{} trailing bytes",
            reader.len()
        )));
    }
    Ok(proof)
}

impl Verifier for Groth16Verifier {
    fn verify(&self, proof: &[u8], public_inputs: &[FieldElement]) -> Result<bool, VerifyError> {
        check_arity(public_inputs)?;
        let proof = decode_proof(proof)?;
        Groth16::<Bn254>::verify_with_processed_vk(&self.pvk, public_inputs, &proof)
            .map_err(|e| VerifyError::Backend(e.to_string()))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{prove, verifier, TEST_KEYS};
    use super::*;
    use crate::field;

    #[test]
    fn test_round_trip_known_vectors() {
        let verifier = verifier();
        for (b, e, m, y) in [(3u32, 6u32, 7u32, 1u64), (2, 10, 1000, 24)] {
            let artifact = prove(b, e, m);
            assert_eq!(artifact.public_inputs, vec![FieldElement::from(y)]);
            assert_eq!(artifact.proof.len(), 128);
            assert_eq!(
                verifier.verify(&artifact.proof, &artifact.public_inputs),
                Ok(true)
            );
        }
    }

    #[test]
    fn test_round_trip_word_extremes() {
        let verifier = verifier();
        for (b, e, m) in [(u32::MAX, u32::MAX, u32::MAX), (7, 0, 1), (0, 5, 13)] {
            let artifact = prove(b, e, m);
            assert_eq!(
                verifier.verify(&artifact.proof, &artifact.public_inputs),
                Ok(true)
            );
        }
    }

    #[test]
    fn test_wrong_public_input_is_rejected_not_an_error() {
        let artifact = prove(3, 6, 7);
        let result = verifier().verify(&artifact.proof, &[FieldElement::from(2u64)]);
        assert_eq!(result, Ok(false));
    }

    #[test]
    fn test_single_bit_flips_of_public_input_are_rejected() {
        let verifier = verifier();
        let artifact = prove(2, 10, 1000);
        let word = field::encode(&artifact.public_inputs[0]);

        for bit in 0..word.len() * 8 {
            let mut flipped = word.clone();
            flipped[word.len() - 1 - bit / 8] ^= 1 << (bit % 8);
            match field::decode(&flipped) {
                Ok(input) => assert_eq!(
                    verifier.verify(&artifact.proof, &[input]),
                    Ok(false),
                    "bit {}",
                    bit
                ),
                // Setting one of the top bits leaves the field entirely.
                Err(e) => {
                    assert!(bit >= 253, "bit {} failed to decode: {}", bit, e);
                }
            }
        }
    }

    #[test]
    fn test_proof_for_other_witness_is_rejected() {
        let a = prove(3, 6, 7);
        let b = prove(2, 10, 1000);
        assert_eq!(verifier().verify(&a.proof, &b.public_inputs), Ok(false));
    }

    #[test]
    fn test_arity_mismatch_is_structural() {
        let artifact = prove(3, 6, 7);
        let verifier = verifier();
        assert!(matches!(
            verifier.verify(&artifact.proof, &[]),
            Err(VerifyError::ArityMismatch {
                expected: 1,
                actual: 0
            })
        ));
        let two = [artifact.public_inputs[0], artifact.public_inputs[0]];
        assert!(matches!(
            verifier.verify(&artifact.proof, &two),
            Err(VerifyError::ArityMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated_proof_is_structural() {
        let artifact = prove(3, 6, 7);
        let verifier = verifier();
        let truncated = &artifact.proof[..artifact.proof.len() - 1];
        assert!(matches!(
            verifier.verify(truncated, &artifact.public_inputs),
            Err(VerifyError::MalformedProof(_))
        ));
        assert!(matches!(
            verifier.verify(&[], &artifact.public_inputs),
            Err(VerifyError::MalformedProof(_))
        ));
    }

    #[test]
    fn test_trailing_bytes_are_structural() {
        let artifact = prove(3, 6, 7);
        let mut padded = artifact.proof.clone();
        padded.push(0);
        let result = verifier().verify(&padded, &artifact.public_inputs);
        assert!(result.unwrap_err().to_string().contains("trailing"));
    }

    #[test]
    fn test_garbage_proof_is_structural() {
        let result = verifier().verify(&[0xffu8; 128], &[FieldElement::from(1u64)]);
        assert!(matches!(result, Err(VerifyError::MalformedProof(_))));
    }

    #[test]
    fn test_key_with_wrong_arity_is_incompatible() {
        let mut vk = TEST_KEYS.verifying_key.clone();
        let extra = vk.gamma_abc_g1[0];
        vk.gamma_abc_g1.push(extra);
        assert!(matches!(
            Groth16Verifier::new(&vk),
            Err(VerifyError::IncompatibleKey(_))
        ));
    }

    #[test]
    fn test_undecodable_key_is_incompatible() {
        assert!(matches!(
            Groth16Verifier::from_bytes(&[1, 2, 3]),
            Err(VerifyError::IncompatibleKey(_))
        ));
    }

    #[test]
    fn test_verifier_from_key_bytes() {
        let mut bytes = Vec::new();
        TEST_KEYS.verifying_key.serialize_compressed(&mut bytes).unwrap();
        let verifier = Groth16Verifier::from_bytes(&bytes).unwrap();
        let artifact = prove(3, 6, 7);
        assert_eq!(
            verifier.verify(&artifact.proof, &artifact.public_inputs),
            Ok(true)
        );
    }

    #[test]
    fn test_proof_under_foreign_key_is_rejected() {
        let other = Groth16Keys::setup(&mut StdRng::seed_from_u64(7)).unwrap();
        let foreign = Groth16Verifier::new(&other.verifying_key).unwrap();
        let artifact = prove(3, 6, 7);
        assert_eq!(
            foreign.verify(&artifact.proof, &artifact.public_inputs),
            Ok(false)
        );
    }

    #[test]
    fn test_save_and_load_keys() {
        let dir = tempfile::tempdir().unwrap();
        TEST_KEYS.save(dir.path()).unwrap();
        assert!(dir.path().join(PROVING_KEY_FILE).exists());
        assert!(dir.path().join(VERIFYING_KEY_FILE).exists());

        let loaded = Groth16Keys::load(dir.path()).unwrap();
        assert_eq!(loaded.verifying_key, TEST_KEYS.verifying_key);

        let artifact = Groth16Prover::new(loaded.proving_key)
            .prove(&Witness::new(2, 10, 1000).unwrap())
            .unwrap();
        assert_eq!(
            super::test_support::verifier().verify(&artifact.proof, &artifact.public_inputs),
            Ok(true)
        );
    }

    #[test]
    fn test_load_or_setup_reuses_existing_keys() {
        let dir = tempfile::tempdir().unwrap();
        TEST_KEYS.save(dir.path()).unwrap();
        let keys = Groth16Keys::load_or_setup(dir.path(), Some(99)).unwrap();
        assert_eq!(keys.verifying_key, TEST_KEYS.verifying_key);
    }

    #[test]
    fn test_load_or_setup_refuses_half_present_keys() {
        let dir = tempfile::tempdir().unwrap();
        TEST_KEYS.save(dir.path()).unwrap();
        let vk_path = dir.path().join(VERIFYING_KEY_FILE);
        let vk_before = std::fs::read(&vk_path).unwrap();
        std::fs::remove_file(dir.path().join(PROVING_KEY_FILE)).unwrap();

        let result = Groth16Keys::load_or_setup(dir.path(), Some(5));
        assert!(matches!(
            result,
            Err(KeyError::Incomplete {
                missing: PROVING_KEY_FILE,
                ..
            })
        ));
        assert_eq!(std::fs::read(&vk_path).unwrap(), vk_before);
        assert!(!dir.path().join(PROVING_KEY_FILE).exists());

        // Proofs under the original keys still verify against the surviving file.
        let verifier = Groth16Verifier::from_bytes(&vk_before).unwrap();
        let artifact = prove(3, 6, 7);
        assert_eq!(
            verifier.verify(&artifact.proof, &artifact.public_inputs),
            Ok(true)
        );
    }

    #[test]
    fn test_load_or_setup_refuses_missing_verifying_key() {
        let dir = tempfile::tempdir().unwrap();
        TEST_KEYS.save(dir.path()).unwrap();
        std::fs::remove_file(dir.path().join(VERIFYING_KEY_FILE)).unwrap();
        let result = Groth16Keys::load_or_setup(dir.path(), Some(5));
        assert!(matches!(
            result,
            Err(KeyError::Incomplete {
                missing: VERIFYING_KEY_FILE,
                ..
            })
        ));
    }

    #[test]
    fn test_save_leaves_no_staged_files() {
        let dir = tempfile::tempdir().unwrap();
        TEST_KEYS.save(dir.path()).unwrap();
        let mut names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec![PROVING_KEY_FILE, VERIFYING_KEY_FILE]);
    }

    #[test]
    fn test_save_overwrites_previous_pair() {
        let dir = tempfile::tempdir().unwrap();
        let other = Groth16Keys::setup(&mut StdRng::seed_from_u64(11)).unwrap();
        other.save(dir.path()).unwrap();
        TEST_KEYS.save(dir.path()).unwrap();
        let loaded = Groth16Keys::load(dir.path()).unwrap();
        assert_eq!(loaded.verifying_key, TEST_KEYS.verifying_key);
    }

    #[test]
    fn test_load_or_setup_is_reproducible_with_seed() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let a = Groth16Keys::load_or_setup(first.path(), Some(42)).unwrap();
        let b = Groth16Keys::load_or_setup(second.path(), Some(42)).unwrap();
        assert_eq!(a.verifying_key, b.verifying_key);
        assert!(first.path().join(VERIFYING_KEY_FILE).exists());
    }

    #[test]
    fn test_load_missing_dir_fails() {
        let result = Groth16Keys::load(Path::new("/nonexistent/keys/dir"));
        assert!(matches!(result, Err(KeyError::Read { .. })));
    }

    #[test]
    fn test_load_corrupt_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROVING_KEY_FILE), b"junk").unwrap();
        std::fs::write(dir.path().join(VERIFYING_KEY_FILE), b"junk").unwrap();
        let result = Groth16Keys::load(dir.path());
        assert!(matches!(result, Err(KeyError::Decode { .. })));
    }
}
