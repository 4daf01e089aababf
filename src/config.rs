use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Groth16,
    Noir,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Groth16 => "groth16",
            BackendKind::Noir => "noir",
        }
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groth16" => Ok(BackendKind::Groth16),
            "noir" | "ultrahonk" => Ok(BackendKind::Noir),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

// ─────────────────────────────────────────────
// Configuration from environment
// ─────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub backend: BackendKind,
    /// Groth16 proving/verifying keys.
    pub keys_dir: PathBuf,
    /// Deterministic Groth16 setup, for development only.
    pub setup_seed: Option<u64>,
    /// Compiled Noir circuits.
    pub circuits_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value: v,
            })?,
            None => 4003,
        };

        let backend = match lookup("PROOF_BACKEND") {
            Some(v) => v.parse()?,
            None => BackendKind::Groth16,
        };

        let setup_seed = match lookup("SETUP_SEED") {
            Some(v) => Some(v.parse().map_err(|_| ConfigError::InvalidValue {
                name: "SETUP_SEED",
                value: v,
            })?),
            None => None,
        };

        let keys_dir = PathBuf::from(lookup("KEYS_DIR").unwrap_or_else(|| "./keys".to_string()));
        let circuits_dir =
            PathBuf::from(lookup("CIRCUITS_DIR").unwrap_or_else(|| "./circuits".to_string()));

        Ok(Self {
            port,
            backend,
            keys_dir,
            setup_seed,
            circuits_dir,
        })
    }
}
