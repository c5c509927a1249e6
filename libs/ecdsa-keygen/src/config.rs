//! The key generation configuration.

use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The configuration for a key generation run.
///
/// The number of iterations of both the DLN and the Paillier correctness proofs are fixed by their message formats
/// and can't be configured: see [DLN_PROOF_ITERATIONS][crate::crypto::range_proof::DLN_PROOF_ITERATIONS] and
/// [PAILLIER_PROOF_ITERATIONS][crate::crypto::paillier::PAILLIER_PROOF_ITERATIONS].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeygenConfig {
    /// The size, in bits, of the Paillier modulus we generate.
    #[serde(default = "default_modulus_bits")]
    pub paillier_modulus_bits: usize,

    /// The size, in bits, of the range proof modulus we generate.
    #[serde(default = "default_modulus_bits")]
    pub ntilde_modulus_bits: usize,

    /// The minimum size, in bits, we accept for any other party's Paillier or range proof modulus.
    #[serde(default = "default_modulus_bits")]
    pub min_modulus_bits: usize,
}

impl KeygenConfig {
    /// Load the configuration from a path.
    ///
    /// Any of the configuration properties can also be overridden by using environment variables prefixed with
    /// `KEYGEN`. For example, the `min_modulus_bits` property can be set by using `KEYGEN__MIN_MODULUS_BITS=3072`.
    /// Note the double underscores to delimit segments.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let source = config::File::from(path.into()).format(config::FileFormat::Yaml);
        let config = config::Config::builder()
            .add_source(source)
            .add_source(config::Environment::with_prefix("KEYGEN").separator("__").try_parsing(true))
            .build()?;
        config.try_deserialize()
    }
}

impl Default for KeygenConfig {
    fn default() -> Self {
        Self {
            paillier_modulus_bits: default_modulus_bits(),
            ntilde_modulus_bits: default_modulus_bits(),
            min_modulus_bits: default_modulus_bits(),
        }
    }
}

fn default_modulus_bits() -> usize {
    2048
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod test {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().expect("failed to create file");
        file.write_all(contents.as_bytes()).expect("failed to write config");
        file
    }

    #[test]
    fn defaults() {
        let config = KeygenConfig::default();
        assert_eq!(config.paillier_modulus_bits, 2048);
        assert_eq!(config.min_modulus_bits, 2048);
    }

    #[test]
    fn load_from_yaml() {
        let file = write_config("paillier_modulus_bits: 3072\nmin_modulus_bits: 1024\n");
        let config = KeygenConfig::load(file.path()).expect("failed to load config");
        assert_eq!(config.paillier_modulus_bits, 3072);
        assert_eq!(config.min_modulus_bits, 1024);
    }

    #[test]
    fn environment_overrides() {
        let file = write_config("ntilde_modulus_bits: 1024\n");
        std::env::set_var("KEYGEN__NTILDE_MODULUS_BITS", "4096");
        let config = KeygenConfig::load(file.path());
        std::env::remove_var("KEYGEN__NTILDE_MODULUS_BITS");
        assert_eq!(config.expect("failed to load config").ntilde_modulus_bits, 4096);
    }

    #[test]
    fn missing_file() {
        assert!(KeygenConfig::load("/this/does/not/exist.yaml").is_err());
    }
}
