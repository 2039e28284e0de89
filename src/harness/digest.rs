//! Digests written into hash artifacts.

use serde::{Deserialize, Serialize};
use sha2::Digest;
use strum::{Display, EnumString};

/// Hash algorithm of the artifact, paired with the engine's mode number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Md5,
    Sha1,
    Sha256,
}

impl DigestAlgorithm {
    /// Mode identifier passed to the engine with `-m`.
    pub fn hashcat_mode(self) -> u32 {
        match self {
            Self::Md5 => 0,
            Self::Sha1 => 100,
            Self::Sha256 => 1400,
        }
    }

    /// Lowercase hex digest of `input`.
    pub fn hex_digest(self, input: &[u8]) -> String {
        match self {
            Self::Md5 => hex::encode(md5::Md5::digest(input)),
            Self::Sha1 => hex::encode(sha1::Sha1::digest(input)),
            Self::Sha256 => hex::encode(sha2::Sha256::digest(input)),
        }
    }
}
