//! Stable fingerprints over button-set configurations. Two messages carry
//! the same fingerprint exactly when their canonical configuration fields
//! are identical, which is what the cache uses to decide whether a freshly
//! posted button set supersedes an older one.

use std::fmt;

use sha2::{Digest, Sha256};

use super::custom_id::CONFIG_DELIMITER;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigFingerprint(pub u64);

impl ConfigFingerprint {
    /// Fingerprint of the delimiter-joined canonical field list.
    pub fn of_fields<S: AsRef<str>>(fields: &[S]) -> Self {
        let canonical =
            fields.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(CONFIG_DELIMITER);
        Self::of_canonical(&canonical)
    }

    pub fn of_canonical(canonical: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let digest = hasher.finalize();
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        Self(u64::from_be_bytes(prefix))
    }
}

impl fmt::Display for ConfigFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
