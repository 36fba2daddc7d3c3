//! Deterministic per-item seed derivation.
//!
//! Each job's seed is `SHA-256(base || decimal(index))`, where `base` is the
//! canonical string form of the run's [`BaseSeed`]. The derivation is a pure
//! function of its inputs, so a fixed base seed reproduces the same sequence
//! of seeds on every run and every machine, while the one-way hash keeps
//! neighbouring seeds unrelated to each other.

use sha2::{Digest, Sha256};

use crate::config::SEED_LEN;
use crate::secret::BaseSeed;

/// A 32-byte per-item seed, used as private key material by the transforms.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seed([u8; SEED_LEN]);

impl Seed {
    #[inline]
    pub const fn from_bytes(bytes: [u8; SEED_LEN]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Seed([... 32 bytes ...])")
    }
}

/// Derives job seeds from one base seed.
pub struct SeedDeriver {
    base: BaseSeed,
}

impl SeedDeriver {
    pub fn new(base: BaseSeed) -> Self {
        Self { base }
    }

    /// Seed for the job at `index`. Never fails.
    pub fn derive(&self, index: u64) -> Seed {
        let mut hasher = Sha256::new();
        hasher.update(self.base.expose_secret().as_bytes());
        hasher.update(index.to_string().as_bytes());
        Seed(hasher.finalize().into())
    }
}
