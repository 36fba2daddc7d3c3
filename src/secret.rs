use anyhow::{Result, anyhow, ensure};
use rand::TryRngCore;
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};

use crate::config::RANDOM_SEED_LEN;

/// Root seed of a run, in its canonical string form.
///
/// Every per-item seed is derived from this string, so it is as sensitive as
/// all the generated private keys together and is never printed.
pub struct BaseSeed {
    inner: SecretString,
}

impl BaseSeed {
    /// Wraps an already canonical seed string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty.
    pub fn new(seed: &str) -> Result<Self> {
        ensure!(!seed.is_empty(), "base seed cannot be empty");
        Ok(Self { inner: SecretString::from(seed.to_owned()) })
    }

    /// Canonical form of an integer seed: lowercase base 16, sign kept.
    pub fn from_int(value: i64) -> Self {
        let canonical = if value < 0 { format!("-{:x}", value.unsigned_abs()) } else { format!("{value:x}") };
        Self { inner: SecretString::from(canonical) }
    }

    /// Draws a fresh seed from the operating system RNG, hex encoded.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS RNG is unavailable.
    pub fn random() -> Result<Self> {
        let mut bytes = [0u8; RANDOM_SEED_LEN];
        OsRng.try_fill_bytes(&mut bytes).map_err(|e| anyhow!("rng failed: {e}"))?;
        Ok(Self { inner: SecretString::from(hex::encode(bytes)) })
    }

    pub fn expose_secret(&self) -> &str {
        self.inner.expose_secret()
    }
}

impl std::fmt::Debug for BaseSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BaseSeed([... {} chars ...])", self.inner.expose_secret().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_int_is_hex() {
        assert_eq!(BaseSeed::from_int(255).expose_secret(), "ff");
        assert_eq!(BaseSeed::from_int(12345).expose_secret(), "3039");
        assert_eq!(BaseSeed::from_int(-31).expose_secret(), "-1f");
        assert_eq!(BaseSeed::from_int(i64::MIN).expose_secret(), "-8000000000000000");
    }

    #[test]
    fn test_random_is_hex_and_fresh() {
        let a = BaseSeed::random().unwrap();
        let b = BaseSeed::random().unwrap();
        assert_eq!(a.expose_secret().len(), RANDOM_SEED_LEN * 2);
        assert!(a.expose_secret().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.expose_secret(), b.expose_secret());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(BaseSeed::new("").is_err());
        assert_eq!(BaseSeed::new("abc").unwrap().expose_secret(), "abc");
    }

    #[test]
    fn test_debug_redacts() {
        let seed = BaseSeed::new("deadbeef").unwrap();
        assert!(!format!("{seed:?}").contains("deadbeef"));
    }
}
