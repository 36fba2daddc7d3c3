use ed25519_dalek::SigningKey;

use crate::seed::Seed;

/// Solana address: the Base58 Ed25519 public key of the keypair seeded by `seed`.
///
/// Every 32-byte string is a valid Ed25519 secret seed, so this cannot fail.
pub fn address(seed: &Seed) -> String {
    let key = SigningKey::from_bytes(seed.as_bytes());
    bs58::encode(key.verifying_key().to_bytes()).into_string()
}
