use anyhow::{Result, anyhow};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256};

use crate::seed::Seed;

/// Ethereum address of the secp256k1 key whose scalar is `seed`.
pub fn address(seed: &Seed) -> Result<String> {
    let key = SigningKey::from_slice(seed.as_bytes()).map_err(|e| anyhow!("invalid secp256k1 private key: {e}"))?;
    let point = key.verifying_key().as_affine().to_encoded_point(false);

    // Skip the 0x04 SEC1 tag; the address is the low 20 bytes of the hash.
    let hash = Keccak256::digest(&point.as_bytes()[1..]);

    Ok(checksum(&hash[12..]))
}

/// EIP-55 mixed-case encoding.
fn checksum(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut encoded = String::with_capacity(2 + lower.len());
    encoded.push_str("0x");

    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 { hash[i / 2] >> 4 } else { hash[i / 2] & 0x0f };
        if nibble >= 8 {
            encoded.push(c.to_ascii_uppercase());
        } else {
            encoded.push(c);
        }
    }

    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(hex_seed: &str) -> Seed {
        let bytes: [u8; 32] = hex::decode(hex_seed).unwrap().try_into().unwrap();
        Seed::from_bytes(bytes)
    }

    #[test]
    fn test_known_address() {
        let seed = seed("c8c5e5a7f326a2b5f3eee778db6856430d808c32b16e18d8228a93e3d94791a3");
        assert_eq!(address(&seed).unwrap(), "0x0d747F8AdFdE4beF87CF21FEa682083C7149268f");
    }

    #[test]
    fn test_checksum_vector() {
        // Test vector from EIP-55.
        let raw = hex::decode("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        assert_eq!(checksum(&raw), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    #[test]
    fn test_zero_scalar_rejected() {
        assert!(address(&Seed::from_bytes([0u8; 32])).is_err());
    }
}
