use anyhow::{Result, anyhow};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::seed::Seed;

/// Mainnet pay-to-pubkey-hash version byte.
const P2PKH_VERSION: u8 = 0x00;

/// Legacy P2PKH address of the compressed secp256k1 key whose scalar is `seed`.
pub fn address(seed: &Seed) -> Result<String> {
    let key = SigningKey::from_slice(seed.as_bytes()).map_err(|e| anyhow!("invalid secp256k1 private key: {e}"))?;
    let point = key.verifying_key().as_affine().to_encoded_point(true);

    let hash160 = Ripemd160::digest(Sha256::digest(point.as_bytes()));

    let mut payload = Vec::with_capacity(1 + hash160.len() + 4);
    payload.push(P2PKH_VERSION);
    payload.extend_from_slice(&hash160);

    let check = Sha256::digest(Sha256::digest(&payload));
    payload.extend_from_slice(&check[..4]);

    Ok(bs58::encode(payload).into_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_p2pkh_shape() {
        let bytes: [u8; 32] = hex::decode("c8c5e5a7f326a2b5f3eee778db6856430d808c32b16e18d8228a93e3d94791a3").unwrap().try_into().unwrap();
        let address = address(&Seed::from_bytes(bytes)).unwrap();

        assert!(address.starts_with('1'), "unexpected prefix: {address}");
        assert!((26..=35).contains(&address.len()), "unexpected length: {}", address.len());

        let decoded = bs58::decode(&address).into_vec().unwrap();
        assert_eq!(decoded.len(), 25);
        assert_eq!(decoded[0], P2PKH_VERSION);
        let check = Sha256::digest(Sha256::digest(&decoded[..21]));
        assert_eq!(&decoded[21..], &check[..4]);
    }

    #[test]
    fn test_private_key_one() {
        // The generator point's well-known compressed-key address.
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        assert_eq!(address(&Seed::from_bytes(bytes)).unwrap(), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
    }

    #[test]
    fn test_zero_scalar_rejected() {
        assert!(address(&Seed::from_bytes([0u8; 32])).is_err());
    }
}
