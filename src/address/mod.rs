//! # Address Derivation
//!
//! Turns a 32-byte per-item seed into a public address string. The pipeline
//! only sees the [`Transform`] trait; [`Addresses`] is the implementation the
//! binary uses, dispatching on the job's [`Network`].
//!
//! ## Formats
//!
//! - **Ethereum**: secp256k1, Keccak-256, EIP-55 checksummed hex
//! - **Bitcoin**: secp256k1 compressed key, HASH160, Base58Check P2PKH
//! - **Solana**: Ed25519 public key in Base58
//!
//! All three are pure functions of the seed. A seed that is not a valid
//! secp256k1 scalar is reported as an error rather than silently reduced.

use anyhow::Result;

mod bitcoin;
mod ethereum;
mod solana;

use crate::seed::Seed;
use crate::types::Network;

/// A deterministic, thread-safe seed-to-output function.
///
/// Implementations are shared by every worker, so they must be `Send + Sync`
/// and must not rely on per-call mutable state.
pub trait Transform: Send + Sync {
    /// Derives the output for `seed` in the format selected by `network`.
    ///
    /// # Errors
    ///
    /// Returns an error if the seed is not valid key material for `network`.
    fn derive(&self, network: Network, seed: &Seed) -> Result<String>;
}

/// The address transforms for every supported [`Network`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Addresses;

impl Transform for Addresses {
    #[inline]
    fn derive(&self, network: Network, seed: &Seed) -> Result<String> {
        match network {
            Network::Ethereum => ethereum::address(seed),
            Network::Bitcoin => bitcoin::address(seed),
            Network::Solana => Ok(solana::address(seed)),
        }
    }
}
