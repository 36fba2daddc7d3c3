//! AddrMint - ordered bulk address generation.
//!
//! Derives one seed per index from a base seed, transforms the seeds into
//! blockchain addresses on a pool of worker threads, and writes the results
//! in strict index order:
//! - SHA-256 seed derivation, reproducible for a given base seed
//! - Bounded job and result channels for backpressure
//! - A reorder buffer that restores sequence before emission
//! - Ethereum, Bitcoin and Solana address transforms

pub mod address;
pub mod app;
pub mod config;
pub mod secret;
pub mod seed;
pub mod types;
pub mod ui;
pub mod worker;
