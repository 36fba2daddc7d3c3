//! Global allocator for the binary.
//!
//! Every generated address allocates a few short-lived strings on worker
//! threads; mimalloc keeps those allocations thread-local.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
