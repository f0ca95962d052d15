//! # Cryptography module
//!
//! Algorithm identifiers and the primitives behind them. The actual
//! implementations come from the RustCrypto crates.

pub mod checksum;
pub mod ecc_curve;
pub mod hash;
pub mod public_key;
pub mod sym;
