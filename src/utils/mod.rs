// file: src/utils/mod.rs
// version: 2.0.0
// guid: b71d9df0-a8be-4156-a2a1-32925d0cc023

//! Shared utilities

pub mod crypto;

pub use crypto::{CryptMethod, CryptoUtils};
