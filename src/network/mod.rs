// file: src/network/mod.rs
// version: 2.0.0
// guid: dfffa7dd-4d03-4160-bc56-b1972cd8ac50

//! Network operations module

pub mod download;

pub use download::{HttpFetch, NetworkDownloader};
