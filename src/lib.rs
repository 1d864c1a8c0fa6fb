// file: src/lib.rs
// version: 3.0.0
// guid: d82472d1-7f0f-4eb4-b0a3-6e1547103eb4

//! # Metal Provision Jobs
//!
//! Provisioning jobs for bare-metal nodes: OS install option processing,
//! vendor boot metadata retrieval, install completion tracking, IPMI command
//! dispatch and IPMI hardware catalogs.

pub mod boot_config;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod network;
pub mod options;
pub mod utils;

pub use error::{JobError, Result};

/// Version information for the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
