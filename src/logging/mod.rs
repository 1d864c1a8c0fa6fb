// file: src/logging/mod.rs
// version: 2.0.0
// guid: 242e8c23-2eb1-4e17-9d93-9c4e4baeaf89

//! Logging system for provisioning jobs

pub mod logger;

pub use logger::{init_json_logger, init_logger, job_span};
