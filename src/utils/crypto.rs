// file: src/utils/crypto.rs
// version: 2.0.0
// guid: daf64ba6-e548-488d-9097-0dec2ddff524

use crate::{JobError, Result};
use sha_crypt::{
    sha256_check, sha256_simple, sha512_check, sha512_simple, Sha256Params, Sha512Params,
    ROUNDS_DEFAULT,
};

/// Cryptographic utilities for install options
pub struct CryptoUtils;

impl CryptoUtils {
    /// Create a crypt-style password hash (for /etc/shadow compatibility).
    ///
    /// A fresh random salt is drawn on every call, so hashing the same
    /// password twice yields two different strings that both verify.
    pub fn create_crypt_hash(password: &str, method: CryptMethod) -> Result<String> {
        match method {
            CryptMethod::Sha256 => {
                let params = Sha256Params::new(ROUNDS_DEFAULT)
                    .map_err(|e| JobError::other(format!("Invalid sha256 crypt params: {:?}", e)))?;
                sha256_simple(password, &params)
                    .map_err(|e| JobError::other(format!("Failed to hash password: {:?}", e)))
            }
            CryptMethod::Sha512 => {
                let params = Sha512Params::new(ROUNDS_DEFAULT)
                    .map_err(|e| JobError::other(format!("Invalid sha512 crypt params: {:?}", e)))?;
                sha512_simple(password, &params)
                    .map_err(|e| JobError::other(format!("Failed to hash password: {:?}", e)))
            }
        }
    }

    /// Verify a password against a crypt-style hash
    pub fn verify_crypt_hash(password: &str, hash: &str) -> bool {
        match CryptMethod::from_hash(hash) {
            Some(CryptMethod::Sha256) => sha256_check(password, hash).is_ok(),
            Some(CryptMethod::Sha512) => sha512_check(password, hash).is_ok(),
            None => false,
        }
    }
}

/// Supported crypt methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptMethod {
    Sha256,
    Sha512,
}

impl CryptMethod {
    /// Modular crypt format identifier
    pub fn prefix(&self) -> &'static str {
        match self {
            CryptMethod::Sha256 => "$5$",
            CryptMethod::Sha512 => "$6$",
        }
    }

    /// Detect the method from an existing hash string
    pub fn from_hash(hash: &str) -> Option<Self> {
        [CryptMethod::Sha512, CryptMethod::Sha256]
            .into_iter()
            .find(|m| hash.starts_with(m.prefix()))
    }
}
