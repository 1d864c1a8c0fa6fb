// file: src/options/processor.rs
// version: 1.0.0
// guid: 81338042-7a34-442b-9f27-c76ce08ddbbd

//! Validation, normalization and credential derivation for install options

use super::{InstallOptions, IpBlock};
use crate::utils::{CryptMethod, CryptoUtils};
use crate::{JobError, Result};
use serde_json::Value;
use tracing::debug;

/// Turns raw, partially specified install options into the form templates consume.
///
/// Runs synchronously at job construction, before any network activity.
pub struct OptionsProcessor {
    hash_method: CryptMethod,
}

impl OptionsProcessor {
    /// Create a processor hashing passwords with SHA-512 crypt
    pub fn new() -> Self {
        Self {
            hash_method: CryptMethod::Sha512,
        }
    }

    /// Validate, normalize and derive credentials for `raw`, targeting node `target`
    pub fn process(&self, target: &str, raw: Value) -> Result<InstallOptions> {
        if target.is_empty() {
            return Err(JobError::validation("context.target must be a non-empty string"));
        }

        let mut options: InstallOptions = serde_json::from_value(raw)
            .map_err(|e| JobError::validation(format!("Invalid install options: {}", e)))?;

        validate(&options)?;
        convert(&mut options);
        self.derive_passwords(&mut options)?;

        debug!(
            profile = %options.profile,
            users = options.users.len(),
            devices = options.network_devices.len(),
            "Install options processed"
        );

        Ok(options)
    }

    /// Keep the plain password for installers that need it (ESXi) and a
    /// crypt hash for those that write it to the shadow file (CentOS/RHEL).
    fn derive_passwords(&self, options: &mut InstallOptions) -> Result<()> {
        for user in options.users.iter_mut() {
            if !user.password.is_empty() {
                user.plain_password = Some(user.password.clone());
                user.encrypted_password =
                    Some(CryptoUtils::create_crypt_hash(&user.password, self.hash_method)?);
            }
        }

        if let Some(password) = options.root_password.as_deref().filter(|p| !p.is_empty()) {
            options.root_plain_password = Some(password.to_string());
            options.root_encrypted_password =
                Some(CryptoUtils::create_crypt_hash(password, self.hash_method)?);
        }

        Ok(())
    }
}

impl Default for OptionsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Trim the repository URL and strip exactly one trailing slash.
///
/// `http://host/repo/` and `http://host/repo` name the same repository;
/// templates expect the latter.
pub fn normalize_repo(repo: &str) -> String {
    let trimmed = repo.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
}

fn validate(options: &InstallOptions) -> Result<()> {
    if options.completion_uri.is_empty() {
        return Err(JobError::validation("options.completionUri must be a non-empty string"));
    }

    if options.profile.is_empty() {
        return Err(JobError::validation("options.profile must be a non-empty string"));
    }

    for (index, dev) in options.network_devices.iter().enumerate() {
        if dev.device.is_empty() {
            return Err(JobError::validation(format!(
                "options.networkDevices[{}].device must be a non-empty string",
                index
            )));
        }
        if let Some(block) = &dev.ipv4 {
            validate_ip_block(block, index, "ipv4")?;
        }
        if let Some(block) = &dev.ipv6 {
            validate_ip_block(block, index, "ipv6")?;
        }
    }

    for (index, user) in options.users.iter().enumerate() {
        if user.name.is_empty() {
            return Err(JobError::validation(format!(
                "options.users[{}].name must be a non-empty string",
                index
            )));
        }
    }

    Ok(())
}

fn validate_ip_block(block: &IpBlock, index: usize, family: &str) -> Result<()> {
    let fields = [
        ("ipAddr", &block.ip_addr),
        ("gateway", &block.gateway),
        ("netmask", &block.netmask),
    ];

    for (name, value) in fields {
        if value.is_empty() {
            return Err(JobError::validation(format!(
                "options.networkDevices[{}].{}.{} must be a non-empty string",
                index, family, name
            )));
        }
    }

    Ok(())
}

fn convert(options: &mut InstallOptions) {
    options.repo = options
        .repo
        .as_deref()
        .map(normalize_repo)
        .filter(|r| !r.is_empty());

    // Templates render a present-but-empty key literally, so drop it entirely.
    if options.root_ssh_key.as_deref() == Some("") {
        options.root_ssh_key = None;
    }
    for user in options.users.iter_mut() {
        if user.ssh_key.as_deref() == Some("") {
            user.ssh_key = None;
        }
    }
}
