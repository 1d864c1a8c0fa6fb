// file: src/config/mod.rs
// version: 2.0.0
// guid: 003570b2-0f7a-4562-9c27-3b58edb4ecb0

//! Configuration module for provisioning jobs
//!
//! Handles loading and validation of job settings and raw install options.

pub mod loader;

use crate::{JobError, Result};
use serde::{Deserialize, Serialize};

/// Routing key the IPMI command results are published under
pub const IPMI_COMMAND_ROUTING_KEY: &str = "54edcbb0-437f-44ba-a47c-29446b018052";

/// Settings shared by all provisioning jobs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Outbound HTTP settings
    pub http: HttpSettings,
    /// OS install job settings
    pub install: InstallSettings,
    /// IPMI job settings
    pub ipmi: IpmiSettings,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("metal-provision-jobs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// OS install job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallSettings {
    /// Completion URIs whose install flavor needs vendor boot metadata
    pub boot_metadata_flavors: Vec<String>,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            boot_metadata_flavors: vec!["esx-ks".to_string()],
        }
    }
}

/// IPMI job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpmiSettings {
    /// Routing key for published command results
    pub routing_key: String,
    /// SEL entries requested when the caller gives no count
    pub default_sel_count: u32,
    /// OBM service name carrying the BMC credentials
    pub obm_service: String,
}

impl Default for IpmiSettings {
    fn default() -> Self {
        Self {
            routing_key: IPMI_COMMAND_ROUTING_KEY.to_string(),
            default_sel_count: 25,
            obm_service: "ipmi-obm-service".to_string(),
        }
    }
}

impl JobsConfig {
    /// Validate the job configuration
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            return Err(JobError::config("http.timeout_secs must be greater than zero"));
        }

        self.ipmi.validate()
    }
}

impl IpmiSettings {
    /// Validate IPMI settings
    pub fn validate(&self) -> Result<()> {
        uuid::Uuid::parse_str(&self.routing_key).map_err(|e| {
            JobError::config(format!(
                "ipmi.routing_key '{}' is not a UUID: {}",
                self.routing_key, e
            ))
        })?;

        if self.default_sel_count == 0 {
            return Err(JobError::config("ipmi.default_sel_count must be greater than zero"));
        }

        if self.obm_service.is_empty() {
            return Err(JobError::config("ipmi.obm_service cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = JobsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ipmi.default_sel_count, 25);
        assert_eq!(config.install.boot_metadata_flavors, vec!["esx-ks".to_string()]);
    }

    #[test]
    fn test_invalid_routing_key() {
        let mut config = JobsConfig::default();
        config.ipmi.routing_key = "not-a-uuid".to_string();
        assert!(matches!(config.validate(), Err(JobError::Config(_))));
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut config = JobsConfig::default();
        config.http.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = JobsConfig::default();
        config.ipmi.default_sel_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: JobsConfig = serde_yaml::from_str("ipmi:\n  default_sel_count: 50\n").unwrap();
        assert_eq!(config.ipmi.default_sel_count, 50);
        assert_eq!(config.ipmi.routing_key, IPMI_COMMAND_ROUTING_KEY);
        assert_eq!(config.http.timeout_secs, 30);
    }
}
