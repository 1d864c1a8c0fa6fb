// file: src/jobs/node.rs
// version: 1.0.0
// guid: 8ba575b6-b937-4952-981f-ad1fea505731

//! Node records and out-of-band management credentials

use crate::{JobError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Managed node as stored by the platform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub obm_settings: Vec<ObmSetting>,
}

impl Node {
    /// First OBM setting registered for `service`
    pub fn obm_setting(&self, service: &str) -> Option<&ObmSetting> {
        self.obm_settings
            .iter()
            .find(|s| s.service.as_deref() == Some(service))
    }
}

/// Out-of-band management setting attached to a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObmSetting {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub config: ObmConfig,
}

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObmConfig {
    /// BMC address, either an IP/hostname or the BMC MAC address
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl fmt::Debug for ObmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObmConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Node and OBM lookups in the platform datastore
#[async_trait::async_trait]
pub trait NodeStore: Send + Sync {
    async fn find_by_identifier(&self, id: &str) -> Result<Option<Node>>;

    async fn find_obm_by_node(&self, node_id: &str, service: &str) -> Result<Option<ObmSetting>> {
        Ok(self
            .find_by_identifier(node_id)
            .await?
            .and_then(|node| node.obm_setting(service).cloned()))
    }
}

/// Network lookup service mapping BMC MAC addresses to leased IPs
#[async_trait::async_trait]
pub trait AddressResolver: Send + Sync {
    /// Resolve `host`; values that are not MAC addresses come back unchanged
    async fn mac_address_to_ip(&self, host: &str) -> Result<String>;
}

/// Resolved BMC credentials for one command run
#[derive(Clone, PartialEq, Eq)]
pub struct IpmiCredentials {
    pub host: String,
    pub user: String,
    pub password: String,
}

impl IpmiCredentials {
    /// Build credentials from an OBM config, resolving the host address
    pub async fn resolve(config: &ObmConfig, resolver: &dyn AddressResolver) -> Result<Self> {
        let host = config
            .host
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| JobError::validation("OBM setting has no host"))?;
        let user = config
            .user
            .clone()
            .ok_or_else(|| JobError::validation("OBM setting has no user"))?;

        Ok(Self {
            host: resolver.mac_address_to_ip(host).await?,
            user,
            password: config.password.clone().unwrap_or_default(),
        })
    }
}

impl fmt::Debug for IpmiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IpmiCredentials")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}
