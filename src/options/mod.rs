// file: src/options/mod.rs
// version: 1.0.0
// guid: 9cf7fc17-e095-4153-81bc-0b4bd3ac1236

//! Install option structures handed to OS install templates
//!
//! Field names follow the camelCase keys the profile and kickstart templates
//! read. Keys this crate does not interpret (`version`, `hostname`,
//! `domain`, vendor extras) are carried through untouched in `extra`.

pub mod processor;

pub use processor::{normalize_repo, OptionsProcessor};

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Options owned by an OS install job for its whole lifetime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallOptions {
    /// Boot profile rendered for the node
    pub profile: String,
    /// Completion token, also used to tell install flavors apart
    pub completion_uri: String,
    /// Installation repository, without trailing slash once processed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_plain_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_encrypted_password: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "falsy_string"
    )]
    pub root_ssh_key: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: Vec<UserAccount>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub network_devices: Vec<NetworkDevice>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dns_servers: Vec<String>,
    /// Kernel path derived from the vendor boot configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tboot_file: Option<String>,
    /// Module list derived from the vendor boot configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_files: Option<String>,
    /// Boot loader module derived from the repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mboot_file: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InstallOptions {
    /// Whether the completion URI names a flavor that needs vendor boot metadata
    pub fn requires_boot_metadata(&self, flavors: &[String]) -> bool {
        !self.completion_uri.is_empty() && flavors.iter().any(|f| *f == self.completion_uri)
    }
}

/// Local account created by the installer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub name: String,
    pub password: String,
    pub uid: u32,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "falsy_string"
    )]
    pub ssh_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plain_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_password: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Network interface configured during install
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDevice {
    pub device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<IpBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<IpBlock>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Static address block for one IP family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpBlock {
    pub ip_addr: String,
    pub gateway: String,
    pub netmask: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Treat `null`, `false` and `""` as an absent string.
fn falsy_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(de::Error::custom(format!(
            "invalid type: {}, expected a string",
            other
        ))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
