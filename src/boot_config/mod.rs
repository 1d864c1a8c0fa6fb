// file: src/boot_config/mod.rs
// version: 1.0.0
// guid: 16a0576d-9a76-4641-8ba0-5a5f973d176e

//! Vendor boot configuration retrieval
//!
//! ESXi repositories ship a `boot.cfg` manifest naming the kernel and module
//! files needed for a network install. Official ISOs use upper-case names
//! (`BOOT.CFG`), extracted or mirrored trees are often lower-case, so the
//! manifest is tried in upper case first and lower case second. Every path
//! derived from it keeps the case of the name that was actually served.

use crate::network::HttpFetch;
use crate::options::InstallOptions;
use crate::{JobError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Naming convention of the files in a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameCase {
    Upper,
    Lower,
}

impl NameCase {
    /// Boot manifest file name
    pub fn boot_cfg_name(&self) -> &'static str {
        match self {
            NameCase::Upper => "BOOT.CFG",
            NameCase::Lower => "boot.cfg",
        }
    }

    /// Multiboot loader module file name
    pub fn mboot_name(&self) -> &'static str {
        match self {
            NameCase::Upper => "MBOOT.C32",
            NameCase::Lower => "mboot.c32",
        }
    }

    fn apply(&self, value: &str) -> String {
        match self {
            NameCase::Upper => value.to_uppercase(),
            NameCase::Lower => value.to_lowercase(),
        }
    }
}

/// Boot files resolved against the install repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootConfig {
    pub tboot_file: String,
    pub module_files: String,
    pub mboot_file: String,
}

impl BootConfig {
    /// Derive boot files from manifest text served under `case` by `repo`
    pub fn from_boot_cfg(data: &str, case: NameCase, repo: &str) -> Self {
        let rooted = |key: &str| {
            case.apply(&extract_value(data, key))
                .replace('/', &format!("{}/", repo))
        };

        Self {
            tboot_file: rooted("kernel"),
            module_files: rooted("modules"),
            mboot_file: format!("{}/{}", repo, case.mboot_name()),
        }
    }

    /// Copy each field into `options` unless the caller already set it
    pub fn merge_into(self, options: &mut InstallOptions) {
        options.tboot_file.get_or_insert(self.tboot_file);
        options.module_files.get_or_insert(self.module_files);
        options.mboot_file.get_or_insert(self.mboot_file);
    }
}

/// Text between the first `key=` in `data` and the next newline.
///
/// Empty when the key is absent or no newline follows it. A trailing CR is
/// dropped.
///
/// ```
/// use metal_provision_jobs::boot_config::extract_value;
///
/// let data = "key1=abc def\nkey2=12xyz - pmq\nkey3=pmq,abq";
/// assert_eq!(extract_value(data, "key2"), "12xyz - pmq");
/// assert_eq!(extract_value(data, "key3"), "");
/// assert_eq!(extract_value(data, "key4"), "");
/// ```
pub fn extract_value(data: &str, key: &str) -> String {
    let token = format!("{}=", key);
    let Some(start) = data.find(&token).map(|pos| pos + token.len()) else {
        return String::new();
    };

    match data[start..].find('\n') {
        Some(end) => data[start..start + end].trim_end_matches('\r').to_string(),
        None => String::new(),
    }
}

/// Fetches and parses the boot manifest of an install repository
pub struct BootConfigFetcher {
    http: Arc<dyn HttpFetch>,
}

impl BootConfigFetcher {
    /// Create a fetcher over the given HTTP client
    pub fn new(http: Arc<dyn HttpFetch>) -> Self {
        Self { http }
    }

    /// Fetch the boot configuration of `repo`.
    ///
    /// The lower-case attempt starts only after the upper-case one failed
    /// with a transport error; if both fail the combined error is returned.
    pub async fn fetch_options(&self, repo: &str) -> Result<BootConfig> {
        validate_repo(repo)?;

        let (data, case) = match self.download(repo, NameCase::Upper).await {
            Ok(data) => (data, NameCase::Upper),
            Err(upper_err) if upper_err.is_fatal() => return Err(upper_err),
            Err(upper_err) => {
                warn!(
                    repo = repo,
                    error = %upper_err,
                    "Upper-case boot.cfg unavailable, trying lower case"
                );
                match self.download(repo, NameCase::Lower).await {
                    Ok(data) => (data, NameCase::Lower),
                    Err(lower_err) => {
                        return Err(JobError::network(format!(
                            "Unable to fetch boot configuration from {}: {}; {}",
                            repo, upper_err, lower_err
                        )))
                    }
                }
            }
        };

        let config = BootConfig::from_boot_cfg(&data, case, repo);
        debug!(?config, "Boot options from external repo");
        Ok(config)
    }

    async fn download(&self, repo: &str, case: NameCase) -> Result<String> {
        self.http
            .get_text(&format!("{}/{}", repo, case.boot_cfg_name()))
            .await
    }
}

fn validate_repo(repo: &str) -> Result<()> {
    if repo.is_empty() {
        return Err(JobError::validation("options.repo is required to fetch boot metadata"));
    }

    url::Url::parse(repo).map_err(|e| {
        JobError::validation(format!("options.repo '{}' is not a valid URL: {}", repo, e))
    })?;

    Ok(())
}
