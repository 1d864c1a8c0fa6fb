// file: src/config/loader.rs
// version: 2.0.0
// guid: f947d6ed-51b9-459b-996c-3df77f16c9fc

//! Configuration file loading and environment variable substitution

use super::JobsConfig;
use crate::{JobError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
    env_vars: HashMap<String, String>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
        }
    }

    /// Load job settings from a YAML file
    pub fn load_jobs_config<P: AsRef<Path>>(&self, path: P) -> Result<JobsConfig> {
        let content = self.read(path.as_ref(), "jobs config")?;
        let expanded = self.expand_env_vars(&content)?;
        let config: JobsConfig = serde_yaml::from_str(&expanded)?;

        config.validate()?;

        Ok(config)
    }

    /// Load raw install options from a YAML or JSON file.
    ///
    /// The document is returned untyped: typing and validation belong to
    /// the options processor so that malformed fields surface as
    /// validation errors rather than parse errors.
    pub fn load_raw_options<P: AsRef<Path>>(&self, path: P) -> Result<serde_json::Value> {
        let content = self.read(path.as_ref(), "install options")?;
        let expanded = self.expand_env_vars(&content)?;
        let value: serde_json::Value = serde_yaml::from_str(&expanded)?;

        if !value.is_object() {
            return Err(JobError::config(format!(
                "Install options file {} must contain a mapping",
                path.as_ref().display()
            )));
        }

        Ok(value)
    }

    fn read(&self, path: &Path, what: &str) -> Result<String> {
        fs::read_to_string(path).map_err(|e| {
            JobError::config(format!(
                "Failed to read {} file {}: {}",
                what,
                path.display(),
                e
            ))
        })
    }

    /// Expand environment variables in configuration content
    fn expand_env_vars(&self, content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| JobError::config(format!("Invalid regex pattern: {}", e)))?;

        let mut result = content.to_string();
        let mut missing_vars = Vec::new();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];

            if let Some(value) = self.env_vars.get(var_name) {
                result = result.replace(placeholder, value);
            } else if !missing_vars.iter().any(|v| v == var_name) {
                missing_vars.push(var_name.to_string());
            }
        }

        if !missing_vars.is_empty() {
            return Err(JobError::config(format!(
                "Missing environment variables: {}",
                missing_vars.join(", ")
            )));
        }

        Ok(result)
    }

    /// Set environment variable for substitution
    pub fn set_env_var(&mut self, key: String, value: String) {
        self.env_vars.insert(key, value);
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_env_var_expansion() {
        let mut loader = ConfigLoader::new();
        loader.set_env_var("TEST_VAR".to_string(), "test_value".to_string());

        let content = "key: ${TEST_VAR}";
        let result = loader.expand_env_vars(content).unwrap();
        assert_eq!(result, "key: test_value");
    }

    #[test]
    fn test_missing_env_var() {
        let loader = ConfigLoader::new();
        let content = "key: ${MPJ_SURELY_MISSING_VAR}";

        let result = loader.expand_env_vars(content);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Missing environment variables"));
    }

    #[test]
    fn test_load_jobs_config() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
http:
  timeout_secs: 10
install:
  boot_metadata_flavors:
    - esx-ks
    - esx6-ks
ipmi:
  default_sel_count: 40
"#
        )
        .unwrap();

        let loader = ConfigLoader::new();
        let config = loader.load_jobs_config(file.path())?;

        assert_eq!(config.http.timeout_secs, 10);
        assert_eq!(config.install.boot_metadata_flavors.len(), 2);
        assert_eq!(config.ipmi.default_sel_count, 40);

        Ok(())
    }

    #[test]
    fn test_load_raw_options_with_substitution() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
profile: install-esx.ipxe
completionUri: esx-ks
rootPassword: ${{ROOT_PW}}
users:
  - name: admin
    password: secret
    uid: 1010
"#
        )
        .unwrap();

        let mut loader = ConfigLoader::new();
        loader.set_env_var("ROOT_PW".to_string(), "hunter2".to_string());
        let raw = loader.load_raw_options(file.path())?;

        assert_eq!(raw["rootPassword"], "hunter2");
        assert_eq!(raw["users"][0]["uid"], 1010);

        Ok(())
    }

    #[test]
    fn test_load_raw_options_rejects_scalar() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "just a string").unwrap();

        let loader = ConfigLoader::new();
        assert!(matches!(
            loader.load_raw_options(file.path()),
            Err(JobError::Config(_))
        ));
    }
}
