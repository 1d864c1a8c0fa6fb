// file: src/cli/commands.rs
// version: 2.0.0
// guid: g7h8i9j0-k1l2-3456-7890-123456ghijkl

//! Command implementations for the CLI

use crate::{
    boot_config::BootConfigFetcher,
    config::{loader::ConfigLoader, JobsConfig},
    logging::job_span,
    network::NetworkDownloader,
    options::{InstallOptions, OptionsProcessor},
    utils::{CryptMethod, CryptoUtils},
    JobError, Result,
};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::{debug, info, Instrument};
use uuid::Uuid;

/// Load the jobs configuration, falling back to defaults without a file
pub fn load_config(path: Option<&str>) -> Result<JobsConfig> {
    match path {
        Some(path) => {
            debug!("Loading jobs config from {}", path);
            ConfigLoader::new().load_jobs_config(path)
        }
        None => Ok(JobsConfig::default()),
    }
}

/// Build the final install options for `target` from a raw options file
pub async fn prepare_install(
    config: &JobsConfig,
    options_path: &str,
    target: &str,
    task_id: Uuid,
) -> Result<InstallOptions> {
    let span = job_span("Job.Os.Install", target, &task_id);
    async {
        let raw = ConfigLoader::new().load_raw_options(options_path)?;
        let mut options = OptionsProcessor::new().process(target, raw)?;

        if options.requires_boot_metadata(&config.install.boot_metadata_flavors) {
            let repo = options.repo.clone().unwrap_or_default();
            info!(repo = %repo, "Fetching boot metadata");
            fetcher(config)?
                .fetch_options(&repo)
                .await?
                .merge_into(&mut options);
        }

        Ok(options)
    }
    .instrument(span)
    .await
}

/// Print the prepared install options as JSON
pub async fn prepare_install_command(
    config: &JobsConfig,
    options_path: &str,
    target: &str,
    task_id: Option<Uuid>,
) -> Result<()> {
    let task_id = task_id.unwrap_or_else(Uuid::new_v4);
    let options = prepare_install(config, options_path, target, task_id).await?;

    print_json(&serde_json::to_value(&options)?)
}

/// Print the boot metadata derived from `repo` as JSON
pub async fn fetch_boot_config_command(config: &JobsConfig, repo: &str) -> Result<()> {
    let boot_config = fetcher(config)?.fetch_options(repo).await?;
    info!("Boot metadata retrieved from {}", repo);

    print_json(&serde_json::to_value(&boot_config)?)
}

/// Hash the first line of `input` as a crypt password
pub fn hash_password<R: BufRead>(mut input: R, sha256: bool) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(JobError::validation("No password given on stdin"));
    }

    let method = if sha256 {
        CryptMethod::Sha256
    } else {
        CryptMethod::Sha512
    };
    CryptoUtils::create_crypt_hash(password, method)
}

/// Read a password from stdin and print its hash
pub fn hash_password_command(sha256: bool) -> Result<()> {
    let hash = hash_password(std::io::stdin().lock(), sha256)?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", hash)?;
    Ok(())
}

fn fetcher(config: &JobsConfig) -> Result<BootConfigFetcher> {
    let downloader = NetworkDownloader::with_settings(&config.http)?;
    Ok(BootConfigFetcher::new(Arc::new(downloader)))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}
