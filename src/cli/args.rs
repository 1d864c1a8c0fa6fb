// file: src/cli/args.rs
// version: 2.0.0
// guid: f6g7h8i9-j0k1-2345-6789-012345fghijk

//! Command line argument definitions

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "metal-provision-jobs")]
#[command(about = "Prepare and inspect bare-metal provisioning jobs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Jobs configuration file (YAML)
    #[arg(short, long, global = true, env = "METAL_JOBS_CONFIG")]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate install options and print the final job options as JSON
    PrepareInstall {
        /// Raw install options file (YAML or JSON)
        #[arg(short, long)]
        options: String,

        /// Target node identifier
        #[arg(short, long)]
        target: String,

        #[arg(long)]
        task_id: Option<uuid::Uuid>,
    },

    /// Fetch vendor boot metadata from an OS repository
    FetchBootConfig {
        #[arg(short, long)]
        repo: String,
    },

    /// Read a password from stdin and print its crypt hash
    HashPassword {
        /// Use SHA-256 crypt instead of SHA-512
        #[arg(long)]
        sha256: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_prepare_install() {
        let cli = Cli::try_parse_from([
            "metal-provision-jobs",
            "--verbose",
            "prepare-install",
            "--options",
            "opts.yaml",
            "--target",
            "node-1",
            "--task-id",
            "0f5b6a74-3d2c-4bb5-9d35-12a5a2f6a0c1",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::PrepareInstall {
                options,
                target,
                task_id,
            } => {
                assert_eq!(options, "opts.yaml");
                assert_eq!(target, "node-1");
                assert!(task_id.is_some());
            }
            _ => panic!("expected prepare-install"),
        }
    }

    #[test]
    fn test_rejects_bad_task_id() {
        let result = Cli::try_parse_from([
            "metal-provision-jobs",
            "prepare-install",
            "-o",
            "opts.yaml",
            "-t",
            "node-1",
            "--task-id",
            "not-a-uuid",
        ]);
        assert!(result.is_err());
    }
}
