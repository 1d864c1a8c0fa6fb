// file: src/jobs/ipmi_catalog.rs
// version: 1.0.0
// guid: ee4a7523-7520-4e5e-b07c-1b3e4e7956b8

//! IPMI catalog job: runs raw ipmitool commands and catalogs the parsed output

use super::node::{AddressResolver, IpmiCredentials, NodeStore};
use super::{JobContext, JobLifecycle, JobOutcome};
use crate::catalog::{CatalogFilter, CatalogStore, ParsedRecord};
use crate::config::IpmiSettings;
use crate::logging::job_span;
use crate::{JobError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn, Instrument, Span};

/// Task options for the catalog job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpmiCatalogOptions {
    /// ipmitool sub-commands, e.g. `sdr` or `lan print`
    pub commands: Vec<String>,
    /// Non-zero exit codes treated as success
    #[serde(default)]
    pub accepted_response_codes: Vec<i32>,
}

/// Exit status and output of one ipmitool run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Output of one catalog command as handed to the parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub cmd: String,
    pub stdout: String,
    pub stderr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs ipmitool with a prepared argument vector
#[async_trait::async_trait]
pub trait IpmiCommandRunner: Send + Sync {
    async fn run(&self, args: &[String]) -> Result<CommandOutput>;
}

/// Converts command responses into catalog records
#[async_trait::async_trait]
pub trait CommandParser: Send + Sync {
    async fn parse_tasks(&self, responses: Vec<CommandResponse>) -> Result<Vec<ParsedRecord>>;
}

/// Collaborators of the IPMI catalog job
#[derive(Clone)]
pub struct IpmiCatalogDeps {
    pub nodes: Arc<dyn NodeStore>,
    pub resolver: Arc<dyn AddressResolver>,
    pub runner: Arc<dyn IpmiCommandRunner>,
    pub parser: Arc<dyn CommandParser>,
    pub catalogs: Arc<dyn CatalogStore>,
    pub lifecycle: Arc<dyn JobLifecycle>,
}

pub struct IpmiCatalogJob {
    options: IpmiCatalogOptions,
    context: JobContext,
    deps: IpmiCatalogDeps,
    settings: IpmiSettings,
    span: Span,
}

impl IpmiCatalogJob {
    pub const NAME: &'static str = "Job.Ipmi.Catalog";

    pub fn new(
        options: IpmiCatalogOptions,
        context: JobContext,
        deps: IpmiCatalogDeps,
        settings: IpmiSettings,
    ) -> Result<Self> {
        if options.commands.is_empty() {
            return Err(JobError::validation("options.commands must not be empty"));
        }
        if options.commands.iter().any(|c| c.trim().is_empty()) {
            return Err(JobError::validation("options.commands must not contain blank commands"));
        }

        let span = job_span(Self::NAME, &context.target, &context.task_id);
        Ok(Self {
            options,
            context,
            deps,
            settings,
            span,
        })
    }

    pub fn node_id(&self) -> &str {
        &self.context.target
    }

    pub fn commands(&self) -> &[String] {
        &self.options.commands
    }

    /// ipmitool arguments for `cmd` against the BMC in `creds`
    pub fn format_cmd(creds: &IpmiCredentials, cmd: &str) -> Vec<String> {
        let mut args = vec![
            "-U".to_string(),
            creds.user.clone(),
            "-P".to_string(),
            creds.password.clone(),
            "-H".to_string(),
            creds.host.clone(),
        ];
        args.extend(cmd.split_whitespace().map(str::to_string));
        args
    }

    pub async fn run(&self) -> Result<JobOutcome> {
        async {
            match self.execute().await {
                Ok(count) => {
                    info!(catalogs = count, "IPMI catalog stored");
                    self.deps.lifecycle.complete().await?;
                    Ok(JobOutcome::Completed)
                }
                Err(err) => {
                    error!(error = %err, "IPMI catalog job failed");
                    self.deps.lifecycle.fail(&err).await?;
                    Err(err)
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    async fn execute(&self) -> Result<usize> {
        let node = self
            .deps
            .nodes
            .find_by_identifier(self.node_id())
            .await?
            .ok_or_else(|| JobError::validation("No node for ipmi catalog"))?;

        let setting = node
            .obm_setting(&self.settings.obm_service)
            .filter(|s| s.config.host.is_some())
            .ok_or_else(|| JobError::validation("No ipmi obmSettings for ipmi catalog"))?;
        let creds = IpmiCredentials::resolve(&setting.config, self.deps.resolver.as_ref()).await?;

        let mut responses = Vec::with_capacity(self.options.commands.len());
        for cmd in &self.options.commands {
            responses.push(self.run_command(&creds, cmd).await);
        }

        self.handle_response(responses).await
    }

    /// A failed command becomes a response carrying an error rather than aborting the job
    async fn run_command(&self, creds: &IpmiCredentials, cmd: &str) -> CommandResponse {
        let args = Self::format_cmd(creds, cmd);
        match self.deps.runner.run(&args).await {
            Ok(output) => {
                let accepted = output.exit_code == 0
                    || self.options.accepted_response_codes.contains(&output.exit_code);
                let error = if accepted {
                    None
                } else {
                    warn!(cmd = cmd, exit_code = output.exit_code, "ipmitool command failed");
                    Some(format!("exit code {}: {}", output.exit_code, output.stderr.trim()))
                };
                CommandResponse {
                    cmd: cmd.to_string(),
                    stdout: output.stdout,
                    stderr: output.stderr,
                    error,
                }
            }
            Err(err) => {
                warn!(cmd = cmd, error = %err, "ipmitool command could not be run");
                CommandResponse {
                    cmd: cmd.to_string(),
                    stdout: String::new(),
                    stderr: String::new(),
                    error: Some(err.to_string()),
                }
            }
        }
    }

    /// Parse `responses` and persist the storable records for this node
    pub async fn handle_response(&self, responses: Vec<CommandResponse>) -> Result<usize> {
        let records = self.deps.parser.parse_tasks(responses).await?;
        CatalogFilter::new(self.deps.catalogs.as_ref())
            .persist(self.node_id(), records)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::jobs::node::testing::{MemoryNodes, StaticResolver};
    use crate::jobs::node::{Node, ObmConfig, ObmSetting};
    use crate::jobs::testing::{LifecycleEvent, RecordingLifecycle};
    use serde_json::json;
    use std::sync::Mutex;

    struct ScriptedRunner {
        exit_code: i32,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedRunner {
        fn exiting(exit_code: i32) -> Self {
            Self {
                exit_code,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl IpmiCommandRunner for ScriptedRunner {
        async fn run(&self, args: &[String]) -> Result<CommandOutput> {
            self.calls.lock().unwrap().push(args.to_vec());
            Ok(CommandOutput {
                stdout: format!("output of {}", args[6..].join(" ")),
                stderr: String::new(),
                exit_code: self.exit_code,
            })
        }
    }

    /// Returns canned records and remembers what it was given
    #[derive(Default)]
    struct CannedParser {
        records: Vec<ParsedRecord>,
        seen: Mutex<Vec<CommandResponse>>,
    }

    #[async_trait::async_trait]
    impl CommandParser for CannedParser {
        async fn parse_tasks(&self, responses: Vec<CommandResponse>) -> Result<Vec<ParsedRecord>> {
            self.seen.lock().unwrap().extend(responses);
            Ok(self.records.clone())
        }
    }

    #[derive(Default)]
    struct RecordingCatalogs {
        created: Mutex<Vec<CatalogEntry>>,
    }

    #[async_trait::async_trait]
    impl CatalogStore for RecordingCatalogs {
        async fn create(&self, entry: CatalogEntry) -> Result<()> {
            self.created.lock().unwrap().push(entry);
            Ok(())
        }
    }

    fn options() -> IpmiCatalogOptions {
        IpmiCatalogOptions {
            commands: vec!["sdr".to_string(), "lan print".to_string()],
            accepted_response_codes: vec![1],
        }
    }

    fn deps(
        nodes: MemoryNodes,
        runner: Arc<ScriptedRunner>,
        parser: Arc<CannedParser>,
        catalogs: Arc<RecordingCatalogs>,
        lifecycle: Arc<RecordingLifecycle>,
    ) -> IpmiCatalogDeps {
        IpmiCatalogDeps {
            nodes: Arc::new(nodes),
            resolver: Arc::new(StaticResolver),
            runner,
            parser,
            catalogs,
            lifecycle,
        }
    }

    fn default_deps() -> IpmiCatalogDeps {
        deps(
            MemoryNodes::with_ipmi_node("testid", "172.31.128.11"),
            Arc::new(ScriptedRunner::exiting(0)),
            Arc::new(CannedParser::default()),
            Arc::new(RecordingCatalogs::default()),
            Arc::new(RecordingLifecycle::default()),
        )
    }

    #[test]
    fn test_format_cmd() {
        let job = IpmiCatalogJob::new(
            options(),
            JobContext::new("bc7dab7e8fb7d6abf8e7d6ac"),
            default_deps(),
            IpmiSettings::default(),
        )
        .unwrap();
        let creds = IpmiCredentials {
            host: "172.31.128.11".to_string(),
            user: "admin".to_string(),
            password: "password".to_string(),
        };

        let cmds: Vec<Vec<String>> = job
            .commands()
            .iter()
            .map(|cmd| IpmiCatalogJob::format_cmd(&creds, cmd))
            .collect();

        assert_eq!(
            cmds,
            vec![
                vec!["-U", "admin", "-P", "password", "-H", "172.31.128.11", "sdr"],
                vec!["-U", "admin", "-P", "password", "-H", "172.31.128.11", "lan", "print"],
            ]
        );
    }

    #[test]
    fn test_empty_commands_rejected() {
        let result = IpmiCatalogJob::new(
            IpmiCatalogOptions {
                commands: vec![],
                accepted_response_codes: vec![],
            },
            JobContext::new("testid"),
            default_deps(),
            IpmiSettings::default(),
        );
        assert!(matches!(result, Err(JobError::Validation(_))));
    }

    #[tokio::test]
    async fn test_fails_if_node_does_not_exist() {
        let lifecycle = Arc::new(RecordingLifecycle::default());
        let job = IpmiCatalogJob::new(
            options(),
            JobContext::new("bc7dab7e8fb7d6abf8e7d6ac"),
            deps(
                MemoryNodes::default(),
                Arc::new(ScriptedRunner::exiting(0)),
                Arc::new(CannedParser::default()),
                Arc::new(RecordingCatalogs::default()),
                lifecycle.clone(),
            ),
            IpmiSettings::default(),
        )
        .unwrap();

        let err = job.run().await.unwrap_err();
        assert_eq!(err.to_string(), "Validation error: No node for ipmi catalog");
        assert!(matches!(lifecycle.events()[0], LifecycleEvent::Failed(_)));
    }

    #[tokio::test]
    async fn test_fails_if_obm_setting_missing() {
        let mut nodes = MemoryNodes::default();
        nodes.nodes.insert(
            "bc7dab7e8fb7d6abf8e7d6ac".to_string(),
            Node {
                id: "bc7dab7e8fb7d6abf8e7d6ac".to_string(),
                obm_settings: vec![ObmSetting {
                    service: Some("ipmi-obm-service".to_string()),
                    config: ObmConfig::default(),
                }],
            },
        );
        let job = IpmiCatalogJob::new(
            options(),
            JobContext::new("bc7dab7e8fb7d6abf8e7d6ac"),
            deps(
                nodes,
                Arc::new(ScriptedRunner::exiting(0)),
                Arc::new(CannedParser::default()),
                Arc::new(RecordingCatalogs::default()),
                Arc::new(RecordingLifecycle::default()),
            ),
            IpmiSettings::default(),
        )
        .unwrap();

        let err = job.run().await.unwrap_err();
        assert_eq!(err.to_string(), "Validation error: No ipmi obmSettings for ipmi catalog");
    }

    #[tokio::test]
    async fn test_creates_catalog_entries_for_response_data() {
        let catalogs = Arc::new(RecordingCatalogs::default());
        let parser = Arc::new(CannedParser {
            records: serde_json::from_value(json!([
                { "store": true, "source": "test-source-1", "data": "test data 1" },
                { "store": true, "data": "test data 2" },
                { "store": false, "source": "test-source-3", "data": "test data 3" },
                { "error": {}, "source": "test-error-source" }
            ]))
            .unwrap(),
            ..Default::default()
        });
        let job = IpmiCatalogJob::new(
            options(),
            JobContext::new("testid"),
            deps(
                MemoryNodes::with_ipmi_node("testid", "172.31.128.11"),
                Arc::new(ScriptedRunner::exiting(0)),
                parser,
                catalogs.clone(),
                Arc::new(RecordingLifecycle::default()),
            ),
            IpmiSettings::default(),
        )
        .unwrap();

        let count = job.handle_response(vec![]).await.unwrap();

        assert_eq!(count, 2);
        let created = catalogs.created.lock().unwrap();
        assert!(created.contains(&CatalogEntry {
            node: "testid".to_string(),
            source: Some("test-source-1".to_string()),
            data: json!("test data 1"),
        }));
        assert!(created.contains(&CatalogEntry {
            node: "testid".to_string(),
            source: None,
            data: json!("test data 2"),
        }));
    }

    #[tokio::test]
    async fn test_run_marks_unaccepted_exit_codes() {
        let parser = Arc::new(CannedParser::default());
        let lifecycle = Arc::new(RecordingLifecycle::default());

        let mut accepted = deps(
            MemoryNodes::with_ipmi_node("testid", "52:54:be:ef:00:01"),
            Arc::new(ScriptedRunner::exiting(1)),
            parser.clone(),
            Arc::new(RecordingCatalogs::default()),
            lifecycle.clone(),
        );
        let job = IpmiCatalogJob::new(options(), JobContext::new("testid"), accepted.clone(), IpmiSettings::default())
            .unwrap();
        assert_eq!(job.run().await.unwrap(), JobOutcome::Completed);

        let runner = Arc::new(ScriptedRunner::exiting(2));
        accepted.runner = runner.clone() as Arc<dyn IpmiCommandRunner>;
        let job = IpmiCatalogJob::new(options(), JobContext::new("testid"), accepted, IpmiSettings::default())
            .unwrap();
        assert_eq!(job.run().await.unwrap(), JobOutcome::Completed);

        // MAC host resolved before building arguments
        assert_eq!(runner.calls.lock().unwrap()[0][5], "172.31.128.11");

        let seen = parser.seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen[..2].iter().all(|r| r.error.is_none()));
        assert!(seen[2..].iter().all(|r| r.error.as_deref().unwrap().starts_with("exit code 2")));
        assert_eq!(seen[1].stdout, "output of lan print");

        assert_eq!(
            lifecycle.events(),
            vec![LifecycleEvent::Completed, LifecycleEvent::Completed]
        );
    }
}
