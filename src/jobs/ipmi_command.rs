// file: src/jobs/ipmi_command.rs
// version: 1.0.0
// guid: eb004fad-9cc9-4be4-ab9b-be0acbb7f2da

//! IPMI command job
//!
//! Runs one out-of-band query against a node's BMC, parses the output and
//! publishes the result. The BMC password is used for the query only and is
//! never part of the published message.

use super::node::{AddressResolver, IpmiCredentials, NodeStore};
use super::{JobContext, JobLifecycle, JobOutcome};
use crate::config::IpmiSettings;
use crate::logging::job_span;
use crate::{JobError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, Instrument, Span};

/// Supported IPMI queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IpmiCommand {
    /// SEL summary (`ipmitool sel info`)
    SelInformation,
    /// Most recent SEL entries
    Sel,
    /// Sensor data repository snapshot
    Sdr,
    /// Chassis status
    Chassis,
    /// Drive health status
    DriveHealth,
}

impl IpmiCommand {
    pub const ALL: [IpmiCommand; 5] = [
        IpmiCommand::SelInformation,
        IpmiCommand::Sel,
        IpmiCommand::Sdr,
        IpmiCommand::Chassis,
        IpmiCommand::DriveHealth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IpmiCommand::SelInformation => "selInformation",
            IpmiCommand::Sel => "sel",
            IpmiCommand::Sdr => "sdr",
            IpmiCommand::Chassis => "chassis",
            IpmiCommand::DriveHealth => "driveHealth",
        }
    }
}

impl fmt::Display for IpmiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IpmiCommand {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| JobError::dispatch(format!("invalid command: {}", s)))
    }
}

/// Task options for the IPMI command job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpmiCommandRequest {
    /// Command name, checked against [`IpmiCommand`] at dispatch time
    pub command: String,
    pub node_id: String,
    /// Number of SEL entries to read; absent or zero falls back to settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

/// Wrapper around the ipmitool CLI; each call returns raw command output
#[async_trait::async_trait]
pub trait Ipmitool: Send + Sync {
    async fn sel_information(&self, host: &str, user: &str, password: &str) -> Result<String>;
    async fn sel(&self, host: &str, user: &str, password: &str, count: u32) -> Result<String>;
    async fn sensor_data_repository(&self, host: &str, user: &str, password: &str) -> Result<String>;
    async fn chassis_status(&self, host: &str, user: &str, password: &str) -> Result<String>;
    async fn drive_health_status(&self, host: &str, user: &str, password: &str) -> Result<String>;
}

/// Turns raw ipmitool output into structured records
pub trait IpmiParser: Send + Sync {
    fn parse_sel_information_data(&self, raw: &str) -> Result<Value>;
    fn parse_sel_data(&self, raw: &str) -> Result<Value>;
    fn parse_sdr_data(&self, raw: &str) -> Result<Value>;
    fn parse_chassis_data(&self, raw: &str) -> Result<Value>;
    fn parse_drive_health_data(&self, raw: &str) -> Result<Value>;
}

/// Message bus publisher for command results
#[async_trait::async_trait]
pub trait ResultPublisher: Send + Sync {
    async fn publish_ipmi_command_result(
        &self,
        routing_key: &str,
        command: IpmiCommand,
        message: Value,
    ) -> Result<()>;
}

/// Published result of one command; holds no credential
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResultEnvelope {
    pub command: IpmiCommand,
    pub result: Value,
    pub host: String,
    pub user: String,
    pub work_item_id: Option<String>,
}

impl CommandResultEnvelope {
    /// Build the envelope, dropping the password from `credentials`
    pub fn new(
        command: IpmiCommand,
        result: Value,
        credentials: IpmiCredentials,
        work_item_id: Option<String>,
    ) -> Self {
        let IpmiCredentials { host, user, .. } = credentials;
        Self {
            command,
            result,
            host,
            user,
            work_item_id,
        }
    }

    /// `{<command>: result, host, user, workItemId}`
    pub fn to_message(&self) -> Value {
        let mut message = Map::new();
        message.insert(self.command.as_str().to_string(), self.result.clone());
        message.insert("host".to_string(), Value::String(self.host.clone()));
        message.insert("user".to_string(), Value::String(self.user.clone()));
        if let Some(work_item_id) = &self.work_item_id {
            message.insert("workItemId".to_string(), Value::String(work_item_id.clone()));
        }
        Value::Object(message)
    }
}

/// Collaborators of the IPMI command job
#[derive(Clone)]
pub struct IpmiJobDeps {
    pub nodes: Arc<dyn NodeStore>,
    pub resolver: Arc<dyn AddressResolver>,
    pub ipmitool: Arc<dyn Ipmitool>,
    pub parser: Arc<dyn IpmiParser>,
    pub publisher: Arc<dyn ResultPublisher>,
    pub lifecycle: Arc<dyn JobLifecycle>,
}

/// Job that runs a single IPMI query and publishes its parsed result
pub struct RunCommandIpmiJob {
    request: IpmiCommandRequest,
    context: JobContext,
    deps: IpmiJobDeps,
    settings: IpmiSettings,
    span: Span,
}

impl RunCommandIpmiJob {
    pub const NAME: &'static str = "Job.RunCommand.Ipmi";

    pub fn new(
        request: IpmiCommandRequest,
        context: JobContext,
        deps: IpmiJobDeps,
        settings: IpmiSettings,
    ) -> Result<Self> {
        settings.validate()?;
        let span = job_span(Self::NAME, &request.node_id, &context.task_id);

        Ok(Self {
            request,
            context,
            deps,
            settings,
            span,
        })
    }

    pub fn routing_key(&self) -> &str {
        &self.settings.routing_key
    }

    /// Run the command, publish the result and report the outcome
    pub async fn run(&self) -> Result<JobOutcome> {
        async {
            match self.execute().await {
                Ok(()) => {
                    self.deps.lifecycle.complete().await?;
                    Ok(JobOutcome::Completed)
                }
                Err(err) => {
                    error!(command = %self.request.command, error = %err, "IPMI command job failed");
                    self.deps.lifecycle.fail(&err).await?;
                    Err(err)
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    async fn execute(&self) -> Result<()> {
        let command: IpmiCommand = self.request.command.parse()?;

        let setting = self
            .deps
            .nodes
            .find_obm_by_node(&self.request.node_id, &self.settings.obm_service)
            .await?
            .ok_or_else(|| {
                JobError::validation(format!(
                    "No {} setting for node {}",
                    self.settings.obm_service, self.request.node_id
                ))
            })?;
        let credentials =
            IpmiCredentials::resolve(&setting.config, self.deps.resolver.as_ref()).await?;

        let result = self.dispatch(command, &credentials).await?;
        let envelope = CommandResultEnvelope::new(
            command,
            result,
            credentials,
            self.context.work_item_id.clone(),
        );

        debug!(command = %command, host = %envelope.host, "Publishing IPMI command result");
        self.deps
            .publisher
            .publish_ipmi_command_result(self.routing_key(), command, envelope.to_message())
            .await
    }

    /// Execute `command` against the BMC and parse its output
    pub async fn dispatch(&self, command: IpmiCommand, creds: &IpmiCredentials) -> Result<Value> {
        let ipmitool = self.deps.ipmitool.as_ref();
        let parser = self.deps.parser.as_ref();
        let (host, user, password) = (creds.host.as_str(), creds.user.as_str(), creds.password.as_str());

        match command {
            IpmiCommand::SelInformation => {
                let raw = ipmitool.sel_information(host, user, password).await?;
                parser.parse_sel_information_data(&raw)
            }
            IpmiCommand::Sel => {
                let count = self
                    .request
                    .count
                    .filter(|c| *c > 0)
                    .unwrap_or(self.settings.default_sel_count);
                let raw = ipmitool.sel(host, user, password, count).await?;
                parser.parse_sel_data(&raw)
            }
            IpmiCommand::Sdr => {
                let raw = ipmitool.sensor_data_repository(host, user, password).await?;
                parser.parse_sdr_data(&raw)
            }
            IpmiCommand::Chassis => {
                let raw = ipmitool.chassis_status(host, user, password).await?;
                parser.parse_chassis_data(&raw)
            }
            IpmiCommand::DriveHealth => {
                let raw = ipmitool.drive_health_status(host, user, password).await?;
                parser.parse_drive_health_data(&raw)
            }
        }
    }
}
