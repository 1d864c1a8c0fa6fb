// file: src/jobs/mod.rs
// version: 1.0.0
// guid: a05e088b-2a0a-4d05-a0fb-16cbb10025ed

//! Provisioning jobs and the lifecycle seam they report through

pub mod completion;
pub mod install_os;
pub mod ipmi_catalog;
pub mod ipmi_command;
pub mod node;

pub use completion::{CompletionWatcher, HttpNotification};
pub use install_os::InstallOsJob;
pub use ipmi_catalog::{IpmiCatalogDeps, IpmiCatalogJob, IpmiCatalogOptions};
pub use ipmi_command::{IpmiCommand, IpmiCommandRequest, IpmiJobDeps, RunCommandIpmiJob};
pub use node::{AddressResolver, IpmiCredentials, Node, NodeStore, ObmConfig, ObmSetting};

use crate::{JobError, Result};
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Identity of one job run against a managed node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    /// Node the job acts on
    pub target: String,
    /// Task instance that owns the job
    pub task_id: Uuid,
    /// Poller work item that triggered the job, if any
    pub work_item_id: Option<String>,
}

impl JobContext {
    /// Create a context for `target` with a fresh task id
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            task_id: Uuid::new_v4(),
            work_item_id: None,
        }
    }

    /// Attach the work item that triggered this run
    pub fn with_work_item(mut self, work_item_id: impl Into<String>) -> Self {
        self.work_item_id = Some(work_item_id.into());
        self
    }
}

/// How a job run ended from the job's own point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job reported completion through its lifecycle handle
    Completed,
    /// The job is still waiting on external events
    Pending,
}

/// Lifecycle handle supplied by the task runner.
///
/// Jobs hold one of these instead of extending a base job type. The handle
/// owns the message bus subscriptions and the terminal state of the task.
#[async_trait::async_trait]
pub trait JobLifecycle: Send + Sync {
    /// Answer profile requests from the node with `profile`
    async fn subscribe_request_profile(&self, profile: String) -> Result<()>;

    /// Answer template property requests from the node with `options`
    async fn subscribe_request_properties(&self, options: Value) -> Result<()>;

    /// Stream of HTTP responses served to the node
    async fn subscribe_http_response(&self) -> Result<mpsc::Receiver<HttpNotification>>;

    /// Record successful completion
    async fn complete(&self) -> Result<()>;

    /// Record failure with the triggering error
    async fn fail(&self, error: &JobError) -> Result<()>;
}
