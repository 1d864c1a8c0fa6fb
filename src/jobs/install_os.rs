// file: src/jobs/install_os.rs
// version: 1.0.0
// guid: 008e35f2-1355-462e-a867-81050c9b9e49

//! OS install job
//!
//! Builds the option set served to the installer, fetches vendor boot
//! metadata for flavors that need it, then waits for the installer to
//! request the completion URI.

use super::{CompletionWatcher, HttpNotification, JobContext, JobLifecycle, JobOutcome};
use crate::boot_config::BootConfigFetcher;
use crate::config::InstallSettings;
use crate::logging::job_span;
use crate::network::HttpFetch;
use crate::options::{InstallOptions, OptionsProcessor};
use crate::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn, Instrument, Span};

/// Job that drives one OS installation on a node
pub struct InstallOsJob {
    context: JobContext,
    options: InstallOptions,
    settings: InstallSettings,
    fetcher: BootConfigFetcher,
    lifecycle: Arc<dyn JobLifecycle>,
    span: Span,
}

impl InstallOsJob {
    pub const NAME: &'static str = "Job.Os.Install";

    /// Build the job; fails with a validation error before any network activity
    pub fn new(
        raw_options: Value,
        context: JobContext,
        http: Arc<dyn HttpFetch>,
        lifecycle: Arc<dyn JobLifecycle>,
        settings: InstallSettings,
    ) -> Result<Self> {
        let options = OptionsProcessor::new().process(&context.target, raw_options)?;
        let span = job_span(Self::NAME, &context.target, &context.task_id);

        Ok(Self {
            context,
            options,
            settings,
            fetcher: BootConfigFetcher::new(http),
            lifecycle,
            span,
        })
    }

    pub fn node_id(&self) -> &str {
        &self.context.target
    }

    /// Profile served to the node
    pub fn profile(&self) -> &str {
        &self.options.profile
    }

    /// Options served to the node's templates
    pub fn options(&self) -> &InstallOptions {
        &self.options
    }

    /// Whether `notification` signals that the installation finished
    pub fn is_install_complete(&self, notification: &HttpNotification) -> bool {
        CompletionWatcher::new(self.options.completion_uri.as_str()).matches(notification)
    }

    /// Whether this install flavor needs vendor boot metadata
    pub fn requires_boot_metadata(&self) -> bool {
        self.options
            .requires_boot_metadata(&self.settings.boot_metadata_flavors)
    }

    /// Fetch boot metadata when the flavor needs it and merge it into the options
    pub async fn pre_handling(&mut self) -> Result<()> {
        if !self.requires_boot_metadata() {
            return Ok(());
        }

        let repo = self.options.repo.clone().unwrap_or_default();
        self.fetcher
            .fetch_options(&repo)
            .await?
            .merge_into(&mut self.options);

        Ok(())
    }

    /// Run the job to completion or failure.
    ///
    /// Failures are reported through the lifecycle handle and returned.
    pub async fn run(&mut self) -> Result<JobOutcome> {
        let span = self.span.clone();
        async {
            let result = self.execute().await;
            if let Err(err) = &result {
                error!(
                    repo = ?self.options.repo,
                    node_id = %self.context.target,
                    error = %err,
                    "Install OS job failed"
                );
                self.lifecycle.fail(err).await?;
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn execute(&mut self) -> Result<JobOutcome> {
        self.pre_handling().await?;

        self.lifecycle
            .subscribe_request_profile(self.options.profile.clone())
            .await?;
        self.lifecycle
            .subscribe_request_properties(serde_json::to_value(&self.options)?)
            .await?;
        let mut notifications = self.lifecycle.subscribe_http_response().await?;

        info!(profile = %self.options.profile, "Waiting for installation to complete");

        let watcher = CompletionWatcher::new(self.options.completion_uri.as_str());
        match watcher.wait(&mut notifications).await {
            Some(notification) => {
                info!(url = %notification.url, "Installation completed");
                self.lifecycle.complete().await?;
                Ok(JobOutcome::Completed)
            }
            None => {
                warn!("Notification stream closed before the installation completed");
                Ok(JobOutcome::Pending)
            }
        }
    }
}
