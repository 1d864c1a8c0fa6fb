// file: src/logging/logger.rs
// version: 2.0.0
// guid: f4d86829-8bb0-4551-bc0f-a9498c20f12c

//! Logger initialization and per-job spans

use crate::{JobError, Result};
use tracing::Span;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system
pub fn init_logger(verbose: bool, quiet: bool) -> Result<()> {
    tracing_subscriber::registry()
        .with(level_filter(verbose, quiet))
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init()
        .map_err(|e| JobError::config(format!("Failed to initialize logger: {}", e)))?;

    Ok(())
}

/// Initialize structured JSON logging (for services)
pub fn init_json_logger() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_current_span(true))
        .try_init()
        .map_err(|e| JobError::config(format!("Failed to initialize JSON logger: {}", e)))?;

    Ok(())
}

fn level_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    }
}

/// Span handed to a job at construction; everything the job logs runs inside it.
pub fn job_span(job: &str, node_id: &str, task_id: &uuid::Uuid) -> Span {
    tracing::info_span!("job", name = job, node_id = node_id, task_id = %task_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_default() {
        // The global subscriber can only be set once per process, so a
        // second initialization from another test is allowed to fail.
        let result = init_logger(false, false);
        assert!(result.is_ok() || matches!(result, Err(JobError::Config(_))));
    }

    #[test]
    fn test_level_filter_selection() {
        assert_eq!(level_filter(false, true).to_string(), "error");
        assert_eq!(level_filter(true, false).to_string(), "debug");
        assert_eq!(level_filter(false, false).to_string(), "info");
        // quiet wins over verbose
        assert_eq!(level_filter(true, true).to_string(), "error");
    }

    #[test]
    fn test_job_span_enters() {
        let task_id = uuid::Uuid::new_v4();
        let span = job_span("install-os", "node-1", &task_id);
        let result = span.in_scope(|| 2 + 2);
        assert_eq!(result, 4);
    }
}
