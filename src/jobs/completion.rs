// file: src/jobs/completion.rs
// version: 1.0.0
// guid: 460b1072-df63-44e8-8dbd-d76a264da754

//! Detects install completion from HTTP traffic served to the node

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

/// HTTP response the file server reported for a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpNotification {
    pub status_code: u16,
    pub url: String,
}

/// Matches the notification the installer sends once it has finished
#[derive(Debug, Clone)]
pub struct CompletionWatcher {
    token: String,
}

impl CompletionWatcher {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// A 2xx response whose URL contains the completion token
    pub fn matches(&self, notification: &HttpNotification) -> bool {
        (200..300).contains(&notification.status_code) && notification.url.contains(&self.token)
    }

    /// Wait for the first matching notification.
    ///
    /// Returns `None` if the sender side closes first. There is no timeout.
    pub async fn wait(
        &self,
        notifications: &mut mpsc::Receiver<HttpNotification>,
    ) -> Option<HttpNotification> {
        while let Some(notification) = notifications.recv().await {
            if self.matches(&notification) {
                return Some(notification);
            }
            trace!(status = notification.status_code, url = %notification.url, "Ignoring notification");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(status_code: u16, url: &str) -> HttpNotification {
        HttpNotification {
            status_code,
            url: url.to_string(),
        }
    }

    #[test]
    fn test_matches_status_range() {
        let watcher = CompletionWatcher::new("esx-ks");
        let url = "/api/common/templates/esx-ks";

        assert!(watcher.matches(&notification(200, url)));
        assert!(watcher.matches(&notification(204, url)));
        assert!(watcher.matches(&notification(299, url)));
        assert!(!watcher.matches(&notification(199, url)));
        assert!(!watcher.matches(&notification(300, url)));
        assert!(!watcher.matches(&notification(404, url)));
    }

    #[test]
    fn test_matches_url_token() {
        let watcher = CompletionWatcher::new("esx-ks");

        assert!(!watcher.matches(&notification(200, "/api/common/templates/centos-ks")));
        assert!(!watcher.matches(&notification(200, "")));
    }

    #[test]
    fn test_notification_wire_format() {
        let parsed: HttpNotification =
            serde_json::from_str(r#"{"statusCode":201,"url":"/notify/esx-ks"}"#).unwrap();
        assert_eq!(parsed, notification(201, "/notify/esx-ks"));
    }

    #[tokio::test]
    async fn test_wait_returns_first_match() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(notification(404, "/esx-ks")).await.unwrap();
        tx.send(notification(200, "/other")).await.unwrap();
        tx.send(notification(200, "/templates/esx-ks?nodeId=1")).await.unwrap();
        tx.send(notification(200, "/templates/esx-ks?nodeId=2")).await.unwrap();

        let watcher = CompletionWatcher::new("esx-ks");
        let matched = watcher.wait(&mut rx).await.unwrap();
        assert_eq!(matched.url, "/templates/esx-ks?nodeId=1");
    }

    #[tokio::test]
    async fn test_wait_closed_channel() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(notification(500, "/esx-ks")).await.unwrap();
        drop(tx);

        let watcher = CompletionWatcher::new("esx-ks");
        assert!(watcher.wait(&mut rx).await.is_none());
    }
}
