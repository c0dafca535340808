//! Desktop Notifications
//!
//! Delivers alerts through the freedesktop notification service using
//! notify-send.

use crate::domain::ports::{Notifier, Severity};
use crate::error::{Error, Result};
use crate::hardware::discovery::command::run_tool;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Application name and notification summary
pub const APP_NAME: &str = "diskwatcher";

/// Sends notifications with notify-send
pub struct DesktopNotifier {
    notify_send_path: PathBuf,
    timeout: Duration,
}

impl DesktopNotifier {
    pub fn new(notify_send_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            notify_send_path: notify_send_path.into(),
            timeout,
        }
    }

    /// notify-send arguments for one notification
    pub fn arguments(message: &str, severity: Severity, timeout_ms: u32) -> Vec<String> {
        vec![
            "--app-name".to_string(),
            APP_NAME.to_string(),
            "--urgency".to_string(),
            severity.to_string(),
            "--icon".to_string(),
            severity.icon().to_string(),
            "--expire-time".to_string(),
            timeout_ms.to_string(),
            APP_NAME.to_string(),
            message.to_string(),
        ]
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, message: &str, severity: Severity, timeout_ms: u32) -> Result<()> {
        let args = Self::arguments(message, severity, timeout_ms);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let output = run_tool(
            "notify-send",
            &self.notify_send_path,
            &args,
            "desktop",
            self.timeout,
        )
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ToolInvocation {
                tool: "notify-send".into(),
                device: "desktop".into(),
                reason: stderr.trim().to_string(),
            });
        }

        debug!(%severity, "Notification delivered");
        Ok(())
    }
}

/// Notifier that drops everything, used when notifications are disabled
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, message: &str, severity: Severity, _timeout_ms: u32) -> Result<()> {
        debug!(%severity, "Notification suppressed: {}", message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments() {
        let args = DesktopNotifier::arguments("Device tampering!", Severity::Critical, 10_000);
        assert_eq!(
            args,
            vec![
                "--app-name",
                "diskwatcher",
                "--urgency",
                "critical",
                "--icon",
                "error",
                "--expire-time",
                "10000",
                "diskwatcher",
                "Device tampering!",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_notify_send_is_an_error() {
        let notifier = DesktopNotifier::new("/nonexistent/notify-send", Duration::from_secs(1));
        assert!(notifier
            .notify("hello", Severity::Normal, 1000)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_null_notifier() {
        assert!(NullNotifier.notify("hello", Severity::Low, 1000).await.is_ok());
    }
}
