//! External Tool Invocation
//!
//! Runs the system tools diskwatcher depends on with a hard time limit.

use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Run `program` with `args`, killing it if it outlives `limit`
///
/// `tool` and `target` only label errors. A binary that cannot be found is
/// reported as `ToolMissing`; any other spawn failure or a timeout is
/// attributed to `target`.
pub async fn run_tool(
    tool: &str,
    program: &Path,
    args: &[&str],
    target: &str,
    limit: Duration,
) -> Result<Output> {
    debug!("Running {} {}", program.display(), args.join(" "));

    let child = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(limit, child).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) if e.kind() == ErrorKind::NotFound => Err(Error::ToolMissing {
            name: tool.to_string(),
            path: program.display().to_string(),
        }),
        Ok(Err(e)) => Err(Error::ToolInvocation {
            tool: tool.to_string(),
            device: target.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Err(Error::ToolTimeout {
            tool: tool.to_string(),
            device: target.to_string(),
            secs: limit.as_secs(),
        }),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_missing_binary() {
        let result = run_tool(
            "smartctl",
            Path::new("/nonexistent/smartctl"),
            &["-j"],
            "sda",
            Duration::from_secs(1),
        )
        .await;
        assert_matches!(result, Err(Error::ToolMissing { name, .. }) if name == "smartctl");
    }

    #[tokio::test]
    async fn test_timeout() {
        let result = run_tool(
            "sleep",
            Path::new("/bin/sh"),
            &["-c", "sleep 5"],
            "sda",
            Duration::from_millis(100),
        )
        .await;
        assert_matches!(result, Err(Error::ToolTimeout { device, .. }) if device == "sda");
    }

    #[tokio::test]
    async fn test_captures_output_and_status() {
        let output = run_tool(
            "sh",
            Path::new("/bin/sh"),
            &["-c", "echo '{}'; exit 4"],
            "sda",
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(output.status.code(), Some(4));
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "{}");
    }
}
