use std::io::ErrorKind;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::ScanError;

/// Run an external tool and return its stdout.
///
/// A missing binary maps to [`ScanError::Unavailable`] so callers can tell
/// "nothing to ask" apart from "asking failed".
pub async fn run_tool(program: &Path, args: &[&str]) -> Result<String, ScanError> {
    debug!("Running {} {}", program.display(), args.join(" "));

    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                ScanError::Unavailable(format!("{}: {}", program.display(), e))
            }
            _ => ScanError::Failed(format!("{}: {}", program.display(), e)),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        // pactl reports a missing sound server this way.
        if stderr.contains("Connection failure") {
            return Err(ScanError::Unavailable(format!(
                "{}: {}",
                program.display(),
                stderr.trim()
            )));
        }
        return Err(ScanError::Failed(format!(
            "{} {} exited with {}: {}",
            program.display(),
            args.join(" "),
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let result = run_tool(Path::new("/nonexistent/pactl"), &["info"]).await;
        assert!(matches!(result, Err(ScanError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let result = run_tool(Path::new("sh"), &["-c", "echo oops >&2; exit 3"]).await;
        let Err(ScanError::Failed(message)) = result else {
            panic!("expected a scan failure, got {result:?}");
        };
        assert!(message.contains("oops"));
    }

    #[tokio::test]
    async fn test_connection_failure_is_unavailable() {
        let result = run_tool(
            Path::new("sh"),
            &["-c", "echo 'Connection failure: Connection refused' >&2; exit 1"],
        )
        .await;
        assert!(matches!(result, Err(ScanError::Unavailable(_))));
    }
}
