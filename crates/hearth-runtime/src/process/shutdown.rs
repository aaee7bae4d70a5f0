//! Forced termination for `tokio::process::Child` with SIGTERM → SIGKILL escalation.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

#[cfg(unix)]
use tokio::time::timeout;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Terminate a child that ignored (or could not receive) its graceful
/// stop command.
///
/// # Strategy
/// 1. Send SIGTERM and wait up to `term_grace` for exit
/// 2. If still running, send SIGKILL
/// 3. Wait for reaping (required to avoid zombies)
///
/// On non-unix platforms the child is killed immediately.
pub async fn terminate_child(child: &mut Child, term_grace: Duration) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        terminate_unix(child, term_grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = term_grace;
        child.kill().await?;
        child.wait().await
    }
}

#[cfg(unix)]
async fn terminate_unix(child: &mut Child, term_grace: Duration) -> io::Result<ExitStatus> {
    let Some(pid) = child.id() else {
        // Already reaped.
        return child.wait().await;
    };
    let pid = i32::try_from(pid).map_err(io::Error::other)?;

    if let Err(e) = signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = timeout(term_grace, child.wait()).await {
        return result;
    }

    child.kill().await?;
    child.wait().await
}

/// Kill a child without waiting and reap it in the background.
pub fn kill_and_reap(mut child: Child) {
    if let Err(e) = child.start_kill() {
        tracing::debug!(error = %e, "start_kill failed (child likely exited)");
    }
    reap_in_background(child);
}

/// Wait for a child on a background task so it never lingers as a zombie.
pub fn reap_in_background(mut child: Child) {
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) => tracing::debug!(%status, "Reaped child"),
            Err(e) => tracing::debug!(error = %e, "Failed to reap child"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::process::Command;
    use tokio::time::sleep;

    #[tokio::test]
    #[cfg(unix)]
    async fn terminate_responds_to_sigterm() {
        let mut child = Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("failed to spawn sleep");

        let result = terminate_child(&mut child, Duration::from_secs(5)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn terminate_escalates_when_term_ignored() {
        let mut child = Command::new("sh")
            .args(["-c", "trap '' TERM; sleep 30"])
            .spawn()
            .expect("failed to spawn sh");
        // Let the trap install.
        sleep(Duration::from_millis(200)).await;

        let status = terminate_child(&mut child, Duration::from_millis(200))
            .await
            .expect("terminate");
        assert!(!status.success());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn terminate_handles_already_exited() {
        let mut child = Command::new("echo")
            .arg("test")
            .spawn()
            .expect("failed to spawn echo");

        sleep(Duration::from_millis(100)).await;

        let result = terminate_child(&mut child, Duration::from_secs(1)).await;
        assert!(result.is_ok());
    }
}
