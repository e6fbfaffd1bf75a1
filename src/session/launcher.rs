//! Browser process launch, attach, and teardown.
//!
//! A [`BrowserSession`] records how the embedding application was reached
//! (a spawned process, an attached running instance, or a directly-provided
//! toolkit) and owns the resources that must outlive the connection: the
//! child process guard and any temporary user-data directory.

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::process::Stdio;

use tempfile::TempDir;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::SessionId;

use super::options::BrowserOptions;

// ============================================================================
// ProcessGuard
// ============================================================================

/// Owns a spawned browser process and kills it on drop unless detached.
pub struct ProcessGuard {
    child: Option<Child>,
    detach: bool,
}

impl ProcessGuard {
    fn new(child: Child, detach: bool) -> Self {
        Self {
            child: Some(child),
            detach,
        }
    }

    /// OS process ID, while the process is owned.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Kills the owned process and waits for it to exit.
    ///
    /// A no-op for detached guards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the kill signal cannot be delivered.
    pub async fn shutdown(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        if self.detach {
            debug!("Leaving detached browser process running");
            return Ok(());
        }
        child.kill().await?;
        Ok(())
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if self.detach {
            return;
        }
        // Async kill is unavailable in drop; deliver the signal and let the
        // runtime reap the child.
        if let Some(child) = self.child.as_mut()
            && let Err(e) = child.start_kill()
        {
            warn!(error = %e, "Failed to kill browser process on drop");
        }
    }
}

// ============================================================================
// BrowserSession
// ============================================================================

/// How the session reaches the embedding application.
enum Connection {
    /// The session spawned and owns the process.
    Launched(ProcessGuard),
    /// The session attached to a running instance over a named channel.
    Attached(String),
    /// The toolkit was handed in directly; there is no process to manage.
    Direct,
}

/// One connection to an embedding application.
pub struct BrowserSession {
    id: SessionId,
    connection: Connection,
    /// Temporary profile directory; removed when the session drops.
    _user_data_dir: Option<TempDir>,
}

impl BrowserSession {
    /// Establishes a session per the given options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for inconsistent options and
    /// [`Error::Io`] if the process fails to spawn.
    pub fn start(options: &BrowserOptions) -> Result<Self> {
        options.validate()?;
        let id = SessionId::next();

        if let Some(binary) = &options.binary {
            let (data_dir, temp_dir) = resolve_user_data_dir(options)?;
            let guard = spawn_browser(binary, options, &data_dir)?;
            info!(session_id = %id, pid = ?guard.pid(), "Browser process spawned");
            return Ok(Self {
                id,
                connection: Connection::Launched(guard),
                _user_data_dir: temp_dir,
            });
        }

        if let Some(channel) = &options.channel_id {
            info!(session_id = %id, channel, "Attached to running browser");
            return Ok(Self {
                id,
                connection: Connection::Attached(channel.clone()),
                _user_data_dir: None,
            });
        }

        debug!(session_id = %id, "Session over directly-provided toolkit");
        Ok(Self {
            id,
            connection: Connection::Direct,
            _user_data_dir: None,
        })
    }

    /// Session identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns `true` when the session owns a spawned process.
    #[must_use]
    pub fn owns_process(&self) -> bool {
        matches!(self.connection, Connection::Launched(_))
    }

    /// Tears down the session, killing the owned process unless detached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if process teardown fails.
    pub async fn terminate(mut self) -> Result<()> {
        if let Connection::Launched(guard) = &mut self.connection {
            guard.shutdown().await?;
        }
        info!(session_id = %self.id, "Session terminated");
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Resolves the user-data directory, creating a temporary one when unset.
fn resolve_user_data_dir(options: &BrowserOptions) -> Result<(PathBuf, Option<TempDir>)> {
    match &options.user_data_dir {
        Some(dir) => Ok((dir.clone(), None)),
        None => {
            let temp = tempfile::Builder::new().prefix("webview-profile-").tempdir()?;
            let path = temp.path().to_path_buf();
            debug!(path = %path.display(), "Created temporary user-data directory");
            Ok((path, Some(temp)))
        }
    }
}

/// Spawns the embedding application process.
fn spawn_browser(
    binary: &std::path::Path,
    options: &BrowserOptions,
    data_dir: &std::path::Path,
) -> Result<ProcessGuard> {
    let mut cmd = Command::new(binary);
    cmd.arg(BrowserOptions::user_data_arg(data_dir));
    cmd.args(options.to_args());
    cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
    if options.detach_process {
        cmd.kill_on_drop(false);
    } else {
        cmd.kill_on_drop(true);
    }

    let child = cmd.spawn().map_err(Error::Io)?;
    Ok(ProcessGuard::new(child, options.detach_process))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_session_owns_no_process() {
        let session = BrowserSession::start(&BrowserOptions::new()).unwrap();
        assert!(!session.owns_process());
    }

    #[test]
    fn test_attach_session_owns_no_process() {
        let session = BrowserSession::start(&BrowserOptions::attach("chan-1")).unwrap();
        assert!(!session.owns_process());
    }

    #[test]
    fn test_session_ids_are_distinct() {
        let a = BrowserSession::start(&BrowserOptions::new()).unwrap();
        let b = BrowserSession::start(&BrowserOptions::new()).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_terminate_direct_session() {
        let session = BrowserSession::start(&BrowserOptions::new()).unwrap();
        session.terminate().await.unwrap();
    }

    #[tokio::test]
    async fn test_launch_failure_reports_io() {
        let options = BrowserOptions::new().with_binary("/nonexistent/browser-shell");
        let err = BrowserSession::start(&options).err().unwrap();
        assert!(matches!(err, Error::Io(_)));
    }
}
