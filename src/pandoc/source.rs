//! Where banners come from.
//!
//! [`BannerSource`] is the one seam between the probe and the outside world:
//! - [`SystemBannerSource`] runs the real binary
//! - `MockBannerSource` serves canned banners in unit tests

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::{ProbeError, VERSION_FLAG};

/// Trait abstracting the `--version` invocation for testability
#[async_trait]
pub trait BannerSource: Send + Sync {
    /// Run `<location> --version` and return its standard output.
    async fn banner(&self, location: &str) -> Result<String, ProbeError>;
}

/// Real implementation that spawns the tool
#[derive(Debug, Clone, Default)]
pub struct SystemBannerSource {
    /// Upper bound on the external call (None = wait forever)
    timeout: Option<Duration>,
}

impl SystemBannerSource {
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// Kill the child and fail with [`ProbeError::Timeout`] after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl BannerSource for SystemBannerSource {
    async fn banner(&self, location: &str) -> Result<String, ProbeError> {
        let mut cmd = Command::new(location);
        cmd.arg(VERSION_FLAG)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(location, timeout = ?self.timeout, "running version probe");

        let result = match self.timeout {
            Some(after) => tokio::time::timeout(after, cmd.output())
                .await
                .map_err(|_| ProbeError::Timeout {
                    location: location.to_string(),
                    after,
                })?,
            None => cmd.output().await,
        };

        let output = result.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProbeError::NotInstalled {
                    location: location.to_string(),
                }
            } else {
                ProbeError::Launch {
                    location: location.to_string(),
                    source: e,
                }
            }
        })?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                location: location.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Mock implementation for testing
#[cfg(test)]
#[derive(Default)]
pub struct MockBannerSource {
    /// Canned responses: location -> banner or (exit code, stderr)
    responses: std::collections::HashMap<String, Result<String, (i32, String)>>,
    /// Locations probed, in order
    calls: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockBannerSource {
    /// A source where every location is "not installed" until told otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_banner(mut self, location: &str, banner: &str) -> Self {
        self.responses
            .insert(location.to_string(), Ok(banner.to_string()));
        self
    }

    pub fn with_failure(mut self, location: &str, code: i32, stderr: &str) -> Self {
        self.responses
            .insert(location.to_string(), Err((code, stderr.to_string())));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl BannerSource for MockBannerSource {
    async fn banner(&self, location: &str) -> Result<String, ProbeError> {
        self.calls.lock().unwrap().push(location.to_string());

        match self.responses.get(location) {
            Some(Ok(banner)) => Ok(banner.clone()),
            Some(Err((code, stderr))) => Err(ProbeError::Failed {
                location: location.to_string(),
                code: Some(*code),
                stderr: stderr.clone(),
            }),
            None => Err(ProbeError::NotInstalled {
                location: location.to_string(),
            }),
        }
    }
}
