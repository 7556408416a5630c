//! Pandoc version probing and capability gating.
//!
//! Runs `<location> --version`, reduces the first banner line to a semantic
//! version and hands back a [`Pandoc`] handle that callers branch on:
//!
//! ```no_run
//! # async fn demo() -> Result<(), pandoc_probe::ProbeError> {
//! use pandoc_probe::{Pandoc, Version};
//!
//! let pandoc = Pandoc::new(None).await?;
//! if pandoc.meets_minimum(&Version::new(3, 0, 0)) {
//!     // safe to pass pandoc 3 flags
//! }
//! # Ok(())
//! # }
//! ```

mod banner;
mod source;

use std::fmt;
use std::time::Duration;

use semver::{Version, VersionReq};
use serde::Serialize;
use thiserror::Error;

pub use banner::{first_line, parse_banner};
#[cfg(test)]
pub use source::MockBannerSource;
pub use source::{BannerSource, SystemBannerSource};

/// Location used when the caller does not name one; resolved through `PATH`.
pub const DEFAULT_LOCATION: &str = "pandoc";

/// Token stripped from the banner line before parsing.
pub const TOOL_NAME: &str = "pandoc";

/// Flag that makes the tool print its banner.
pub const VERSION_FLAG: &str = "--version";

/// Errors specific to version probing
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("{location} is not installed or not in PATH")]
    NotInstalled { location: String },

    #[error("failed to run {location}: {source}")]
    Launch {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{location} --version failed with {}: {}", describe_exit(.code), .stderr.trim())]
    Failed {
        location: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("could not parse version from '{line}': {source}")]
    Parse {
        line: String,
        #[source]
        source: semver::Error,
    },

    #[error("{location} --version did not finish within {after:?}")]
    Timeout { location: String, after: Duration },
}

impl ProbeError {
    /// The tool could not be started, or it ran and did not exit cleanly.
    pub fn is_launch_failure(&self) -> bool {
        matches!(
            self,
            ProbeError::NotInstalled { .. } | ProbeError::Launch { .. } | ProbeError::Failed { .. }
        )
    }

    /// The tool ran but its banner did not reduce to a semantic version.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, ProbeError::Parse { .. })
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Probe the installed pandoc and return its version.
///
/// `None` probes [`DEFAULT_LOCATION`]. Every call spawns a fresh process;
/// nothing is cached and there is no timeout.
pub async fn probe_version(location: Option<&str>) -> Result<Version, ProbeError> {
    probe_version_with(&SystemBannerSource::new(), location).await
}

/// Like [`probe_version`], but gives up (and kills the child) after `timeout`.
pub async fn probe_version_with_timeout(
    location: Option<&str>,
    timeout: Duration,
) -> Result<Version, ProbeError> {
    probe_version_with(&SystemBannerSource::with_timeout(timeout), location).await
}

/// Probe through an explicit banner source.
pub async fn probe_version_with<S>(source: &S, location: Option<&str>) -> Result<Version, ProbeError>
where
    S: BannerSource + ?Sized,
{
    let location = location.unwrap_or(DEFAULT_LOCATION);
    let banner = source.banner(location).await?;
    let version = parse_banner(&banner, TOOL_NAME)?;

    tracing::debug!(location, %version, "pandoc version detected");
    Ok(version)
}

/// A probed pandoc installation: where it lives and which version it reported.
///
/// Only constructed through a successful probe, so both fields are always
/// populated. The handle is a point-in-time snapshot; probe again if the
/// installation may have changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pandoc {
    location: String,
    version: Version,
}

impl Pandoc {
    /// Probe `location` (or [`DEFAULT_LOCATION`]) and build a handle.
    pub async fn new(location: Option<&str>) -> Result<Self, ProbeError> {
        Self::new_with(&SystemBannerSource::new(), location).await
    }

    /// Build a handle, bounding the probe by `timeout`.
    pub async fn new_with_timeout(
        location: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ProbeError> {
        Self::new_with(&SystemBannerSource::with_timeout(timeout), location).await
    }

    /// Build a handle from an explicit banner source.
    pub async fn new_with<S>(source: &S, location: Option<&str>) -> Result<Self, ProbeError>
    where
        S: BannerSource + ?Sized,
    {
        let location = location.unwrap_or(DEFAULT_LOCATION);
        let version = probe_version_with(source, Some(location)).await?;

        Ok(Self {
            location: location.to_string(),
            version,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Check if this version meets the minimum requirement.
    ///
    /// Uses semver precedence: build metadata is ignored and a pre-release
    /// sorts below its release (`3.0.0-rc1` does not meet `3.0.0`).
    pub fn meets_minimum(&self, minimum: &Version) -> bool {
        self.version.cmp_precedence(minimum).is_ge()
    }

    /// Check the version against a requirement such as `">=2.11, <4"`.
    ///
    /// Pre-release versions only match comparators that name the same
    /// `major.minor.patch` with a pre-release of their own.
    pub fn satisfies(&self, requirement: &VersionReq) -> bool {
        requirement.matches(&self.version)
    }
}

impl fmt::Display for Pandoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", TOOL_NAME, self.version, self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER: &str = "pandoc 2.19.2\nCompiled with pandoc-types 1.22.2.1, texmath 0.12.5.2\n";

    #[tokio::test]
    async fn test_probe_version_default_location() {
        let source = MockBannerSource::new().with_banner(DEFAULT_LOCATION, BANNER);

        let version = probe_version_with(&source, None).await.unwrap();
        assert_eq!(version, Version::new(2, 19, 2));
        assert_eq!(source.calls(), vec![DEFAULT_LOCATION.to_string()]);
    }

    #[tokio::test]
    async fn test_probe_version_explicit_location() {
        let source =
            MockBannerSource::new().with_banner("/opt/pandoc/bin/pandoc", "pandoc 3.1.2\n");

        let version = probe_version_with(&source, Some("/opt/pandoc/bin/pandoc"))
            .await
            .unwrap();
        assert_eq!(version, Version::new(3, 1, 2));
    }

    #[tokio::test]
    async fn test_probe_version_is_not_cached() {
        let source = MockBannerSource::new().with_banner(DEFAULT_LOCATION, BANNER);

        probe_version_with(&source, None).await.unwrap();
        probe_version_with(&source, None).await.unwrap();
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_probe_version_not_installed() {
        let source = MockBannerSource::new();

        let err = probe_version_with(&source, None).await.unwrap_err();
        assert!(matches!(err, ProbeError::NotInstalled { ref location } if location == "pandoc"));
        assert!(err.is_launch_failure());
        assert!(!err.is_parse_failure());
    }

    #[tokio::test]
    async fn test_probe_version_unparseable_banner() {
        let source = MockBannerSource::new().with_banner(DEFAULT_LOCATION, "pandoc unknown\n");

        let err = probe_version_with(&source, None).await.unwrap_err();
        assert!(err.is_parse_failure());
        assert!(err.to_string().contains("'unknown'"));
    }

    #[tokio::test]
    async fn test_new_with_default_location() {
        let source = MockBannerSource::new().with_banner(DEFAULT_LOCATION, BANNER);

        let pandoc = Pandoc::new_with(&source, None).await.unwrap();
        assert_eq!(pandoc.location(), DEFAULT_LOCATION);
        assert_eq!(pandoc.version(), &Version::new(2, 19, 2));
    }

    #[tokio::test]
    async fn test_new_fails_when_probe_fails() {
        let source = MockBannerSource::new().with_failure(DEFAULT_LOCATION, 1, "boom");

        let err = Pandoc::new_with(&source, None).await.unwrap_err();
        match err {
            ProbeError::Failed { code, stderr, .. } => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_new_fails_on_parse_error() {
        let source = MockBannerSource::new().with_banner("pandoc-nightly", "pandoc nightly\n");

        let result = Pandoc::new_with(&source, Some("pandoc-nightly")).await;
        assert!(result.unwrap_err().is_parse_failure());
    }

    fn handle(version: &str) -> Pandoc {
        Pandoc {
            location: DEFAULT_LOCATION.to_string(),
            version: Version::parse(version).unwrap(),
        }
    }

    #[test]
    fn test_meets_minimum() {
        let pandoc = handle("2.19.2");
        assert!(pandoc.meets_minimum(&Version::new(2, 19, 2)));
        assert!(pandoc.meets_minimum(&Version::new(2, 11, 0)));
        assert!(pandoc.meets_minimum(&Version::new(1, 0, 0)));
        assert!(!pandoc.meets_minimum(&Version::new(2, 19, 3)));
        assert!(!pandoc.meets_minimum(&Version::new(3, 0, 0)));
    }

    #[test]
    fn test_meets_minimum_pre_release_and_build() {
        assert!(!handle("3.0.0-rc1").meets_minimum(&Version::new(3, 0, 0)));
        assert!(handle("3.0.0-rc1").meets_minimum(&Version::new(2, 19, 2)));
        assert!(handle("3.0.0+nightly").meets_minimum(&Version::new(3, 0, 0)));
    }

    #[test]
    fn test_satisfies() {
        let pandoc = handle("2.19.2");
        assert!(pandoc.satisfies(&VersionReq::parse(">=2.11").unwrap()));
        assert!(pandoc.satisfies(&VersionReq::parse(">=2.11, <3").unwrap()));
        assert!(!pandoc.satisfies(&VersionReq::parse(">=3").unwrap()));
        assert!(!pandoc.satisfies(&VersionReq::parse("=2.19.1").unwrap()));
    }

    #[test]
    fn test_display() {
        assert_eq!(handle("3.1.2").to_string(), "pandoc 3.1.2 (pandoc)");
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_value(handle("3.1.2")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "location": "pandoc", "version": "3.1.2" })
        );
    }

    #[test]
    fn test_failed_error_message() {
        let err = ProbeError::Failed {
            location: "pandoc".to_string(),
            code: Some(2),
            stderr: "unknown option\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "pandoc --version failed with exit code 2: unknown option"
        );

        let err = ProbeError::Failed {
            location: "pandoc".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("terminated by signal"));
    }
}
