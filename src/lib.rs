//! pandoc-probe - find out which pandoc is installed and gate features on it
//!
//! The library surface is the [`pandoc`] module: [`probe_version`] for a bare
//! version and [`Pandoc`] for a handle that pairs the version with the
//! location it was probed at.

pub mod config;
pub mod pandoc;

pub use pandoc::{
    parse_banner, probe_version, probe_version_with, probe_version_with_timeout, BannerSource,
    Pandoc, ProbeError, SystemBannerSource, DEFAULT_LOCATION, TOOL_NAME,
};
pub use semver::{Version, VersionReq};
