//! Banner parsing.
//!
//! A banner is what the tool prints for `--version`. Only its first line is
//! read; pandoc prints `pandoc X.Y.Z` there.

use semver::Version;

use super::ProbeError;

/// Text up to (excluding) the first newline, or the whole banner if there is none.
pub fn first_line(banner: &str) -> &str {
    banner.split_once('\n').map_or(banner, |(line, _)| line)
}

/// Reduce a banner to a semantic version.
///
/// Every occurrence of `tool_name` on the first line is removed, not just a
/// leading one, then the rest is trimmed and parsed strictly: no `v` prefix,
/// exactly three numeric components, optional `-pre` and `+build`.
pub fn parse_banner(banner: &str, tool_name: &str) -> Result<Version, ProbeError> {
    let stripped = first_line(banner).replace(tool_name, "");
    let candidate = stripped.trim();

    Version::parse(candidate).map_err(|source| ProbeError::Parse {
        line: candidate.to_string(),
        source,
    })
}
