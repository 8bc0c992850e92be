use semver::{BuildMetadata, Version};

/// Parse a version string leniently: trims whitespace and a leading `v`/`V`.
///
/// Build metadata is dropped since it carries no precedence.
pub fn parse_version(input: &str) -> Option<Version> {
    let normalized = input.trim().trim_start_matches(['v', 'V']);
    let mut version = Version::parse(normalized).ok()?;
    version.build = BuildMetadata::EMPTY;
    Some(version)
}

/// True when `candidate` is strictly newer than `current`.
///
/// Unparseable input never counts as newer.
pub fn is_newer_version(current: &str, candidate: &str) -> bool {
    match (parse_version(current), parse_version(candidate)) {
        (Some(current), Some(candidate)) => candidate > current,
        _ => false,
    }
}
