//! Package version parsing.
//!
//! Python package versions (PEP 440) are mapped onto [`semver::Version`] so the
//! rest of the engine compares versions with one type. The mapping is lenient
//! about missing release components and strict about everything it does not
//! recognise: an unrecognised suffix makes the whole version unparsable.

use semver::{BuildMetadata, Prerelease, Version};

use crate::severity::DriftSeverity;

const SEPARATORS: [char; 3] = ['.', '-', '_'];

/// Parse a package version string.
///
/// - `1`, `1.2`, `1.2.3` pad to three components; components past the third
///   are kept as build metadata.
/// - `a1`, `b2`, `rc3`, `.dev4` become semver pre-releases
///   (`alpha.1`, `beta.2`, `rc.3`, `dev.4`).
/// - `.post1` / `-1` and local labels (`+cpu`) become build metadata.
/// - Epochs (`1!2.0`) are rejected.
pub fn parse_version(raw: &str) -> Option<Version> {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix(['v', 'V']) {
        s = rest;
    }
    if s.is_empty() || s.contains('!') {
        return None;
    }

    let (public, local) = match s.split_once('+') {
        Some((public, local)) => (public, Some(local)),
        None => (s, None),
    };
    let lower = public.to_ascii_lowercase();

    let release_end = lower
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(lower.len());
    let release = lower[..release_end].trim_end_matches('.');
    let components = release
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    let mut pre: Vec<String> = Vec::new();
    let mut build: Vec<String> = components.iter().skip(3).map(u64::to_string).collect();

    let mut rest = &lower[release_end..];
    loop {
        rest = rest.trim_start_matches(SEPARATORS);
        if rest.is_empty() {
            break;
        }
        let label_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let label = &rest[..label_end];
        rest = rest[label_end..].trim_start_matches(SEPARATORS);
        let number_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let number = if number_end == 0 {
            if label.is_empty() {
                return None;
            }
            0
        } else {
            rest[..number_end].parse::<u64>().ok()?
        };
        rest = &rest[number_end..];

        match label {
            "a" | "alpha" => pre.extend(["alpha".to_string(), number.to_string()]),
            "b" | "beta" => pre.extend(["beta".to_string(), number.to_string()]),
            "rc" | "c" | "pre" | "preview" => pre.extend(["rc".to_string(), number.to_string()]),
            "dev" => pre.extend(["dev".to_string(), number.to_string()]),
            "" | "post" | "rev" | "r" => build.extend(["post".to_string(), number.to_string()]),
            _ => return None,
        }
    }

    if let Some(local) = local {
        build.extend(
            local
                .split(|c: char| !c.is_ascii_alphanumeric())
                .filter(|part| !part.is_empty())
                .map(str::to_string),
        );
    }

    let mut version = Version::new(
        components[0],
        components.get(1).copied().unwrap_or(0),
        components.get(2).copied().unwrap_or(0),
    );
    if !pre.is_empty() {
        version.pre = Prerelease::new(&pre.join(".")).ok()?;
    }
    if !build.is_empty() {
        version.build = BuildMetadata::new(&build.join(".")).ok()?;
    }
    Some(version)
}

/// Normalise a package name (PEP 503): lowercase, runs of `-`, `_` and `.`
/// collapse to a single `-`.
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.trim().chars() {
        if SEPARATORS.contains(&c) {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('-');
        }
        pending_sep = false;
        out.push(c.to_ascii_lowercase());
    }
    out
}

pub fn is_prerelease(version: &Version) -> bool {
    !version.pre.is_empty()
}

/// Number of major versions crossed going from `from` to `to` (zero for
/// downgrades).
pub fn major_jump(from: &Version, to: &Version) -> u64 {
    to.major.saturating_sub(from.major)
}

/// Classify the semver delta between two raw versions.
///
/// Unparsable input or a target that is not newer yields `Safe`.
pub fn classify_delta(current: &str, latest: &str) -> DriftSeverity {
    let (Some(current), Some(latest)) = (parse_version(current), parse_version(latest)) else {
        return DriftSeverity::Safe;
    };
    if latest <= current {
        DriftSeverity::Safe
    } else if latest.major > current.major {
        DriftSeverity::Major
    } else if latest.minor > current.minor {
        DriftSeverity::Minor
    } else {
        DriftSeverity::Patch
    }
}
