#![deny(unsafe_code)]
//! Shared fixtures for the depgov end-to-end and property tests.
//!
//! Every fixture lives in its own temporary directory, removed on drop.

use chrono::{DateTime, TimeZone, Utc};
use depgov_types::RunContext;
use serde_json::{json, Value};
use std::io;
use std::path::{Path, PathBuf};

/// Instant all time-dependent tests evaluate against: 2026-03-01T00:00:00Z.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

pub fn fixed_context() -> RunContext {
    RunContext::at(fixed_now())
}

/// A scratch directory for input documents and output artifacts.
pub struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write_text(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_json(&self, name: &str, doc: &Value) -> io::Result<PathBuf> {
        self.write_text(name, &doc.to_string())
    }
}

/// SBOM with one component per `(name, version)`.
pub fn sbom_doc(components: &[(&str, &str)]) -> Value {
    let components: Vec<Value> = components
        .iter()
        .map(|(name, version)| {
            json!({
                "type": "library",
                "name": name,
                "version": version,
                "purl": format!("pkg:pypi/{name}@{version}"),
            })
        })
        .collect();
    json!({ "bomFormat": "CycloneDX", "specVersion": "1.5", "components": components })
}

/// Preflight entry: `(name, current, latest, status)`.
pub fn preflight_doc(packages: &[(&str, &str, &str, &str)]) -> Value {
    let packages: Vec<Value> = packages
        .iter()
        .map(|(name, current, latest, status)| {
            json!({
                "name": name,
                "current_version": current,
                "latest_version": latest,
                "status": status,
            })
        })
        .collect();
    json!({ "generated_at": "2026-02-28T12:00:00Z", "packages": packages })
}

/// One OSV vulnerability against an installed package.
#[derive(Clone, Debug)]
pub struct OsvEntry<'a> {
    pub package: &'a str,
    pub version: &'a str,
    pub id: &'a str,
    pub aliases: &'a [&'a str],
    /// Textual label, e.g. `CRITICAL`, `HIGH`, `MODERATE`, `LOW`.
    pub severity: &'a str,
    pub fixed: Option<&'a str>,
}

pub fn osv_doc(entries: &[OsvEntry<'_>]) -> Value {
    let packages: Vec<Value> = entries
        .iter()
        .map(|e| {
            let mut events = vec![json!({ "introduced": "0" })];
            if let Some(fixed) = e.fixed {
                events.push(json!({ "fixed": fixed }));
            }
            json!({
                "package": { "name": e.package, "version": e.version, "ecosystem": "PyPI" },
                "vulnerabilities": [{
                    "id": e.id,
                    "aliases": e.aliases,
                    "summary": format!("{} in {}", e.id, e.package),
                    "database_specific": { "severity": e.severity },
                    "affected": [{
                        "package": { "name": e.package, "ecosystem": "PyPI" },
                        "ranges": [{ "type": "ECOSYSTEM", "events": events }]
                    }]
                }]
            })
        })
        .collect();
    json!({ "results": [{ "source": { "path": "uv.lock", "type": "lockfile" }, "packages": packages }] })
}

/// Contract with a `[contract]` header validated on `last_validated`,
/// followed by `body` verbatim.
pub fn contract_text(last_validated: &str, review_days: u32, body: &str) -> String {
    format!(
        "[contract]\nstatus = \"active\"\nlast_validated = \"{last_validated}\"\ndefault_review_days = {review_days}\n\n{body}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_now_is_march_first() {
        assert_eq!(fixed_now().to_rfc3339(), "2026-03-01T00:00:00+00:00");
    }

    #[test]
    fn fixture_writes_nested_files() {
        let fx = Fixture::new().unwrap();
        let path = fx.write_json("inputs/sbom.json", &sbom_doc(&[("demo", "1.0.0")])).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("pkg:pypi/demo@1.0.0"));
    }
}
