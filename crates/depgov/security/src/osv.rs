//! OSV scanner report parsing.
//!
//! Reports look like `results[].packages[].{package, vulnerabilities[]}`.
//! Severity data is inconsistent across advisory databases, so the score is
//! looked up in several places before falling back to a textual label.

use depgov_types::{canonical_name, LoadError, Severity};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

use crate::types::{AffectedRange, CveRecord};

/// One vulnerability reported against one scanned package.
#[derive(Clone, Debug, PartialEq)]
pub struct OsvFinding {
    /// Canonical package name.
    pub package: String,
    /// Version the scanner saw installed.
    pub version: Option<String>,
    pub record: CveRecord,
}

#[derive(Deserialize)]
struct Report {
    results: Vec<ResultEntry>,
}

#[derive(Deserialize)]
struct ResultEntry {
    #[serde(default)]
    packages: Vec<PackageEntry>,
}

#[derive(Deserialize)]
struct PackageEntry {
    package: PackageRef,
    #[serde(default)]
    vulnerabilities: Vec<Vulnerability>,
}

#[derive(Deserialize)]
struct PackageRef {
    name: String,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Deserialize)]
struct Vulnerability {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    affected: Vec<Affected>,
    #[serde(default)]
    severity: Vec<Value>,
    #[serde(default)]
    database_specific: Option<Value>,
    #[serde(default)]
    references: Vec<Reference>,
}

#[derive(Deserialize)]
struct Affected {
    #[serde(default)]
    package: Option<PackageRef>,
    #[serde(default)]
    ranges: Vec<Range>,
}

#[derive(Deserialize)]
struct Range {
    #[serde(default)]
    events: Vec<AffectedRange>,
}

#[derive(Deserialize)]
struct Reference {
    url: String,
}

/// Parse an OSV scan document into findings, one per (package, vulnerability).
pub fn parse_osv_findings(doc: &Value) -> Result<Vec<OsvFinding>, LoadError> {
    if !doc.get("results").is_some_and(Value::is_array) {
        return Err(LoadError::Schema("OSV report has no 'results' array".into()));
    }
    let report = Report::deserialize(doc)?;

    let mut findings = Vec::new();
    for entry in report.results {
        for package in entry.packages {
            let name = canonical_name(&package.package.name);
            for vuln in package.vulnerabilities {
                let record = to_record(&name, vuln);
                debug!(
                    package = %name,
                    cve = %record.id,
                    severity = %record.severity,
                    fixed = ?record.fixed_version,
                    "OSV finding"
                );
                findings.push(OsvFinding {
                    package: name.clone(),
                    version: package.package.version.clone(),
                    record,
                });
            }
        }
    }
    Ok(findings)
}

pub fn load_osv_findings(path: &Path) -> Result<Vec<OsvFinding>, LoadError> {
    let text = depgov_types::error::read_to_string(path)?;
    let doc: Value = serde_json::from_str(&text)?;
    let findings = parse_osv_findings(&doc)?;
    info!(path = %path.display(), findings = findings.len(), "OSV scan parsed");
    Ok(findings)
}

fn to_record(package: &str, vuln: Vulnerability) -> CveRecord {
    let relevant: Vec<&Affected> = {
        let matching: Vec<&Affected> = vuln
            .affected
            .iter()
            .filter(|a| {
                a.package
                    .as_ref()
                    .is_some_and(|p| canonical_name(&p.name) == package)
            })
            .collect();
        if matching.is_empty() {
            vuln.affected.iter().collect()
        } else {
            matching
        }
    };

    let mut ranges = Vec::new();
    for affected in &relevant {
        for range in &affected.ranges {
            ranges.extend(fold_events(&range.events));
        }
    }
    let fixed_version = ranges.iter().find_map(|r| r.fixed.clone());

    let cvss_score = score_from(vuln.database_specific.as_ref(), &vuln.severity);
    let severity = match cvss_score {
        Some(score) => Severity::from_cvss(score),
        None => Severity::Low,
    };

    CveRecord {
        id: vuln.id,
        package: package.to_string(),
        affected_versions: ranges,
        fixed_version,
        severity,
        cvss_score,
        description: vuln.summary.or(vuln.details).unwrap_or_default(),
        published: vuln.published,
        references: vuln.references.into_iter().map(|r| r.url).collect(),
        aliases: vuln.aliases,
    }
}

/// OSV events are a flat list; each `introduced` opens a new interval.
fn fold_events(events: &[AffectedRange]) -> Vec<AffectedRange> {
    let mut ranges: Vec<AffectedRange> = Vec::new();
    for event in events {
        if event.introduced.is_some() || ranges.is_empty() {
            ranges.push(AffectedRange::default());
        }
        if let Some(current) = ranges.last_mut() {
            if event.introduced.is_some() {
                current.introduced = event.introduced.clone();
            }
            if event.fixed.is_some() {
                current.fixed = event.fixed.clone();
            }
            if event.last_affected.is_some() {
                current.last_affected = event.last_affected.clone();
            }
        }
    }
    ranges
}

/// Resolve a CVSS score: `database_specific.severity` first, then the
/// top-level `severity[]` scores, then a textual label from either place.
fn score_from(database_specific: Option<&Value>, severity: &[Value]) -> Option<f64> {
    let db_severity = database_specific.and_then(|d| d.get("severity"));

    db_severity
        .and_then(numeric_score)
        .or_else(|| severity.iter().find_map(numeric_score))
        .or_else(|| db_severity.and_then(label_score))
        .or_else(|| severity.iter().find_map(label_score))
}

fn numeric_score(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Array(items) => items.iter().find_map(numeric_score),
        Value::Object(map) => map.get("score").and_then(numeric_score),
        _ => None,
    }
}

fn label_score(value: &Value) -> Option<f64> {
    let label = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map
            .get("score")
            .or_else(|| map.get("severity"))
            .and_then(Value::as_str)?,
        Value::Array(items) => return items.iter().find_map(label_score),
        _ => return None,
    };
    match label.trim().to_ascii_uppercase().as_str() {
        "CRITICAL" => Some(9.0),
        "HIGH" => Some(7.0),
        "MODERATE" | "MEDIUM" => Some(4.0),
        "LOW" => Some(0.1),
        _ => None,
    }
}
