//! The policy contract: dependency policy, drift policy, freshness metadata,
//! signature policy, snoozes and environment alignment, parsed once.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use depgov_drift::DriftPolicy;
use depgov_policy::DependencyPolicy;
use depgov_types::{canonical_name, LoadError, RiskLevel};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::path::Path;
use toml::Value as TomlValue;
use tracing::{info, warn};

const DEFAULT_REVIEW_DAYS: u32 = 14;

/// A parsed contract document.
#[derive(Clone, Debug)]
pub struct ContractDocument {
    pub metadata: ContractMetadata,
    pub policy: DependencyPolicy,
    pub drift_policy: DriftPolicy,
    /// `[policies.signatures]`, verbatim.
    pub signatures: Option<JsonValue>,
    pub snoozes: Vec<Snooze>,
    /// `[environment_alignment]`, verbatim.
    pub environment_alignment: Option<JsonValue>,
}

impl ContractDocument {
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        let mut table: toml::Table = toml::from_str(text)?;

        let metadata = ContractMetadata::from_section(table.get("contract"));
        let policy = match table.remove("dependency_policy") {
            Some(section) => DependencyPolicy::from_value(section)
                .map_err(|e| LoadError::Schema(e.to_string()))?,
            None => DependencyPolicy::default(),
        };
        let drift_policy = depgov_drift::parse_policy(table.get("drift_policy"))?;
        let signatures = table
            .get("policies")
            .and_then(|p| p.get("signatures"))
            .map(toml_to_json);
        let snoozes = table
            .get("governance")
            .and_then(|g| g.get("snoozes"))
            .and_then(TomlValue::as_table)
            .map(|t| t.iter().filter_map(|(id, v)| Snooze::from_entry(id, v)).collect())
            .unwrap_or_default();
        let environment_alignment = table.get("environment_alignment").map(toml_to_json);

        Ok(Self {
            metadata,
            policy,
            drift_policy,
            signatures,
            snoozes,
            environment_alignment,
        })
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = depgov_types::error::read_to_string(path)?;
        let doc = Self::parse(&text)?;
        info!(
            path = %path.display(),
            status = ?doc.metadata.status,
            snoozes = doc.snoozes.len(),
            "Contract loaded"
        );
        Ok(doc)
    }

    /// The active snooze covering `package` + `cve`, if any.
    pub fn active_snooze(&self, package: &str, cve_ids: &[&str], now: DateTime<Utc>) -> Option<&Snooze> {
        self.snoozes
            .iter()
            .find(|s| s.is_active(now) && cve_ids.iter().any(|id| s.matches(package, id)))
    }
}

/// The `[contract]` section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMetadata {
    pub status: Option<String>,
    /// Raw `last_validated` value.
    pub last_validated: Option<String>,
    pub default_review_days: u32,
}

impl Default for ContractMetadata {
    fn default() -> Self {
        Self {
            status: None,
            last_validated: None,
            default_review_days: DEFAULT_REVIEW_DAYS,
        }
    }
}

impl ContractMetadata {
    fn from_section(section: Option<&TomlValue>) -> Self {
        let Some(section) = section else {
            return Self::default();
        };
        Self {
            status: section.get("status").and_then(TomlValue::as_str).map(str::to_string),
            last_validated: section.get("last_validated").map(toml_scalar),
            default_review_days: section
                .get("default_review_days")
                .and_then(TomlValue::as_integer)
                .and_then(|d| u32::try_from(d).ok())
                .unwrap_or(DEFAULT_REVIEW_DAYS),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Fresh,
    Stale,
    Expired,
    Unknown,
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fresh => "fresh",
            Self::Stale => "stale",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvaluation {
    pub status: ContractStatus,
    pub risk: RiskLevel,
    pub age_days: Option<i64>,
    pub review_days: u32,
    pub last_validated: Option<String>,
    pub message: String,
}

/// Contract freshness: within the review window is fresh, within twice the
/// window is stale, beyond that expired. No usable date is unknown.
pub fn evaluate_contract_metadata(meta: &ContractMetadata, now: DateTime<Utc>) -> ContractEvaluation {
    let review = meta.default_review_days;
    let validated = meta.last_validated.as_deref().and_then(parse_instant);

    let Some(validated) = validated else {
        let message = match &meta.last_validated {
            Some(raw) => format!("Contract last_validated '{raw}' is not a date"),
            None => "Contract has no last_validated date".to_string(),
        };
        return ContractEvaluation {
            status: ContractStatus::Unknown,
            risk: RiskLevel::NeedsReview,
            age_days: None,
            review_days: review,
            last_validated: meta.last_validated.clone(),
            message,
        };
    };

    let age = (now - validated).num_days().max(0);
    let review_i = i64::from(review);
    let (status, risk) = if age <= review_i {
        (ContractStatus::Fresh, RiskLevel::Safe)
    } else if age <= 2 * review_i {
        (ContractStatus::Stale, RiskLevel::NeedsReview)
    } else {
        (ContractStatus::Expired, RiskLevel::Blocked)
    };
    ContractEvaluation {
        status,
        risk,
        age_days: Some(age),
        review_days: review,
        last_validated: meta.last_validated.clone(),
        message: format!("Contract validated {age} days ago ({status}, review every {review} days)"),
    }
}

/// A time-boxed, approved exception for one package + CVE.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snooze {
    pub id: String,
    pub package: String,
    pub cve: String,
    pub expires: Option<String>,
    pub reason: Option<String>,
    pub approved_by: Option<String>,
}

impl Snooze {
    fn from_entry(id: &str, value: &TomlValue) -> Option<Self> {
        let field = |key: &str| value.get(key).map(toml_scalar);
        let (Some(package), Some(cve)) = (field("package"), field("cve")) else {
            warn!(snooze = id, "snooze without package or cve ignored");
            return None;
        };
        Some(Self {
            id: id.to_string(),
            package,
            cve,
            expires: field("expires"),
            reason: field("reason"),
            approved_by: field("approved_by"),
        })
    }

    /// Snoozes without a parsable expiry never apply. A bare date covers
    /// that whole day.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        let Some(raw) = self.expires.as_deref() else {
            return false;
        };
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return now < at.with_timezone(&Utc);
        }
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => now.date_naive() <= date,
            Err(_) => false,
        }
    }

    pub fn matches(&self, package: &str, cve: &str) -> bool {
        canonical_name(&self.package) == canonical_name(package) && self.cve.eq_ignore_ascii_case(cve)
    }
}

/// RFC 3339 timestamp or `YYYY-MM-DD` (midnight UTC).
fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
}

/// Strings stay bare; TOML dates and other scalars use their TOML text.
fn toml_scalar(value: &TomlValue) -> String {
    match value {
        TomlValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// TOML → JSON with datetimes rendered as strings.
fn toml_to_json(value: &TomlValue) -> JsonValue {
    match value {
        TomlValue::String(s) => JsonValue::String(s.clone()),
        TomlValue::Integer(i) => JsonValue::from(*i),
        TomlValue::Float(f) => JsonValue::from(*f),
        TomlValue::Boolean(b) => JsonValue::Bool(*b),
        TomlValue::Datetime(d) => JsonValue::String(d.to_string()),
        TomlValue::Array(items) => JsonValue::Array(items.iter().map(toml_to_json).collect()),
        TomlValue::Table(table) => JsonValue::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
    }
}
