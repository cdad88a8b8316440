//! Loaders for the SBOM, package metadata and `[drift_policy]` inputs.

use depgov_types::{canonical_name, LoadError, Sbom};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::types::DriftPolicy;

/// Upstream facts about one package.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageMetadata {
    #[serde(default)]
    pub latest: Option<String>,
    /// Days since the installed version was released.
    #[serde(default)]
    pub age_days: Option<u32>,
    /// Advisory identifiers or advisory objects, as published.
    #[serde(default)]
    pub advisories: Vec<Value>,
}

impl PackageMetadata {
    /// Advisory ids: plain strings, or the `id` field of objects.
    pub fn advisory_ids(&self) -> Vec<String> {
        self.advisories
            .iter()
            .filter_map(|a| match a {
                Value::String(id) => Some(id.clone()),
                Value::Object(map) => map.get("id").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect()
    }
}

/// Load an SBOM. The document must have a top-level `components` array.
pub fn load_sbom(path: &Path) -> Result<Sbom, LoadError> {
    let text = depgov_types::error::read_to_string(path)?;
    let doc: Value = serde_json::from_str(&text)?;
    if !doc.get("components").is_some_and(Value::is_array) {
        return Err(LoadError::Schema("SBOM has no 'components' array".into()));
    }
    let sbom = Sbom::deserialize(&doc)?;
    info!(path = %path.display(), components = sbom.len(), "SBOM loaded");
    Ok(sbom)
}

/// Load package metadata keyed by canonical name. A missing file is empty.
pub fn load_metadata(path: &Path) -> Result<BTreeMap<String, PackageMetadata>, LoadError> {
    if !path.exists() {
        debug!(path = %path.display(), "metadata file absent");
        return Ok(BTreeMap::new());
    }
    let text = depgov_types::error::read_to_string(path)?;
    let raw: BTreeMap<String, PackageMetadata> = serde_json::from_str(&text)?;
    let metadata: BTreeMap<String, PackageMetadata> = raw
        .into_iter()
        .map(|(name, meta)| (canonical_name(&name), meta))
        .collect();
    info!(path = %path.display(), packages = metadata.len(), "Package metadata loaded");
    Ok(metadata)
}

/// Build a [`DriftPolicy`] from the `[drift_policy]` value, if any.
pub fn parse_policy(section: Option<&toml::Value>) -> Result<DriftPolicy, LoadError> {
    let Some(section) = section else {
        return Ok(DriftPolicy::default());
    };
    let policy: DriftPolicy = section.clone().try_into()?;
    let overrides = policy
        .overrides
        .into_iter()
        .map(|(name, rule)| (canonical_name(&name), rule))
        .collect();
    Ok(DriftPolicy { overrides, ..policy })
}
