//! CycloneDX-style bill of materials, reduced to what governance needs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::version::canonical_name;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sbom {
    pub components: Vec<SbomComponent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SbomComponent {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub purl: Option<String>,
}

impl Sbom {
    /// Installed versions keyed by canonical name. Components without a
    /// version are skipped; later duplicates win.
    pub fn current_versions(&self) -> BTreeMap<String, (String, String)> {
        self.components
            .iter()
            .filter_map(|c| {
                c.version
                    .as_ref()
                    .map(|v| (canonical_name(&c.name), (c.name.clone(), v.clone())))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
