//! Constraint extraction from `pyproject.toml` and `uv.lock`.

use depgov_types::{canonical_name, Requirement};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::ConflictError;
use crate::types::{DependencyConstraint, ROOT_DEV_REQUIRER, ROOT_REQUIRER};

/// Every constraint declared against each package, keyed by canonical name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencyManifest {
    pub project_name: Option<String>,
    pub constraints: BTreeMap<String, Vec<DependencyConstraint>>,
}

impl DependencyManifest {
    pub fn from_constraints(constraints: impl IntoIterator<Item = DependencyConstraint>) -> Self {
        let mut manifest = Self::default();
        for constraint in constraints {
            manifest.push(constraint);
        }
        manifest
    }

    pub fn push(&mut self, constraint: DependencyConstraint) {
        self.constraints
            .entry(constraint.package.clone())
            .or_default()
            .push(constraint);
    }

    pub fn package_count(&self) -> usize {
        self.constraints.len()
    }
}

/// Build a manifest from already-parsed `pyproject.toml` and optional
/// `uv.lock` tables.
pub fn collect_constraints(pyproject: &toml::Table, lock: Option<&toml::Table>) -> DependencyManifest {
    let mut manifest = DependencyManifest::default();
    let project = pyproject.get("project").and_then(toml::Value::as_table);
    manifest.project_name = project
        .and_then(|p| p.get("name"))
        .and_then(toml::Value::as_str)
        .map(str::to_string);

    if let Some(project) = project {
        for line in string_items(project.get("dependencies")) {
            push_requirement(&mut manifest, line, ROOT_REQUIRER);
        }
        let optional_dev = project
            .get("optional-dependencies")
            .and_then(toml::Value::as_table)
            .and_then(|t| t.get("dev"));
        for line in string_items(optional_dev) {
            push_requirement(&mut manifest, line, ROOT_DEV_REQUIRER);
        }
    }
    let group_dev = pyproject
        .get("dependency-groups")
        .and_then(toml::Value::as_table)
        .and_then(|t| t.get("dev"));
    for line in string_items(group_dev) {
        push_requirement(&mut manifest, line, ROOT_DEV_REQUIRER);
    }

    if let Some(lock) = lock {
        collect_lock(&mut manifest, lock);
    }
    manifest
}

fn collect_lock(manifest: &mut DependencyManifest, lock: &toml::Table) {
    let root = manifest.project_name.as_deref().map(canonical_name);
    let packages = lock
        .get("package")
        .and_then(toml::Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for package in packages.iter().filter_map(toml::Value::as_table) {
        let Some(requirer) = package.get("name").and_then(toml::Value::as_str) else {
            continue;
        };
        if root.as_deref() == Some(canonical_name(requirer).as_str()) {
            continue;
        }
        let requires = package
            .get("metadata")
            .and_then(toml::Value::as_table)
            .and_then(|m| m.get("requires-dist"))
            .and_then(toml::Value::as_array);
        for entry in requires.into_iter().flatten().filter_map(toml::Value::as_table) {
            let Some(name) = entry.get("name").and_then(toml::Value::as_str) else {
                continue;
            };
            let specifier = entry
                .get("specifier")
                .and_then(toml::Value::as_str)
                .unwrap_or_default();
            manifest.push(DependencyConstraint::transitive(
                canonical_name(name),
                specifier.chars().filter(|c| !c.is_whitespace()).collect::<String>(),
                requirer,
            ));
        }
    }
}

fn string_items(value: Option<&toml::Value>) -> impl Iterator<Item = &str> {
    value
        .and_then(toml::Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(toml::Value::as_str)
}

fn push_requirement(manifest: &mut DependencyManifest, line: &str, requirer: &str) {
    match Requirement::parse(line) {
        Ok(req) => manifest.push(DependencyConstraint {
            package: req.canonical,
            constraint: req.specifier,
            required_by: requirer.to_string(),
            is_direct: true,
        }),
        Err(e) => warn!(requirement = line, error = %e, "skipping unparsable requirement"),
    }
}

/// Read `pyproject.toml` (and `uv.lock` when given and present).
pub fn load_manifest(pyproject: &Path, lock: Option<&Path>) -> Result<DependencyManifest, ConflictError> {
    let text = depgov_types::error::read_to_string(pyproject)?;
    let pyproject_table: toml::Table = toml::from_str(&text)?;

    let lock_table = match lock {
        Some(path) if path.exists() => {
            let text = depgov_types::error::read_to_string(path)?;
            Some(toml::from_str::<toml::Table>(&text)?)
        }
        Some(path) => {
            debug!(path = %path.display(), "lock file absent, using direct constraints only");
            None
        }
        None => None,
    };

    let manifest = collect_constraints(&pyproject_table, lock_table.as_ref());
    info!(
        path = %pyproject.display(),
        packages = manifest.package_count(),
        "Dependency manifest loaded"
    );
    Ok(manifest)
}
