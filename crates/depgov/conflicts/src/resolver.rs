//! Conflict detection and resolution proposals.

use chrono::{DateTime, Utc};
use depgov_types::{normalize_specifier, RunContext, Severity};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::manifest::DependencyManifest;
use crate::types::{
    Conflict, ConflictAnalysisReport, ConflictKind, DependencyConstraint, Resolution,
    ResolutionType,
};

pub struct ConflictResolver {
    generated_at: DateTime<Utc>,
}

impl ConflictResolver {
    pub fn new(ctx: &RunContext) -> Self {
        Self {
            generated_at: ctx.now,
        }
    }

    /// Packages whose constraints are not all semantically equal.
    pub fn detect_conflicts(
        &self,
        constraints: &BTreeMap<String, Vec<DependencyConstraint>>,
    ) -> Vec<Conflict> {
        constraints
            .iter()
            .filter(|(_, list)| list.len() > 1)
            .filter_map(|(package, list)| {
                let distinct: BTreeSet<String> = list
                    .iter()
                    .map(|c| normalize_specifier(&c.constraint))
                    .collect();
                if distinct.len() < 2 {
                    return None;
                }
                let conflict = build_conflict(package, list);
                debug!(
                    package = %package,
                    constraints = list.len(),
                    auto_resolvable = conflict.auto_resolvable,
                    "version conflict detected"
                );
                Some(conflict)
            })
            .collect()
    }

    /// Pin to the sole direct requirement, otherwise hand over to a human.
    pub fn resolve_conflict(&self, conflict: &Conflict) -> Resolution {
        let package = &conflict.package;
        let direct = if conflict.auto_resolvable {
            conflict.direct_constraints().next()
        } else {
            None
        };

        match direct {
            Some(direct) => Resolution {
                package: package.clone(),
                resolution_type: ResolutionType::Pin,
                target_version: Some(direct.constraint.clone()),
                commands: vec![
                    format!("uv add \"{package}{}\"", direct.constraint),
                    format!("uv lock --upgrade-package {package}"),
                ],
                description: format!(
                    "Pin {package} to the project's direct requirement '{}' and relock",
                    display_spec(&direct.constraint)
                ),
            },
            None => Resolution {
                package: package.clone(),
                resolution_type: ResolutionType::Manual,
                target_version: None,
                commands: vec![
                    format!("uv tree --invert --package {package}"),
                    format!("uv pip show {package}"),
                ],
                description: format!(
                    "Inspect the requirers of {package} and reconcile their constraints by hand"
                ),
            },
        }
    }

    pub fn analyze_conflicts(&self, manifest: &DependencyManifest) -> ConflictAnalysisReport {
        let conflicts = self.detect_conflicts(&manifest.constraints);
        let resolutions: Vec<Resolution> =
            conflicts.iter().map(|c| self.resolve_conflict(c)).collect();

        let mut summary = BTreeMap::new();
        for conflict in &conflicts {
            *summary.entry(conflict.kind.as_str().to_string()).or_insert(0) += 1;
        }
        summary.insert("total".to_string(), conflicts.len());
        let auto_resolvable = conflicts.iter().filter(|c| c.auto_resolvable).count();

        info!(
            packages = manifest.package_count(),
            conflicts = conflicts.len(),
            auto_resolvable,
            "Conflict analysis complete"
        );

        ConflictAnalysisReport {
            generated_at: self.generated_at,
            conflicts,
            resolutions,
            summary,
            auto_resolvable,
        }
    }
}

fn build_conflict(package: &str, list: &[DependencyConstraint]) -> Conflict {
    let direct: Vec<&DependencyConstraint> = list.iter().filter(|c| c.is_direct).collect();
    let auto_resolvable = direct.len() == 1;
    let severity = if direct.is_empty() {
        Severity::Medium
    } else {
        Severity::High
    };

    let listing = list
        .iter()
        .map(DependencyConstraint::describe)
        .collect::<Vec<_>>()
        .join("; ");
    let suggestions = match direct.as_slice() {
        [only] => vec![format!(
            "Pin {package} to the direct requirement '{}'",
            display_spec(&only.constraint)
        )],
        [] => vec![format!(
            "Add a direct constraint for {package} compatible with: {listing}"
        )],
        _ => vec![format!(
            "Reconcile the direct requirements for {package}: {listing}"
        )],
    };

    Conflict {
        package: package.to_string(),
        kind: ConflictKind::Version,
        constraints: list.to_vec(),
        auto_resolvable,
        severity,
        suggestions,
    }
}

fn display_spec(spec: &str) -> &str {
    if spec.is_empty() {
        "*"
    } else {
        spec
    }
}
