//! Version specifiers (`>=1.2,<2`) and requirement strings
//! (`requests[socks]>=2.31; python_version >= "3.9"`).

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::version::{canonical_name, parse_version};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecifierError {
    #[error("invalid version in specifier clause: {0}")]
    InvalidVersion(String),

    #[error("invalid requirement: {0}")]
    InvalidRequirement(String),
}

/// Comparison operator of one specifier clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    NotEq,
    Ge,
    Le,
    Gt,
    Lt,
    Compatible,
    Arbitrary,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Compatible => "~=",
            Self::Arbitrary => "===",
        }
    }

    /// Split a clause into operator and remainder. Longest operators first.
    fn split(clause: &str) -> (Self, &str) {
        const TABLE: [(&str, Operator); 9] = [
            ("===", Operator::Arbitrary),
            ("~=", Operator::Compatible),
            ("==", Operator::Eq),
            ("!=", Operator::NotEq),
            (">=", Operator::Ge),
            ("<=", Operator::Le),
            (">", Operator::Gt),
            ("<", Operator::Lt),
            ("=", Operator::Eq),
        ];
        for (token, op) in TABLE {
            if let Some(rest) = clause.strip_prefix(token) {
                return (op, rest.trim());
            }
        }
        (Self::Eq, clause)
    }
}

/// One `op version` clause.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Clause {
    op: Operator,
    raw: String,
    version: Option<Version>,
    /// Number of release components written (`~=1.4` has 2).
    release_len: usize,
    wildcard: bool,
}

impl Clause {
    fn parse(text: &str) -> Result<Self, SpecifierError> {
        let (op, rest) = Operator::split(text.trim());
        if op == Operator::Arbitrary {
            return Ok(Self {
                op,
                raw: rest.to_string(),
                version: None,
                release_len: 0,
                wildcard: false,
            });
        }
        let (base, wildcard) = match rest.strip_suffix(".*") {
            Some(base) if matches!(op, Operator::Eq | Operator::NotEq) => (base, true),
            _ => (rest, false),
        };
        let version =
            parse_version(base).ok_or_else(|| SpecifierError::InvalidVersion(text.to_string()))?;
        let release_len = base
            .trim_start_matches(['v', 'V'])
            .split(|c: char| !(c.is_ascii_digit() || c == '.'))
            .next()
            .unwrap_or("")
            .split('.')
            .filter(|part| !part.is_empty())
            .count();
        if op == Operator::Compatible && release_len < 2 {
            return Err(SpecifierError::InvalidVersion(text.to_string()));
        }
        Ok(Self {
            op,
            raw: base.to_string(),
            version: Some(version),
            release_len,
            wildcard,
        })
    }

    fn normalized(&self) -> String {
        match (&self.version, self.wildcard) {
            (Some(v), true) => {
                let parts = [v.major, v.minor, v.patch];
                let prefix: Vec<String> = parts
                    .iter()
                    .take(self.release_len.clamp(1, 3))
                    .map(u64::to_string)
                    .collect();
                format!("{}{}.*", self.op.as_str(), prefix.join("."))
            }
            (Some(v), false) => format!("{}{}", self.op.as_str(), v),
            (None, _) => format!("{}{}", self.op.as_str(), self.raw),
        }
    }

    fn allows(&self, candidate: &Version) -> bool {
        let Some(bound) = &self.version else {
            return candidate.to_string() == self.raw;
        };
        match self.op {
            Operator::Eq if self.wildcard => prefix_matches(bound, candidate, self.release_len),
            Operator::NotEq if self.wildcard => !prefix_matches(bound, candidate, self.release_len),
            Operator::Eq => candidate == bound,
            Operator::NotEq => candidate != bound,
            Operator::Ge => candidate >= bound,
            Operator::Le => candidate <= bound,
            Operator::Gt => candidate > bound,
            Operator::Lt => candidate < bound,
            Operator::Compatible => {
                candidate >= bound && prefix_matches(bound, candidate, self.release_len - 1)
            }
            Operator::Arbitrary => false,
        }
    }
}

fn prefix_matches(bound: &Version, candidate: &Version, len: usize) -> bool {
    let b = [bound.major, bound.minor, bound.patch];
    let c = [candidate.major, candidate.minor, candidate.patch];
    let len = len.min(3);
    b[..len] == c[..len]
}

/// A comma-separated set of clauses. All clauses must hold.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct VersionSpecifier {
    clauses: Vec<Clause>,
}

impl VersionSpecifier {
    /// The specifier that admits every version.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn is_any(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn allows(&self, version: &Version) -> bool {
        self.clauses.iter().all(|c| c.allows(version))
    }

    /// Canonical textual form: clauses with normalised versions, sorted and
    /// de-duplicated. Two specifiers with the same normalised form admit the
    /// same versions.
    pub fn normalized(&self) -> String {
        let mut parts: Vec<String> = self.clauses.iter().map(Clause::normalized).collect();
        parts.sort();
        parts.dedup();
        parts.join(",")
    }

    /// Version pinned by a lone `==` clause, if any.
    pub fn pinned(&self) -> Option<&Version> {
        match self.clauses.as_slice() {
            [clause] if clause.op == Operator::Eq && !clause.wildcard => clause.version.as_ref(),
            _ => None,
        }
    }
}

impl FromStr for VersionSpecifier {
    type Err = SpecifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('(').trim_end_matches(')');
        let mut clauses = Vec::new();
        for part in trimmed.split(',') {
            let part = part.trim();
            if part.is_empty() || part == "*" {
                continue;
            }
            clauses.push(Clause::parse(part)?);
        }
        Ok(Self { clauses })
    }
}

impl fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}

/// Normalised form of a raw specifier string. Unparsable specifiers fall
/// back to their whitespace-free text so they still compare consistently.
pub fn normalize_specifier(raw: &str) -> String {
    match raw.parse::<VersionSpecifier>() {
        Ok(spec) => spec.normalized(),
        Err(_) => raw.chars().filter(|c| !c.is_whitespace()).collect(),
    }
}

/// A parsed requirement line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Name as written.
    pub name: String,
    /// Canonical (PEP 503) name.
    pub canonical: String,
    /// Specifier text without extras or environment markers.
    pub specifier: String,
}

impl Requirement {
    /// Parse `name[extras] specifier ; marker`. Direct references
    /// (`name @ url`) carry an empty specifier.
    pub fn parse(line: &str) -> Result<Self, SpecifierError> {
        let without_marker = line.split(';').next().unwrap_or("").trim();
        let name_end = without_marker
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            .unwrap_or(without_marker.len());
        let name = &without_marker[..name_end];
        if name.is_empty() {
            return Err(SpecifierError::InvalidRequirement(line.to_string()));
        }

        let mut rest = without_marker[name_end..].trim_start();
        if rest.starts_with('[') {
            let close = rest
                .find(']')
                .ok_or_else(|| SpecifierError::InvalidRequirement(line.to_string()))?;
            rest = rest[close + 1..].trim_start();
        }
        let specifier = if rest.starts_with('@') {
            String::new()
        } else {
            rest.trim_start_matches('(')
                .trim_end_matches(')')
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect()
        };

        Ok(Self {
            name: name.to_string(),
            canonical: canonical_name(name),
            specifier,
        })
    }
}
