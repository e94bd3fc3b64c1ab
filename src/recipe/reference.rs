// src/recipe/reference.rs

//! Package references of the form `name/version`
//!
//! References name a package at an exact version. Version ranges are not
//! supported: a build requirement is located by exact name and version.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An exact `name/version` package reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageReference {
    pub name: String,
    pub version: String,
}

impl PackageReference {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parse `name/version`
    pub fn parse(s: &str) -> Result<Self, ReferenceParseError> {
        let (name, version) = s
            .split_once('/')
            .ok_or_else(|| ReferenceParseError::MissingSlash(s.to_string()))?;

        if name.is_empty() {
            return Err(ReferenceParseError::EmptyName(s.to_string()));
        }
        if version.is_empty() {
            return Err(ReferenceParseError::EmptyVersion(s.to_string()));
        }

        let valid_chars = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | '+');
        if !name.chars().all(valid_chars) {
            return Err(ReferenceParseError::InvalidName(name.to_string()));
        }
        if !version.chars().all(valid_chars) {
            return Err(ReferenceParseError::InvalidVersion(version.to_string()));
        }

        Ok(Self::new(name, version))
    }
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

impl FromStr for PackageReference {
    type Err = ReferenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PackageReference {
    type Error = ReferenceParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PackageReference> for String {
    fn from(r: PackageReference) -> Self {
        r.to_string()
    }
}

/// Errors that can occur when parsing a package reference
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceParseError {
    #[error("Reference '{0}' must have the form name/version")]
    MissingSlash(String),

    #[error("Reference '{0}' has an empty name")]
    EmptyName(String),

    #[error("Reference '{0}' has an empty version")]
    EmptyVersion(String),

    #[error("Invalid characters in package name '{0}'")]
    InvalidName(String),

    #[error("Invalid characters in version '{0}'")]
    InvalidVersion(String),
}
