// src/requirements.rs

//! Build requirements and their resolution
//!
//! A build requirement is needed while building and testing only. It is
//! located before configuration starts and never appears among the
//! requirements of the published package.
//!
//! Resolution is pluggable through [`RequirementResolver`] so the
//! orchestrator stays decoupled from where dependencies come from:
//! - [`CacheResolver`]: binary packages in the local package cache
//! - [`PathResolver`]: explicit `name/version=PREFIX` mappings
//! - [`ChainResolver`]: first hit across several resolvers

use crate::error::{Error, Result};
use crate::package_info::{PACKAGE_INFO_FILE, PackageInfo, PackageManifest};
use crate::recipe::PackageReference;
use crate::settings::BuildSettings;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// When a requirement is needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequirementKind {
    /// Linked by the test suite only
    Test,
}

/// A dependency declared by the recipe for build and test only
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildRequirement {
    pub reference: PackageReference,
    pub kind: RequirementKind,
}

impl BuildRequirement {
    pub fn test(reference: PackageReference) -> Self {
        Self {
            reference,
            kind: RequirementKind::Test,
        }
    }

    pub fn is_test(&self) -> bool {
        self.kind == RequirementKind::Test
    }
}

/// A requirement located on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequirement {
    pub requirement: BuildRequirement,
    /// Install prefix of the dependency
    pub package_folder: PathBuf,
    /// Published metadata, absent for plain install prefixes
    pub info: Option<PackageInfo>,
}

impl ResolvedRequirement {
    pub fn reference(&self) -> &PackageReference {
        &self.requirement.reference
    }
}

/// Trait for locating build requirements
///
/// Implementations only look things up; they never build or download.
pub trait RequirementResolver: Send + Sync {
    /// Locate a requirement for a build using `settings`
    ///
    /// Returns `Ok(None)` when the requirement is not available.
    fn resolve(
        &self,
        requirement: &BuildRequirement,
        settings: &BuildSettings,
    ) -> Result<Option<ResolvedRequirement>>;
}

/// Resolves requirements from binary packages in the local cache
///
/// Looks in `<root>/<name>/<version>/package/*` for a package whose
/// manifest is compatible with the consumer's settings. Candidates are
/// visited in sorted order so the choice is stable.
pub struct CacheResolver {
    root: PathBuf,
}

impl CacheResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl RequirementResolver for CacheResolver {
    fn resolve(
        &self,
        requirement: &BuildRequirement,
        settings: &BuildSettings,
    ) -> Result<Option<ResolvedRequirement>> {
        let reference = &requirement.reference;
        let packages = self
            .root
            .join(&reference.name)
            .join(&reference.version)
            .join("package");

        if !packages.is_dir() {
            debug!("No cached packages for {} in {}", reference, packages.display());
            return Ok(None);
        }

        let mut candidates: Vec<PathBuf> = fs::read_dir(&packages)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        candidates.sort();

        for folder in candidates {
            let manifest = match PackageManifest::load(&folder) {
                Ok(m) => m,
                Err(e) => {
                    warn!("Skipping cached package {}: {}", folder.display(), e);
                    continue;
                }
            };

            if manifest.reference != *reference || !manifest.is_compatible_with(settings) {
                continue;
            }

            let info = match PackageInfo::load(&folder) {
                Ok(info) => info,
                Err(e) => {
                    warn!("Skipping cached package {}: {}", folder.display(), e);
                    continue;
                }
            };
            debug!("Resolved {} to {}", reference, folder.display());
            return Ok(Some(ResolvedRequirement {
                requirement: requirement.clone(),
                package_folder: folder,
                info: Some(info),
            }));
        }

        Ok(None)
    }
}

/// Resolves requirements from explicit install prefixes
///
/// A prefix holding `package_info.json` contributes that metadata;
/// otherwise the prefix is handed to CMake as a search path and the
/// dependency's own config files are used.
#[derive(Default)]
pub struct PathResolver {
    prefixes: BTreeMap<PackageReference, PathBuf>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: PackageReference, prefix: impl Into<PathBuf>) {
        self.prefixes.insert(reference, prefix.into());
    }

    /// Parse `name/version=PREFIX`
    pub fn parse_mapping(mapping: &str) -> Result<(PackageReference, PathBuf)> {
        let (reference, prefix) = mapping.split_once('=').ok_or_else(|| {
            Error::ParseError(format!("Expected name/version=PREFIX, got '{}'", mapping))
        })?;
        let reference = PackageReference::parse(reference.trim())
            .map_err(|e| Error::ParseError(e.to_string()))?;
        Ok((reference, PathBuf::from(prefix.trim())))
    }
}

impl RequirementResolver for PathResolver {
    fn resolve(
        &self,
        requirement: &BuildRequirement,
        _settings: &BuildSettings,
    ) -> Result<Option<ResolvedRequirement>> {
        let Some(prefix) = self.prefixes.get(&requirement.reference) else {
            return Ok(None);
        };

        if !prefix.is_dir() {
            warn!(
                "Prefix for {} does not exist: {}",
                requirement.reference,
                prefix.display()
            );
            return Ok(None);
        }

        let info = if is_package_folder(prefix) {
            Some(PackageInfo::load(prefix)?)
        } else {
            None
        };

        Ok(Some(ResolvedRequirement {
            requirement: requirement.clone(),
            package_folder: prefix.clone(),
            info,
        }))
    }
}

/// Tries resolvers in order and returns the first hit
#[derive(Default)]
pub struct ChainResolver {
    resolvers: Vec<Arc<dyn RequirementResolver>>,
}

impl ChainResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolver: Arc<dyn RequirementResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }
}

impl RequirementResolver for ChainResolver {
    fn resolve(
        &self,
        requirement: &BuildRequirement,
        settings: &BuildSettings,
    ) -> Result<Option<ResolvedRequirement>> {
        for resolver in &self.resolvers {
            if let Some(resolved) = resolver.resolve(requirement, settings)? {
                return Ok(Some(resolved));
            }
        }
        Ok(None)
    }
}

/// Resolve every requirement or fail listing all that are missing
pub fn resolve_all(
    resolver: &dyn RequirementResolver,
    requirements: &[BuildRequirement],
    settings: &BuildSettings,
) -> Result<Vec<ResolvedRequirement>> {
    let mut resolved = Vec::with_capacity(requirements.len());
    let mut unresolved = Vec::new();

    for requirement in requirements {
        match resolver.resolve(requirement, settings)? {
            Some(r) => {
                info!(
                    "Resolved requirement {} -> {}",
                    requirement.reference,
                    r.package_folder.display()
                );
                resolved.push(r);
            }
            None => unresolved.push(requirement.reference.to_string()),
        }
    }

    if !unresolved.is_empty() {
        return Err(Error::ResolutionError(unresolved));
    }

    Ok(resolved)
}

/// Whether a folder looks like a package produced by this tool
pub fn is_package_folder(path: &Path) -> bool {
    path.join(PACKAGE_INFO_FILE).is_file()
}
