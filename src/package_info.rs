// src/package_info.rs

//! Package metadata published to consumers
//!
//! Two records live in every package folder:
//! - `package_info.json`: what a consumer needs to link (libs, include
//!   dirs, the CMake target name)
//! - `package_manifest.json`: which recipe and settings produced the binary
//!
//! Both serialize deterministically: fields in declaration order and maps
//! sorted by key, so the same record always yields the same bytes.

use crate::error::{Error, Result};
use crate::hash::{Hasher, PACKAGE_ID_LEN};
use crate::recipe::PackageReference;
use crate::settings::BuildSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const PACKAGE_INFO_FILE: &str = "package_info.json";
pub const PACKAGE_MANIFEST_FILE: &str = "package_manifest.json";

/// Consumer-facing package metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Library names to link
    #[serde(default)]
    pub libs: Vec<String>,

    /// Include directories relative to the package folder
    #[serde(default)]
    pub includedirs: Vec<String>,

    #[serde(default)]
    pub libdirs: Vec<String>,

    #[serde(default)]
    pub bindirs: Vec<String>,

    #[serde(default)]
    pub defines: Vec<String>,

    /// Name passed to `find_package()`
    pub cmake_file_name: String,

    /// Target consumers link against, `namespace::name`
    pub cmake_target_name: String,

    #[serde(default)]
    pub components: BTreeMap<String, ComponentInfo>,
}

impl PackageInfo {
    /// Serialize to the published JSON form
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read `package_info.json` from a package folder
    pub fn load(package_folder: &Path) -> Result<Self> {
        let path = package_folder.join(PACKAGE_INFO_FILE);
        let content = fs::read_to_string(&path).map_err(|e| {
            Error::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Target name for a component
    pub fn component_target(&self, name: &str) -> String {
        self.components
            .get(name)
            .and_then(|c| c.cmake_target_name.clone())
            .unwrap_or_else(|| format!("{}::{}", self.cmake_file_name, name))
    }
}

/// A named sub-library of a package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    #[serde(default)]
    pub libs: Vec<String>,

    #[serde(default = "default_includedirs")]
    pub includedirs: Vec<String>,

    /// Other components of the same package this one links
    #[serde(default)]
    pub requires: Vec<String>,

    /// Overrides the default `<file_name>::<component>` target
    #[serde(default)]
    pub cmake_target_name: Option<String>,
}

fn default_includedirs() -> Vec<String> {
    vec!["include".to_string()]
}

/// Record of what produced a binary package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub reference: PackageReference,
    pub package_id: String,
    pub recipe_revision: String,
    pub settings: BuildSettings,
}

impl PackageManifest {
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn load(package_folder: &Path) -> Result<Self> {
        let path = package_folder.join(PACKAGE_MANIFEST_FILE);
        let content = fs::read_to_string(&path).map_err(|e| {
            Error::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Whether this binary can serve a consumer built with `settings`
    ///
    /// Every setting recorded in the manifest must have the same value in
    /// the consumer's settings. A package that records fewer settings
    /// (e.g. header-only) matches more consumers.
    pub fn is_compatible_with(&self, settings: &BuildSettings) -> bool {
        self.settings
            .iter()
            .all(|(key, value)| settings.get_key(key) == Some(value))
    }
}

/// Compute the package id for a reference built with `settings`
///
/// `settings` must already be restricted to the axes the recipe declares.
pub fn package_id(reference: &PackageReference, settings: &BuildSettings) -> String {
    let mut hasher = Hasher::new();
    hasher.str_field(&reference.to_string());
    for (key, value) in settings.iter() {
        hasher.str_field(key).str_field(value);
    }
    let mut id = hasher.finalize();
    id.truncate(PACKAGE_ID_LEN);
    id
}

/// Write both metadata files into a package folder
///
/// Each file is written to a temporary name and renamed into place. The
/// manifest goes last: a folder without one is not a package.
pub fn publish(package_folder: &Path, info: &PackageInfo, manifest: &PackageManifest) -> Result<()> {
    write_atomic(&package_folder.join(PACKAGE_INFO_FILE), &info.to_json()?)?;
    write_atomic(&package_folder.join(PACKAGE_MANIFEST_FILE), &manifest.to_json()?)?;
    Ok(())
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content)
        .map_err(|e| Error::InstallError(format!("Failed to write {}: {}", tmp.display(), e)))?;
    fs::rename(&tmp, path)
        .map_err(|e| Error::InstallError(format!("Failed to write {}: {}", path.display(), e)))?;
    Ok(())
}
