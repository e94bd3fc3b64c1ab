// src/recipe/format.rs

//! Recipe file format definitions
//!
//! Recipes are TOML files that describe how to configure, build, test and
//! package a CMake project, and what a consumer needs to link against it.

use crate::generators::Generator;
use crate::package_info::{ComponentInfo, PackageInfo};
use crate::recipe::reference::PackageReference;
use crate::requirements::BuildRequirement;
use crate::settings::{BuildSettings, SettingAxis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// CMake cache variable that enables test targets
pub const BUILD_TESTING: &str = "BUILD_TESTING";

/// A complete recipe for building a package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Package identity
    pub package: PackageSection,

    /// Build configuration
    pub build: BuildSection,

    /// Metadata published to consumers after packaging
    #[serde(default)]
    pub package_info: PackageInfoSection,
}

impl Recipe {
    /// The `name/version` reference of this recipe
    pub fn reference(&self) -> PackageReference {
        PackageReference::new(&self.package.name, &self.package.version)
    }

    /// Substitute built-in variables in a string
    ///
    /// Replaces `%(name)s` and `%(version)s`, plus `%(<axis>)s` for every
    /// settings axis that has a value.
    pub fn substitute(&self, template: &str, settings: &BuildSettings) -> String {
        let mut result = template.to_string();

        result = result.replace("%(name)s", &self.package.name);
        result = result.replace("%(version)s", &self.package.version);

        for axis in SettingAxis::ALL {
            if let Some(value) = settings.get(axis) {
                result = result.replace(&format!("%({})s", axis.as_str()), value);
            }
        }

        result
    }

    /// Whether the recipe declares the given settings axis
    pub fn declares(&self, axis: SettingAxis) -> bool {
        self.build.settings.contains(&axis)
    }

    /// Whether `BUILD_TESTING` is set to a CMake-true value
    pub fn testing_enabled(&self) -> bool {
        self.build
            .variables
            .get(BUILD_TESTING)
            .is_some_and(|v| is_cmake_true(v))
    }

    /// CMake cache variables with built-in variables substituted
    pub fn cmake_variables(&self, settings: &BuildSettings) -> BTreeMap<String, String> {
        self.build
            .variables
            .iter()
            .map(|(k, v)| (k.clone(), self.substitute(v, settings)))
            .collect()
    }

    /// Requirements needed only while building and testing
    pub fn build_requirements(&self) -> Vec<BuildRequirement> {
        self.build
            .test_requires
            .iter()
            .cloned()
            .map(BuildRequirement::test)
            .collect()
    }

    /// The package info record for this recipe
    ///
    /// A pure function of recipe constants: calling it any number of times
    /// yields the same value.
    pub fn package_info(&self) -> PackageInfo {
        let section = &self.package_info;
        let name = &self.package.name;

        let cmake_file_name = section
            .cmake_file_name
            .clone()
            .unwrap_or_else(|| name.clone());
        let cmake_target_name = section
            .cmake_target_name
            .clone()
            .unwrap_or_else(|| format!("{}::{}", name, name));

        PackageInfo {
            libs: section.libs.clone(),
            includedirs: section
                .includedirs
                .clone()
                .unwrap_or_else(|| vec!["include".to_string()]),
            libdirs: section
                .libdirs
                .clone()
                .unwrap_or_else(|| vec!["lib".to_string()]),
            bindirs: section
                .bindirs
                .clone()
                .unwrap_or_else(|| vec!["bin".to_string()]),
            defines: section.defines.clone(),
            cmake_file_name,
            cmake_target_name,
            components: section.components.clone(),
        }
    }
}

/// CMake's notion of a true constant
pub fn is_cmake_true(value: &str) -> bool {
    let v = value.trim().to_ascii_uppercase();
    matches!(v.as_str(), "1" | "ON" | "YES" | "TRUE" | "Y")
        || v.parse::<i64>().is_ok_and(|n| n != 0)
}

/// Package identity section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    /// Package name
    pub name: String,

    /// Package version
    pub version: String,

    /// Short description
    #[serde(default)]
    pub description: Option<String>,

    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,

    /// Author, usually `Name <email>`
    #[serde(default)]
    pub author: Option<String>,

    /// Homepage or repository URL
    #[serde(default)]
    pub url: Option<String>,
}

/// Build instructions section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSection {
    /// Settings axes that parameterize this package
    ///
    /// Values for axes not listed here are ignored.
    #[serde(default = "default_settings")]
    pub settings: Vec<SettingAxis>,

    /// Generators run during configure
    #[serde(default)]
    pub generators: Vec<Generator>,

    /// Path patterns of the files shipped with the recipe
    ///
    /// `dir/*` matches every file below `dir`.
    #[serde(default)]
    pub exports_sources: Vec<String>,

    /// On-disk arrangement of source, build and generator folders
    #[serde(default)]
    pub layout: LayoutKind,

    /// Requirements needed to build and run the tests only
    #[serde(default)]
    pub test_requires: Vec<PackageReference>,

    /// CMake cache variables passed to configure
    ///
    /// Supports `%(variable)s` substitution.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

fn default_settings() -> Vec<SettingAxis> {
    SettingAxis::ALL.to_vec()
}

/// Folder layout used by the build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// `build/<build_type>` and `build/<build_type>/generators`
    #[default]
    Cmake,
}

/// Consumer metadata section
///
/// Unset fields fall back to the defaults documented on
/// [`Recipe::package_info`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageInfoSection {
    /// Library names to link
    #[serde(default)]
    pub libs: Vec<String>,

    /// Include directories relative to the package folder
    #[serde(default)]
    pub includedirs: Option<Vec<String>>,

    #[serde(default)]
    pub libdirs: Option<Vec<String>>,

    #[serde(default)]
    pub bindirs: Option<Vec<String>>,

    /// Preprocessor definitions consumers must use
    #[serde(default)]
    pub defines: Vec<String>,

    /// Name used for `find_package()` (defaults to the package name)
    #[serde(default)]
    pub cmake_file_name: Option<String>,

    /// Downstream target, `namespace::name` (defaults to `<name>::<name>`)
    #[serde(default)]
    pub cmake_target_name: Option<String>,

    /// Named sub-libraries with their own targets
    #[serde(default)]
    pub components: BTreeMap<String, ComponentInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::NBKIT_RECIPE;

    #[test]
    fn test_parse_nbkit_recipe() {
        let recipe: Recipe = toml::from_str(NBKIT_RECIPE).unwrap();

        assert_eq!(recipe.package.name, "nbkit");
        assert_eq!(recipe.package.version, "1.0.0");
        assert_eq!(recipe.package.license.as_deref(), Some("MIT"));
        assert_eq!(recipe.build.settings, SettingAxis::ALL.to_vec());
        assert_eq!(
            recipe.build.generators,
            vec![Generator::CMakeDeps, Generator::CMakeToolchain]
        );
        assert_eq!(
            recipe.build.exports_sources,
            vec!["CMakeLists.txt", "nbkit/*", "tests/*"]
        );
        assert_eq!(
            recipe.build.test_requires,
            vec![PackageReference::new("gtest", "1.14.0")]
        );
        assert!(recipe.testing_enabled());
    }

    #[test]
    fn test_package_info_defaults() {
        let recipe: Recipe = toml::from_str(NBKIT_RECIPE).unwrap();
        let info = recipe.package_info();

        assert_eq!(info.libs, vec!["nbkit"]);
        assert_eq!(info.includedirs, vec!["include"]);
        assert_eq!(info.libdirs, vec!["lib"]);
        assert_eq!(info.cmake_target_name, "nbkit::nbkit");
        assert_eq!(info.cmake_file_name, "nbkit");
        assert_eq!(info, recipe.package_info());
    }

    #[test]
    fn test_minimal_recipe() {
        let minimal = r#"
[package]
name = "hello"
version = "0.1"

[build]
exports_sources = ["CMakeLists.txt"]
"#;

        let recipe: Recipe = toml::from_str(minimal).unwrap();
        assert_eq!(recipe.build.settings.len(), 4);
        assert_eq!(recipe.build.layout, LayoutKind::Cmake);
        assert!(recipe.build.test_requires.is_empty());
        assert!(!recipe.testing_enabled());
        assert_eq!(recipe.package_info().cmake_target_name, "hello::hello");
    }

    #[test]
    fn test_substitution() {
        let recipe: Recipe = toml::from_str(NBKIT_RECIPE).unwrap();
        let settings = BuildSettings::new().with(SettingAxis::BuildType, "Debug");

        assert_eq!(
            recipe.substitute("%(name)s-%(version)s-%(build_type)s", &settings),
            "nbkit-1.0.0-Debug"
        );
        // Axes without a value are left untouched
        assert_eq!(recipe.substitute("%(arch)s", &settings), "%(arch)s");
    }

    #[test]
    fn test_cmake_true_values() {
        for v in ["ON", "on", "1", "TRUE", "yes", "Y", "2"] {
            assert!(is_cmake_true(v), "{} should be true", v);
        }
        for v in ["OFF", "0", "FALSE", "no", "", "NOTFOUND"] {
            assert!(!is_cmake_true(v), "{} should be false", v);
        }
    }

    #[test]
    fn test_build_requirements_are_test_kind() {
        let recipe: Recipe = toml::from_str(NBKIT_RECIPE).unwrap();
        let reqs = recipe.build_requirements();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].reference.to_string(), "gtest/1.14.0");
        assert!(reqs[0].is_test());
    }
}
