// src/settings.rs

//! Build settings and profiles
//!
//! Settings are the axes of build-configuration variability: `os`,
//! `compiler`, `build_type` and `arch`, plus dotted sub-settings such as
//! `compiler.cppstd`. Values are free-form strings supplied by a profile or
//! the command line; they are passed through, never interpreted beyond what
//! the generators need to pick CMake variables.
//!
//! A profile is a TOML file:
//!
//! ```toml
//! [settings]
//! os = "Linux"
//! compiler = "gcc"
//! "compiler.cppstd" = "17"
//! build_type = "Release"
//! arch = "x86_64"
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// A recognized settings axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingAxis {
    Os,
    Compiler,
    BuildType,
    Arch,
}

impl SettingAxis {
    pub const ALL: [SettingAxis; 4] = [
        SettingAxis::Os,
        SettingAxis::Compiler,
        SettingAxis::BuildType,
        SettingAxis::Arch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingAxis::Os => "os",
            SettingAxis::Compiler => "compiler",
            SettingAxis::BuildType => "build_type",
            SettingAxis::Arch => "arch",
        }
    }
}

impl fmt::Display for SettingAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingAxis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SettingAxis::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| Error::SettingsError(format!("Unknown settings axis '{}'", s)))
    }
}

/// Immutable mapping of settings keys to values
///
/// Keys are either an axis name (`compiler`) or an axis sub-setting
/// (`compiler.cppstd`). Iteration order is sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildSettings {
    values: BTreeMap<String, String>,
}

impl BuildSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for an axis value
    pub fn with(mut self, axis: SettingAxis, value: impl Into<String>) -> Self {
        self.values.insert(axis.as_str().to_string(), value.into());
        self
    }

    /// Set a key, validating that it belongs to a known axis
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let root = key.split('.').next().unwrap_or(key);
        root.parse::<SettingAxis>()?;
        if key.ends_with('.') || key.contains("..") {
            return Err(Error::SettingsError(format!("Malformed settings key '{}'", key)));
        }
        self.values.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Apply a `key=value` override
    pub fn apply_override(&mut self, entry: &str) -> Result<()> {
        let (key, value) = entry.split_once('=').ok_or_else(|| {
            Error::SettingsError(format!("Expected key=value, got '{}'", entry))
        })?;
        self.set(key.trim(), value.trim())
    }

    pub fn get(&self, axis: SettingAxis) -> Option<&str> {
        self.values.get(axis.as_str()).map(|s| s.as_str())
    }

    /// Look up any key, including sub-settings
    pub fn get_key(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn build_type(&self) -> Option<&str> {
        self.get(SettingAxis::BuildType)
    }

    /// Multi-config CMake generators put every build type in one tree
    pub fn is_multi_config(&self) -> bool {
        self.get(SettingAxis::Compiler)
            .is_some_and(|c| c.eq_ignore_ascii_case("msvc"))
    }

    /// Keep only the keys that belong to the given axes
    pub fn restricted_to(&self, axes: &[SettingAxis]) -> BuildSettings {
        let values = self
            .values
            .iter()
            .filter(|(key, _)| {
                let root = key.split('.').next().unwrap_or(key);
                axes.iter().any(|a| a.as_str() == root)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        BuildSettings { values }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Settings of the machine running the build
    pub fn detect() -> Self {
        let os = match std::env::consts::OS {
            "linux" => "Linux",
            "macos" => "Macos",
            "windows" => "Windows",
            "freebsd" => "FreeBSD",
            other => other,
        };
        let arch = match std::env::consts::ARCH {
            "aarch64" => "armv8",
            "arm" => "armv7",
            other => other,
        };
        let compiler = match std::env::consts::OS {
            "windows" => "msvc",
            "macos" => "apple-clang",
            _ if which::which("gcc").is_ok() => "gcc",
            _ if which::which("clang").is_ok() => "clang",
            _ => "gcc",
        };

        debug!("Detected host settings: os={} arch={} compiler={}", os, arch, compiler);

        BuildSettings::new()
            .with(SettingAxis::Os, os)
            .with(SettingAxis::Arch, arch)
            .with(SettingAxis::Compiler, compiler)
            .with(SettingAxis::BuildType, "Release")
    }
}

impl fmt::Display for BuildSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        f.write_str(&parts.join(", "))
    }
}

/// A settings profile on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

impl Profile {
    pub fn from_settings(settings: &BuildSettings) -> Self {
        Self {
            settings: settings
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Convert into validated settings
    pub fn into_settings(self) -> Result<BuildSettings> {
        let mut settings = BuildSettings::new();
        for (key, value) in self.settings {
            settings.set(&key, value)?;
        }
        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self)
            .map_err(|e| Error::SettingsError(format!("Failed to serialize profile: {}", e)))
    }
}

/// Parse a profile from a TOML string
pub fn parse_profile(content: &str) -> Result<BuildSettings> {
    let profile: Profile = toml::from_str(content)
        .map_err(|e| Error::SettingsError(format!("Invalid profile: {}", e)))?;
    profile.into_settings()
}

/// Load a profile file
pub fn load_profile(path: &Path) -> Result<BuildSettings> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::IoError(format!("Failed to read profile {}: {}", path.display(), e))
    })?;
    parse_profile(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_roundtrip_names() {
        for axis in SettingAxis::ALL {
            assert_eq!(axis.as_str().parse::<SettingAxis>().unwrap(), axis);
        }
        assert!("compiler_version".parse::<SettingAxis>().is_err());
    }

    #[test]
    fn test_set_validates_root_axis() {
        let mut settings = BuildSettings::new();
        settings.set("compiler.cppstd", "17").unwrap();
        assert_eq!(settings.get_key("compiler.cppstd"), Some("17"));

        assert!(settings.set("options.shared", "True").is_err());
        assert!(settings.set("compiler.", "x").is_err());
    }

    #[test]
    fn test_apply_override() {
        let mut settings = BuildSettings::new().with(SettingAxis::BuildType, "Release");
        settings.apply_override("build_type=Debug").unwrap();
        assert_eq!(settings.build_type(), Some("Debug"));

        assert!(settings.apply_override("build_type").is_err());
    }

    #[test]
    fn test_restricted_to_drops_undeclared_axes() {
        let mut settings = BuildSettings::new()
            .with(SettingAxis::Os, "Linux")
            .with(SettingAxis::Compiler, "gcc")
            .with(SettingAxis::BuildType, "Release");
        settings.set("compiler.version", "13").unwrap();

        let restricted = settings.restricted_to(&[SettingAxis::Os, SettingAxis::BuildType]);
        assert_eq!(restricted.get(SettingAxis::Os), Some("Linux"));
        assert_eq!(restricted.get(SettingAxis::Compiler), None);
        assert_eq!(restricted.get_key("compiler.version"), None);
    }

    #[test]
    fn test_multi_config() {
        let settings = BuildSettings::new().with(SettingAxis::Compiler, "msvc");
        assert!(settings.is_multi_config());
        let settings = BuildSettings::new().with(SettingAxis::Compiler, "gcc");
        assert!(!settings.is_multi_config());
    }

    #[test]
    fn test_parse_profile() {
        let content = r#"
[settings]
os = "linux"
compiler = "gcc"
"compiler.cppstd" = "17"
build_type = "Release"
arch = "x86_64"
"#;
        let settings = parse_profile(content).unwrap();
        assert_eq!(settings.get(SettingAxis::Os), Some("linux"));
        assert_eq!(settings.get_key("compiler.cppstd"), Some("17"));
        assert_eq!(
            settings.to_string(),
            "arch=x86_64, build_type=Release, compiler=gcc, compiler.cppstd=17, os=linux"
        );
    }

    #[test]
    fn test_parse_profile_unknown_axis() {
        let content = r#"
[settings]
distro = "fedora"
"#;
        assert!(parse_profile(content).is_err());
    }

    #[test]
    fn test_profile_to_toml_reparses() {
        let settings = BuildSettings::detect();
        let text = Profile::from_settings(&settings).to_toml().unwrap();
        assert_eq!(parse_profile(&text).unwrap(), settings);
    }

    #[test]
    fn test_detect_has_all_axes() {
        let settings = BuildSettings::detect();
        for axis in SettingAxis::ALL {
            assert!(settings.get(axis).is_some(), "missing {}", axis);
        }
    }
}
