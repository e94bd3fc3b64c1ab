// src/layout.rs

//! On-disk arrangement of a build
//!
//! The cmake layout places build trees under the source folder:
//! - single-config: `build/<build_type>` with generators in
//!   `build/<build_type>/generators`
//! - multi-config (`compiler=msvc`): `build` with generators in
//!   `build/generators`, the build type selected at build time
//!
//! Deriving a layout touches no files.

use crate::error::{Error, Result};
use crate::recipe::LayoutKind;
use crate::settings::BuildSettings;
use std::path::{Path, PathBuf};

/// Resolved folders for one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Root of the exported sources (holds `CMakeLists.txt`)
    pub source_folder: PathBuf,
    /// CMake binary directory
    pub build_folder: PathBuf,
    /// Where generators write their files
    pub generators_folder: PathBuf,
    /// Final installed package
    pub package_folder: PathBuf,
    /// Build type passed to CMake
    pub build_type: String,
    /// Whether the build tree holds every configuration
    pub multi_config: bool,
}

impl Layout {
    /// Path of the toolchain file written by the CMakeToolchain generator
    pub fn toolchain_file(&self) -> PathBuf {
        self.generators_folder.join(crate::generators::TOOLCHAIN_FILE_NAME)
    }
}

/// Derive a layout for the given kind
pub fn derive_layout(
    kind: LayoutKind,
    source_folder: &Path,
    package_folder: &Path,
    settings: &BuildSettings,
) -> Result<Layout> {
    match kind {
        LayoutKind::Cmake => cmake_layout(source_folder, package_folder, settings),
    }
}

/// The standard CMake layout
pub fn cmake_layout(
    source_folder: &Path,
    package_folder: &Path,
    settings: &BuildSettings,
) -> Result<Layout> {
    let build_type = settings
        .build_type()
        .filter(|bt| !bt.is_empty())
        .ok_or_else(|| {
            Error::LayoutError(
                "'build_type' setting not defined, it is necessary for cmake_layout".to_string(),
            )
        })?;

    if build_type.contains(['/', '\\']) || build_type == ".." {
        return Err(Error::LayoutError(format!(
            "build_type '{}' cannot be used as a folder name",
            build_type
        )));
    }

    let multi_config = settings.is_multi_config();
    let build_folder = if multi_config {
        source_folder.join("build")
    } else {
        source_folder.join("build").join(build_type)
    };
    let generators_folder = build_folder.join("generators");

    Ok(Layout {
        source_folder: source_folder.to_path_buf(),
        build_folder,
        generators_folder,
        package_folder: package_folder.to_path_buf(),
        build_type: build_type.to_string(),
        multi_config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingAxis;

    #[test]
    fn test_single_config_layout() {
        let settings = BuildSettings::new()
            .with(SettingAxis::Compiler, "gcc")
            .with(SettingAxis::BuildType, "Release");
        let layout = cmake_layout(Path::new("/src"), Path::new("/pkg"), &settings).unwrap();

        assert_eq!(layout.build_folder, PathBuf::from("/src/build/Release"));
        assert_eq!(
            layout.generators_folder,
            PathBuf::from("/src/build/Release/generators")
        );
        assert_eq!(
            layout.toolchain_file(),
            PathBuf::from("/src/build/Release/generators/recipe_toolchain.cmake")
        );
        assert_eq!(layout.package_folder, PathBuf::from("/pkg"));
        assert!(!layout.multi_config);
    }

    #[test]
    fn test_multi_config_layout() {
        let settings = BuildSettings::new()
            .with(SettingAxis::Compiler, "msvc")
            .with(SettingAxis::BuildType, "Debug");
        let layout = cmake_layout(Path::new("/src"), Path::new("/pkg"), &settings).unwrap();

        assert_eq!(layout.build_folder, PathBuf::from("/src/build"));
        assert_eq!(layout.generators_folder, PathBuf::from("/src/build/generators"));
        assert_eq!(layout.build_type, "Debug");
        assert!(layout.multi_config);
    }

    #[test]
    fn test_layout_requires_build_type() {
        let settings = BuildSettings::new().with(SettingAxis::Os, "Linux");
        let err = cmake_layout(Path::new("/src"), Path::new("/pkg"), &settings).unwrap_err();
        assert!(matches!(err, Error::LayoutError(_)));
    }

    #[test]
    fn test_layout_rejects_path_like_build_type() {
        let settings = BuildSettings::new().with(SettingAxis::BuildType, "../escape");
        assert!(cmake_layout(Path::new("/src"), Path::new("/pkg"), &settings).is_err());
    }
}
