// src/generators/mod.rs

//! Generators: translate settings and requirements into CMake input files
//!
//! Generators run during the configure step of `build()`, exactly once per
//! build, before any compilation. Their output depends only on the recipe,
//! the settings, the layout and the resolved requirements, so the same
//! inputs always produce byte-identical files.
//!
//! - `CMakeToolchain` writes the toolchain file (compilers, flags, build
//!   type, search paths) and a `CMakePresets.json`
//! - `CMakeDeps` writes a `<Name>Config.cmake` / `<Name>ConfigVersion.cmake`
//!   pair per resolved requirement that published package info

mod deps;
mod presets;
mod toolchain;

pub use deps::{config_file_name, render_config, render_config_version};
pub use presets::render_presets;
pub use toolchain::{ToolchainValues, generator_platform, render_toolchain};

use crate::error::Result;
use crate::layout::Layout;
use crate::recipe::Recipe;
use crate::requirements::ResolvedRequirement;
use crate::settings::BuildSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File written by the CMakeToolchain generator
pub const TOOLCHAIN_FILE_NAME: &str = "recipe_toolchain.cmake";

/// Presets file written next to the toolchain
pub const PRESETS_FILE_NAME: &str = "CMakePresets.json";

/// A named generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Generator {
    CMakeDeps,
    CMakeToolchain,
}

impl Generator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Generator::CMakeDeps => "CMakeDeps",
            Generator::CMakeToolchain => "CMakeToolchain",
        }
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a generator may read
pub struct GeneratorContext<'a> {
    pub recipe: &'a Recipe,
    /// Settings restricted to the recipe's declared axes
    pub settings: &'a BuildSettings,
    /// Settings of the machine running the build
    pub host: &'a BuildSettings,
    pub layout: &'a Layout,
    pub requirements: &'a [ResolvedRequirement],
}

/// Files produced by one generator run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedFiles {
    pub files: Vec<PathBuf>,
}

/// Render every declared generator to memory
///
/// Keys are file names inside the generators folder. Generators listed
/// twice run once.
pub fn render_all(ctx: &GeneratorContext<'_>) -> Result<BTreeMap<String, String>> {
    let mut outputs = BTreeMap::new();
    let mut seen = Vec::new();

    for generator in &ctx.recipe.build.generators {
        if seen.contains(generator) {
            continue;
        }
        seen.push(*generator);
        debug!("Running generator {}", generator);

        match generator {
            Generator::CMakeToolchain => {
                let values = ToolchainValues::from_context(ctx);
                outputs.insert(TOOLCHAIN_FILE_NAME.to_string(), render_toolchain(ctx, &values));
                outputs.insert(PRESETS_FILE_NAME.to_string(), render_presets(ctx)?);
            }
            Generator::CMakeDeps => {
                for req in ctx.requirements {
                    let Some(info) = &req.info else {
                        continue;
                    };
                    let file_name = &info.cmake_file_name;
                    let (config, version) = config_file_name(file_name);
                    outputs.insert(config, render_config(req, info));
                    outputs.insert(version, render_config_version(req));
                }
            }
        }
    }

    Ok(outputs)
}

/// Run every declared generator and write the results
pub fn generate_all(ctx: &GeneratorContext<'_>) -> Result<GeneratedFiles> {
    let outputs = render_all(ctx)?;
    let folder = &ctx.layout.generators_folder;
    fs::create_dir_all(folder)?;

    let mut generated = GeneratedFiles::default();
    for (name, content) in outputs {
        let path = folder.join(&name);
        fs::write(&path, content)?;
        generated.files.push(path);
    }

    info!(
        "Generators wrote {} file(s) to {}",
        generated.files.len(),
        folder.display()
    );
    Ok(generated)
}

/// Format a path for CMake: forward slashes, quoted
pub(crate) fn cmake_path(path: &Path) -> String {
    cmake_quote(&path.to_string_lossy().replace('\\', "/"))
}

/// Quote a value as a CMake quoted argument
pub(crate) fn cmake_quote(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$");
    format!("\"{}\"", escaped)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::layout::cmake_layout;
    use crate::package_info::PackageInfo;
    use crate::recipe::{NBKIT_RECIPE, PackageReference, parse_recipe};
    use crate::requirements::BuildRequirement;
    use crate::settings::SettingAxis;

    pub fn nbkit() -> Recipe {
        parse_recipe(NBKIT_RECIPE).unwrap()
    }

    pub fn linux_gcc_release() -> BuildSettings {
        BuildSettings::new()
            .with(SettingAxis::Os, "Linux")
            .with(SettingAxis::Compiler, "gcc")
            .with(SettingAxis::BuildType, "Release")
            .with(SettingAxis::Arch, "x86_64")
    }

    pub fn layout(settings: &BuildSettings) -> Layout {
        cmake_layout(Path::new("/work/src"), Path::new("/work/pkg"), settings).unwrap()
    }

    pub fn gtest_resolved() -> ResolvedRequirement {
        ResolvedRequirement {
            requirement: BuildRequirement::test(PackageReference::new("gtest", "1.14.0")),
            package_folder: PathBuf::from("/cache/gtest/1.14.0/package/abc"),
            info: Some(PackageInfo {
                libs: Vec::new(),
                includedirs: vec!["include".into()],
                libdirs: vec!["lib".into()],
                bindirs: vec!["bin".into()],
                defines: Vec::new(),
                cmake_file_name: "GTest".into(),
                cmake_target_name: "GTest::GTest".into(),
                components: [
                    (
                        "gtest".to_string(),
                        crate::package_info::ComponentInfo {
                            libs: vec!["gtest".into()],
                            ..Default::default()
                        },
                    ),
                    (
                        "gtest_main".to_string(),
                        crate::package_info::ComponentInfo {
                            libs: vec!["gtest_main".into()],
                            requires: vec!["gtest".into()],
                            ..Default::default()
                        },
                    ),
                ]
                .into_iter()
                .collect(),
            }),
        }
    }
}
