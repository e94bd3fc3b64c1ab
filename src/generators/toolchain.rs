// src/generators/toolchain.rs

//! CMakeToolchain: map settings onto CMake toolchain variables

use super::{GeneratorContext, cmake_path, cmake_quote};
use crate::settings::{BuildSettings, SettingAxis};
use std::path::PathBuf;

/// CMake values derived from settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainValues {
    /// `CMAKE_BUILD_TYPE`, only for single-config generators
    pub build_type: Option<String>,
    pub c_compiler: Option<String>,
    pub cxx_compiler: Option<String>,
    /// Flags appended to the C, C++ and linker init flags
    pub arch_flags: Vec<String>,
    pub cxx_standard: Option<String>,
    pub cxx_extensions: bool,
    /// `_GLIBCXX_USE_CXX11_ABI` value from `compiler.libcxx`
    pub glibcxx_abi: Option<u8>,
    /// Set when building for an OS other than the host's
    pub system_name: Option<String>,
    pub system_processor: Option<String>,
    pub osx_architectures: Option<String>,
    /// Directories prepended to `CMAKE_PREFIX_PATH`
    pub prefix_paths: Vec<PathBuf>,
}

impl ToolchainValues {
    pub fn from_context(ctx: &GeneratorContext<'_>) -> Self {
        let settings = ctx.settings;
        let mut values = Self::from_settings(settings, ctx.host);

        values.build_type = if ctx.layout.multi_config {
            None
        } else {
            Some(ctx.layout.build_type.clone())
        };

        values.prefix_paths.push(ctx.layout.generators_folder.clone());
        for req in ctx.requirements {
            if req.info.is_none() {
                values.prefix_paths.push(req.package_folder.clone());
            }
        }

        values
    }

    /// Values that depend on settings alone
    pub fn from_settings(settings: &BuildSettings, host: &BuildSettings) -> Self {
        let mut values = Self::default();
        let compiler = settings.get(SettingAxis::Compiler).map(str::to_ascii_lowercase);
        let os = settings.get(SettingAxis::Os).map(str::to_ascii_lowercase);
        let arch = settings.get(SettingAxis::Arch).map(str::to_ascii_lowercase);

        let (c, cxx) = match compiler.as_deref() {
            Some("gcc") => (Some("gcc"), Some("g++")),
            Some("clang") => (Some("clang"), Some("clang++")),
            Some("intel-cc") => (Some("icx"), Some("icpx")),
            _ => (None, None),
        };
        values.c_compiler = c.map(String::from);
        values.cxx_compiler = cxx.map(String::from);

        let gnu_like = matches!(compiler.as_deref(), Some("gcc" | "clang" | "apple-clang" | "intel-cc"));
        let is_macos = os.as_deref() == Some("macos");

        if is_macos {
            values.osx_architectures = match arch.as_deref() {
                Some("armv8") => Some("arm64".to_string()),
                Some("x86_64") => Some("x86_64".to_string()),
                _ => None,
            };
        } else if gnu_like {
            match arch.as_deref() {
                Some("x86") => values.arch_flags.push("-m32".to_string()),
                Some("x86_64") => values.arch_flags.push("-m64".to_string()),
                _ => {}
            }
        }

        if let Some(cppstd) = settings.get_key("compiler.cppstd") {
            let (std, gnu) = match cppstd.strip_prefix("gnu") {
                Some(s) => (s, true),
                None => (cppstd, false),
            };
            values.cxx_standard = Some(std.to_string());
            values.cxx_extensions = gnu;
        }

        values.glibcxx_abi = match settings.get_key("compiler.libcxx") {
            Some("libstdc++11") => Some(1),
            Some("libstdc++") => Some(0),
            _ => None,
        };

        let host_os = host.get(SettingAxis::Os).map(str::to_ascii_lowercase);
        if os.is_some() && os != host_os {
            values.system_name = os.as_deref().map(cmake_system_name);
            values.system_processor = arch.as_deref().map(cmake_system_processor);
        }

        values
    }
}

/// Platform passed to multi-config generators with `-A`
pub fn generator_platform(settings: &BuildSettings) -> Option<String> {
    if !settings.is_multi_config() {
        return None;
    }
    let platform = match settings.get(SettingAxis::Arch)?.to_ascii_lowercase().as_str() {
        "x86" => "Win32",
        "x86_64" => "x64",
        "armv8" => "ARM64",
        "armv7" => "ARM",
        _ => return None,
    };
    Some(platform.to_string())
}

fn cmake_system_name(os: &str) -> String {
    match os {
        "linux" => "Linux",
        "macos" => "Darwin",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        "android" => "Android",
        "ios" => "iOS",
        other => other,
    }
    .to_string()
}

fn cmake_system_processor(arch: &str) -> String {
    match arch {
        "armv8" => "aarch64",
        "x86" => "i686",
        other => other,
    }
    .to_string()
}

/// Render the toolchain file
pub fn render_toolchain(ctx: &GeneratorContext<'_>, values: &ToolchainValues) -> String {
    let mut lines = vec![
        format!(
            "# {} generated for {}",
            super::TOOLCHAIN_FILE_NAME,
            ctx.recipe.reference()
        ),
        format!("# Settings: {}", ctx.settings),
        String::new(),
        "include_guard()".to_string(),
        String::new(),
    ];

    if let Some(build_type) = &values.build_type {
        lines.push(format!(
            "set(CMAKE_BUILD_TYPE {} CACHE STRING \"Choose the type of build.\" FORCE)",
            cmake_quote(build_type)
        ));
    }

    if let Some(name) = &values.system_name {
        lines.push(format!("set(CMAKE_SYSTEM_NAME {})", cmake_quote(name)));
    }
    if let Some(processor) = &values.system_processor {
        lines.push(format!("set(CMAKE_SYSTEM_PROCESSOR {})", cmake_quote(processor)));
    }
    if let Some(c) = &values.c_compiler {
        lines.push(format!("set(CMAKE_C_COMPILER {})", cmake_quote(c)));
    }
    if let Some(cxx) = &values.cxx_compiler {
        lines.push(format!("set(CMAKE_CXX_COMPILER {})", cmake_quote(cxx)));
    }
    if let Some(archs) = &values.osx_architectures {
        lines.push(format!(
            "set(CMAKE_OSX_ARCHITECTURES {} CACHE STRING \"\" FORCE)",
            cmake_quote(archs)
        ));
    }

    if !values.arch_flags.is_empty() {
        let flags = format!(" {}", values.arch_flags.join(" "));
        for var in [
            "CMAKE_C_FLAGS_INIT",
            "CMAKE_CXX_FLAGS_INIT",
            "CMAKE_EXE_LINKER_FLAGS_INIT",
            "CMAKE_SHARED_LINKER_FLAGS_INIT",
        ] {
            lines.push(format!("string(APPEND {} {})", var, cmake_quote(&flags)));
        }
    }

    if let Some(std) = &values.cxx_standard {
        lines.push(format!("set(CMAKE_CXX_STANDARD {})", std));
        lines.push(format!(
            "set(CMAKE_CXX_EXTENSIONS {})",
            if values.cxx_extensions { "ON" } else { "OFF" }
        ));
        lines.push("set(CMAKE_CXX_STANDARD_REQUIRED ON)".to_string());
    }

    if let Some(abi) = values.glibcxx_abi {
        lines.push(format!("add_compile_definitions(_GLIBCXX_USE_CXX11_ABI={})", abi));
    }

    if !values.prefix_paths.is_empty() {
        let paths: Vec<String> = values.prefix_paths.iter().map(|p| cmake_path(p)).collect();
        lines.push(format!("list(PREPEND CMAKE_PREFIX_PATH {})", paths.join(" ")));
        lines.push(format!("list(PREPEND CMAKE_MODULE_PATH {})", paths.join(" ")));
    }
    lines.push("set(CMAKE_FIND_PACKAGE_PREFER_CONFIG ON)".to_string());

    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn render(settings: &BuildSettings, host: &BuildSettings) -> String {
        let recipe = nbkit();
        let layout = layout(settings);
        let reqs = vec![gtest_resolved()];
        let ctx = GeneratorContext {
            recipe: &recipe,
            settings,
            host,
            layout: &layout,
            requirements: &reqs,
        };
        render_toolchain(&ctx, &ToolchainValues::from_context(&ctx))
    }

    #[test]
    fn test_linux_gcc_release() {
        let settings = linux_gcc_release();
        let text = render(&settings, &settings);

        assert!(text.starts_with("# recipe_toolchain.cmake generated for nbkit/1.0.0\n"));
        assert!(text.contains("set(CMAKE_BUILD_TYPE \"Release\" CACHE STRING"));
        assert!(text.contains("set(CMAKE_C_COMPILER \"gcc\")"));
        assert!(text.contains("set(CMAKE_CXX_COMPILER \"g++\")"));
        assert!(text.contains("string(APPEND CMAKE_CXX_FLAGS_INIT \" -m64\")"));
        assert!(text.contains(
            "list(PREPEND CMAKE_PREFIX_PATH \"/work/src/build/Release/generators\")"
        ));
        assert!(!text.contains("CMAKE_SYSTEM_NAME"));
    }

    #[test]
    fn test_cppstd_and_libcxx() {
        let mut settings = linux_gcc_release();
        settings.set("compiler.cppstd", "gnu20").unwrap();
        settings.set("compiler.libcxx", "libstdc++11").unwrap();

        let values = ToolchainValues::from_settings(&settings, &settings);
        assert_eq!(values.cxx_standard.as_deref(), Some("20"));
        assert!(values.cxx_extensions);
        assert_eq!(values.glibcxx_abi, Some(1));

        let text = render(&settings, &settings);
        assert!(text.contains("set(CMAKE_CXX_STANDARD 20)"));
        assert!(text.contains("set(CMAKE_CXX_EXTENSIONS ON)"));
        assert!(text.contains("_GLIBCXX_USE_CXX11_ABI=1"));
    }

    #[test]
    fn test_cross_os_sets_system_name() {
        let settings = linux_gcc_release().with(SettingAxis::Arch, "armv8");
        let host = linux_gcc_release().with(SettingAxis::Os, "Macos");

        let values = ToolchainValues::from_settings(&settings, &host);
        assert_eq!(values.system_name.as_deref(), Some("Linux"));
        assert_eq!(values.system_processor.as_deref(), Some("aarch64"));
        assert!(values.arch_flags.is_empty());
    }

    #[test]
    fn test_macos_architectures() {
        let settings = BuildSettings::new()
            .with(SettingAxis::Os, "Macos")
            .with(SettingAxis::Compiler, "apple-clang")
            .with(SettingAxis::Arch, "armv8");

        let values = ToolchainValues::from_settings(&settings, &settings);
        assert_eq!(values.osx_architectures.as_deref(), Some("arm64"));
        assert!(values.c_compiler.is_none());
    }

    #[test]
    fn test_msvc_is_multi_config() {
        let settings = BuildSettings::new()
            .with(SettingAxis::Os, "Windows")
            .with(SettingAxis::Compiler, "msvc")
            .with(SettingAxis::BuildType, "Release")
            .with(SettingAxis::Arch, "x86_64");

        assert_eq!(generator_platform(&settings).as_deref(), Some("x64"));
        let text = render(&settings, &settings);
        assert!(!text.contains("CMAKE_BUILD_TYPE"));
        assert!(!text.contains("CMAKE_CXX_COMPILER"));

        assert_eq!(generator_platform(&linux_gcc_release()), None);
    }
}
