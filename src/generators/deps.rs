// src/generators/deps.rs

//! CMakeDeps: config files that make requirements findable
//!
//! For a requirement publishing `cmake_file_name = GTest` this writes
//! `GTestConfig.cmake` and `GTestConfigVersion.cmake`, so a consumer's
//! `find_package(GTest CONFIG)` succeeds and its targets point into the
//! requirement's package folder.

use super::{cmake_path, cmake_quote};
use crate::package_info::PackageInfo;
use crate::requirements::ResolvedRequirement;
use std::path::Path;

/// Config and version file names for a `find_package()` name
pub fn config_file_name(file_name: &str) -> (String, String) {
    (
        format!("{}Config.cmake", file_name),
        format!("{}ConfigVersion.cmake", file_name),
    )
}

/// Render `<Name>Config.cmake`
pub fn render_config(req: &ResolvedRequirement, info: &PackageInfo) -> String {
    let root = &req.package_folder;
    let mut out = vec![
        format!("# {} for {}", config_file_name(&info.cmake_file_name).0, req.reference()),
        String::new(),
        "include_guard()".to_string(),
        String::new(),
        format!("set({}_FOUND TRUE)", info.cmake_file_name),
        format!("set({}_VERSION {})", info.cmake_file_name, cmake_quote(&req.reference().version)),
        format!("set({}_PACKAGE_FOLDER {})", info.cmake_file_name, cmake_path(root)),
        String::new(),
    ];

    for (name, component) in &info.components {
        let target = info.component_target(name);
        let linked: Vec<String> = component
            .requires
            .iter()
            .map(|r| info.component_target(r))
            .collect();
        render_target(
            &mut out,
            &target,
            root,
            &component.libs,
            &component.includedirs,
            &info.libdirs,
            &[],
            &linked,
        );
    }

    let component_targets: Vec<String> = info
        .components
        .keys()
        .map(|c| info.component_target(c))
        .collect();
    if !component_targets.contains(&info.cmake_target_name) {
        render_target(
            &mut out,
            &info.cmake_target_name,
            root,
            &info.libs,
            &info.includedirs,
            &info.libdirs,
            &info.defines,
            &component_targets,
        );
    }

    out.join("\n")
}

#[allow(clippy::too_many_arguments)]
fn render_target(
    out: &mut Vec<String>,
    target: &str,
    root: &Path,
    libs: &[String],
    includedirs: &[String],
    libdirs: &[String],
    defines: &[String],
    links: &[String],
) {
    out.push(format!("if(NOT TARGET {})", target));
    out.push(format!("  add_library({} INTERFACE IMPORTED)", target));

    let hints: Vec<String> = libdirs.iter().map(|d| cmake_path(&root.join(d))).collect();
    let var_prefix = target.replace("::", "_");
    let mut found_libs = Vec::new();
    for lib in libs {
        let var = format!("{}_{}_LIBRARY", var_prefix, lib);
        out.push(format!(
            "  find_library({} NAMES {} PATHS {} NO_DEFAULT_PATH)",
            var,
            cmake_quote(lib),
            hints.join(" ")
        ));
        out.push(format!("  if(NOT {})", var));
        out.push(format!(
            "    message(FATAL_ERROR {})",
            cmake_quote(&format!("Library '{}' not found for {}", lib, target))
        ));
        out.push("  endif()".to_string());
        found_libs.push(format!("${{{}}}", var));
    }

    let mut link_items = found_libs;
    link_items.extend(links.iter().cloned());
    if !link_items.is_empty() {
        out.push(format!(
            "  set_property(TARGET {} PROPERTY INTERFACE_LINK_LIBRARIES {})",
            target,
            link_items.join(" ")
        ));
    }

    if !includedirs.is_empty() {
        let dirs: Vec<String> = includedirs.iter().map(|d| cmake_path(&root.join(d))).collect();
        out.push(format!(
            "  set_property(TARGET {} PROPERTY INTERFACE_INCLUDE_DIRECTORIES {})",
            target,
            dirs.join(" ")
        ));
    }

    if !defines.is_empty() {
        let quoted: Vec<String> = defines.iter().map(|d| cmake_quote(d)).collect();
        out.push(format!(
            "  set_property(TARGET {} PROPERTY INTERFACE_COMPILE_DEFINITIONS {})",
            target,
            quoted.join(" ")
        ));
    }

    out.push("endif()".to_string());
    out.push(String::new());
}

/// Render `<Name>ConfigVersion.cmake`
///
/// Any requested version up to and including ours is accepted; an exact
/// match also sets `PACKAGE_VERSION_EXACT`.
pub fn render_config_version(req: &ResolvedRequirement) -> String {
    let version = cmake_quote(&req.reference().version);
    [
        format!("set(PACKAGE_VERSION {})", version),
        String::new(),
        "if(PACKAGE_VERSION VERSION_LESS PACKAGE_FIND_VERSION)".to_string(),
        "  set(PACKAGE_VERSION_COMPATIBLE FALSE)".to_string(),
        "else()".to_string(),
        "  set(PACKAGE_VERSION_COMPATIBLE TRUE)".to_string(),
        "  if(PACKAGE_FIND_VERSION STREQUAL PACKAGE_VERSION)".to_string(),
        "    set(PACKAGE_VERSION_EXACT TRUE)".to_string(),
        "  endif()".to_string(),
        "endif()".to_string(),
        String::new(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::super::test_support::gtest_resolved;
    use super::*;

    #[test]
    fn test_config_file_names() {
        assert_eq!(
            config_file_name("GTest"),
            ("GTestConfig.cmake".to_string(), "GTestConfigVersion.cmake".to_string())
        );
    }

    #[test]
    fn test_render_config_components() {
        let req = gtest_resolved();
        let info = req.info.clone().unwrap();
        let text = render_config(&req, &info);

        assert!(text.contains("add_library(GTest::gtest INTERFACE IMPORTED)"));
        assert!(text.contains("add_library(GTest::gtest_main INTERFACE IMPORTED)"));
        assert!(text.contains("add_library(GTest::GTest INTERFACE IMPORTED)"));
        assert!(text.contains(
            "set_property(TARGET GTest::gtest_main PROPERTY INTERFACE_LINK_LIBRARIES ${GTest_gtest_main_gtest_main_LIBRARY} GTest::gtest)"
        ));
        assert!(text.contains(
            "set_property(TARGET GTest::GTest PROPERTY INTERFACE_LINK_LIBRARIES GTest::gtest GTest::gtest_main)"
        ));
        assert!(text.contains("\"/cache/gtest/1.14.0/package/abc/include\""));
        assert!(text.contains("message(FATAL_ERROR \"Library 'gtest' not found for GTest::gtest\")"));
        assert!(text.contains("set(GTest_VERSION \"1.14.0\")"));
    }

    #[test]
    fn test_root_target_without_components() {
        let req = gtest_resolved();
        let mut info = req.info.clone().unwrap();
        info.components.clear();
        info.libs = vec!["gtest".into()];
        info.defines = vec!["GTEST_LINKED_AS_SHARED_LIBRARY=0".into()];

        let text = render_config(&req, &info);
        assert_eq!(text.matches("add_library(").count(), 1);
        assert!(text.contains("INTERFACE_COMPILE_DEFINITIONS \"GTEST_LINKED_AS_SHARED_LIBRARY=0\""));
    }

    #[test]
    fn test_render_config_version() {
        let text = render_config_version(&gtest_resolved());
        assert!(text.starts_with("set(PACKAGE_VERSION \"1.14.0\")\n"));
        assert!(text.contains("PACKAGE_VERSION_EXACT TRUE"));
    }
}
