// tests/cmake_integration.rs

//! Builds a tiny CMake project with the real cmake and ctest.
//!
//! Ignored by default. Run with `cargo test -- --ignored` on a machine
//! with CMake 3.21+ and a C++ compiler.

mod common;

use common::find_files;
use nbkit_recipe::cmake::CMakeCli;
use nbkit_recipe::orchestrator::{BuildState, Orchestrator, OrchestratorConfig, TestSummary};
use nbkit_recipe::package_info::PACKAGE_INFO_FILE;
use nbkit_recipe::requirements::PathResolver;
use nbkit_recipe::settings::{BuildSettings, SettingAxis};
use std::fs;
use std::sync::Arc;

const RECIPE: &str = r#"
[package]
name = "tinykit"
version = "0.1.0"

[build]
generators = ["CMakeDeps", "CMakeToolchain"]
exports_sources = ["CMakeLists.txt", "tinykit/*", "tests/*"]

[build.variables]
BUILD_TESTING = "ON"

[package_info]
libs = ["tinykit"]
cmake_target_name = "tinykit::tinykit"
"#;

const CMAKE_LISTS: &str = r#"cmake_minimum_required(VERSION 3.21)
project(tinykit CXX)

add_library(tinykit tinykit/add.cpp)
target_include_directories(tinykit PUBLIC
    $<BUILD_INTERFACE:${CMAKE_CURRENT_SOURCE_DIR}>
    $<INSTALL_INTERFACE:include>)

include(CTest)
if(BUILD_TESTING)
    add_executable(test_add tests/test_add.cpp)
    target_link_libraries(test_add PRIVATE tinykit)
    add_test(NAME add COMMAND test_add)
endif()

install(TARGETS tinykit)
install(FILES tinykit/add.h DESTINATION include/tinykit)
"#;

#[test]
#[ignore]
fn test_create_with_real_cmake() {
    let src = tempfile::tempdir().unwrap();
    let files = [
        ("recipe.toml", RECIPE),
        ("CMakeLists.txt", CMAKE_LISTS),
        ("tinykit/add.h", "#pragma once\nint add(int a, int b);\n"),
        ("tinykit/add.cpp", "#include \"tinykit/add.h\"\nint add(int a, int b) { return a + b; }\n"),
        (
            "tests/test_add.cpp",
            "#include \"tinykit/add.h\"\nint main() { return add(2, 2) == 4 ? 0 : 1; }\n",
        ),
    ];
    for (name, content) in files {
        let path = src.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    let cache = tempfile::tempdir().unwrap();
    let config = OrchestratorConfig::default().with_cache_root(cache.path());
    let tool = CMakeCli::locate(None).expect("cmake and ctest on PATH");
    let orch = Orchestrator::new(config, Arc::new(tool), Arc::new(PathResolver::new()));

    let settings = BuildSettings::detect().with(SettingAxis::BuildType, "Release");
    let outcome = orch
        .create(&src.path().join("recipe.toml"), &settings)
        .unwrap_or_else(|e| panic!("create failed: {}\n{}", e, e.log));

    assert_eq!(outcome.state, BuildState::InfoPublished);
    assert_eq!(outcome.tests, TestSummary::Passed { total: 1 });

    let package_folder = outcome.package_folder.unwrap();
    assert!(package_folder.join("include/tinykit/add.h").is_file());
    assert!(package_folder.join(PACKAGE_INFO_FILE).is_file());
    assert_eq!(find_files(cache.path(), PACKAGE_INFO_FILE).len(), 1);
}
