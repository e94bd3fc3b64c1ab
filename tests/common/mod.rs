// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use nbkit_recipe::cmake::{BuildTool, ConfigureRequest, StepOutput};
use nbkit_recipe::layout::Layout;
use nbkit_recipe::orchestrator::{Orchestrator, OrchestratorConfig, TestPolicy};
use nbkit_recipe::recipe::NBKIT_RECIPE;
use nbkit_recipe::requirements::{PathResolver, RequirementResolver};
use nbkit_recipe::settings::{BuildSettings, SettingAxis};
use nbkit_recipe::{Error, PackageReference, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const ALL_PASSED: &str = "100% tests passed, 0 tests failed out of 4\n";
pub const ONE_FAILED: &str =
    "75% tests passed, 1 test failed out of 4\n\nThe following tests FAILED:\n\t  3 - MatrixTest.Inverse (Failed)\n";
pub const NO_TESTS: &str = "Test project /work/build/Release\nNo tests were found!!!\n";

fn step(status: i32, stdout: &str, stderr: &str) -> StepOutput {
    StepOutput {
        status: Some(status),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

/// A scripted CMake stand-in that records every call
pub struct FakeBuildTool {
    compile: StepOutput,
    test: StepOutput,
    install_files: Vec<&'static str>,
    /// Step whose tool cannot be started
    unstartable: Option<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl FakeBuildTool {
    /// Every step succeeds and four tests pass
    pub fn passing() -> Self {
        Self {
            compile: step(0, "[100%] Built target nbkit", ""),
            test: step(0, ALL_PASSED, ""),
            install_files: vec!["include/nbkit/event.h", "lib/libnbkit.a"],
            unstartable: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_failing_test() -> Self {
        Self {
            test: step(8, ONE_FAILED, "Errors while running CTest"),
            ..Self::passing()
        }
    }

    pub fn with_compile_error() -> Self {
        Self {
            compile: step(2, "", "matrix.h:42: error: expected ';'"),
            ..Self::passing()
        }
    }

    pub fn with_no_tests() -> Self {
        Self {
            test: step(8, NO_TESTS, ""),
            ..Self::passing()
        }
    }

    /// Install succeeds but leaves the prefix empty
    pub fn installing_nothing() -> Self {
        Self {
            install_files: Vec::new(),
            ..Self::passing()
        }
    }

    /// The tool behind `step` is missing, e.g. ctest was uninstalled
    pub fn without_tool_for(step: &'static str) -> Self {
        Self {
            unstartable: Some(step),
            ..Self::passing()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(call.to_string());
        if self.unstartable == Some(call) {
            return Err(Error::IoError(format!("Failed to run {}: No such file or directory", call)));
        }
        Ok(())
    }
}

impl BuildTool for FakeBuildTool {
    fn configure(&self, request: &ConfigureRequest<'_>) -> Result<StepOutput> {
        self.record("configure")?;
        // Generators must have run before cmake sees the toolchain
        if !request.layout.toolchain_file().is_file() {
            return Ok(step(1, "", "Could not find toolchain file"));
        }
        fs::create_dir_all(&request.layout.build_folder)?;
        Ok(step(0, "-- Configuring done", ""))
    }

    fn build(&self, _layout: &Layout, _jobs: u32) -> Result<StepOutput> {
        self.record("build")?;
        Ok(self.compile.clone())
    }

    fn test(&self, _layout: &Layout, _jobs: u32) -> Result<StepOutput> {
        self.record("test")?;
        Ok(self.test.clone())
    }

    fn install(&self, _layout: &Layout, prefix: &Path) -> Result<StepOutput> {
        self.record("install")?;
        for file in &self.install_files {
            let path = prefix.join(file);
            fs::create_dir_all(path.parent().unwrap())?;
            fs::write(path, "installed")?;
        }
        Ok(step(0, "-- Install configuration: \"Release\"", ""))
    }
}

/// Write the nbkit recipe and a minimal project next to it.
///
/// Returns (TempDir, recipe file) - keep the TempDir alive to prevent cleanup.
pub fn nbkit_source_tree() -> (TempDir, PathBuf) {
    nbkit_source_tree_with(NBKIT_RECIPE)
}

pub fn nbkit_source_tree_with(recipe: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let files = [
        ("recipe.toml", recipe),
        ("CMakeLists.txt", "cmake_minimum_required(VERSION 3.21)\nproject(nbkit CXX)\n"),
        ("nbkit/event.h", "#pragma once\n"),
        ("nbkit/matrix.h", "#pragma once\n"),
        ("tests/test_event.cpp", "#include <gtest/gtest.h>\n"),
        ("README.md", "not exported\n"),
    ];
    for (name, content) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    let recipe_file = dir.path().join("recipe.toml");
    (dir, recipe_file)
}

/// The nbkit recipe with testing turned off
pub fn recipe_without_testing() -> String {
    NBKIT_RECIPE.replace("BUILD_TESTING = \"ON\"", "BUILD_TESTING = \"OFF\"")
}

pub fn linux_gcc_release() -> BuildSettings {
    BuildSettings::new()
        .with(SettingAxis::Os, "Linux")
        .with(SettingAxis::Compiler, "gcc")
        .with(SettingAxis::BuildType, "Release")
        .with(SettingAxis::Arch, "x86_64")
}

pub fn gtest() -> PackageReference {
    PackageReference::new("gtest", "1.14.0")
}

/// A resolver that finds gtest in a plain install prefix
pub fn gtest_resolver(prefix: &Path) -> PathResolver {
    fs::create_dir_all(prefix).unwrap();
    let mut resolver = PathResolver::new();
    resolver.insert(gtest(), prefix);
    resolver
}

/// Orchestrator on a scratch cache with the given collaborators
pub fn orchestrator(
    cache: &Path,
    tool: Arc<FakeBuildTool>,
    resolver: impl RequirementResolver + 'static,
    policy: TestPolicy,
) -> Orchestrator {
    let config = OrchestratorConfig::default()
        .with_cache_root(cache)
        .with_jobs(2)
        .with_test_policy(policy);
    Orchestrator::new(config, tool, Arc::new(resolver)).with_host(linux_gcc_release())
}

/// Every file below `root` whose name is `name`
pub fn find_files(root: &Path, name: &str) -> Vec<PathBuf> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name() == name)
        .map(|e| e.path().to_path_buf())
        .collect()
}
