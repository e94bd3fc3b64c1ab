// src/orchestrator/session.rs

//! One build of one recipe with one set of settings
//!
//! Each phase returns a typed result that the next phase takes as an
//! argument, so phases cannot be called out of order without holding the
//! result of the one before. The [`Lifecycle`] additionally rejects a
//! phase run twice or after a failure.

use super::config::TestPolicy;
use super::state::{BuildState, Lifecycle};
use super::Orchestrator;
use crate::cmake::{ConfigureRequest, CtestSummary, StepOutput, parse_summary};
use crate::error::{Error, Result};
use crate::generators::{GeneratedFiles, GeneratorContext, generate_all, generator_platform};
use crate::layout::{Layout, derive_layout};
use crate::package_info::{self, PackageInfo, PackageManifest, package_id};
use crate::recipe::{BUILD_TESTING, PackageReference, Recipe, is_cmake_true};
use crate::requirements::{ResolvedRequirement, resolve_all};
use crate::settings::BuildSettings;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Result of `layout()`
#[derive(Debug, Clone)]
pub struct LaidOut {
    layout: Layout,
}

impl LaidOut {
    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}

/// Result of `build_requirements()`
#[derive(Debug, Clone)]
pub struct RequirementsDeclared {
    resolved: Vec<ResolvedRequirement>,
}

impl RequirementsDeclared {
    pub fn resolved(&self) -> &[ResolvedRequirement] {
        &self.resolved
    }
}

/// How the test step ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestSummary {
    Passed { total: usize },
    /// Only reachable under [`TestPolicy::AllowSkip`]
    Skipped { reason: String },
}

impl TestSummary {
    pub fn is_skipped(&self) -> bool {
        matches!(self, TestSummary::Skipped { .. })
    }
}

/// Result of `build()`: configured, compiled and tested
#[derive(Debug, Clone)]
pub struct Built {
    generated: GeneratedFiles,
    tests: TestSummary,
}

impl Built {
    pub fn generated(&self) -> &GeneratedFiles {
        &self.generated
    }

    pub fn tests(&self) -> &TestSummary {
        &self.tests
    }
}

/// Result of `package()`
#[derive(Debug, Clone)]
pub struct Installed {
    package_folder: PathBuf,
    file_count: u64,
}

impl Installed {
    pub fn package_folder(&self) -> &Path {
        &self.package_folder
    }

    pub fn file_count(&self) -> u64 {
        self.file_count
    }
}

/// Result of publishing package info
#[derive(Debug, Clone)]
pub struct Published {
    pub package_folder: PathBuf,
    pub info: PackageInfo,
    pub manifest: PackageManifest,
}

/// A single build driven phase by phase
pub struct Session<'a> {
    orchestrator: &'a Orchestrator,
    recipe: &'a Recipe,
    settings: BuildSettings,
    source_folder: PathBuf,
    package_folder: PathBuf,
    lifecycle: Lifecycle,
    log: String,
    warnings: Vec<String>,
}

impl<'a> Session<'a> {
    pub(super) fn new(
        orchestrator: &'a Orchestrator,
        recipe: &'a Recipe,
        settings: &BuildSettings,
        source_folder: &Path,
        package_folder: &Path,
    ) -> Self {
        // Undeclared axes must not influence the build
        let settings = settings.restricted_to(&recipe.build.settings);
        Self {
            orchestrator,
            recipe,
            settings,
            source_folder: source_folder.to_path_buf(),
            package_folder: package_folder.to_path_buf(),
            lifecycle: Lifecycle::new(),
            log: String::new(),
            warnings: Vec::new(),
        }
    }

    pub fn reference(&self) -> PackageReference {
        self.recipe.reference()
    }

    /// Settings restricted to the recipe's declared axes
    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    pub fn package_id(&self) -> String {
        package_id(&self.reference(), &self.settings)
    }

    pub fn state(&self) -> BuildState {
        self.lifecycle.state()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn log(&self) -> &str {
        &self.log
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub(super) fn take_output(&mut self) -> (String, Vec<String>) {
        (
            std::mem::take(&mut self.log),
            std::mem::take(&mut self.warnings),
        )
    }

    /// Phase 1: derive the folders of this build
    pub fn layout(&mut self) -> Result<LaidOut> {
        self.lifecycle.ensure_can_reach(BuildState::LaidOut)?;
        info!("Running layout phase for {}", self.reference());

        let result = derive_layout(
            self.recipe.build.layout,
            &self.source_folder,
            &self.package_folder,
            &self.settings,
        );
        let layout = self.settle(result)?;

        self.log_line(&format!(
            "Layout: build folder {}, generators folder {}",
            layout.build_folder.display(),
            layout.generators_folder.display()
        ));
        self.lifecycle.transition_to(BuildState::LaidOut)?;
        Ok(LaidOut { layout })
    }

    /// Phase 2: declare and locate the test-only requirements
    pub fn build_requirements(&mut self, _laid_out: &LaidOut) -> Result<RequirementsDeclared> {
        self.lifecycle
            .ensure_can_reach(BuildState::RequirementsDeclared)?;
        info!("Running build_requirements phase");

        let requirements = self.recipe.build_requirements();
        let result = resolve_all(
            self.orchestrator.resolver.as_ref(),
            &requirements,
            &self.settings,
        );
        let resolved = self.settle(result)?;

        for req in &resolved {
            self.log_line(&format!(
                "Requirement {} -> {}",
                req.reference(),
                req.package_folder.display()
            ));
        }
        self.lifecycle
            .transition_to(BuildState::RequirementsDeclared)?;
        Ok(RequirementsDeclared { resolved })
    }

    /// Phase 3: configure, compile, test
    ///
    /// Each step runs only if the one before succeeded.
    pub fn build(
        &mut self,
        laid_out: &LaidOut,
        requirements: &RequirementsDeclared,
    ) -> Result<Built> {
        self.lifecycle.ensure_can_reach(BuildState::Configured)?;

        let result = self.configure(laid_out, requirements);
        let (generated, testing) = self.settle(result)?;
        self.lifecycle.transition_to(BuildState::Configured)?;

        let result = self.compile(laid_out);
        self.settle(result)?;
        self.lifecycle.transition_to(BuildState::Compiled)?;

        let result = self.run_tests(laid_out, testing);
        let tests = self.settle(result)?;
        self.lifecycle.transition_to(BuildState::Tested)?;

        Ok(Built { generated, tests })
    }

    fn configure(
        &mut self,
        laid_out: &LaidOut,
        requirements: &RequirementsDeclared,
    ) -> Result<(GeneratedFiles, bool)> {
        info!("Running configure step");
        let orchestrator = self.orchestrator;
        let config = &orchestrator.config;
        let layout = &laid_out.layout;

        let mut variables: BTreeMap<String, String> = self.recipe.cmake_variables(&self.settings);
        variables.extend(config.variables.clone());

        let testing = variables.get(BUILD_TESTING).is_some_and(|v| is_cmake_true(v));
        if !testing {
            match config.test_policy {
                TestPolicy::Require => {
                    return Err(Error::ConfigurationError(format!(
                        "{} must be ON: the test suite is part of the build",
                        BUILD_TESTING
                    )));
                }
                TestPolicy::AllowSkip => {
                    self.warn(format!("{} is not ON; tests will be skipped", BUILD_TESTING));
                }
            }
        }

        let ctx = GeneratorContext {
            recipe: self.recipe,
            settings: &self.settings,
            host: &orchestrator.host,
            layout,
            requirements: &requirements.resolved,
        };
        let generated = generate_all(&ctx).map_err(|e| {
            Error::ConfigurationError(format!("generators failed: {}", e))
        })?;

        let platform = generator_platform(&self.settings);
        let request = ConfigureRequest {
            layout,
            variables: &variables,
            platform: platform.as_deref(),
        };
        let output = orchestrator
            .tool
            .configure(&request)
            .map_err(|e| Error::ConfigurationError(e.to_string()))?;
        self.log_build_output("configure", &output);

        if !output.success() {
            return Err(Error::ConfigurationError(format!(
                "cmake exited with status {:?}: {}",
                output.status,
                output.stderr.trim()
            )));
        }

        Ok((generated, testing))
    }

    fn compile(&mut self, laid_out: &LaidOut) -> Result<()> {
        info!("Running compile step");
        let jobs = self.orchestrator.config.jobs;
        let output = self
            .orchestrator
            .tool
            .build(&laid_out.layout, jobs)
            .map_err(|e| Error::CompilationError {
                status: None,
                message: e.to_string(),
            })?;
        self.log_build_output("compile", &output);

        if !output.success() {
            let message = if output.stderr.trim().is_empty() {
                output.stdout.trim().to_string()
            } else {
                output.stderr.trim().to_string()
            };
            return Err(Error::CompilationError {
                status: output.status,
                message,
            });
        }
        Ok(())
    }

    fn run_tests(&mut self, laid_out: &LaidOut, testing: bool) -> Result<TestSummary> {
        if !testing {
            let reason = format!("{} is not ON", BUILD_TESTING);
            self.warn(format!("Test step skipped: {}", reason));
            return Ok(TestSummary::Skipped { reason });
        }

        info!("Running test step");
        let jobs = self.orchestrator.config.jobs;
        let output = self
            .orchestrator
            .tool
            .test(&laid_out.layout, jobs)
            .map_err(|e| Error::TestFailure {
                failed: 0,
                total: 0,
                output: e.to_string(),
            })?;
        self.log_build_output("test", &output);

        let combined = output.combined();
        match (parse_summary(&combined), output.success()) {
            (Some(CtestSummary::Ran { failed: 0, total }), true) if total > 0 => {
                info!("All {} test(s) passed", total);
                Ok(TestSummary::Passed { total })
            }
            (Some(CtestSummary::Ran { failed, total }), _) if failed > 0 => {
                Err(Error::TestFailure {
                    failed,
                    total,
                    output: combined,
                })
            }
            (Some(CtestSummary::NoTests), _)
            | (Some(CtestSummary::Ran { total: 0, .. }), _)
            | (None, true) => self.no_tests_run("ctest found no tests"),
            (_, _) => Err(Error::TestFailure {
                failed: 0,
                total: 0,
                output: combined,
            }),
        }
    }

    fn no_tests_run(&mut self, reason: &str) -> Result<TestSummary> {
        match self.orchestrator.config.test_policy {
            TestPolicy::Require => Err(Error::NoTestsRun(reason.to_string())),
            TestPolicy::AllowSkip => {
                self.warn(format!("Test step skipped: {}", reason));
                Ok(TestSummary::Skipped {
                    reason: reason.to_string(),
                })
            }
        }
    }

    /// Phase 4: install into a staging folder, verify, move into place
    pub fn package(&mut self, laid_out: &LaidOut, _built: &Built) -> Result<Installed> {
        self.lifecycle.ensure_can_reach(BuildState::Installed)?;
        info!("Running package phase");

        let result = self.install(&laid_out.layout);
        let installed = self.settle(result)?;

        self.log_line(&format!(
            "Installed {} file(s) into {}",
            installed.file_count,
            installed.package_folder.display()
        ));
        self.lifecycle.transition_to(BuildState::Installed)?;
        Ok(installed)
    }

    fn install(&mut self, layout: &Layout) -> Result<Installed> {
        let final_folder = layout.package_folder.clone();
        let staging = staging_folder(&final_folder);

        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| install_error(&staging, e))?;
        }
        fs::create_dir_all(&staging).map_err(|e| install_error(&staging, e))?;

        match self.install_into(layout, &staging, &final_folder) {
            Ok(installed) => Ok(installed),
            Err(e) => {
                if staging.exists()
                    && let Err(cleanup) = fs::remove_dir_all(&staging)
                {
                    warn!("Failed to remove {}: {}", staging.display(), cleanup);
                }
                Err(e)
            }
        }
    }

    fn install_into(&mut self, layout: &Layout, staging: &Path, final_folder: &Path) -> Result<Installed> {
        let output = self
            .orchestrator
            .tool
            .install(layout, staging)
            .map_err(|e| Error::InstallError(e.to_string()))?;
        self.log_build_output("install", &output);

        if !output.success() {
            return Err(Error::InstallError(format!(
                "cmake --install exited with status {:?}: {}",
                output.status,
                output.stderr.trim()
            )));
        }

        let file_count = WalkDir::new(staging)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count() as u64;
        if file_count == 0 {
            return Err(Error::InstallError(format!(
                "nothing was installed into {}",
                staging.display()
            )));
        }

        for dir in &self.recipe.package_info().includedirs {
            if !staging.join(dir).is_dir() {
                return Err(Error::InstallError(format!(
                    "declared include directory '{}' was not installed",
                    dir
                )));
            }
        }

        if final_folder.exists() {
            fs::remove_dir_all(final_folder).map_err(|e| install_error(final_folder, e))?;
        }
        if let Some(parent) = final_folder.parent() {
            fs::create_dir_all(parent).map_err(|e| install_error(parent, e))?;
        }
        fs::rename(staging, final_folder).map_err(|e| install_error(final_folder, e))?;

        Ok(Installed {
            package_folder: final_folder.to_path_buf(),
            file_count,
        })
    }

    /// Phase 5: the package info record
    ///
    /// Pure: depends on recipe constants only and may be called any number
    /// of times, in any state.
    pub fn package_info(&self) -> PackageInfo {
        self.recipe.package_info()
    }

    /// Write package info and the manifest into the installed package
    pub fn publish(&mut self, installed: &Installed, recipe_revision: &str) -> Result<Published> {
        self.lifecycle.ensure_can_reach(BuildState::InfoPublished)?;
        info!("Publishing package info");

        let info = self.package_info();
        let manifest = PackageManifest {
            reference: self.reference(),
            package_id: self.package_id(),
            recipe_revision: recipe_revision.to_string(),
            settings: self.settings.clone(),
        };

        let result = package_info::publish(&installed.package_folder, &info, &manifest);
        self.settle(result)?;

        self.log_line(&format!(
            "Published {} as {}",
            info.cmake_target_name, manifest.package_id
        ));
        self.lifecycle.transition_to(BuildState::InfoPublished)?;
        Ok(Published {
            package_folder: installed.package_folder.clone(),
            info,
            manifest,
        })
    }

    /// Mark the build failed on error
    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!("{}", e);
            self.log_line(&format!("FAILED: {}", e));
            self.lifecycle.fail();
        }
        result
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    fn log_line(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }

    fn log_build_output(&mut self, step: &str, output: &StepOutput) {
        self.log_line(&format!("=== {} ===", step));
        if !output.stdout.is_empty() {
            self.log.push_str(&output.stdout);
            self.log.push('\n');
        }
        if !output.stderr.is_empty() {
            self.log.push_str(&output.stderr);
            self.log.push('\n');
        }
    }
}

fn staging_folder(package_folder: &Path) -> PathBuf {
    let name = package_folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "package".to_string());
    package_folder.with_file_name(format!("{}.staging", name))
}

fn install_error(path: &Path, e: std::io::Error) -> Error {
    Error::InstallError(format!("{}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_folder_is_sibling() {
        assert_eq!(
            staging_folder(Path::new("/cache/nbkit/1.0.0/package/abc")),
            PathBuf::from("/cache/nbkit/1.0.0/package/abc.staging")
        );
    }

    #[test]
    fn test_skipped_summary() {
        let summary = TestSummary::Skipped {
            reason: "BUILD_TESTING is not ON".to_string(),
        };
        assert!(summary.is_skipped());
        assert!(!TestSummary::Passed { total: 3 }.is_skipped());
    }
}
