// src/commands/build.rs

//! Create and build commands

use super::{GlobalOptions, resolve_settings};
use crate::cli::BuildOptions;
use anyhow::{Context, Result};
use nbkit_recipe::cmake::CMakeCli;
use nbkit_recipe::Error;
use nbkit_recipe::orchestrator::{
    BuildFailure, BuildOutcome, Orchestrator, OrchestratorConfig, TestPolicy, TestSummary,
};
use nbkit_recipe::recipe::locate_recipe;
use nbkit_recipe::requirements::{CacheResolver, ChainResolver, PathResolver};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Orchestrator config with the command-line options applied
fn build_config(
    globals: &GlobalOptions,
    options: &BuildOptions,
    keep_build: bool,
) -> Result<OrchestratorConfig> {
    let mut config = globals.orchestrator_config()?;
    if let Some(jobs) = options.jobs {
        config = config.with_jobs(jobs);
    }
    if options.allow_skip_tests {
        config = config.with_test_policy(TestPolicy::AllowSkip);
    }
    let keep = keep_build || config.keep_build;
    Ok(config.with_keep_build(keep))
}

fn orchestrator(globals: &GlobalOptions, options: &BuildOptions, keep_build: bool) -> Result<Orchestrator> {
    let config = build_config(globals, options, keep_build)?;

    let mut paths = PathResolver::new();
    for mapping in &options.requirements {
        let (reference, prefix) = PathResolver::parse_mapping(mapping)
            .with_context(|| format!("Invalid --requirement '{}'", mapping))?;
        paths.insert(reference, prefix);
    }
    let resolver = ChainResolver::new()
        .with(Arc::new(paths))
        .with(Arc::new(CacheResolver::new(&config.cache_root)));

    let tool = CMakeCli::locate(config.cmake.as_deref()).context("CMake is required to build")?;
    info!("Using {}", tool.cmake().display());

    Ok(Orchestrator::new(config, Arc::new(tool), Arc::new(resolver)))
}

fn write_log(log: &str, log_path: Option<&str>) -> Result<()> {
    if let Some(path) = log_path {
        fs::write(path, log).with_context(|| format!("Failed to write log {}", path))?;
        println!("Build log written to {}", path);
    }
    Ok(())
}

/// Save the log and show the failing step's output, then pass the error on
fn report_failure(failure: BuildFailure, log_path: Option<&str>) -> Result<()> {
    for warning in &failure.warnings {
        println!("Warning: {}", warning);
    }
    write_log(&failure.log, log_path)?;

    match &failure.error {
        Error::TestFailure { output, .. } => eprintln!("{}", output.trim_end()),
        Error::ConfigurationError(_) | Error::CompilationError { .. } if log_path.is_none() => {
            eprintln!("Rerun with --log <file> to keep the full build output");
        }
        _ => {}
    }
    Err(failure.into())
}

fn report(outcome: &BuildOutcome, log_path: Option<&str>) -> Result<()> {
    write_log(&outcome.log, log_path)?;

    for warning in &outcome.warnings {
        println!("Warning: {}", warning);
    }

    match &outcome.tests {
        TestSummary::Passed { total } => println!("Tests: {} passed", total),
        TestSummary::Skipped { reason } => println!("Tests: SKIPPED ({})", reason),
    }

    println!("{} reached state '{}'", outcome.reference, outcome.state);
    println!("  Package id: {}", outcome.package_id);
    if let Some(revision) = &outcome.recipe_revision {
        println!("  Recipe revision: {}", revision);
    }
    if let Some(folder) = &outcome.package_folder {
        println!("  Package folder: {}", folder.display());
    }
    if let Some(info) = &outcome.package_info {
        println!("  Target: {}", info.cmake_target_name);
        println!("  Libraries: {}", info.libs.join(", "));
    }
    Ok(())
}

/// Export, build, test, package and publish a recipe in the cache
pub fn cmd_create(
    globals: &GlobalOptions,
    options: &BuildOptions,
    keep_build: bool,
    log: Option<&str>,
) -> Result<()> {
    let recipe_file = locate_recipe(Path::new(&options.recipe))?;
    let settings = resolve_settings(options.profile.as_deref(), &options.settings)?;
    println!("Creating {} with settings: {}", recipe_file.display(), settings);

    let orchestrator = orchestrator(globals, options, keep_build)?;
    match orchestrator.create(&recipe_file, &settings) {
        Ok(outcome) => report(&outcome, log),
        Err(failure) => report_failure(failure, log),
    }
}

/// Build and test a recipe in place
pub fn cmd_build(globals: &GlobalOptions, options: &BuildOptions, log: Option<&str>) -> Result<()> {
    let recipe_file = locate_recipe(Path::new(&options.recipe))?;
    let settings = resolve_settings(options.profile.as_deref(), &options.settings)?;
    println!("Building {} with settings: {}", recipe_file.display(), settings);

    let orchestrator = orchestrator(globals, options, false)?;
    match orchestrator.build_local(&recipe_file, &settings) {
        Ok(outcome) => report(&outcome, log),
        Err(failure) => report_failure(failure, log),
    }
}
