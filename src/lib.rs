// src/lib.rs

//! nbkit-recipe: a recipe-driven build orchestrator for CMake projects
//!
//! A recipe describes how to configure, build, test and package a CMake
//! library. The orchestrator turns abstract build settings (`os`,
//! `compiler`, `build_type`, `arch`) into concrete CMake invocations, runs
//! the test suite as part of the build, installs the result into a package
//! folder and publishes the metadata downstream builds link against.
//!
//! # Architecture
//!
//! - Phases: layout, build_requirements, build, package, package_info, in
//!   that order, each gated on the typed result of the one before
//! - Settings: one immutable map passed explicitly to every phase
//! - Collaborators: CMake behind [`cmake::BuildTool`], dependency lookup
//!   behind [`requirements::RequirementResolver`]
//! - Local cache: exported sources, build trees and binary packages keyed
//!   by a package id derived from the settings

pub mod cmake;
mod error;
pub mod export;
pub mod generators;
pub mod hash;
pub mod layout;
pub mod orchestrator;
pub mod package_info;
pub mod recipe;
pub mod requirements;
pub mod settings;

pub use error::{Error, Result};
pub use orchestrator::{
    BuildFailure, BuildOutcome, BuildResult, BuildState, Orchestrator, OrchestratorConfig, Phase,
    TestPolicy, TestSummary,
};
pub use package_info::{PackageInfo, PackageManifest};
pub use recipe::{PackageReference, Recipe};
pub use settings::{BuildSettings, Profile, SettingAxis};
