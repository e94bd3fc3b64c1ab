// src/recipe/mod.rs

//! Recipe system for building packages from a CMake project
//!
//! A recipe declares:
//! - Package identity (name, version, license, author, url)
//! - The settings axes that parameterize the build
//! - Generators that translate settings into CMake input files
//! - The exported source set that accompanies the recipe
//! - Test-only build requirements
//! - The metadata consumers need to link against the package
//!
//! # Example Recipe
//!
//! ```toml
//! [package]
//! name = "nbkit"
//! version = "1.0.0"
//! license = "MIT"
//!
//! [build]
//! settings = ["os", "compiler", "build_type", "arch"]
//! generators = ["CMakeDeps", "CMakeToolchain"]
//! exports_sources = ["CMakeLists.txt", "nbkit/*", "tests/*"]
//! test_requires = ["gtest/1.14.0"]
//!
//! [build.variables]
//! BUILD_TESTING = "ON"
//!
//! [package_info]
//! libs = ["nbkit"]
//! includedirs = ["include"]
//! cmake_target_name = "nbkit::nbkit"
//! ```

mod format;
pub mod parser;
mod reference;

pub use format::{
    BUILD_TESTING, BuildSection, LayoutKind, PackageInfoSection, PackageSection, Recipe,
    is_cmake_true,
};
pub use parser::{RECIPE_FILE_NAME, locate_recipe, parse_recipe, parse_recipe_file, validate_recipe};
pub use reference::{PackageReference, ReferenceParseError};

/// The recipe for the nbkit library
pub const NBKIT_RECIPE: &str = include_str!("../../recipes/nbkit/recipe.toml");
