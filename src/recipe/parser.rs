// src/recipe/parser.rs

//! Recipe file parsing

use crate::error::{Error, Result};
use crate::recipe::format::{BUILD_TESTING, Recipe};
use crate::settings::SettingAxis;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File name looked up when a directory is given instead of a recipe file
pub const RECIPE_FILE_NAME: &str = "recipe.toml";

/// Parse a recipe from a TOML string
pub fn parse_recipe(content: &str) -> Result<Recipe> {
    Ok(toml::from_str(content)?)
}

/// Parse a recipe from a file
pub fn parse_recipe_file(path: &Path) -> Result<Recipe> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::IoError(format!(
            "Failed to read recipe file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_recipe(&content)
}

/// Resolve a recipe path argument to a recipe file
///
/// Accepts either the recipe file itself or the directory holding
/// `recipe.toml`.
pub fn locate_recipe(path: &Path) -> Result<PathBuf> {
    let candidate = if path.is_dir() {
        path.join(RECIPE_FILE_NAME)
    } else {
        path.to_path_buf()
    };

    if !candidate.is_file() {
        return Err(Error::IoError(format!(
            "Recipe not found: {}",
            candidate.display()
        )));
    }

    Ok(candidate)
}

/// Validate a recipe for completeness and correctness
///
/// Hard errors are returned as `Err`; softer problems come back as warnings.
pub fn validate_recipe(recipe: &Recipe) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if recipe.package.name.is_empty() {
        return Err(Error::ParseError("Recipe package name cannot be empty".to_string()));
    }
    if recipe.package.version.is_empty() {
        return Err(Error::ParseError("Recipe package version cannot be empty".to_string()));
    }
    if recipe.build.exports_sources.is_empty() {
        return Err(Error::ParseError(
            "Recipe must export at least one source pattern".to_string(),
        ));
    }

    // cmake_layout derives its folders from build_type
    if !recipe.declares(SettingAxis::BuildType) {
        return Err(Error::ParseError(
            "The cmake layout requires the build_type setting to be declared".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for req in &recipe.build.test_requires {
        if !seen.insert(&req.name) {
            return Err(Error::ParseError(format!(
                "Requirement {} is declared more than once",
                req.name
            )));
        }
    }

    let mut generators = HashSet::new();
    for generator in &recipe.build.generators {
        if !generators.insert(generator) {
            warnings.push(format!("Generator {} is listed more than once", generator));
        }
    }

    let target = recipe.package_info().cmake_target_name;
    if !target.contains("::") {
        warnings.push(format!(
            "cmake_target_name '{}' does not follow the namespace::name convention",
            target
        ));
    }

    if recipe.package.description.is_none() {
        warnings.push("Missing package description".to_string());
    }
    if recipe.package.license.is_none() {
        warnings.push("Missing package license".to_string());
    }

    if !recipe.testing_enabled() {
        warnings.push(format!(
            "{} is not ON; the test phase will not run any tests",
            BUILD_TESTING
        ));
    }
    if !recipe.build.test_requires.is_empty() && !recipe.testing_enabled() {
        warnings.push("Test requirements are declared but testing is disabled".to_string());
    }

    Ok(warnings)
}
