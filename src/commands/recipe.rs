// src/commands/recipe.rs

//! Recipe inspection commands: info, export, validate

use super::GlobalOptions;
use anyhow::{Context, Result};
use nbkit_recipe::orchestrator::export_to_cache;
use nbkit_recipe::recipe::{Recipe, locate_recipe, parse_recipe_file, validate_recipe};
use std::path::{Path, PathBuf};

fn load(recipe: &str) -> Result<(PathBuf, Recipe)> {
    let recipe_file = locate_recipe(Path::new(recipe))?;
    let recipe = parse_recipe_file(&recipe_file)
        .with_context(|| format!("Failed to parse recipe: {}", recipe_file.display()))?;
    Ok((recipe_file, recipe))
}

/// Print the package info JSON a recipe publishes
pub fn cmd_info(recipe: &str) -> Result<()> {
    let (_, recipe) = load(recipe)?;
    print!("{}", recipe.package_info().to_json()?);
    Ok(())
}

/// Validate a recipe and report warnings
pub fn cmd_validate(recipe: &str) -> Result<()> {
    let (recipe_file, recipe) = load(recipe)?;
    println!("Recipe: {} ({})", recipe.reference(), recipe_file.display());

    let warnings = validate_recipe(&recipe).with_context(|| "Recipe validation failed")?;
    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    if warnings.is_empty() {
        println!("[OK] No issues found");
    } else {
        println!("[OK] {} warning(s)", warnings.len());
    }
    Ok(())
}

/// Copy a recipe's exported sources into the cache
pub fn cmd_export(globals: &GlobalOptions, recipe: &str) -> Result<()> {
    let (recipe_file, recipe) = load(recipe)?;
    validate_recipe(&recipe).with_context(|| "Recipe validation failed")?;

    let config = globals.orchestrator_config()?;
    let exported = export_to_cache(&config.cache_root, &recipe_file, &recipe)?;
    for warning in &exported.warnings {
        println!("Warning: {}", warning);
    }
    println!(
        "Exported {} file(s) of {} to {}",
        exported.files.len(),
        recipe.reference(),
        exported.folder.display()
    );
    println!("  Recipe revision: {}", exported.revision);
    Ok(())
}
