// src/commands/mod.rs
//! Command handlers for the nbkit-recipe CLI

mod build;
mod profile;
mod recipe;

pub use build::{cmd_build, cmd_create};
pub use profile::{cmd_profile_detect, cmd_profile_show};
pub use recipe::{cmd_export, cmd_info, cmd_validate};

use anyhow::{Context, Result};
use nbkit_recipe::orchestrator::OrchestratorConfig;
use nbkit_recipe::settings::{BuildSettings, load_profile};
use std::path::{Path, PathBuf};

/// Global options every command may use
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub cache: Option<String>,
    pub config: Option<String>,
}

impl GlobalOptions {
    /// Orchestrator config from `--config`, with `--cache` applied on top
    pub fn orchestrator_config(&self) -> Result<OrchestratorConfig> {
        let mut config = match &self.config {
            Some(path) => OrchestratorConfig::load(Path::new(path))
                .with_context(|| format!("Failed to load config {}", path))?,
            None => OrchestratorConfig::default(),
        };
        if let Some(cache) = &self.cache {
            config.cache_root = PathBuf::from(cache);
        }
        Ok(config)
    }
}

/// Settings from a profile (or host detection) plus `-s` overrides
pub(crate) fn resolve_settings(profile: Option<&str>, overrides: &[String]) -> Result<BuildSettings> {
    let mut settings = match profile {
        Some(path) => load_profile(Path::new(path))
            .with_context(|| format!("Failed to load profile {}", path))?,
        None => BuildSettings::detect(),
    };

    for entry in overrides {
        settings
            .apply_override(entry)
            .with_context(|| format!("Invalid setting override '{}'", entry))?;
    }

    Ok(settings)
}
