// src/commands/profile.rs

//! Settings profile commands

use super::resolve_settings;
use anyhow::{Context, Result, bail};
use nbkit_recipe::settings::{BuildSettings, Profile};
use std::fs;
use std::path::Path;

/// Detect host settings and print or save them as a profile
pub fn cmd_profile_detect(output: Option<&str>, force: bool) -> Result<()> {
    let settings = BuildSettings::detect();
    let content = Profile::from_settings(&settings).to_toml()?;

    match output {
        Some(path) => {
            let path = Path::new(path);
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(path, content)
                .with_context(|| format!("Failed to write profile {}", path.display()))?;
            println!("Detected profile written to {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

/// Print the settings a profile and overrides resolve to
pub fn cmd_profile_show(profile: Option<&str>, overrides: &[String]) -> Result<()> {
    let settings = resolve_settings(profile, overrides)?;
    print!("{}", Profile::from_settings(&settings).to_toml()?);
    Ok(())
}
