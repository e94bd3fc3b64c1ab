// src/cli.rs
//! CLI definitions for nbkit-recipe
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "nbkit-recipe")]
#[command(author = "nbkit Contributors")]
#[command(version)]
#[command(about = "Recipe-driven build orchestrator for CMake libraries", long_about = None)]
pub struct Cli {
    /// Local package cache (default: $NBKIT_RECIPE_HOME or ~/.nbkit-recipe)
    #[arg(long, global = true)]
    pub cache: Option<String>,

    /// Orchestrator config file (TOML)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by the commands that run a build
#[derive(Args, Debug, Clone, Default)]
pub struct BuildOptions {
    /// Recipe file or directory holding recipe.toml
    #[arg(default_value = ".")]
    pub recipe: String,

    /// Settings profile (TOML with a [settings] table)
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Override a setting, e.g. -s build_type=Debug
    #[arg(short, long = "setting", value_name = "KEY=VALUE")]
    pub settings: Vec<String>,

    /// Use an install prefix for a requirement, e.g. gtest/1.14.0=/opt/gtest
    #[arg(short, long = "requirement", value_name = "NAME/VERSION=PREFIX")]
    pub requirements: Vec<String>,

    /// Parallel build jobs (default: available CPUs)
    #[arg(short, long)]
    pub jobs: Option<u32>,

    /// Report a disabled or empty test phase as skipped instead of failing
    #[arg(long)]
    pub allow_skip_tests: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export, build, test and package a recipe into the local cache
    Create {
        #[command(flatten)]
        options: BuildOptions,

        /// Keep the build folder after a successful create
        #[arg(long)]
        keep_build: bool,

        /// Write the build log to this file
        #[arg(long)]
        log: Option<String>,
    },

    /// Configure, build and test in place without packaging
    Build {
        #[command(flatten)]
        options: BuildOptions,

        /// Write the build log to this file
        #[arg(long)]
        log: Option<String>,
    },

    /// Print the package info a recipe publishes
    Info {
        /// Recipe file or directory holding recipe.toml
        #[arg(default_value = ".")]
        recipe: String,
    },

    /// Copy a recipe and its exported sources into the local cache
    Export {
        /// Recipe file or directory holding recipe.toml
        #[arg(default_value = ".")]
        recipe: String,
    },

    /// Check a recipe for errors and warnings
    Validate {
        /// Recipe file or directory holding recipe.toml
        #[arg(default_value = ".")]
        recipe: String,
    },

    /// Settings profile commands
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Detect the settings of this machine
    Detect {
        /// Write the profile here instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Overwrite an existing output file
        #[arg(long)]
        force: bool,
    },

    /// Show the settings a profile and overrides resolve to
    Show {
        /// Settings profile (TOML with a [settings] table)
        profile: Option<String>,

        /// Override a setting, e.g. -s build_type=Debug
        #[arg(short, long = "setting", value_name = "KEY=VALUE")]
        settings: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create() {
        let cli = Cli::try_parse_from([
            "nbkit-recipe",
            "--cache",
            "/tmp/cache",
            "create",
            "recipes/nbkit",
            "-s",
            "build_type=Debug",
            "-r",
            "gtest/1.14.0=/opt/gtest",
            "--keep-build",
        ])
        .unwrap();

        assert_eq!(cli.cache.as_deref(), Some("/tmp/cache"));
        match cli.command {
            Some(Commands::Create {
                options,
                keep_build,
                log,
            }) => {
                assert_eq!(options.recipe, "recipes/nbkit");
                assert_eq!(options.settings, vec!["build_type=Debug"]);
                assert_eq!(options.requirements, vec!["gtest/1.14.0=/opt/gtest"]);
                assert!(keep_build);
                assert!(log.is_none());
            }
            _ => panic!("expected create"),
        }
    }
}
