// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: recipe file or directory
fn recipe_arg() -> Arg {
    Arg::new("recipe")
        .default_value(".")
        .help("Recipe file or directory holding recipe.toml")
}

/// Arguments shared by create and build
fn build_args(cmd: Command) -> Command {
    cmd.arg(recipe_arg())
        .arg(
            Arg::new("profile")
                .short('p')
                .long("profile")
                .help("Settings profile (TOML with a [settings] table)"),
        )
        .arg(
            Arg::new("setting")
                .short('s')
                .long("setting")
                .value_name("KEY=VALUE")
                .action(ArgAction::Append)
                .help("Override a setting, e.g. -s build_type=Debug"),
        )
        .arg(
            Arg::new("requirement")
                .short('r')
                .long("requirement")
                .value_name("NAME/VERSION=PREFIX")
                .action(ArgAction::Append)
                .help("Use an install prefix for a requirement"),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Parallel build jobs (default: available CPUs)"),
        )
        .arg(
            Arg::new("allow_skip_tests")
                .long("allow-skip-tests")
                .action(ArgAction::SetTrue)
                .help("Report a disabled or empty test phase as skipped instead of failing"),
        )
        .arg(Arg::new("log").long("log").help("Write the build log to this file"))
}

fn build_cli() -> Command {
    Command::new("nbkit-recipe")
        .version(env!("CARGO_PKG_VERSION"))
        .author("nbkit Contributors")
        .about("Recipe-driven build orchestrator for CMake libraries")
        .subcommand_required(false)
        .arg(
            Arg::new("cache")
                .long("cache")
                .global(true)
                .help("Local package cache (default: $NBKIT_RECIPE_HOME or ~/.nbkit-recipe)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("Orchestrator config file (TOML)"),
        )
        .subcommand(
            build_args(
                Command::new("create")
                    .about("Export, build, test and package a recipe into the local cache"),
            )
            .arg(
                Arg::new("keep_build")
                    .long("keep-build")
                    .action(ArgAction::SetTrue)
                    .help("Keep the build folder after a successful create"),
            ),
        )
        .subcommand(build_args(
            Command::new("build").about("Configure, build and test in place without packaging"),
        ))
        .subcommand(
            Command::new("info")
                .about("Print the package info a recipe publishes")
                .arg(recipe_arg()),
        )
        .subcommand(
            Command::new("export")
                .about("Copy a recipe and its exported sources into the local cache")
                .arg(recipe_arg()),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a recipe for errors and warnings")
                .arg(recipe_arg()),
        )
        .subcommand(
            Command::new("profile")
                .about("Settings profile commands")
                .subcommand(
                    Command::new("detect")
                        .about("Detect the settings of this machine")
                        .arg(Arg::new("output").short('o').long("output").help("Write the profile here"))
                        .arg(
                            Arg::new("force")
                                .long("force")
                                .action(ArgAction::SetTrue)
                                .help("Overwrite an existing output file"),
                        ),
                )
                .subcommand(
                    Command::new("show")
                        .about("Show the settings a profile and overrides resolve to")
                        .arg(Arg::new("profile").help("Settings profile"))
                        .arg(
                            Arg::new("setting")
                                .short('s')
                                .long("setting")
                                .action(ArgAction::Append)
                                .help("Override a setting"),
                        ),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell", "elvish"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("nbkit-recipe.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
