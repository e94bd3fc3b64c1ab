// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;

mod cli;
mod commands;

use cli::{Cli, Commands, ProfileCommands};
use commands::GlobalOptions;

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let globals = GlobalOptions {
        cache: cli.cache.clone(),
        config: cli.config.clone(),
    };

    match cli.command {
        Some(Commands::Create {
            options,
            keep_build,
            log,
        }) => commands::cmd_create(&globals, &options, keep_build, log.as_deref()),

        Some(Commands::Build { options, log }) => {
            commands::cmd_build(&globals, &options, log.as_deref())
        }

        Some(Commands::Info { recipe }) => commands::cmd_info(&recipe),

        Some(Commands::Export { recipe }) => commands::cmd_export(&globals, &recipe),

        Some(Commands::Validate { recipe }) => commands::cmd_validate(&recipe),

        Some(Commands::Profile(ProfileCommands::Detect { output, force })) => {
            commands::cmd_profile_detect(output.as_deref(), force)
        }

        Some(Commands::Profile(ProfileCommands::Show { profile, settings })) => {
            commands::cmd_profile_show(profile.as_deref(), &settings)
        }

        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "nbkit-recipe", &mut std::io::stdout());
            Ok(())
        }

        None => {
            println!("nbkit-recipe v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'nbkit-recipe --help' for usage information");
            Ok(())
        }
    }
}
