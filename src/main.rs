use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Template tool-use hook for Claude Code plugins.
#[derive(Debug, Parser)]
#[command(name = "plugin-hook", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run as a tool-use hook (reads stdin, writes stdout, exits 0 or 2)
    Hook {
        /// Path to a KDL policy file; relative paths resolve under CLAUDE_PLUGIN_ROOT
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate a KDL policy file
    Check {
        /// Path to the KDL policy file
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    plugin_hook::logging::init();

    // clap exits 2 on usage errors, which the host would read as a block
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(plugin_hook::policy::FATAL_EXIT)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match cli.command {
        Commands::Hook { config } => plugin_hook::run_hook(config.as_deref()),
        Commands::Check { config } => plugin_hook::run_check(&config),
    }
}
