pub mod config;
pub mod context;
pub mod logging;
pub mod policy;
pub mod protocol;

pub(crate) mod cli;
pub(crate) mod path;
pub(crate) mod shell;

use std::path::Path;
use std::process::ExitCode;

/// Run the hook subcommand: read JSON from stdin, decide, write JSON to stdout.
///
/// This bridges the binary crate (`main.rs`) to the library without exposing
/// `cli` internals. Plugin authors embedding their own [`policy::Policy`]
/// should call [`policy::decide`] directly.
pub fn run_hook(config_path: Option<&Path>) -> ExitCode {
    cli::hook::run(config_path)
}

/// Run the check subcommand: validate a policy file.
pub fn run_check(config_path: &Path) -> ExitCode {
    cli::check::run(config_path)
}
