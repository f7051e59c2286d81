use std::path::Path;
use std::process::ExitCode;

use crate::config::{Config, ErrorMode};

/// Execute the check subcommand: validate a policy file and summarize it.
///
/// Problems are rendered as a miette diagnostic on stderr.
pub fn run(config_path: &Path) -> ExitCode {
    match check(config_path) {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::FAILURE
        }
    }
}

fn check(config_path: &Path) -> miette::Result<String> {
    let config = Config::load(config_path)?;
    Ok(summarize(config_path, &config))
}

fn summarize(config_path: &Path, config: &Config) -> String {
    let policy = &config.policy;
    let on_error = match policy.on_error {
        ErrorMode::Block => "block",
        ErrorMode::Approve => "approve",
    };
    format!(
        "{}: ok ({} rule(s): {} pattern, {} program, {} path; on-error {on_error})",
        config_path.display(),
        policy.rule_count(),
        policy.patterns.len(),
        policy.programs.len(),
        policy.paths.len(),
    )
}
