use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::{debug, error, info};

use crate::config::{Config, ErrorMode};
use crate::context::HookContext;
use crate::policy::{self, ApproveAll, RulePolicy, Verdict, APP_NAME, FATAL_EXIT};
use crate::protocol::{HookOutput, Invocation};

/// Failures that abort the hook without a decision.
#[derive(Debug, thiserror::Error)]
enum HookError {
    #[error("failed to read stdin: {0}")]
    ReadInput(#[source] std::io::Error),
    #[error("failed to serialize decision: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write stdout: {0}")]
    WriteOutput(#[source] std::io::Error),
}

/// Execute the hook subcommand: read JSON from stdin, decide, write JSON to stdout.
///
/// Without a config every invocation is approved. A config that fails to load
/// blocks, since approving with an unknown policy would be silent fail-open.
///
/// Exit code 0 approves and 2 blocks. Exit code 1 means stdin could not be
/// read or stdout could not be written.
pub fn run(config_path: Option<&Path>) -> ExitCode {
    let ctx = HookContext::from_env();
    debug!(
        project_dir = %ctx.project_dir,
        plugin_root = %ctx.plugin_root,
        "hook context resolved"
    );

    match execute(config_path, &ctx, &mut std::io::stdin(), &mut std::io::stdout()) {
        Ok(verdict) => ExitCode::from(verdict.exit_code()),
        Err(e) => {
            error!(error = %e, "hook aborted");
            ExitCode::from(FATAL_EXIT)
        }
    }
}

fn execute(
    config_path: Option<&Path>,
    ctx: &HookContext,
    stdin: &mut impl Read,
    stdout: &mut impl Write,
) -> Result<Verdict, HookError> {
    let mut bytes = Vec::new();
    stdin.read_to_end(&mut bytes).map_err(HookError::ReadInput)?;
    let text = String::from_utf8_lossy(&bytes);

    let input = Invocation::parse(&text);
    debug!(bytes = bytes.len(), raw_fallback = input.is_raw(), "input parsed");

    let verdict = match config_path {
        None => policy::decide(&ApproveAll::default(), &input, ctx, ErrorMode::Block),
        Some(path) => {
            let path = resolve_config_path(path, ctx);
            match Config::load(&path) {
                Ok(config) => {
                    let on_error = config.policy.on_error;
                    let rules = RulePolicy::new(config.policy);
                    policy::decide(&rules, &input, ctx, on_error)
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "config load failed");
                    Verdict::block(format!("{APP_NAME}: config error: {e}"))
                }
            }
        }
    };

    let output = HookOutput::from(&verdict);
    info!(
        decision = output.decision.as_str(),
        exit_code = verdict.exit_code(),
        "decision made"
    );

    let json = serde_json::to_string(&output)?;
    writeln!(stdout, "{json}").map_err(HookError::WriteOutput)?;
    stdout.flush().map_err(HookError::WriteOutput)?;
    Ok(verdict)
}

/// Relative config paths are looked up under the plugin root, when known.
fn resolve_config_path(path: &Path, ctx: &HookContext) -> PathBuf {
    if path.is_relative() && !ctx.plugin_root.is_empty() {
        Path::new(&ctx.plugin_root).join(path)
    } else {
        path.to_path_buf()
    }
}
