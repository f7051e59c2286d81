mod rules;

pub use rules::RulePolicy;

use tracing::warn;

use crate::config::ErrorMode;
use crate::context::HookContext;
use crate::path::PathError;
use crate::protocol::Invocation;
use crate::shell::ShellParseError;

pub(crate) const APP_NAME: &str = "plugin-hook";

/// Exit code the host reads as "approve".
pub const APPROVE_EXIT: u8 = 0;
/// Exit code the host reads as "block".
pub const BLOCK_EXIT: u8 = 2;
/// Exit code for failures that produce no decision at all.
pub const FATAL_EXIT: u8 = 1;

/// Outcome of evaluating a policy.
///
/// Policies only ever produce a verdict; turning it into an exit code and a
/// JSON body happens once, at the process boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Approve { message: Option<String> },
    Block { reason: String },
}

impl Verdict {
    pub fn approve() -> Self {
        Verdict::Approve { message: None }
    }

    pub fn block(reason: impl Into<String>) -> Self {
        Verdict::Block {
            reason: reason.into(),
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Verdict::Block { .. })
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Verdict::Approve { .. } => APPROVE_EXIT,
            Verdict::Block { .. } => BLOCK_EXIT,
        }
    }
}

/// Errors raised while a policy evaluates an invocation.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("failed to parse command: {0}")]
    Command(#[from] ShellParseError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("{0}")]
    Glob(String),
}

/// The approve/block predicate a hook runs.
///
/// Plugin authors implement this to add their own checks; the relay takes
/// care of stdin, the environment, the JSON body and the exit code.
pub trait Policy {
    fn evaluate(&self, input: &Invocation, ctx: &HookContext) -> Result<Verdict, PolicyError>;
}

/// Policy that approves everything, optionally with a reminder message.
#[derive(Debug, Default)]
pub struct ApproveAll {
    pub message: Option<String>,
}

impl Policy for ApproveAll {
    fn evaluate(&self, _input: &Invocation, _ctx: &HookContext) -> Result<Verdict, PolicyError> {
        Ok(Verdict::Approve {
            message: self.message.clone(),
        })
    }
}

/// Any closure with the right shape is a policy.
impl<F> Policy for F
where
    F: Fn(&Invocation, &HookContext) -> Result<Verdict, PolicyError>,
{
    fn evaluate(&self, input: &Invocation, ctx: &HookContext) -> Result<Verdict, PolicyError> {
        self(input, ctx)
    }
}

/// Evaluate a policy, resolving evaluation errors according to `on_error`.
///
/// # Examples
///
/// ```
/// use plugin_hook::config::ErrorMode;
/// use plugin_hook::context::HookContext;
/// use plugin_hook::policy::{decide, ApproveAll, Verdict};
/// use plugin_hook::protocol::Invocation;
///
/// let input = Invocation::parse(r#"{"tool":"Bash","command":"ls -la"}"#);
/// let verdict = decide(&ApproveAll::default(), &input, &HookContext::default(), ErrorMode::Block);
/// assert_eq!(verdict, Verdict::approve());
/// assert_eq!(verdict.exit_code(), 0);
/// ```
pub fn decide(
    policy: &dyn Policy,
    input: &Invocation,
    ctx: &HookContext,
    on_error: ErrorMode,
) -> Verdict {
    match policy.evaluate(input, ctx) {
        Ok(verdict) => verdict,
        Err(e) => {
            warn!(error = %e, ?on_error, "policy evaluation failed");
            let message = format!("{APP_NAME}: policy evaluation failed: {e}");
            match on_error {
                ErrorMode::Block => Verdict::block(message),
                ErrorMode::Approve => Verdict::Approve {
                    message: Some(message),
                },
            }
        }
    }
}
