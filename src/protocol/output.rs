use serde::Serialize;

use crate::policy::Verdict;

/// The decision document written to stdout.
///
/// The host acts on the exit code; this body is supplementary context.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HookOutput {
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
}

/// The decision: approve or block.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Block,
}

impl Decision {
    /// Lowercase string, as serialized (`"approve"`, `"block"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Block => "block",
        }
    }
}

impl HookOutput {
    pub fn approve() -> Self {
        HookOutput {
            decision: Decision::Approve,
            system_message: None,
        }
    }

    pub fn block(message: impl Into<String>) -> Self {
        HookOutput {
            decision: Decision::Block,
            system_message: Some(message.into()),
        }
    }
}

impl From<&Verdict> for HookOutput {
    fn from(verdict: &Verdict) -> Self {
        match verdict {
            Verdict::Approve { message } => HookOutput {
                decision: Decision::Approve,
                system_message: message.clone(),
            },
            Verdict::Block { reason } => HookOutput::block(reason.clone()),
        }
    }
}
