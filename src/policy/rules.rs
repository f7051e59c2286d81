use tracing::debug;

use crate::config::rule::RuleMeta;
use crate::config::PolicyConfig;
use crate::context::HookContext;
use crate::path;
use crate::protocol::Invocation;
use crate::shell;

use super::{Policy, PolicyError, Verdict, APP_NAME};

/// Policy driven by the rules of a KDL policy file.
///
/// Rules run in a fixed order (patterns, then programs, then paths) and
/// the first one that matches blocks. Nothing matching means approve.
#[derive(Debug, Default)]
pub struct RulePolicy {
    config: PolicyConfig,
}

impl RulePolicy {
    pub fn new(config: PolicyConfig) -> Self {
        RulePolicy { config }
    }

    fn check_patterns(&self, input: &Invocation, tool: Option<&str>) -> Option<Verdict> {
        let strings = input.strings();
        self.config
            .patterns
            .iter()
            .filter(|rule| rule.meta.applies_to(tool))
            .find(|rule| strings.iter().any(|s| s.contains(rule.pattern.as_str())))
            .map(|rule| {
                debug!(pattern = %rule.pattern, line = rule.meta.line, "pattern rule matched");
                block_with(&rule.meta, || {
                    format!("{APP_NAME}: input matches blocked pattern '{}'", rule.pattern)
                })
            })
    }

    fn check_programs(
        &self,
        input: &Invocation,
        tool: Option<&str>,
    ) -> Result<Option<Verdict>, PolicyError> {
        let rules: Vec<_> = self
            .config
            .programs
            .iter()
            .filter(|rule| rule.meta.applies_to(tool))
            .collect();
        let Some(command) = input.command() else {
            return Ok(None);
        };
        if rules.is_empty() {
            return Ok(None);
        }

        let programs = shell::programs(command)?;
        debug!(?programs, "programs extracted from command");
        for program in &programs {
            if let Some(rule) = rules.iter().find(|rule| rule.program == *program) {
                return Ok(Some(block_with(&rule.meta, || {
                    format!("{APP_NAME}: '{program}' is blocked")
                })));
            }
        }
        Ok(None)
    }

    fn check_paths(
        &self,
        input: &Invocation,
        tool: Option<&str>,
        ctx: &HookContext,
    ) -> Result<Option<Verdict>, PolicyError> {
        let rules: Vec<_> = self
            .config
            .paths
            .iter()
            .filter(|rule| rule.meta.applies_to(tool))
            .filter_map(|rule| match path::expand_pattern(&rule.pattern, ctx) {
                Some(expanded) => Some((rule, expanded)),
                None => {
                    debug!(pattern = %rule.pattern, "path rule skipped, context value is empty");
                    None
                }
            })
            .collect();
        if rules.is_empty() {
            return Ok(None);
        }

        for raw in input.paths() {
            let normalized = path::normalize(raw, ctx)?;
            for (rule, expanded) in &rules {
                if path::matches(&normalized, expanded).map_err(PolicyError::Glob)? {
                    return Ok(Some(block_with(&rule.meta, || {
                        format!(
                            "{APP_NAME}: '{raw}' is blocked by path rule '{}'",
                            rule.pattern
                        )
                    })));
                }
            }
        }
        Ok(None)
    }
}

impl Policy for RulePolicy {
    fn evaluate(&self, input: &Invocation, ctx: &HookContext) -> Result<Verdict, PolicyError> {
        let tool = input.tool_name();

        if let Some(verdict) = self.check_patterns(input, tool) {
            return Ok(verdict);
        }
        if let Some(verdict) = self.check_programs(input, tool)? {
            return Ok(verdict);
        }
        if let Some(verdict) = self.check_paths(input, tool, ctx)? {
            return Ok(verdict);
        }

        Ok(Verdict::Approve {
            message: self.config.message.clone(),
        })
    }
}

/// Block with the rule's own reason, or a generated one.
fn block_with(meta: &RuleMeta, default_reason: impl FnOnce() -> String) -> Verdict {
    Verdict::block(meta.reason.clone().unwrap_or_else(default_reason))
}
