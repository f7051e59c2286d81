/// Fields shared by every block rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleMeta {
    /// Custom block message (`reason="..."`); a generated one is used otherwise.
    pub reason: Option<String>,
    /// Restrict the rule to one tool (`tool="Bash"`); `None` applies to all.
    pub tool: Option<String>,
    /// 1-based line number in the config file.
    pub line: usize,
}

impl RuleMeta {
    /// Whether the rule applies to an invocation of `tool_name`.
    ///
    /// An unscoped rule applies everywhere; a scoped rule needs a matching name.
    pub fn applies_to(&self, tool_name: Option<&str>) -> bool {
        match &self.tool {
            None => true,
            Some(tool) => tool_name == Some(tool.as_str()),
        }
    }
}

/// `block "<substring>"`: blocks when any string in the input contains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRule {
    pub pattern: String,
    pub meta: RuleMeta,
}

/// `block-program "<name>"`: blocks when the shell command runs this program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramRule {
    /// Basename only; `/usr/bin/rm` in config is stored as `rm`.
    pub program: String,
    pub meta: RuleMeta,
}

/// `block-path "<glob>"`: blocks when a path in the input matches.
///
/// The pattern is stored unexpanded; `~`, `<project>` and `<plugin>` are
/// filled in from the hook context at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRule {
    pub pattern: String,
    pub meta: RuleMeta,
}

/// Reduce a program string to its basename.
pub(crate) fn program_basename(raw: &str) -> &str {
    raw.rsplit('/').next().unwrap_or(raw)
}
