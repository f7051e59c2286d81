mod document;
pub mod rule;

use std::path::{Path, PathBuf};

use document::{ConfigDocument, ParseNode};
use rule::{program_basename, PathRule, PatternRule, ProgramRule, RuleMeta};

/// Name of the top-level KDL block holding the policy.
const POLICY_SECTION: &str = "policy";

/// Top-level configuration loaded from a KDL policy file.
#[derive(Debug, Default)]
pub struct Config {
    pub policy: PolicyConfig,
}

/// Rules and settings from the `policy { … }` block.
#[derive(Debug, Default)]
pub struct PolicyConfig {
    /// `systemMessage` attached to approvals.
    pub message: Option<String>,
    pub on_error: ErrorMode,
    pub patterns: Vec<PatternRule>,
    pub programs: Vec<ProgramRule>,
    pub paths: Vec<PathRule>,
}

/// What to decide when the policy itself fails to evaluate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorMode {
    /// Fail closed.
    #[default]
    Block,
    /// Fail open, with a `systemMessage` describing the failure.
    Approve,
}

/// Errors that can occur when loading or parsing a config file.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    #[diagnostic(
        code(plugin_hook::config::not_found),
        help("pass an existing KDL policy file with --config")
    )]
    NotFound(PathBuf),
    #[error("failed to read config: {0}")]
    #[diagnostic(code(plugin_hook::config::read))]
    ReadError(#[from] std::io::Error),
    #[error("invalid KDL syntax: {0}")]
    #[diagnostic(code(plugin_hook::config::syntax))]
    ParseError(String),
    #[error("invalid config: {0}")]
    #[diagnostic(
        code(plugin_hook::config::invalid),
        help("supported policy nodes: message, on-error, block, block-program, block-path")
    )]
    ValidationError(String),
}

impl Config {
    /// Load a config from a KDL file at the given path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::ReadError(e)
            }
        })?;
        Self::parse(&content)
    }

    /// Parse a KDL string into a Config.
    ///
    /// A document without a `policy` block yields an empty policy. Repeated
    /// `policy` blocks are read as one, in document order.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let doc = ConfigDocument::parse(content)?;
        let mut nodes = Vec::new();
        for section in doc.sections(POLICY_SECTION) {
            if section.argument_count() > 0 || !section.property_names().is_empty() {
                return Err(invalid(section.line(), "'policy' takes no arguments or properties"));
            }
            match section.children() {
                Some(children) => nodes.extend(children),
                None => return Err(invalid(section.line(), "'policy' needs a { … } block")),
            }
        }
        let policy = PolicyConfig::from_nodes(nodes)?;
        Ok(Config { policy })
    }
}

impl PolicyConfig {
    fn from_nodes(nodes: Vec<ParseNode<'_>>) -> Result<Self, ConfigError> {
        let mut policy = PolicyConfig::default();
        let mut seen_message = false;
        let mut seen_on_error = false;

        for node in nodes {
            let line = node.line();
            if node.has_children() {
                return Err(invalid(line, format!("'{}' does not take a children block", node.name())));
            }

            match node.name() {
                "message" => {
                    check_properties(&node, &[])?;
                    if seen_message {
                        return Err(invalid(line, "duplicate 'message' node"));
                    }
                    seen_message = true;
                    policy.message = Some(single_argument(&node)?.to_string());
                }
                "on-error" => {
                    check_properties(&node, &[])?;
                    if seen_on_error {
                        return Err(invalid(line, "duplicate 'on-error' node"));
                    }
                    seen_on_error = true;
                    policy.on_error = match single_argument(&node)? {
                        "block" => ErrorMode::Block,
                        "approve" => ErrorMode::Approve,
                        other => {
                            return Err(invalid(
                                line,
                                format!("on-error must be \"block\" or \"approve\", got \"{other}\""),
                            ))
                        }
                    };
                }
                "block" => {
                    let meta = rule_meta(&node)?;
                    for value in rule_arguments(&node)? {
                        policy.patterns.push(PatternRule {
                            pattern: value.to_string(),
                            meta: meta.clone(),
                        });
                    }
                }
                "block-program" => {
                    let meta = rule_meta(&node)?;
                    for value in rule_arguments(&node)? {
                        let program = program_basename(value.trim());
                        if program.is_empty() {
                            return Err(invalid(line, format!("'{value}' is not a program name")));
                        }
                        policy.programs.push(ProgramRule {
                            program: program.to_string(),
                            meta: meta.clone(),
                        });
                    }
                }
                "block-path" => {
                    let meta = rule_meta(&node)?;
                    for value in rule_arguments(&node)? {
                        crate::path::validate_pattern(value).map_err(|msg| invalid(line, msg))?;
                        policy.paths.push(PathRule {
                            pattern: value.to_string(),
                            meta: meta.clone(),
                        });
                    }
                }
                other => return Err(invalid(line, format!("unknown policy node '{other}'"))),
            }
        }
        Ok(policy)
    }

    /// Total number of block rules of all kinds.
    pub fn rule_count(&self) -> usize {
        self.patterns.len() + self.programs.len() + self.paths.len()
    }
}

fn invalid(line: usize, msg: impl std::fmt::Display) -> ConfigError {
    ConfigError::ValidationError(format!("line {line}: {msg}"))
}

/// Exactly one string argument, as used by `message` and `on-error`.
fn single_argument<'a>(node: &ParseNode<'a>) -> Result<&'a str, ConfigError> {
    let args = node.arguments();
    match (args.as_slice(), node.argument_count()) {
        ([value], 1) => Ok(*value),
        _ => Err(invalid(
            node.line(),
            format!("'{}' takes exactly one string argument", node.name()),
        )),
    }
}

/// One or more non-empty string arguments, as used by the `block*` nodes.
fn rule_arguments<'a>(node: &ParseNode<'a>) -> Result<Vec<&'a str>, ConfigError> {
    let args = node.arguments();
    if args.is_empty() || args.len() != node.argument_count() {
        return Err(invalid(
            node.line(),
            format!("'{}' needs one or more string arguments", node.name()),
        ));
    }
    if args.iter().any(|a| a.is_empty()) {
        return Err(invalid(node.line(), format!("'{}' has an empty pattern", node.name())));
    }
    Ok(args)
}

fn rule_meta(node: &ParseNode<'_>) -> Result<RuleMeta, ConfigError> {
    check_properties(node, &["reason", "tool"])?;
    Ok(RuleMeta {
        reason: node.property("reason").map(String::from),
        tool: node.property("tool").map(String::from),
        line: node.line(),
    })
}

fn check_properties(node: &ParseNode<'_>, allowed: &[&str]) -> Result<(), ConfigError> {
    match node.property_names().into_iter().find(|p| !allowed.contains(p)) {
        Some(unknown) => Err(invalid(
            node.line(),
            format!("unknown property '{unknown}' on '{}'", node.name()),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn validation_message(content: &str) -> String {
        match Config::parse(content) {
            Err(ConfigError::ValidationError(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    // --- KDL Parsing Tests ---

    #[test]
    fn parse_full_policy() {
        let config = Config::parse(
            r#"
            policy {
                message "Reminder: Check your code for security issues"
                on-error "approve"
                block "rm -rf" reason="Blocking potentially dangerous rm -rf command"
                block-program "shutdown" "/sbin/mkfs" tool="Bash"
                block-path "~/.ssh/**" "<project>/.env"
            }
            "#,
        )
        .unwrap();

        let policy = config.policy;
        assert_eq!(
            policy.message.as_deref(),
            Some("Reminder: Check your code for security issues")
        );
        assert_eq!(policy.on_error, ErrorMode::Approve);
        assert_eq!(policy.patterns.len(), 1);
        assert_eq!(policy.patterns[0].pattern, "rm -rf");
        assert_eq!(
            policy.patterns[0].meta.reason.as_deref(),
            Some("Blocking potentially dangerous rm -rf command")
        );
        assert!(policy.patterns[0].meta.line > 1);
        let programs: Vec<&str> = policy.programs.iter().map(|r| r.program.as_str()).collect();
        assert_eq!(programs, vec!["shutdown", "mkfs"]);
        assert_eq!(policy.programs[1].meta.tool.as_deref(), Some("Bash"));
        let paths: Vec<&str> = policy.paths.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(paths, vec!["~/.ssh/**", "<project>/.env"]);
        assert_eq!(policy.rule_count(), 5);
    }

    #[test]
    fn parse_empty_file_is_empty_policy() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.policy.rule_count(), 0);
        assert_eq!(config.policy.message, None);
        assert_eq!(config.policy.on_error, ErrorMode::Block);
    }

    #[test]
    fn other_top_level_nodes_are_ignored() {
        let config = Config::parse(r#"metadata { author "me" }"#).unwrap();
        assert_eq!(config.policy.rule_count(), 0);
    }

    #[test]
    fn repeated_block_nodes_merge_in_order() {
        let config = Config::parse(
            r#"
            policy {
                block "rm -rf"
                block "DROP TABLE" "mkfs"
            }
            "#,
        )
        .unwrap();
        let patterns: Vec<&str> = config
            .policy
            .patterns
            .iter()
            .map(|r| r.pattern.as_str())
            .collect();
        assert_eq!(patterns, vec!["rm -rf", "DROP TABLE", "mkfs"]);
    }

    #[test]
    fn repeated_policy_blocks_merge_in_order() {
        let config = Config::parse(
            r#"
            policy { message "hi"; block "rm -rf" }
            policy { block "DROP TABLE"; on-error "approve" }
            "#,
        )
        .unwrap();
        let patterns: Vec<&str> = config
            .policy
            .patterns
            .iter()
            .map(|r| r.pattern.as_str())
            .collect();
        assert_eq!(patterns, vec!["rm -rf", "DROP TABLE"]);
        assert_eq!(config.policy.message.as_deref(), Some("hi"));
        assert_eq!(config.policy.on_error, ErrorMode::Approve);
    }

    #[test]
    fn duplicate_message_across_policy_blocks_is_rejected() {
        let msg = validation_message("policy { message \"a\" }\npolicy { message \"b\" }");
        assert!(msg.contains("duplicate 'message' node"), "{msg}");
    }

    #[test]
    fn policy_without_children_is_rejected() {
        let msg = validation_message(r#"policy "rm -rf""#);
        assert!(msg.starts_with("line 1:"), "{msg}");
        assert!(msg.contains("'policy' takes no arguments"), "{msg}");

        let msg = validation_message("policy");
        assert!(msg.contains("'policy' needs a { … } block"), "{msg}");
    }

    #[test]
    fn invalid_kdl_returns_parse_error() {
        let result = Config::parse("this is { not valid { kdl");
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    // --- Validation Tests ---

    #[test]
    fn block_without_argument_is_rejected() {
        let msg = validation_message("policy {\n    block\n}");
        assert!(msg.starts_with("line "), "{msg}");
        assert!(msg.contains("'block' needs one or more string arguments"), "{msg}");
    }

    #[test]
    fn block_with_non_string_argument_is_rejected() {
        let msg = validation_message("policy { block 42 }");
        assert!(msg.contains("needs one or more string arguments"), "{msg}");
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let msg = validation_message(r#"policy { block "" }"#);
        assert!(msg.contains("empty pattern"), "{msg}");
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let msg = validation_message(r#"policy { block-path "<project>/[oops" }"#);
        assert!(msg.contains("invalid glob pattern"), "{msg}");
    }

    #[test]
    fn duplicate_message_is_rejected() {
        let msg = validation_message("policy {\n    message \"a\"\n    message \"b\"\n}");
        assert!(msg.contains("duplicate 'message' node"), "{msg}");
    }

    #[test]
    fn unknown_on_error_value_is_rejected() {
        let msg = validation_message(r#"policy { on-error "ignore" }"#);
        assert!(msg.contains("on-error must be"), "{msg}");
    }

    #[test]
    fn unknown_node_is_rejected() {
        let msg = validation_message(r#"policy { allow "git" }"#);
        assert!(msg.contains("unknown policy node 'allow'"), "{msg}");
    }

    #[test]
    fn unknown_property_is_rejected() {
        let msg = validation_message(r#"policy { block "x" severity="high" }"#);
        assert!(msg.contains("unknown property 'severity'"), "{msg}");
    }

    #[test]
    fn children_block_is_rejected() {
        let msg = validation_message(r#"policy { block "x" { tool "Bash" } }"#);
        assert!(msg.contains("does not take a children block"), "{msg}");
    }

    #[test]
    fn slash_only_program_is_rejected() {
        let msg = validation_message(r#"policy { block-program "/usr/bin/" }"#);
        assert!(msg.contains("is not a program name"), "{msg}");
    }

    // --- File Loading Tests ---

    #[test]
    fn load_nonexistent_file_returns_not_found() {
        let result = Config::load(Path::new("/tmp/does-not-exist-plugin-hook.kdl"));
        assert!(matches!(result.unwrap_err(), ConfigError::NotFound(_)));
    }

    #[test]
    fn load_valid_file_from_disk() {
        let mut tmpfile = NamedTempFile::new().unwrap();
        writeln!(
            tmpfile,
            r#"policy {{
    block "rm -rf"
    block-program "shutdown"
}}"#
        )
        .unwrap();

        let config = Config::load(tmpfile.path()).unwrap();
        assert_eq!(config.policy.patterns[0].pattern, "rm -rf");
        assert_eq!(config.policy.programs[0].program, "shutdown");
    }

    #[test]
    fn load_file_with_invalid_kdl_returns_parse_error() {
        let mut tmpfile = NamedTempFile::new().unwrap();
        writeln!(tmpfile, "invalid {{ kdl {{ syntax").unwrap();

        let result = Config::load(tmpfile.path());
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }
}
