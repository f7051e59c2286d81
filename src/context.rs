//! Ambient context the host injects through environment variables.

pub const PROJECT_DIR_VAR: &str = "CLAUDE_PROJECT_DIR";
pub const PLUGIN_ROOT_VAR: &str = "CLAUDE_PLUGIN_ROOT";
const HOME_VAR: &str = "HOME";

/// Environment context resolved once at process start.
///
/// Every field defaults to an empty string when its variable is unset
/// (or not valid UTF-8). Policies see the environment only through this struct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookContext {
    /// Project root, from `CLAUDE_PROJECT_DIR`.
    pub project_dir: String,
    /// Plugin installation root, from `CLAUDE_PLUGIN_ROOT`.
    pub plugin_root: String,
    /// Home directory, from `HOME`. Only used to expand `~` in path rules.
    pub home_dir: String,
}

impl HookContext {
    /// Resolve the context from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve the context through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).unwrap_or_default();
        HookContext {
            project_dir: get(PROJECT_DIR_VAR),
            plugin_root: get(PLUGIN_ROOT_VAR),
            home_dir: get(HOME_VAR),
        }
    }
}
