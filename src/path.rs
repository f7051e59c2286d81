use globset::Glob;

use crate::context::HookContext;

/// Error from path normalization or pattern expansion.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathError {
    /// `HOME` is empty but the path starts with `~`.
    #[error("HOME not set, cannot expand '~' in path: {0}")]
    HomeNotSet(String),
}

/// Normalize a path to a clean absolute form, without touching the filesystem.
///
/// 1. Expand a bare `~` or a `~/` prefix to the context's home dir
/// 2. Join relative paths onto the project dir (or `/` when it is empty)
/// 3. Collapse `.`, `..` and duplicate separators
/// 4. Drop any trailing `/`
pub(crate) fn normalize(raw: &str, ctx: &HookContext) -> Result<String, PathError> {
    let path = match home_relative(raw) {
        Some(_) if ctx.home_dir.is_empty() => {
            return Err(PathError::HomeNotSet(raw.to_string()));
        }
        Some(rest) => format!("{}{rest}", ctx.home_dir),
        None => raw.to_string(),
    };

    let path = if path.starts_with('/') {
        path
    } else {
        format!("{}/{path}", ctx.project_dir)
    };

    let mut components: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            other => components.push(other),
        }
    }

    if components.is_empty() {
        Ok("/".to_string())
    } else {
        Ok(format!("/{}", components.join("/")))
    }
}

/// The part after `~` when a path is `~` or starts with `~/`.
///
/// `~user` forms are not expanded.
fn home_relative(raw: &str) -> Option<&str> {
    raw.strip_prefix('~')
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Expand `~`, `<project>` and `<plugin>` in a path rule pattern.
///
/// Substituted values are glob-escaped, so a directory named `[app` or `a*`
/// only ever matches itself. Returns `None` when the pattern refers to a
/// context value that is empty; such a rule cannot match anything meaningful
/// and is skipped.
pub(crate) fn expand_pattern(pattern: &str, ctx: &HookContext) -> Option<String> {
    let mut expanded = pattern.to_string();

    if let Some(rest) = home_relative(pattern) {
        if ctx.home_dir.is_empty() {
            return None;
        }
        expanded = format!("{}{rest}", globset::escape(&ctx.home_dir));
    }

    for (placeholder, value) in [("<project>", &ctx.project_dir), ("<plugin>", &ctx.plugin_root)] {
        if expanded.contains(placeholder) {
            if value.is_empty() {
                return None;
            }
            let literal = globset::escape(value.trim_end_matches('/'));
            expanded = expanded.replace(placeholder, &literal);
        }
    }

    Some(expanded)
}

/// Check that a pattern compiles once its placeholders are filled in.
pub(crate) fn validate_pattern(pattern: &str) -> Result<(), String> {
    let sample = HookContext {
        project_dir: "/project".to_string(),
        plugin_root: "/plugin".to_string(),
        home_dir: "/home".to_string(),
    };
    let expanded = expand_pattern(pattern, &sample).unwrap_or_else(|| pattern.to_string());
    Glob::new(&expanded)
        .map(|_| ())
        .map_err(|e| format!("invalid glob pattern '{pattern}': {e}"))
}

/// Tests whether a normalized path matches an expanded glob pattern.
///
/// `**` crosses separators (globset default). Case-sensitive.
pub(crate) fn matches(path: &str, expanded_pattern: &str) -> Result<bool, String> {
    let glob = Glob::new(expanded_pattern).map_err(|e| format!("invalid glob pattern: {e}"))?;
    Ok(glob.compile_matcher().is_match(path))
}
