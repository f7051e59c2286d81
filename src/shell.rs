//! Program extraction from shell command strings.
//!
//! Commands are parsed into a real shell AST (brush-parser) so quoting,
//! lists, pipelines and compound commands are handled the way a shell would.

use brush_parser::ast;

/// Error returned when a command string cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ShellParseError(pub String);

/// Commands that launch another program taken from their arguments.
const WRAPPERS: &[&str] = &[
    "builtin", "command", "env", "exec", "nice", "nohup", "sudo", "time", "xargs",
];

/// Every program a command string would run, as basenames, in source order.
///
/// Wrappers are reported along with the program they launch, so
/// `sudo rm -rf /` yields `["sudo", "rm"]`.
pub(crate) fn programs(command: &str) -> Result<Vec<String>, ShellParseError> {
    if command.trim().is_empty() {
        return Ok(vec![]);
    }

    let mut parser = brush_parser::Parser::builder()
        .reader(std::io::Cursor::new(command.to_string()))
        .build();

    let program = parser
        .parse_program()
        .map_err(|e| ShellParseError(e.to_string()))?;

    let mut found = Vec::new();
    for complete_command in &program.complete_commands {
        for item in &complete_command.0 {
            walk_and_or(&item.0, &mut found)?;
        }
    }
    Ok(found)
}

/// Resolve shell quoting in a word the way the shell does before exec.
///
/// Backslash escapes and quoted segments anywhere in the word are removed,
/// so `\rm`, `r''m` and `"r"m` all become `rm`. Expansions are kept as written.
fn unquote(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut chars = word.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\n') | None => {}
                Some(next) => out.push(next),
            },
            '\'' => out.extend(chars.by_ref().take_while(|&c| c != '\'')),
            '"' => {
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' => match chars.next() {
                            Some(next @ ('$' | '`' | '"' | '\\')) => out.push(next),
                            Some('\n') => {}
                            Some(next) => {
                                out.push('\\');
                                out.push(next);
                            }
                            None => out.push('\\'),
                        },
                        other => out.push(other),
                    }
                }
            }
            // $'..' and $".." quote their contents like '..' and ".."
            '$' if matches!(chars.peek(), Some('\'' | '"')) => {}
            other => out.push(other),
        }
    }
    out
}

/// Basename of an unquoted program word.
fn basename(word: &str) -> String {
    word.rsplit('/').next().unwrap_or(word).to_string()
}

/// Options of each wrapper that take the following word as their value.
fn value_options(wrapper: &str) -> &'static [&'static str] {
    match wrapper {
        "sudo" => &["-u", "-g", "-C", "-D", "-p", "-r", "-t", "-U"],
        "env" => &["-u", "--unset", "-C", "--chdir", "-P"],
        "exec" => &["-a"],
        "nice" => &["-n", "--adjustment"],
        "xargs" => &["-I", "-n", "-P", "-d", "-L", "-s", "-E", "-a"],
        _ => &[],
    }
}

/// `env` options whose value is itself a command line.
const SPLIT_STRING_OPTIONS: &[&str] = &["-S", "--split-string"];

/// Payload of `--split-string=CMD` or `-SCMD`, when the option carries it inline.
fn inline_split_string(option: &str) -> Option<&str> {
    option
        .strip_prefix("--split-string=")
        .or_else(|| option.strip_prefix("-S").filter(|_| !option.starts_with("--")))
        .filter(|payload| !payload.is_empty())
}

/// `command -v` and `command -V` only look a program up.
fn is_lookup_only(wrapper: &str, option: &str) -> bool {
    wrapper == "command"
        && !option.starts_with("--")
        && option.chars().skip(1).any(|c| c == 'v' || c == 'V')
}

fn walk_and_or(list: &ast::AndOrList, found: &mut Vec<String>) -> Result<(), ShellParseError> {
    walk_pipeline(&list.first, found)?;
    for next in &list.additional {
        match next {
            ast::AndOr::And(pipeline) | ast::AndOr::Or(pipeline) => {
                walk_pipeline(pipeline, found)?
            }
        }
    }
    Ok(())
}

fn walk_pipeline(
    pipeline: &ast::Pipeline,
    found: &mut Vec<String>,
) -> Result<(), ShellParseError> {
    for command in &pipeline.seq {
        walk_command(command, found)?;
    }
    Ok(())
}

fn walk_command(command: &ast::Command, found: &mut Vec<String>) -> Result<(), ShellParseError> {
    match command {
        ast::Command::Simple(simple) => {
            let Some(word) = &simple.word_or_name else {
                return Ok(());
            };
            let name = basename(&unquote(&word.flatten()));
            if name.is_empty() {
                return Ok(());
            }
            let is_wrapper = WRAPPERS.contains(&name.as_str());
            found.push(name.clone());
            if is_wrapper {
                if let Some(suffix) = &simple.suffix {
                    unwrap_programs(&name, suffix, found)?;
                }
            }
            Ok(())
        }
        ast::Command::Compound(compound, _) => walk_compound(compound, found),
        ast::Command::Function(func) => walk_compound(&func.body.0, found),
        // [[ ]] runs no programs
        ast::Command::ExtendedTest(_) => Ok(()),
    }
}

/// Follow a wrapper's arguments to the program(s) it launches.
///
/// Flags, their values and `NAME=value` assignments are skipped. Nested
/// wrappers (`sudo env nohup rm`) are followed until a plain program appears.
/// The command line given to `env -S` is parsed as a command of its own.
fn unwrap_programs(
    wrapper: &str,
    suffix: &ast::CommandSuffix,
    found: &mut Vec<String>,
) -> Result<(), ShellParseError> {
    let mut current = wrapper.to_string();
    let mut skip_value = false;
    let mut split_string = false;

    for item in &suffix.0 {
        let ast::CommandPrefixOrSuffixItem::Word(word) = item else {
            continue;
        };
        let text = unquote(&word.flatten());

        if split_string {
            found.extend(programs(&text)?);
            return Ok(());
        }
        if skip_value {
            skip_value = false;
            continue;
        }
        if text.starts_with('-') {
            if current == "env" {
                if let Some(payload) = inline_split_string(&text) {
                    found.extend(programs(payload)?);
                    return Ok(());
                }
                split_string = SPLIT_STRING_OPTIONS.contains(&text.as_str());
            }
            if is_lookup_only(&current, &text) {
                return Ok(());
            }
            skip_value = value_options(&current).contains(&text.as_str());
            continue;
        }
        if text.contains('=') || text.is_empty() {
            continue;
        }

        let name = basename(&text);
        let nested = WRAPPERS.contains(&name.as_str());
        found.push(name.clone());
        if !nested {
            return Ok(());
        }
        current = name;
    }
    Ok(())
}

fn walk_compound(
    command: &ast::CompoundCommand,
    found: &mut Vec<String>,
) -> Result<(), ShellParseError> {
    match command {
        ast::CompoundCommand::BraceGroup(cmd) => walk_list(&cmd.list, found),
        ast::CompoundCommand::Subshell(cmd) => walk_list(&cmd.list, found),
        ast::CompoundCommand::ForClause(cmd) => walk_list(&cmd.body.list, found),
        ast::CompoundCommand::ArithmeticForClause(cmd) => walk_list(&cmd.body.list, found),
        ast::CompoundCommand::WhileClause(cmd) | ast::CompoundCommand::UntilClause(cmd) => {
            walk_list(&cmd.0, found)?;
            walk_list(&cmd.1.list, found)
        }
        ast::CompoundCommand::IfClause(cmd) => {
            walk_list(&cmd.condition, found)?;
            walk_list(&cmd.then, found)?;
            for clause in cmd.elses.iter().flatten() {
                if let Some(condition) = &clause.condition {
                    walk_list(condition, found)?;
                }
                walk_list(&clause.body, found)?;
            }
            Ok(())
        }
        ast::CompoundCommand::CaseClause(cmd) => {
            for case_item in &cmd.cases {
                if let Some(body) = &case_item.cmd {
                    walk_list(body, found)?;
                }
            }
            Ok(())
        }
        // (( )) runs no programs
        ast::CompoundCommand::Arithmetic(_) => Ok(()),
    }
}

fn walk_list(list: &ast::CompoundList, found: &mut Vec<String>) -> Result<(), ShellParseError> {
    for item in &list.0 {
        walk_and_or(&item.0, found)?;
    }
    Ok(())
}
