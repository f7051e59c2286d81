use serde_json::{json, Value};

/// Top-level and `tool_input` fields that carry a filesystem path.
const PATH_FIELDS: &[&str] = &["file_path", "path", "notebook_path"];

/// The tool invocation received from the host on stdin.
///
/// The payload shape is host-defined, so it is kept as a raw JSON value.
/// Accessors pattern-match only the fields policies actually look at.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    value: Value,
    raw: bool,
}

impl Invocation {
    /// Parse stdin text leniently.
    ///
    /// Text that is not valid JSON (including the empty string) is wrapped as
    /// `{"raw": text}` instead of failing.
    ///
    /// # Examples
    ///
    /// ```
    /// use plugin_hook::protocol::Invocation;
    ///
    /// let parsed = Invocation::parse(r#"{"command": "ls"}"#);
    /// assert_eq!(parsed.command(), Some("ls"));
    ///
    /// let fallback = Invocation::parse("not json");
    /// assert!(fallback.is_raw());
    /// assert_eq!(fallback.value()["raw"], "not json");
    /// ```
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(value) => Invocation { value, raw: false },
            Err(_) => Invocation {
                value: json!({ "raw": text }),
                raw: true,
            },
        }
    }

    /// Wrap an already-parsed JSON value.
    pub fn from_value(value: Value) -> Self {
        Invocation { value, raw: false }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether stdin failed to parse and the `{"raw": ..}` wrapper is in use.
    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// Tool name from `tool_name`, or the shorter `tool` key.
    pub fn tool_name(&self) -> Option<&str> {
        self.field_str("tool_name").or_else(|| self.field_str("tool"))
    }

    /// Shell command from `command`, falling back to `tool_input.command`.
    pub fn command(&self) -> Option<&str> {
        self.field_str("command").or_else(|| {
            self.value
                .get("tool_input")
                .and_then(|input| input.get("command"))
                .and_then(Value::as_str)
        })
    }

    /// Filesystem paths named by the invocation, top level first, then `tool_input`.
    pub fn paths(&self) -> Vec<&str> {
        let scopes = [Some(&self.value), self.value.get("tool_input")];
        scopes
            .into_iter()
            .flatten()
            .flat_map(|scope| {
                PATH_FIELDS
                    .iter()
                    .filter_map(move |field| scope.get(*field).and_then(Value::as_str))
            })
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Every string leaf of the document, depth-first. Object keys are skipped.
    pub fn strings(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_strings(&self.value, &mut out);
        out
    }

    fn field_str(&self, field: &str) -> Option<&str> {
        self.value.get(field).and_then(Value::as_str)
    }
}

fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
