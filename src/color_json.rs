//! Purpose: Render pretty JSON with optional ANSI colorization for CLI output.
//! Exports: colorize_json.
//! Role: Small, pure formatter used by CLI emission paths.
//! Invariants: When color is disabled, output equals serde_json::to_string_pretty.
//! Invariants: ANSI escapes appear only when explicitly enabled.
use serde_json::Value;

// Conservative 8/16-color palette for broad terminal compatibility.
#[derive(Copy, Clone)]
enum Role {
    Key,
    Str,
    Num,
    Literal,
    Punct,
}

impl Role {
    fn code(self) -> &'static str {
        match self {
            Role::Key => "36",
            Role::Str => "32",
            Role::Num => "33",
            Role::Literal => "35",
            Role::Punct => "39",
        }
    }
}

struct Painter {
    color: bool,
    out: String,
}

pub fn colorize_json(value: &Value, use_color: bool) -> String {
    let mut painter = Painter {
        color: use_color,
        out: String::new(),
    };
    painter.value(value, 0);
    painter.out
}

impl Painter {
    fn value(&mut self, value: &Value, depth: usize) {
        match value {
            Value::Null => self.paint(Role::Literal, "null"),
            Value::Bool(flag) => self.paint(Role::Literal, if *flag { "true" } else { "false" }),
            Value::Number(number) => self.paint(Role::Num, &number.to_string()),
            Value::String(text) => {
                let encoded =
                    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string());
                self.paint(Role::Str, &encoded);
            }
            Value::Array(items) => self.array(items, depth),
            Value::Object(map) => self.object(map, depth),
        }
    }

    fn array(&mut self, items: &[Value], depth: usize) {
        if items.is_empty() {
            self.paint(Role::Punct, "[]");
            return;
        }
        self.paint(Role::Punct, "[");
        self.out.push('\n');
        for (idx, item) in items.iter().enumerate() {
            self.indent(depth + 1);
            self.value(item, depth + 1);
            if idx + 1 < items.len() {
                self.paint(Role::Punct, ",");
            }
            self.out.push('\n');
        }
        self.indent(depth);
        self.paint(Role::Punct, "]");
    }

    fn object(&mut self, map: &serde_json::Map<String, Value>, depth: usize) {
        if map.is_empty() {
            self.paint(Role::Punct, "{}");
            return;
        }
        self.paint(Role::Punct, "{");
        self.out.push('\n');
        let len = map.len();
        for (idx, (key, value)) in map.iter().enumerate() {
            self.indent(depth + 1);
            let encoded = serde_json::to_string(key).unwrap_or_else(|_| "\"\"".to_string());
            self.paint(Role::Key, &encoded);
            self.paint(Role::Punct, ":");
            self.out.push(' ');
            self.value(value, depth + 1);
            if idx + 1 < len {
                self.paint(Role::Punct, ",");
            }
            self.out.push('\n');
        }
        self.indent(depth);
        self.paint(Role::Punct, "}");
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
    }

    fn paint(&mut self, role: Role, text: &str) {
        if !self.color {
            self.out.push_str(text);
            return;
        }
        self.out.push_str("\u{1b}[");
        self.out.push_str(role.code());
        self.out.push('m');
        self.out.push_str(text);
        self.out.push_str("\u{1b}[0m");
    }
}

#[cfg(test)]
mod tests {
    use super::colorize_json;
    use serde_json::json;

    #[test]
    fn colorize_json_matches_pretty_when_disabled() {
        let value = json!({
            "layout": {
                "fields": [{"column": "guid", "offset": 0}],
                "required_tokens": 47
            },
            "empty": {}
        });
        let plain = colorize_json(&value, false);
        let pretty = serde_json::to_string_pretty(&value).expect("pretty");
        assert_eq!(plain, pretty);
    }

    #[test]
    fn colorize_json_emits_ansi_when_enabled() {
        let value = json!({"k":"v","n":-1,"b":true,"z":null});
        let colored = colorize_json(&value, true);
        assert!(colored.contains("\u{1b}[36m\"k\"\u{1b}[0m"));
        assert!(colored.contains("\u{1b}[32m\"v\"\u{1b}[0m"));
        assert!(colored.contains("\u{1b}[33m-1\u{1b}[0m"));
        assert!(colored.contains("\u{1b}[35mtrue\u{1b}[0m"));
        assert!(colored.contains("\u{1b}[35mnull\u{1b}[0m"));
    }
}
