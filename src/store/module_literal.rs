//! Restricted object-literal grammar for JS-style locale modules.
//!
//! Locale modules look like `const en = { ... }` followed by
//! `export default en`. The object literal is extracted with a bounded
//! structural match and parsed by a small recursive-descent parser; no code
//! is ever evaluated. The grammar covers exactly what locale data needs:
//! objects with bare or quoted keys, strings, numbers, booleans, null,
//! arrays, trailing commas and `//` line comments.

use regex::Regex;
use serde_json::{Map, Number, Value};
use std::sync::OnceLock;

use crate::core::errors::{Result, SyncError};

/// Matches the `const <ident> =` header that opens a locale module
fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"const\s+[A-Za-z_$][A-Za-z0-9_$]*\s*=\s*\{").expect("valid regex")
    })
}

/// Extract the object literal from a module's source text.
///
/// Finds `const <ident> = {`, scans to the matching brace (string-aware),
/// and verifies `export default` follows. Returns the literal including
/// its outer braces.
pub fn extract_object_literal(source: &str) -> Result<&str> {
    let header = header_regex().find(source).ok_or(SyncError::ModuleSyntax {
        offset: 0,
        message: "no `const <name> = {` declaration found".to_string(),
    })?;

    // The header match ends just past the opening brace
    let open = header.end() - 1;
    let close = matching_brace(source, open)?;

    let rest = &source[close + 1..];
    if !rest.contains("export default") {
        return Err(SyncError::ModuleSyntax {
            offset: close + 1,
            message: "no `export default` after the object literal".to_string(),
        });
    }

    Ok(&source[open..=close])
}

/// Find the brace closing the one at `open`, skipping string contents
/// and `//` line comments
fn matching_brace(source: &str, open: usize) -> Result<usize> {
    let mut depth = 0usize;
    let mut chars = source[open..].char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + i);
                }
            }
            '/' if matches!(chars.peek(), Some((_, '/'))) => {
                for (_, n) in chars.by_ref() {
                    if n == '\n' {
                        break;
                    }
                }
            }
            '\'' | '"' => {
                // Skip the whole string, honoring escapes
                loop {
                    match chars.next() {
                        Some((_, '\\')) => {
                            chars.next();
                        }
                        Some((_, q)) if q == c => break,
                        Some(_) => {}
                        None => {
                            return Err(SyncError::ModuleSyntax {
                                offset: open + i,
                                message: "unterminated string".to_string(),
                            })
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Err(SyncError::ModuleSyntax {
        offset: open,
        message: "unbalanced braces".to_string(),
    })
}

/// Parse an extracted object literal into a translation tree
pub fn parse_object_literal(text: &str) -> Result<Value> {
    let mut parser = Parser::new(text);
    parser.skip_trivia();
    let value = parser.parse_value()?;
    parser.skip_trivia();
    if !parser.at_end() {
        return Err(parser.error("trailing characters after literal"));
    }
    Ok(value)
}

/// Recursive-descent parser over the restricted grammar
struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    /// Wrap the literal text for parsing
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    /// Current character, if any
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Consume and return the current character
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// True once all input is consumed
    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Build a syntax error at the current offset
    fn error(&self, message: &str) -> SyncError {
        SyncError::ModuleSyntax {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    /// Skip whitespace and `//` line comments
    fn skip_trivia(&mut self) {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.pos += 1;
            }
            if self.peek() == Some('/') && self.chars.get(self.pos + 1) == Some(&'/') {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.pos += 1;
                }
            } else {
                return;
            }
        }
    }

    /// Consume `expected` or fail
    fn expect(&mut self, expected: char) -> Result<()> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected {:?}", expected)))
        }
    }

    /// Dispatch on the next significant character
    fn parse_value(&mut self) -> Result<Value> {
        self.skip_trivia();
        match self.peek() {
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some('\'') | Some('"') => Ok(Value::String(self.parse_string()?)),
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' => self.parse_number(),
            Some(c) if c.is_alphabetic() => self.parse_keyword(),
            _ => Err(self.error("expected a value")),
        }
    }

    fn parse_object(&mut self) -> Result<Value> {
        self.expect('{')?;
        let mut map = Map::new();

        loop {
            self.skip_trivia();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Value::Object(map));
            }

            let key = self.parse_key()?;
            self.skip_trivia();
            self.expect(':')?;
            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_trivia();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                Some('}') => {}
                _ => return Err(self.error("expected ',' or '}' after entry")),
            }
        }
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.expect('[')?;
        let mut items = Vec::new();

        loop {
            self.skip_trivia();
            if self.peek() == Some(']') {
                self.pos += 1;
                return Ok(Value::Array(items));
            }

            items.push(self.parse_value()?);

            self.skip_trivia();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                Some(']') => {}
                _ => return Err(self.error("expected ',' or ']' after item")),
            }
        }
    }

    /// A key is a bare identifier or a quoted string
    fn parse_key(&mut self) -> Result<String> {
        match self.peek() {
            Some('\'') | Some('"') => self.parse_string(),
            Some(c) if is_ident_start(c) => {
                let start = self.pos;
                while self.peek().is_some_and(is_ident_continue) {
                    self.pos += 1;
                }
                Ok(self.chars[start..self.pos].iter().collect())
            }
            _ => Err(self.error("expected an object key")),
        }
    }

    fn parse_string(&mut self) -> Result<String> {
        let quote = self.bump().ok_or_else(|| self.error("expected a string"))?;
        let mut out = String::new();

        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('0') => out.push('\0'),
                    Some('u') => out.push(self.parse_unicode_escape()?),
                    Some(c @ ('\\' | '\'' | '"' | '`' | '/')) => out.push(c),
                    _ => return Err(self.error("unsupported escape sequence")),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    /// `\uXXXX` escape
    fn parse_unicode_escape(&mut self) -> Result<char> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("expected 4 hex digits after \\u"))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| self.error("invalid unicode escape"))
    }

    fn parse_number(&mut self) -> Result<Value> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
        {
            self.pos += 1;
        }
        let token: String = self.chars[start..self.pos].iter().collect();

        if let Ok(n) = token.parse::<i64>() {
            return Ok(Value::Number(n.into()));
        }
        let float = token
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .ok_or_else(|| self.error("invalid number"))?;
        Ok(Value::Number(float))
    }

    /// `true`, `false` or `null`
    fn parse_keyword(&mut self) -> Result<Value> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphabetic()) {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "null" => Ok(Value::Null),
            _ => {
                self.pos = start;
                Err(self.error(&format!("unexpected identifier {:?}", word)))
            }
        }
    }
}

/// Serialize a tree as locale-module source text.
///
/// Bare identifier keys stay unquoted, everything else is single-quoted,
/// nesting is indented by 2 spaces, and the module closes with
/// `export default <lang>`.
pub fn to_module_source(lang: &str, tree: &Value) -> Result<String> {
    if !tree.is_object() {
        return Err(SyncError::MalformedTree {
            message: "module serialization requires an object root".to_string(),
        });
    }

    let mut out = format!("const {} = ", lang);
    write_value(&mut out, tree, 0);
    out.push_str(&format!("\n\nexport default {}\n", lang));
    Ok(out)
}

/// Write one value at the given nesting depth
fn write_value(out: &mut String, value: &Value, depth: usize) {
    let pad = "  ".repeat(depth + 1);
    let closing_pad = "  ".repeat(depth);

    match value {
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str("{\n");
            for (i, (key, v)) in map.iter().enumerate() {
                out.push_str(&pad);
                write_key(out, key);
                out.push_str(": ");
                write_value(out, v, depth + 1);
                if i + 1 < map.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&closing_pad);
            out.push('}');
        }
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            out.push_str("[\n");
            for (i, v) in items.iter().enumerate() {
                out.push_str(&pad);
                write_value(out, v, depth + 1);
                if i + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&closing_pad);
            out.push(']');
        }
        Value::String(s) => write_quoted(out, s),
        Value::Null => out.push_str("null"),
        other => out.push_str(&other.to_string()),
    }
}

/// Bare identifier keys go unquoted, all others single-quoted
fn write_key(out: &mut String, key: &str) {
    if is_bare_identifier(key) {
        out.push_str(key);
    } else {
        write_quoted(out, key);
    }
}

/// Single-quoted string with the escapes the parser understands
fn write_quoted(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('\'');
}

/// `^[a-zA-Z_$][a-zA-Z0-9_$]*$`
fn is_bare_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => chars.all(is_ident_continue),
        _ => false,
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    const MODULE: &str = r#"const en = {
  greeting: 'hello',
  'menu-bar': {
    open: "Open",
    depth: 2
  },
  items: ['a', 'b'],
  flags: [true, false, null]
}

export default en
"#;

    #[test]
    fn extracts_and_parses_module() {
        let literal = extract_object_literal(MODULE).unwrap();
        let tree = parse_object_literal(literal).unwrap();

        assert_json_eq!(
            tree,
            json!({
                "greeting": "hello",
                "menu-bar": {"open": "Open", "depth": 2},
                "items": ["a", "b"],
                "flags": [true, false, null]
            })
        );
    }

    #[test]
    fn extraction_requires_export_default() {
        let source = "const en = { a: 'x' }\n";
        assert!(matches!(
            extract_object_literal(source),
            Err(SyncError::ModuleSyntax { .. })
        ));
    }

    #[test]
    fn extraction_ignores_braces_inside_strings() {
        let source = "const en = { a: 'closing } brace' }\n\nexport default en\n";
        let literal = extract_object_literal(source).unwrap();
        let tree = parse_object_literal(literal).unwrap();
        assert_json_eq!(tree, json!({"a": "closing } brace"}));
    }

    #[test]
    fn extraction_ignores_braces_inside_comments() {
        let source = "const en = {\n  // keep } in sync\n  a: 'x' // also {\n}\n\nexport default en\n";
        let literal = extract_object_literal(source).unwrap();
        let tree = parse_object_literal(literal).unwrap();
        assert_json_eq!(tree, json!({"a": "x"}));
    }

    #[test]
    fn parses_trailing_commas_and_comments() {
        let literal = r#"{
  // section one
  a: 'x',
  nested: {
    b: 'y', // inline note
  },
}"#;
        let tree = parse_object_literal(literal).unwrap();
        assert_json_eq!(tree, json!({"a": "x", "nested": {"b": "y"}}));
    }

    #[test]
    fn parses_escapes() {
        let tree = parse_object_literal(r"{ a: 'it\'s\nA' }").unwrap();
        assert_json_eq!(tree, json!({"a": "it's\nA"}));
    }

    #[test]
    fn rejects_arbitrary_code() {
        for bad in [
            "{ a: doSomething() }",
            "{ a: `template` }",
            "{ [computed]: 'x' }",
        ] {
            assert!(
                parse_object_literal(bad).is_err(),
                "accepted code-bearing literal: {}",
                bad
            );
        }
    }

    #[test]
    fn serializes_with_deterministic_quoting() {
        let tree = json!({
            "greeting": "l'été",
            "menu-bar": {"open": "Open"},
            "items": ["a", 2],
            "empty": {},
            "$valid_key": true
        });

        let source = to_module_source("fr", &tree).unwrap();
        let expected = "const fr = {\n  greeting: 'l\\'été',\n  'menu-bar': {\n    open: 'Open'\n  },\n  items: [\n    'a',\n    2\n  ],\n  empty: {},\n  $valid_key: true\n}\n\nexport default fr\n";
        assert_eq!(source, expected);
    }

    #[test]
    fn serializer_rejects_non_object_root() {
        assert!(to_module_source("fr", &json!(["a"])).is_err());
    }

    #[test]
    fn module_roundtrip_preserves_key_order() {
        let tree = json!({"z": "1", "a": "2", "m": {"k2": "3", "k1": "4"}});
        let source = to_module_source("en", &tree).unwrap();
        let literal = extract_object_literal(&source).unwrap();
        let parsed = parse_object_literal(literal).unwrap();

        let keys: Vec<_> = parsed.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert_json_eq!(parsed, tree);
    }
}
