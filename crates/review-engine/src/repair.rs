//! Bounded syntactic repair of almost-JSON.
//!
//! A single left-to-right scan that leaves string literals untouched and
//! fixes three mistakes models commonly make:
//!
//! - bare object keys: `{summary: "x"}` becomes `{"summary": "x"}`
//! - bare scalar values: `{"severity": HIGH}` becomes `{"severity": "HIGH"}`
//! - trailing commas: `[1, 2, ]` becomes `[1, 2 ]`
//!
//! Numbers, `true`, `false` and `null` are kept as they are, so valid JSON
//! comes out semantically unchanged.

/// Characters that end a bare object key.
fn ends_key(c: char) -> bool {
    matches!(c, '"' | '{' | '}' | '[' | ']' | ':' | ',' | '\n' | '\r')
}

/// Characters that end a bare value. A colon is ordinary text there.
fn ends_value(c: char) -> bool {
    c != ':' && ends_key(c)
}

fn is_json_literal(token: &str) -> bool {
    matches!(token, "true" | "false" | "null")
        || serde_json::from_str::<serde_json::Number>(token).is_ok()
}

/// Index just past the string literal opening at `start`. Works on chars
/// and on raw bytes, since quote and backslash are ASCII.
pub(crate) fn string_end<T: Copy + Into<char>>(items: &[T], start: usize) -> usize {
    let mut i = start + 1;
    while i < items.len() {
        match items[i].into() {
            '\\' => i += 2,
            '"' => return i + 1,
            _ => i += 1,
        }
    }
    items.len()
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
    chars[from.min(chars.len())..]
        .iter()
        .copied()
        .find(|c| !c.is_whitespace())
}

pub fn repair_json(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 32);
    // Open containers, innermost last.
    let mut open: Vec<char> = Vec::new();
    let mut expect_key = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => {
                let end = string_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
                continue;
            }
            ',' => {
                if !matches!(next_significant(&chars, i + 1), Some('}') | Some(']')) {
                    out.push(',');
                }
                expect_key = open.last() == Some(&'{');
            }
            '{' | '[' => {
                open.push(c);
                expect_key = c == '{';
                out.push(c);
            }
            '}' | ']' => {
                open.pop();
                expect_key = false;
                out.push(c);
            }
            ':' => {
                expect_key = false;
                out.push(c);
            }
            c if c.is_whitespace() => out.push(c),
            _ => {
                let ends = if expect_key { ends_key } else { ends_value };
                let start = i;
                while i < chars.len() && !ends(chars[i]) {
                    i += 1;
                }
                let token: String = chars[start..i].iter().collect();
                let trimmed = token.trim_end();

                if expect_key || !is_json_literal(trimmed) {
                    // serde_json produces a correctly escaped literal for any &str
                    out.push_str(&serde_json::Value::from(trimmed).to_string());
                } else {
                    out.push_str(trimmed);
                }
                out.push_str(&token[trimmed.len()..]);
                continue;
            }
        }
        i += 1;
    }

    out
}
