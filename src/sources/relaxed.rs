//! Lenient reader for JavaScript object literals.
//!
//! Handles what hand-written schedule scripts contain: unquoted keys,
//! single-quoted strings, trailing commas and comments. The literal is
//! rewritten into strict JSON and handed to `serde_json`.

use crate::error::EpgError;
use serde_json::Value;
use std::{collections::BTreeMap, iter::Peekable, str::Chars};

/// Time key (`"HH:MM"`) to title.
pub(crate) type DaySchedule = BTreeMap<String, String>;
/// Weekday name, as written in the script, to that day's shows.
pub(crate) type WeeklySchedule = BTreeMap<String, DaySchedule>;

pub(crate) fn parse_relaxed_schedule(text: &str) -> Result<WeeklySchedule, EpgError> {
    let json = to_strict_json(&strip_comments(text));
    serde_json::from_str(&json).map_err(|e| EpgError::MalformedSchedule(e.to_string()))
}

fn is_quote(c: char) -> bool {
    matches!(c, '"' | '\'' | '`')
}

/// Removes `//` and `/* */` comments outside of string literals.
pub(crate) fn strip_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            q if is_quote(q) => {
                out.push(q);
                while let Some(c) = chars.next() {
                    out.push(c);
                    if c == '\\' {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    } else if c == q {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                while chars.next_if(|&c| c != '\n').is_some() {}
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Byte offset of the bracket closing the one `text` starts with.
pub(crate) fn closing_bracket(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            q if is_quote(q) => quote = Some(q),
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn read_string(chars: &mut Peekable<Chars>, quote: char) -> String {
    let mut s = String::new();
    while let Some(c) = chars.next() {
        if c == quote {
            break;
        }
        if c != '\\' {
            s.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => s.push('\n'),
            Some('t') => s.push('\t'),
            Some('r') => s.push('\r'),
            Some('u') => {
                let hex: String = (0..4).filter_map(|_| chars.next()).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => s.push(decoded),
                    None => {
                        s.push_str("\\u");
                        s.push_str(&hex);
                    }
                }
            }
            Some(other) => s.push(other),
            None => {}
        }
    }
    s
}

fn to_strict_json(src: &str) -> String {
    let mut out = String::with_capacity(src.len() + src.len() / 4);
    let mut chars = src.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            q if is_quote(q) => {
                let s = read_string(&mut chars, q);
                out.push_str(&Value::String(s).to_string());
            }
            ',' => {
                let mut gap = String::new();
                while let Some(c) = chars.next_if(|c| c.is_whitespace()) {
                    gap.push(c);
                }
                if !matches!(chars.peek(), Some('}' | ']')) {
                    out.push(',');
                }
                out.push_str(&gap);
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut ident = String::from(c);
                while let Some(c) = chars.next_if(|c| c.is_alphanumeric() || *c == '_' || *c == '$') {
                    ident.push(c);
                }
                match ident.as_str() {
                    "true" | "false" | "null" => out.push_str(&ident),
                    _ => out.push_str(&Value::String(ident).to_string()),
                }
            }
            _ => out.push(ch),
        }
    }
    out
}
