//! Properties text format, readable by and from `java.util.Properties`

use std::collections::BTreeMap;

use chrono::Local;

use crate::domain::error::{DomainError, DomainResult};

const WHITESPACE: [char; 3] = [' ', '\t', '\x0c'];

pub(super) fn encode(entries: &BTreeMap<String, String>, description: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(description) = description {
        for line in description.lines() {
            out.push_str("# ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str("# ");
    out.push_str(&Local::now().to_rfc2822());
    out.push('\n');
    for (key, value) in entries {
        out.push_str(&escape(key, true));
        out.push('=');
        out.push_str(&escape(value, false));
        out.push('\n');
    }
    out
}

pub(super) fn decode(content: &str) -> DomainResult<BTreeMap<String, String>> {
    let mut entries = BTreeMap::new();
    for (number, line) in logical_lines(content) {
        let (key, value) = split_entry(&line);
        entries.insert(unescape(key, number)?, unescape(value, number)?);
    }
    Ok(entries)
}

fn escape(s: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            // leading blanks of a value would be eaten by the separator
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            _ => out.push(c),
        }
    }
    out
}

/// Join continuation lines and drop blanks and comments; keeps the first line number.
fn logical_lines(content: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in content.lines().enumerate() {
        let trimmed = raw.trim_start_matches(WHITESPACE);
        let (start, mut text) = match pending.take() {
            Some(continued) => continued,
            None => {
                if trimmed.is_empty() || trimmed.starts_with(['#', '!']) {
                    continue;
                }
                (idx + 1, String::new())
            }
        };
        if continues(trimmed) {
            text.push_str(&trimmed[..trimmed.len() - 1]);
            pending = Some((start, text));
        } else {
            text.push_str(trimmed);
            lines.push((start, text));
        }
    }
    lines.extend(pending);
    lines
}

/// An odd number of trailing backslashes continues the line.
fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Key ends at the first unescaped `=`, `:` or blank.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\x0c' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }
    let rest = line[key_end..].trim_start_matches(WHITESPACE);
    let rest = rest.strip_prefix(['=', ':']).unwrap_or(rest);
    (&line[..key_end], rest.trim_start_matches(WHITESPACE))
}

fn unescape(s: &str, line: usize) -> DomainResult<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let unit = hex_unit(&mut chars, line)?;
                let code = if (0xD800..0xDC00).contains(&unit) {
                    // high surrogate: the low half must follow as another \u escape
                    if chars.next() != Some('\\') || chars.next() != Some('u') {
                        return Err(malformed(line, "unpaired surrogate in \\u escape"));
                    }
                    let low = hex_unit(&mut chars, line)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(malformed(line, "unpaired surrogate in \\u escape"));
                    }
                    0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    unit
                };
                let decoded =
                    char::from_u32(code).ok_or_else(|| malformed(line, "invalid \\u escape"))?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

fn hex_unit(chars: &mut std::str::Chars<'_>, line: usize) -> DomainResult<u32> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.chars().count() != 4 {
        return Err(malformed(line, "truncated \\u escape"));
    }
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(malformed(line, "invalid \\u escape"));
    }
    u32::from_str_radix(&hex, 16).map_err(|_| malformed(line, "invalid \\u escape"))
}

fn malformed(line: usize, message: &str) -> DomainError {
    DomainError::MalformedStore {
        format: "properties",
        message: format!("line {line}: {message}"),
    }
}
