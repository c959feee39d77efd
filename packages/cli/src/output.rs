//! Terminal output helpers: highlighted JSON and table cell formatting.

use colored::Colorize;
use serde::Serialize;

/// Serializes a value and prints it as highlighted JSON.
///
/// Keys are cyan, strings green, numbers yellow, and booleans and null
/// magenta.
pub fn print_json<T: Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string());
    println!("{}", highlight_json(&json));
}

/// Returns a colored copy of pretty-printed JSON.
#[must_use]
pub fn highlight_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len() * 2);
    let mut token = String::new();
    let mut in_string = false;
    let mut escape_next = false;
    let mut after_colon = false;
    let mut is_key = false;
    let mut containers: Vec<char> = Vec::new();

    for ch in json.chars() {
        if escape_next {
            token.push(ch);
            escape_next = false;
            continue;
        }
        if in_string && ch == '\\' {
            token.push(ch);
            escape_next = true;
            continue;
        }

        match ch {
            '"' if in_string => {
                token.push(ch);
                let painted = if is_key { token.cyan() } else { token.green() };
                out.push_str(&painted.to_string());
                token.clear();
                in_string = false;
            }
            '"' => {
                flush_scalar(&mut out, &mut token, after_colon);
                token.push(ch);
                in_string = true;
                is_key = !after_colon;
                after_colon = false;
            }
            ':' if !in_string => {
                flush_scalar(&mut out, &mut token, false);
                out.push(':');
                after_colon = true;
            }
            ',' | '{' | '}' | '[' | ']' if !in_string => {
                flush_scalar(&mut out, &mut token, after_colon);
                out.push_str(&ch.to_string().white().bold().to_string());
                match ch {
                    '{' | '[' => containers.push(ch),
                    '}' | ']' => {
                        containers.pop();
                    }
                    _ => {}
                }
                // Array elements are values, object members start with a key.
                after_colon = ch != '}' && ch != ']' && containers.last() == Some(&'[');
            }
            _ => token.push(ch),
        }
    }

    flush_scalar(&mut out, &mut token, after_colon);
    out
}

fn flush_scalar(out: &mut String, token: &mut String, is_value: bool) {
    if token.is_empty() {
        return;
    }

    let start = token.find(|c: char| !c.is_whitespace());
    let end = token.rfind(|c: char| !c.is_whitespace()).map(|i| i + 1);
    match (start, end) {
        (Some(start), Some(end)) if is_value => {
            let value = &token[start..end];
            out.push_str(&token[..start]);
            if matches!(value, "true" | "false" | "null") {
                out.push_str(&value.magenta().to_string());
            } else if value.parse::<f64>().is_ok() {
                out.push_str(&value.yellow().to_string());
            } else {
                out.push_str(value);
            }
            out.push_str(&token[end..]);
        }
        _ => out.push_str(token),
    }
    token.clear();
}

/// Truncates a string to a maximum number of characters, adding an ellipsis.
#[must_use]
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 1 {
        return "…".to_string();
    }
    let cut = s.char_indices().nth(max_chars - 1).map_or(s.len(), |(idx, _)| idx);
    format!("{}…", &s[..cut])
}

/// Formats a boolean as a colored check mark or cross.
#[must_use]
pub fn format_bool(value: bool) -> String {
    if value { "✓".green().to_string() } else { "✗".red().to_string() }
}

/// Formats an optional space number; `None` means every space.
#[must_use]
pub fn format_space(number: Option<u32>) -> String {
    number.map_or_else(|| "all".dimmed().to_string(), |n| n.to_string())
}
