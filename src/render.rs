//! Purpose: Render params documents as aligned, optionally colorized listings.
//! Exports: entries_table, value_text.
//! Role: Small, pure formatter used by the `show` command's human output.
//! Invariants: ANSI escapes appear only when explicitly enabled.
//! Invariants: Rows follow document order; callers sort beforehand if needed.
use liveparam::api::{Document, infer_kind};
use serde_json::Value;

// Same conservative palette as the JSON emitters.
const COLOR_NAME: &str = "36";
const COLOR_KIND: &str = "35";
const COLOR_UNKNOWN: &str = "31";

pub fn entries_table(document: &Document, use_color: bool) -> String {
    let rows: Vec<(&str, Option<&'static str>, String)> = document
        .entries()
        .map(|(name, entry)| (name, infer_kind(entry).map(|kind| kind.as_str()), value_text(entry)))
        .collect();
    let name_width = rows.iter().map(|(name, ..)| name.chars().count()).max().unwrap_or(0);
    let kind_width = rows
        .iter()
        .map(|(_, kind, _)| kind.unwrap_or("?").len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (name, kind, value) in &rows {
        push_padded(name, name_width, COLOR_NAME, use_color, &mut out);
        out.push_str("  ");
        match kind {
            Some(kind) => push_padded(kind, kind_width, COLOR_KIND, use_color, &mut out),
            None => push_padded("?", kind_width, COLOR_UNKNOWN, use_color, &mut out),
        }
        out.push_str("  ");
        out.push_str(value);
        out.push('\n');
    }
    out
}

/// Scalars print bare; compounds print as `name=value` pairs in file order.
pub fn value_text(entry: &Value) -> String {
    match entry {
        Value::String(text) => text.clone(),
        Value::Object(map) => map
            .iter()
            .map(|(key, child)| format!("{key}={}", value_text(child)))
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

fn push_padded(text: &str, width: usize, color: &str, use_color: bool, out: &mut String) {
    push_colored(text, color, use_color, out);
    let len = text.chars().count();
    if width > len {
        out.push_str(&" ".repeat(width - len));
    }
}

fn push_colored(text: &str, color: &str, use_color: bool, out: &mut String) {
    if !use_color {
        out.push_str(text);
        return;
    }
    out.push_str("\u{1b}[");
    out.push_str(color);
    out.push('m');
    out.push_str(text);
    out.push_str("\u{1b}[0m");
}
