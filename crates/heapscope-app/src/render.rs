//! Table formatting using comfy-table

use std::fmt::Write as _;

use comfy_table::presets::{ASCII_FULL_CONDENSED, UTF8_FULL_CONDENSED};
use comfy_table::{Cell, Color, ContentArrangement, Table};
use serde_json::Value;

use heapscope_core::prelude::*;
use heapscope_core::{HeapObjectSummary, IvarDump, MethodList};

use crate::config::TableStyle;

pub const INSTANCE_HEADERS: [&str; 6] = ["Handle", "Kind", "Class", "Super", "iVars", "Methods"];
pub const IVAR_HEADERS: [&str; 3] = ["iVar", "Value", "<className:pointer>"];
pub const METHOD_HEADERS: [&str; 3] = ["Method", "Type", "Full"];

/// Create a styled table
pub fn create_table(headers: &[&str], style: TableStyle, color: bool) -> Table {
    let mut table = Table::new();
    table.load_preset(match style {
        TableStyle::Utf8 => UTF8_FULL_CONDENSED,
        TableStyle::Ascii => ASCII_FULL_CONDENSED,
    });
    table.set_content_arrangement(ContentArrangement::Dynamic);

    if color {
        let header_cells: Vec<Cell> = headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect();
        table.set_header(header_cells);
    } else {
        table.set_header(headers);
    }

    table
}

// ============================================================================
// Instances
// ============================================================================

pub fn instance_row(summary: &HeapObjectSummary) -> [String; 6] {
    [
        summary.handle.clone(),
        summary.kind.clone(),
        summary.class_name.clone(),
        summary.super_class_name().to_string(),
        summary.ivar_count().to_string(),
        summary.method_count().to_string(),
    ]
}

pub fn instances_table(instances: &[HeapObjectSummary], style: TableStyle, color: bool) -> Table {
    let mut table = create_table(&INSTANCE_HEADERS, style, color);
    for summary in instances {
        table.add_row(instance_row(summary));
    }
    table
}

// ============================================================================
// Ivars
// ============================================================================

/// One rendered ivar.
#[derive(Debug, Clone, PartialEq)]
pub struct IvarRow {
    pub name: String,
    /// Scalar or the reference's embedded value; `None` renders empty
    pub value: Option<Value>,
    /// `<ClassName:pointer>` for references, empty for scalars
    pub annotation: String,
}

impl IvarRow {
    pub fn value_cell(&self) -> String {
        self.value.as_ref().map(format_cell).unwrap_or_default()
    }
}

pub fn ivar_rows(dump: &IvarDump) -> Vec<IvarRow> {
    dump.ivars
        .iter()
        .map(|(name, value)| IvarRow {
            name: name.clone(),
            value: value.display_value().cloned(),
            annotation: value.annotation().unwrap_or_default(),
        })
        .collect()
}

pub fn ivars_table(dump: &IvarDump, style: TableStyle, color: bool) -> Table {
    let mut table = create_table(&IVAR_HEADERS, style, color);
    for row in ivar_rows(dump) {
        table.add_row(vec![row.name.clone(), row.value_cell(), row.annotation]);
    }
    table
}

// ============================================================================
// Methods
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRow {
    pub signature: String,
    pub kind: String,
    /// `"<type> [<ClassName> <selector>]"`, empty for malformed signatures
    pub full: String,
}

pub fn method_rows(list: &MethodList) -> Vec<MethodRow> {
    list.parsed()
        .map(|signature| {
            let full = match signature.full_form(&list.class_name) {
                Some(full) => full,
                None => {
                    debug!(
                        "Signature {:?} of {} has no selector token",
                        signature.raw, list.class_name
                    );
                    String::new()
                }
            };
            MethodRow {
                signature: signature.raw,
                kind: signature.kind,
                full,
            }
        })
        .collect()
}

pub fn methods_table(list: &MethodList, style: TableStyle, color: bool) -> Table {
    let mut table = create_table(&METHOD_HEADERS, style, color);
    for row in method_rows(list) {
        table.add_row(vec![row.signature, row.kind, row.full]);
    }
    table
}

// ============================================================================
// Values
// ============================================================================

/// Render a value for a table cell.
///
/// Strings are quoted and escaped, null is empty, and anything else is its
/// compact JSON text.
pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => quote_text(s),
        other => other.to_string(),
    }
}

/// Render a method result: strings quoted, structures as indented JSON.
pub fn format_result(value: &Value) -> String {
    match value {
        Value::String(s) => quote_text(s),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}

/// Quote text the way a debugger shows a string literal.
///
/// Single quotes unless the text contains a single quote and no double
/// quote. Backslashes, the chosen quote, control characters and invisible
/// characters are escaped.
pub fn quote_text(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() || is_invisible(c) => {
                let code = c as u32;
                if code <= 0xff {
                    let _ = write!(out, "\\x{:02x}", code);
                } else if code <= 0xffff {
                    let _ = write!(out, "\\u{:04x}", code);
                } else {
                    let _ = write!(out, "\\U{:08x}", code);
                }
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Whitespace other than the plain space, and Unicode format characters
/// (general category Cf).
fn is_invisible(c: char) -> bool {
    (c.is_whitespace() && c != ' ')
        || matches!(
            c,
            '\u{ad}'
                | '\u{600}'..='\u{605}'
                | '\u{61c}'
                | '\u{6dd}'
                | '\u{70f}'
                | '\u{890}'..='\u{891}'
                | '\u{8e2}'
                | '\u{180e}'
                | '\u{200b}'..='\u{200f}'
                | '\u{202a}'..='\u{202e}'
                | '\u{2060}'..='\u{2064}'
                | '\u{2066}'..='\u{206f}'
                | '\u{feff}'
                | '\u{fff9}'..='\u{fffb}'
                | '\u{110bd}'
                | '\u{110cd}'
                | '\u{13430}'..='\u{1343f}'
                | '\u{1bca0}'..='\u{1bca3}'
                | '\u{1d173}'..='\u{1d17a}'
                | '\u{e0001}'
                | '\u{e0020}'..='\u{e007f}'
        )
}
