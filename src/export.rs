//! Export functionality for decision records
//!
//! Three formats:
//! - CSV: one row per record (index, title, last status date, last status)
//! - JSON: the same data as an array of objects
//! - HTML: a single page with every record and a contents list

use crate::allocator::format_index;
use crate::error::{AdrError, Result};
use crate::markdown::{self, BlockKind};
use crate::repository::{DocumentStatus, Repository};
use crate::slug::slugify;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Output format of `adrman export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Csv,
    Json,
    Html,
}

/// Accepted format names, lowercase.
const FORMAT_NAMES: &[(&str, ExportFormat)] = &[
    ("csv", ExportFormat::Csv),
    ("json", ExportFormat::Json),
    ("html", ExportFormat::Html),
    ("htm", ExportFormat::Html),
];

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Csv, ExportFormat::Json, ExportFormat::Html];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
        }
    }

    /// File written by `export --store`.
    pub fn file_name(&self) -> String {
        format!("export.{}", self.extension())
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
            ExportFormat::Html => "text/html; charset=utf-8",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = AdrError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        FORMAT_NAMES
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, format)| *format)
            .ok_or_else(|| AdrError::UnsupportedFormat(s.to_string()))
    }
}

/// Export every parsable record of `repo`.
pub fn export(repo: &Repository, format: ExportFormat) -> Result<String> {
    let records = repo.list_all_statuses()?;
    match format {
        ExportFormat::Csv => Ok(to_csv(&records, repo.config().digits)),
        ExportFormat::Json => Ok(to_json(&records)),
        ExportFormat::Html => {
            let mut documents = Vec::with_capacity(records.len());
            for record in records {
                match repo.read_file(&record.filename) {
                    Ok(raw) => documents.push(raw),
                    Err(e) => repo
                        .diagnostics()
                        .warn(&format!("Leaving {} out of the export: {}", record.filename, e)),
                }
            }
            Ok(to_html(&documents))
        }
    }
}

// =============================================================================
// CSV
// =============================================================================

/// Quote a CSV field when it contains a separator, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// CSV with header `Index,Decision,Last Modified Date,Last Status`.
pub fn to_csv(records: &[DocumentStatus], digits: usize) -> String {
    let mut out = String::from("Index,Decision,Last Modified Date,Last Status\n");
    for record in records {
        let row = [
            format_index(record.index, digits, ""),
            csv_field(&record.title),
            csv_field(&record.last_modified),
            csv_field(&record.last_status),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

// =============================================================================
// JSON
// =============================================================================

#[derive(Debug, Serialize)]
struct JsonRecord<'a> {
    index: u32,
    decision: &'a str,
    #[serde(rename = "modifiedDate")]
    modified_date: &'a str,
    #[serde(rename = "lastStatus")]
    last_status: &'a str,
}

/// JSON array of `{index, decision, modifiedDate, lastStatus}`.
pub fn to_json(records: &[DocumentStatus]) -> String {
    let rows: Vec<JsonRecord<'_>> = records
        .iter()
        .map(|r| JsonRecord {
            index: r.index,
            decision: &r.title,
            modified_date: &r.last_modified,
            last_status: &r.last_status,
        })
        .collect();
    // Plain strings and integers always serialize
    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
}

// =============================================================================
// HTML
// =============================================================================

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Hands out unique heading ids across the whole page.
#[derive(Default)]
struct HeadingIds {
    seen: HashMap<String, usize>,
}

impl HeadingIds {
    fn next(&mut self, text: &str) -> String {
        let base = match slugify(text) {
            s if s.is_empty() => "section".to_string(),
            s => s,
        };
        let count = self.seen.entry(base.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base
        } else {
            format!("{}-{}", base, *count - 1)
        }
    }
}

fn list_item(line: &str) -> Option<&str> {
    line.strip_prefix("* ").or_else(|| line.strip_prefix("- "))
}

fn code_body(text: &str) -> String {
    let mut lines: Vec<&str> = text.lines().skip(1).collect();
    if lines
        .last()
        .map(|l| l.trim_start().starts_with("```") || l.trim_start().starts_with("~~~"))
        .unwrap_or(false)
    {
        lines.pop();
    }
    lines.join("\n")
}

/// Rendered body and contents entries `(level, id, text)` for one record.
fn render_document(
    raw: &str,
    ids: &mut HeadingIds,
    contents: &mut Vec<(u8, String, String)>,
) -> String {
    let doc = markdown::scan(raw);
    let mut html = String::new();

    for block in &doc.blocks {
        match block.kind {
            BlockKind::Heading { level } => {
                let id = escape_html(&ids.next(block.text));
                html.push_str(&format!(
                    "<h{level} id=\"{id}\">{}</h{level}>\n",
                    escape_html(block.text)
                ));
                contents.push((level, id, block.text.to_string()));
            }
            BlockKind::Code => {
                html.push_str(&format!(
                    "<pre><code>{}</code></pre>\n",
                    escape_html(&code_body(block.text))
                ));
            }
            BlockKind::Text => {
                let lines: Vec<&str> = block.lines().collect();
                if !lines.is_empty() && lines.iter().all(|l| list_item(l).is_some()) {
                    html.push_str("<ul>\n");
                    for item in lines.iter().copied().filter_map(list_item) {
                        html.push_str(&format!("<li>{}</li>\n", escape_html(item)));
                    }
                    html.push_str("</ul>\n");
                } else {
                    let escaped: Vec<String> = lines.iter().copied().map(escape_html).collect();
                    html.push_str(&format!("<p>{}</p>\n", escaped.join("<br />\n")));
                }
            }
        }
    }
    html
}

/// A self-contained page with a contents list and every record in order.
pub fn to_html(documents: &[String]) -> String {
    let mut ids = HeadingIds::default();
    let mut contents = Vec::new();
    let mut body = String::new();
    for raw in documents {
        body.push_str("<article>\n");
        body.push_str(&render_document(raw, &mut ids, &mut contents));
        body.push_str("</article>\n");
    }

    let mut toc = String::from("<ul>\n");
    for (level, id, text) in &contents {
        toc.push_str(&format!(
            "<li class=\"toc-h{}\"><a href=\"#{}\">{}</a></li>\n",
            level,
            id,
            escape_html(text)
        ));
    }
    toc.push_str("</ul>\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<title>Architecture Decision Records</title>
<style>
body {{ display: flex; font-family: sans-serif; margin: 0; }}
nav {{ width: 20rem; padding: 1rem; border-right: 1px solid #ddd; height: 100vh; overflow-y: auto; position: sticky; top: 0; }}
main {{ flex: 1; padding: 1rem 2rem; max-width: 60rem; }}
nav ul {{ list-style: none; padding-left: 0; }}
.toc-h2 {{ padding-left: 1rem; }}
.toc-h3, .toc-h4, .toc-h5, .toc-h6 {{ padding-left: 2rem; }}
article {{ border-bottom: 1px solid #eee; padding-bottom: 1rem; }}
pre {{ background: #f6f8fa; padding: 0.5rem; overflow-x: auto; }}
</style>
</head>
<body>
<nav>
{toc}</nav>
<main>
{body}</main>
</body>
</html>
"#
    )
}
