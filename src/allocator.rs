//! Index allocation for new records
//!
//! Record filenames start with `<prefix><zero-padded index>`, e.g.
//! `0007-use-widgets.md` or `ADR-0007-use-widgets.md`. The next index is
//! one past the largest index found in the records directory.

use crate::diagnostics::DiagnosticSink;
use crate::error::{AdrError, Result};
use std::fs;
use std::path::Path;

/// Generated table of contents, never treated as a record.
pub const TOC_FILE_NAME: &str = "README.md";

/// Files starting with this are templates, never records.
pub const TEMPLATE_PREFIX: &str = "template-";

/// Extension of record files.
pub const DOC_EXTENSION: &str = "md";

/// Which directory entries count as records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions<'a> {
    /// Files excluded by exact name (the TOC)
    pub exclude: &'a [&'a str],
    /// Active template file name
    pub template_name: &'a str,
    /// Record file extension, without the dot
    pub extension: &'a str,
}

impl<'a> ListOptions<'a> {
    pub fn new(template_name: &'a str) -> Self {
        Self {
            exclude: &[TOC_FILE_NAME],
            template_name,
            extension: DOC_EXTENSION,
        }
    }

    fn accepts(&self, name: &str) -> bool {
        let has_extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e == self.extension)
            .unwrap_or(false);

        has_extension
            && !self.exclude.contains(&name)
            && !name.starts_with(TEMPLATE_PREFIX)
            && name != self.template_name
    }
}

/// Record filenames directly inside `dir`, sorted by name.
pub fn list_document_files(dir: &Path, options: &ListOptions<'_>) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| AdrError::io(dir, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AdrError::io(dir, e))?;
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        // Non UTF-8 names can't follow the naming convention anyway
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if options.accepts(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// The index encoded at the start of `filename`.
///
/// `prefix` is stripped first when present; then the whole run of leading
/// ASCII digits is read. Shorter runs than `digits` don't count, longer
/// ones are indices that outgrew their padding.
pub fn parse_filename_index(filename: &str, digits: usize, prefix: &str) -> Option<u32> {
    let rest = if prefix.is_empty() {
        filename
    } else {
        filename.strip_prefix(prefix).unwrap_or(filename)
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 || end < digits {
        return None;
    }
    rest[..end].parse().ok()
}

/// Largest index among `filenames`, or 0 when none parses.
pub fn max_index(filenames: &[String], digits: usize, prefix: &str, diag: &dyn DiagnosticSink) -> u32 {
    filenames
        .iter()
        .filter_map(|name| {
            let index = parse_filename_index(name, digits, prefix);
            if index.is_none() {
                diag.debug(&format!("No index in file name '{}', skipping", name));
            }
            index
        })
        .max()
        .unwrap_or(0)
}

/// `prefix` followed by `index` left-padded with zeros to `digits`.
///
/// An index wider than `digits` is written in full.
pub fn format_index(index: u32, digits: usize, prefix: &str) -> String {
    format!("{}{:0width$}", prefix, index, width = digits)
}

/// Next free index for the records in `dir`, and its filename form.
pub fn next_index(
    dir: &Path,
    options: &ListOptions<'_>,
    digits: usize,
    prefix: &str,
    diag: &dyn DiagnosticSink,
) -> Result<(u32, String)> {
    let files = list_document_files(dir, options)?;
    if files.is_empty() {
        diag.debug(&format!("No records in {}, starting at 1", dir.display()));
    }
    let next = max_index(&files, digits, prefix, diag) + 1;

    let formatted = format_index(next, digits, prefix);
    if formatted.len() - prefix.len() > digits {
        diag.warn(&format!(
            "Index {} does not fit into {} digits; filenames will no longer sort by index",
            next, digits
        ));
    }
    Ok((next, formatted))
}

/// Just the string form of [`next_index`].
pub fn next_index_string(
    dir: &Path,
    options: &ListOptions<'_>,
    digits: usize,
    prefix: &str,
    diag: &dyn DiagnosticSink,
) -> Result<String> {
    next_index(dir, options, digits, prefix, diag).map(|(_, s)| s)
}
