//! Status history editor
//!
//! Appends one `"<date> <status>"` line to the end of a record's Status
//! section. Bytes outside the insertion point are never touched: the new
//! content is `prefix + "\n" + entry + "\n" + suffix`, written to a
//! temporary file next to the record and renamed over it.

use crate::diagnostics::DiagnosticSink;
use crate::error::{AdrError, ParseError, Result};
use crate::markdown;
use crate::parser::{self, StatusEntry, STATUS_SECTION};
use chrono::NaiveDate;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Date format of status entries.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The status values offered by the interactive picker and used for colouring.
/// Any other label is still accepted when given explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Proposed,
    Accepted,
    Done,
    Deprecated,
    Superseded,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Proposed,
        Status::Accepted,
        Status::Done,
        Status::Deprecated,
        Status::Superseded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Proposed => "Proposed",
            Status::Accepted => "Accepted",
            Status::Done => "Done",
            Status::Deprecated => "Deprecated",
            Status::Superseded => "Superseded",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Status::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = Status::ALL.iter().map(Status::as_str).collect();
                format!("must be one of: {}", names.join(", "))
            })
    }
}

/// How a record is written back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Copy the previous content to `<path>.bak` first
    pub backup: bool,
}

/// Byte offset right after the last content line of the Status section.
/// For an empty section this is the end of the heading line.
pub fn status_insertion_point(raw: &str) -> std::result::Result<usize, ParseError> {
    let doc = markdown::scan(raw);
    let section = parser::find_section(&doc, STATUS_SECTION)?;
    let point = doc
        .section_body(section.block)
        .last()
        .unwrap_or(&doc.blocks[section.block])
        .end;
    Ok(point)
}

/// The record text with `entry` appended to its Status section.
pub fn insert_status_entry(
    raw: &str,
    entry: &StatusEntry,
) -> std::result::Result<String, ParseError> {
    let point = status_insertion_point(raw)?;
    let (prefix, suffix) = raw.split_at(point);

    let mut out = String::with_capacity(raw.len() + entry.date.len() + entry.status.len() + 4);
    out.push_str(prefix);
    // A section ending at EOF without a newline still needs its line closed
    if !prefix.is_empty() && !prefix.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&entry.to_line());
    out.push('\n');
    out.push_str(suffix);
    Ok(out)
}

/// Path of the backup copy for `path`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// The trimmed label, if it fits on one status line.
pub fn validate_label(label: &str) -> Result<&str> {
    let trimmed = label.trim();
    if trimmed.is_empty() || trimmed.contains(['\n', '\r']) {
        return Err(AdrError::InvalidStatus(label.to_string()));
    }
    Ok(trimmed)
}

/// Append `(date, label)` to the record at `path`.
///
/// Invalid labels and parse failures abort before anything is written. A failed backup copy is
/// reported to `diag` and the write goes ahead; a failed write leaves the
/// original (and any backup) in place.
pub fn append_status(
    path: &Path,
    label: &str,
    date: NaiveDate,
    options: WriteOptions,
    diag: &dyn DiagnosticSink,
) -> Result<StatusEntry> {
    let label = validate_label(label)?;
    let raw = fs::read_to_string(path).map_err(|e| AdrError::io(path, e))?;
    let entry = StatusEntry::new(date.format(DATE_FORMAT).to_string(), label);
    let updated = insert_status_entry(&raw, &entry).map_err(|kind| AdrError::parse(path, kind))?;

    if options.backup {
        let bak = backup_path(path);
        match fs::copy(path, &bak) {
            Ok(_) => diag.debug(&format!("Backed up {} to {}", path.display(), bak.display())),
            Err(e) => diag.warn(&format!(
                "Could not back up {} to {}: {}",
                path.display(),
                bak.display(),
                e
            )),
        }
    }

    replace_file(path, updated.as_bytes())?;
    diag.debug(&format!(
        "Appended status '{}' to {}",
        entry.to_line(),
        path.display()
    ));
    Ok(entry)
}

/// Write `contents` to a temp file beside `path`, then rename it into place.
pub(crate) fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| AdrError::io(dir, e))?;
    tmp.write_all(contents).map_err(|e| AdrError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| AdrError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| AdrError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{NullSink, RecordingSink};
    use crate::parser::read_status_entries;
    use tempfile::TempDir;

    const RECORD: &str = "# 1. Use widgets\n\nDate: 2023-01-01\n\n## Status\n\n2023-01-01 Proposed\n\n## Context\n\nWidgets.\n";

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("accepted".parse::<Status>(), Ok(Status::Accepted));
        assert_eq!(" SUPERSEDED ".parse::<Status>(), Ok(Status::Superseded));
        let err = "maybe".parse::<Status>().unwrap_err();
        assert!(err.contains("Proposed"));
    }

    #[test]
    fn test_insertion_point() {
        let point = status_insertion_point(RECORD).unwrap();
        assert!(RECORD[..point].ends_with("2023-01-01 Proposed\n"));
        assert!(RECORD[point..].starts_with("\n## Context"));
    }

    #[test]
    fn test_insert_preserves_surrounding_bytes() {
        let entry = StatusEntry::new("2023-06-15", "Accepted");
        let updated = insert_status_entry(RECORD, &entry).unwrap();
        let point = status_insertion_point(RECORD).unwrap();

        assert!(updated.starts_with(&RECORD[..point]));
        assert!(updated.ends_with(&RECORD[point..]));
        assert_eq!(
            updated,
            "# 1. Use widgets\n\nDate: 2023-01-01\n\n## Status\n\n2023-01-01 Proposed\n\n2023-06-15 Accepted\n\n## Context\n\nWidgets.\n"
        );
    }

    #[test]
    fn test_insert_into_empty_section() {
        let raw = "# 1. T\n\n## Status\n\n## Context\n";
        let updated = insert_status_entry(raw, &StatusEntry::new("2023-06-15", "Proposed")).unwrap();
        assert_eq!(updated, "# 1. T\n\n## Status\n\n2023-06-15 Proposed\n\n## Context\n");
    }

    #[test]
    fn test_insert_at_end_of_document_without_newline() {
        let raw = "# 1. T\n\n## Status\n\n2023-01-01 Proposed";
        let updated = insert_status_entry(raw, &StatusEntry::new("2023-06-15", "Done")).unwrap();
        assert_eq!(
            read_status_entries(&updated).unwrap(),
            vec![
                StatusEntry::new("2023-01-01", "Proposed"),
                StatusEntry::new("2023-06-15", "Done"),
            ]
        );
    }

    #[test]
    fn test_insert_without_status_section_fails() {
        let raw = "# 1. T\n\n## Context\n";
        assert!(insert_status_entry(raw, &StatusEntry::new("2023-06-15", "Done")).is_err());
    }

    #[test]
    fn test_append_status_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("0001-use-widgets.md");
        fs::write(&path, RECORD).unwrap();

        let entry = append_status(
            &path,
            "Accepted",
            date("2023-06-15"),
            WriteOptions::default(),
            &NullSink,
        )
        .unwrap();
        assert_eq!(entry, StatusEntry::new("2023-06-15", "Accepted"));

        let raw = fs::read_to_string(&path).unwrap();
        let history = read_status_entries(&raw).unwrap();
        assert_eq!(history.last(), Some(&entry));
        assert_eq!(history.len(), 2);
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_append_status_with_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("0001-use-widgets.md");
        fs::write(&path, RECORD).unwrap();

        append_status(
            &path,
            "Done",
            date("2023-06-15"),
            WriteOptions { backup: true },
            &NullSink,
        )
        .unwrap();

        let bak = backup_path(&path);
        assert_eq!(bak.file_name().unwrap(), "0001-use-widgets.md.bak");
        assert_eq!(fs::read_to_string(bak).unwrap(), RECORD);
    }

    #[test]
    fn test_parse_failure_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("0002-broken.md");
        let broken = "# 2. Broken\n\nNo status here.\n";
        fs::write(&path, broken).unwrap();

        let err = append_status(
            &path,
            "Done",
            date("2023-06-15"),
            WriteOptions { backup: true },
            &NullSink,
        )
        .unwrap_err();
        assert!(matches!(err, AdrError::Parse { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), broken);
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_multiline_label_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("0001-use-widgets.md");
        fs::write(&path, RECORD).unwrap();

        let err = append_status(
            &path,
            "Accepted\n## Injected",
            date("2023-06-15"),
            WriteOptions { backup: true },
            &NullSink,
        )
        .unwrap_err();
        assert!(matches!(err, AdrError::InvalidStatus(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), RECORD);
        assert!(!backup_path(&path).exists());

        assert!(append_status(&path, "Done\r", date("2023-06-15"), WriteOptions::default(), &NullSink).is_ok());
    }

    #[test]
    fn test_blank_label_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("0001-use-widgets.md");
        fs::write(&path, RECORD).unwrap();

        for label in ["", "   ", "\t"] {
            let err = append_status(&path, label, date("2023-06-15"), WriteOptions::default(), &NullSink)
                .unwrap_err();
            assert!(matches!(err, AdrError::InvalidStatus(_)));
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), RECORD);
    }

    #[test]
    fn test_failed_backup_still_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("0001-use-widgets.md");
        fs::write(&path, RECORD).unwrap();
        // A directory in the way makes the copy fail
        fs::create_dir(backup_path(&path)).unwrap();
        let sink = RecordingSink::default();

        let entry = append_status(
            &path,
            "Accepted",
            date("2023-06-15"),
            WriteOptions { backup: true },
            &sink,
        )
        .unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(read_status_entries(&raw).unwrap().last(), Some(&entry));
        assert!(backup_path(&path).is_dir());
        let warnings = sink.warnings.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Could not back up"));
    }
}
