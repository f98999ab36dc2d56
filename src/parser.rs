//! Structured-document parser for decision records
//!
//! A record looks like this:
//!
//! ```text
//! # 7. Use widgets
//!
//! Date: 2023-01-01
//!
//! ## Status
//!
//! 2023-01-01 Proposed
//!
//! 2023-02-01 Accepted
//!
//! ## Context
//! ...
//! ```
//!
//! Only the first heading (index and title) and the body of the `Status`
//! section carry structure; everything else is free prose.

use crate::error::ParseError;
use crate::markdown::{self, BlockKind, Document};
use serde::{Deserialize, Serialize};

/// Heading text of the status section.
pub const STATUS_SECTION: &str = "Status";

/// Index and title recovered from the first heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingInfo {
    pub index: u32,
    pub title: String,
}

/// One `(date, status)` line of the status section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub date: String,
    pub status: String,
}

impl StatusEntry {
    pub fn new(date: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            status: status.into(),
        }
    }

    /// Parse `"<date> <status>"`. The status is the second token only.
    pub fn from_line(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let date = tokens.next()?;
        let status = tokens.next().unwrap_or("");
        Some(Self::new(date, status))
    }

    /// The line as written into a record.
    pub fn to_line(&self) -> String {
        format!("{} {}", self.date, self.status)
    }
}

/// Handle to a section heading inside a scanned document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    /// Position of the heading in the document's block list
    pub block: usize,
}

/// Index and title from the first heading, which must read `"<index>. <title>"`.
pub fn extract_heading_info(raw: &str) -> Result<HeadingInfo, ParseError> {
    heading_info(&markdown::scan(raw))
}

pub(crate) fn heading_info(doc: &Document<'_>) -> Result<HeadingInfo, ParseError> {
    let heading = doc
        .first_heading()
        .map(|i| &doc.blocks[i])
        .ok_or(ParseError::NoHeadingFound)?;

    let mut tokens = heading.text.split_whitespace();
    let first = tokens.next().unwrap_or("");
    let malformed = || ParseError::MalformedHeading {
        token: first.to_string(),
    };

    let digits = first.strip_suffix('.').ok_or_else(malformed)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let index = digits.parse::<u32>().map_err(|_| malformed())?;
    let title = tokens.collect::<Vec<_>>().join(" ");

    Ok(HeadingInfo { index, title })
}

/// Locate the first heading named `name` (case-insensitive).
pub fn find_section(doc: &Document<'_>, name: &str) -> Result<Section, ParseError> {
    doc.find_heading(name)
        .map(|block| Section { block })
        .ok_or_else(|| ParseError::SectionNotFound {
            name: name.to_string(),
        })
}

/// All status entries in document order (oldest first).
pub fn read_status_entries(raw: &str) -> Result<Vec<StatusEntry>, ParseError> {
    status_entries(&markdown::scan(raw))
}

pub(crate) fn status_entries(doc: &Document<'_>) -> Result<Vec<StatusEntry>, ParseError> {
    let section = find_section(doc, STATUS_SECTION)?;
    Ok(doc
        .section_body(section.block)
        .iter()
        .filter(|block| block.kind == BlockKind::Text)
        .flat_map(|block| block.lines())
        .filter_map(StatusEntry::from_line)
        .collect())
}

/// Everything the listing needs from one record, parsed in a single scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFacts {
    pub heading: HeadingInfo,
    pub history: Vec<StatusEntry>,
}

impl RecordFacts {
    pub fn last_status(&self) -> Option<&StatusEntry> {
        self.history.last()
    }
}

/// Heading and status history together.
pub fn parse_record(raw: &str) -> Result<RecordFacts, ParseError> {
    let doc = markdown::scan(raw);
    Ok(RecordFacts {
        heading: heading_info(&doc)?,
        history: status_entries(&doc)?,
    })
}
