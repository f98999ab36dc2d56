//! Minimal Markdown block scanner
//!
//! Records only need block boundaries: ATX headings, fenced code, and
//! blank-line separated text blocks. Every block keeps its byte span in
//! the source so callers can splice text in without re-rendering anything.

/// What a block is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `#` to `######` heading
    Heading { level: u8 },
    /// Consecutive non-blank lines
    Text,
    /// Fenced code, fence lines included
    Code,
}

/// One block of a scanned document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub kind: BlockKind,
    /// Heading text without the `#` markers, or the raw lines of the block
    pub text: &'a str,
    /// Byte offset of the first line
    pub start: usize,
    /// Byte offset just past the line break of the last line
    pub end: usize,
}

impl<'a> Block<'a> {
    pub fn is_heading(&self) -> bool {
        matches!(self.kind, BlockKind::Heading { .. })
    }

    /// Non-blank lines of the block, trimmed.
    pub fn lines(&self) -> impl Iterator<Item = &'a str> {
        self.text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }
}

/// A scanned document: the source plus its blocks in order.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    pub source: &'a str,
    pub blocks: Vec<Block<'a>>,
}

impl<'a> Document<'a> {
    /// Position of the first heading block.
    pub fn first_heading(&self) -> Option<usize> {
        self.blocks.iter().position(Block::is_heading)
    }

    /// Position of the first heading whose text equals `name`, ignoring case.
    pub fn find_heading(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.blocks
            .iter()
            .position(|b| b.is_heading() && b.text.to_lowercase() == wanted)
    }

    /// Blocks after `heading` up to (not including) the next heading.
    pub fn section_body(&self, heading: usize) -> &[Block<'a>] {
        let from = (heading + 1).min(self.blocks.len());
        let to = self.blocks[from..]
            .iter()
            .position(Block::is_heading)
            .map(|offset| from + offset)
            .unwrap_or(self.blocks.len());
        &self.blocks[from..to]
    }
}

/// A physical line: content without the line break, and the offset after the break.
struct Line<'a> {
    start: usize,
    content: &'a str,
    end: usize,
}

fn split_lines(source: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;
    while start < source.len() {
        let rest = &source[start..];
        let (content_len, end) = match rest.find('\n') {
            Some(pos) => (pos, start + pos + 1),
            None => (rest.len(), source.len()),
        };
        let content = rest[..content_len].trim_end_matches('\r');
        lines.push(Line {
            start,
            content,
            end,
        });
        start = end;
    }
    lines
}

/// Strip up to three spaces of indentation, as CommonMark allows for block markers.
fn strip_indent(line: &str) -> Option<&str> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        None
    } else {
        Some(&line[indent..])
    }
}

/// Parse an ATX heading line into `(level, text)`.
fn atx_heading(line: &str) -> Option<(u8, &str)> {
    let line = strip_indent(line)?;
    let level = line.len() - line.trim_start_matches('#').len();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let mut text = rest.trim();
    // Optional closing sequence: "## Status ##"
    let without_closing = text.trim_end_matches('#');
    if without_closing.is_empty() || without_closing.ends_with([' ', '\t']) {
        text = without_closing.trim_end();
    }
    Some((level as u8, text))
}

/// Opening fence marker (character and run length).
fn fence_open(line: &str) -> Option<(char, usize)> {
    let line = strip_indent(line)?;
    let marker = line.chars().next()?;
    if marker != '`' && marker != '~' {
        return None;
    }
    let run = line.len() - line.trim_start_matches(marker).len();
    (run >= 3).then_some((marker, run))
}

fn fence_closes(line: &str, marker: char, run: usize) -> bool {
    strip_indent(line)
        .map(|l| {
            let len = l.len() - l.trim_start_matches(marker).len();
            len >= run && l[len..].trim().is_empty()
        })
        .unwrap_or(false)
}

fn close_text<'a>(
    source: &'a str,
    open: &mut Option<(usize, usize, usize)>,
    blocks: &mut Vec<Block<'a>>,
) {
    if let Some((start, end, content_end)) = open.take() {
        blocks.push(Block {
            kind: BlockKind::Text,
            text: &source[start..content_end],
            start,
            end,
        });
    }
}

/// Scan `source` into blocks.
pub fn scan(source: &str) -> Document<'_> {
    let lines = split_lines(source);
    let mut blocks = Vec::new();
    // Open text block: (start offset, end offset, end of last content)
    let mut open: Option<(usize, usize, usize)> = None;

    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];

        if line.content.trim().is_empty() {
            close_text(source, &mut open, &mut blocks);
            i += 1;
            continue;
        }

        if let Some((level, text)) = atx_heading(line.content) {
            close_text(source, &mut open, &mut blocks);
            blocks.push(Block {
                kind: BlockKind::Heading { level },
                text,
                start: line.start,
                end: line.end,
            });
            i += 1;
            continue;
        }

        if let Some((marker, run)) = fence_open(line.content) {
            close_text(source, &mut open, &mut blocks);
            let start = line.start;
            let mut j = i + 1;
            while j < lines.len() && !fence_closes(lines[j].content, marker, run) {
                j += 1;
            }
            // Unclosed fences run to the end of the document
            let last = j.min(lines.len() - 1);
            let content_end = lines[last].start + lines[last].content.len();
            blocks.push(Block {
                kind: BlockKind::Code,
                text: &source[start..content_end],
                start,
                end: lines[last].end,
            });
            i = last + 1;
            continue;
        }

        let content_end = line.start + line.content.len();
        open = match open {
            Some((start, _, _)) => Some((start, line.end, content_end)),
            None => Some((line.start, line.end, content_end)),
        };
        i += 1;
    }
    close_text(source, &mut open, &mut blocks);

    Document { source, blocks }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = "# 1. Record decisions\n\nDate: 2023-01-01\n\n## Status\n\n2023-01-01 Proposed\n\n## Context\n\nWe need it.\nReally.\n";

    #[test]
    fn test_scan_blocks() {
        let doc = scan(RECORD);
        let kinds: Vec<BlockKind> = doc.blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Heading { level: 1 },
                BlockKind::Text,
                BlockKind::Heading { level: 2 },
                BlockKind::Text,
                BlockKind::Heading { level: 2 },
                BlockKind::Text,
            ]
        );
        assert_eq!(doc.blocks[0].text, "1. Record decisions");
        assert_eq!(doc.blocks[5].text, "We need it.\nReally.");
    }

    #[test]
    fn test_block_spans_include_line_break() {
        let doc = scan(RECORD);
        let status_entry = &doc.blocks[3];
        assert_eq!(&RECORD[status_entry.start..status_entry.end], "2023-01-01 Proposed\n");
    }

    #[test]
    fn test_last_line_without_newline() {
        let source = "# Title\n\ntext";
        let doc = scan(source);
        assert_eq!(doc.blocks[1].end, source.len());
        assert_eq!(doc.blocks[1].text, "text");
    }

    #[test]
    fn test_heading_needs_space() {
        let doc = scan("#hashtag\n");
        assert_eq!(doc.blocks[0].kind, BlockKind::Text);
        let doc = scan("####### seven\n");
        assert_eq!(doc.blocks[0].kind, BlockKind::Text);
    }

    #[test]
    fn test_heading_closing_sequence() {
        let doc = scan("## Status ##\n");
        assert_eq!(doc.blocks[0].text, "Status");
        let doc = scan("# C#\n");
        assert_eq!(doc.blocks[0].text, "C#");
    }

    #[test]
    fn test_heading_interrupts_text() {
        let doc = scan("some text\n## Status\nmore\n");
        assert_eq!(doc.blocks.len(), 3);
        assert!(doc.blocks[1].is_heading());
    }

    #[test]
    fn test_fenced_code_hides_headings() {
        let source = "# 1. Title\n\n```\n# not a heading\n```\n\n## Status\n";
        let doc = scan(source);
        assert_eq!(doc.blocks[1].kind, BlockKind::Code);
        assert_eq!(doc.find_heading("not a heading"), None);
        assert_eq!(doc.find_heading("status"), Some(2));
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let doc = scan("~~~\ncode\n## inside\n");
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].kind, BlockKind::Code);
    }

    #[test]
    fn test_crlf_lines() {
        let source = "# 2. Windows\r\n\r\n## Status\r\n\r\n2023-02-02 Accepted\r\n";
        let doc = scan(source);
        assert_eq!(doc.blocks[0].text, "2. Windows");
        assert_eq!(doc.blocks[2].text, "2023-02-02 Accepted");
        assert_eq!(doc.blocks[2].end, source.len());
    }

    #[test]
    fn test_section_body() {
        let doc = scan(RECORD);
        let status = doc.find_heading("STATUS").unwrap();
        let body = doc.section_body(status);
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].text, "2023-01-01 Proposed");

        let context = doc.find_heading("context").unwrap();
        assert_eq!(doc.section_body(context).len(), 1);
    }
}
