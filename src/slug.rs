//! Filename slugs for record titles

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SEPARATORS: Regex = Regex::new(r"[\s_-]+").expect("valid separator regex");
    static ref REMOVED: Regex = Regex::new(r"[#,.]+").expect("valid removal regex");
    static ref PUNCTUATION: Regex = Regex::new(r"[:?]+").expect("valid punctuation regex");
}

/// Lowercase, trimmed, whitespace/underscore/hyphen runs collapsed to one
/// hyphen, `# , .` removed, `: ?` runs turned into hyphens.
///
/// `"Use PostgreSQL: Pros & Cons?"` becomes `"use-postgresql--pros-&-cons"`.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let trimmed = lower.trim_matches(|c: char| c.is_whitespace() || c == '-');
    let slug = SEPARATORS.replace_all(trimmed, "-");
    let slug = REMOVED.replace_all(&slug, "");
    let slug = PUNCTUATION.replace_all(&slug, "-");
    slug.trim_matches('-').to_string()
}
