//! Repository manager
//!
//! A repository is a working directory with a `.adr.json` configuration and
//! a records directory. Every operation re-reads the directory from disk;
//! nothing is cached between calls.

use crate::allocator::{self, ListOptions, DOC_EXTENSION, TOC_FILE_NAME};
use crate::config::RepoConfig;
use crate::diagnostics::{DiagnosticSink, Diagnostics};
use crate::error::{AdrError, Result};
use crate::parser::{self, StatusEntry};
use crate::slug::slugify;
use crate::status::{self, WriteOptions, DATE_FORMAT};
use crate::templates::{self, TemplateVars};
use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// First line of the generated table of contents.
pub const TOC_HEADER: &str = "# Architecture Decision Records\n\n";

/// Summary of one record for listings and exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatus {
    pub index: u32,
    pub title: String,
    /// Date of the newest status entry, empty if there is none
    pub last_modified: String,
    /// Label of the newest status entry, empty if there is none
    pub last_status: String,
    pub filename: String,
}

/// A record that a bulk operation could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDocument {
    pub filename: String,
    pub reason: String,
}

/// Result of scanning every record for its status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusScan {
    pub records: Vec<DocumentStatus>,
    pub skipped: Vec<SkippedDocument>,
}

/// One line of the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub index: u32,
    pub title: String,
    pub relative_path: String,
    pub filename: String,
}

/// A file renamed by [`Repository::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

/// Outcome of [`Repository::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub renamed: Vec<Rename>,
    pub unchanged: usize,
    pub skipped: Vec<SkippedDocument>,
}

impl UpdateReport {
    /// Records that were renamed or already had their canonical name.
    pub fn succeeded(&self) -> usize {
        self.renamed.len() + self.unchanged
    }
}

/// Today's date in the local timezone.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Title guessed from a filename like `0007-use-widgets.md` ("use widgets").
/// Only a fallback: the heading inside the record is authoritative.
pub fn title_from_filename(filename: &str, digits: usize, prefix: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    let rest = stem.strip_prefix(prefix).unwrap_or(stem);
    let rest = match allocator::parse_filename_index(rest, digits, "") {
        Some(_) => rest.trim_start_matches(|c: char| c.is_ascii_digit()),
        None => rest,
    };
    rest.trim_start_matches('-').replace('-', " ")
}

/// A decision record repository rooted at a working directory.
pub struct Repository {
    root: PathBuf,
    config: RepoConfig,
    diag: Diagnostics,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .field("config", &self.config)
            .finish()
    }
}

impl Repository {
    /// Open the repository whose `.adr.json` lives in `root`.
    pub fn open(root: impl Into<PathBuf>, diag: Diagnostics) -> Result<Self> {
        let root = root.into();
        let config = RepoConfig::load(&root)?;
        diag.debug(&format!(
            "Opened repository at {} (records in {})",
            root.display(),
            config.path
        ));
        Ok(Self { root, config, diag })
    }

    /// Open the repository in the current working directory.
    pub fn open_current(diag: Diagnostics) -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|e| AdrError::io(".", e))?;
        Self::open(cwd, diag)
    }

    /// Build a repository handle without touching the disk.
    pub fn with_config(root: impl Into<PathBuf>, config: RepoConfig, diag: Diagnostics) -> Self {
        Self {
            root: root.into(),
            config,
            diag,
        }
    }

    /// Set up a new repository in `root`: configuration file, records
    /// directory and the short/long templates for the configured language.
    pub fn init(root: impl Into<PathBuf>, config: RepoConfig, diag: Diagnostics) -> Result<Self> {
        let root = root.into();
        let config_path = RepoConfig::file_path(&root);
        if config_path.exists() {
            return Err(AdrError::AlreadyInitialized { path: config_path });
        }
        config.validate(&config_path)?;

        config.store(&root)?;
        let repo = Self::with_config(root, config, diag);

        let dir = repo.documents_dir();
        fs::create_dir_all(&dir).map_err(|e| AdrError::io(&dir, e))?;

        if !templates::is_supported_language(&repo.config.language) {
            repo.diag.warn(&format!(
                "No templates for language '{}', using English",
                repo.config.language
            ));
        }
        let set = templates::for_language(&repo.config.language);
        for (name, text) in [
            (templates::SHORT_TEMPLATE_FILE, set.short),
            (templates::LONG_TEMPLATE_FILE, set.long),
        ] {
            let path = dir.join(name);
            match fs::write(&path, text) {
                Ok(()) => repo.diag.debug(&format!("Wrote template {}", path.display())),
                Err(e) => repo
                    .diag
                    .warn(&format!("Could not write template {}: {}", path.display(), e)),
            }
        }

        Ok(repo)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &dyn DiagnosticSink {
        self.diag.as_ref()
    }

    /// Absolute path of the records directory.
    pub fn documents_dir(&self) -> PathBuf {
        self.config.documents_dir(&self.root)
    }

    /// Path of the generated table of contents.
    pub fn toc_path(&self) -> PathBuf {
        self.documents_dir().join(TOC_FILE_NAME)
    }

    fn list_options(&self) -> ListOptions<'_> {
        ListOptions::new(&self.config.template_name)
    }

    /// Record filenames, sorted by name.
    pub fn document_files(&self) -> Result<Vec<String>> {
        allocator::list_document_files(&self.documents_dir(), &self.list_options())
    }

    /// Path of a record as written in the TOC: the records directory from the
    /// configuration joined with the filename.
    pub fn relative_path(&self, filename: &str) -> String {
        let dir = self.config.path.trim_end_matches('/');
        if dir.is_empty() || dir == "." {
            filename.to_string()
        } else {
            format!("{}/{}", dir, filename)
        }
    }

    /// Raw text of the record file `filename` in the records directory.
    pub fn read_file(&self, filename: &str) -> Result<String> {
        let path = self.documents_dir().join(filename);
        fs::read_to_string(&path).map_err(|e| AdrError::io(&path, e))
    }

    /// Canonical filename for a record: `<prefix><index>-<slug>.md`.
    pub fn canonical_filename(&self, index: u32, title: &str) -> String {
        let number = allocator::format_index(index, self.config.digits, &self.config.prefix);
        format!("{}-{}.{}", number, slugify(title), DOC_EXTENSION)
    }

    /// Create a record with today's date. Returns the new filename.
    pub fn create_document(&self, title: &str, template_text: &str) -> Result<String> {
        self.create_document_on(title, template_text, today())
    }

    /// Create a record dated `date` from `template_text`, then rewrite the TOC.
    pub fn create_document_on(
        &self,
        title: &str,
        template_text: &str,
        date: NaiveDate,
    ) -> Result<String> {
        let title = title.trim();
        let dir = self.documents_dir();
        let (index, _) = allocator::next_index(
            &dir,
            &self.list_options(),
            self.config.digits,
            &self.config.prefix,
            self.diag.as_ref(),
        )?;

        let filename = self.canonical_filename(index, title);
        // The heading carries the bare number so it always parses back
        let number = allocator::format_index(index, self.config.digits, "");
        let date = date.format(DATE_FORMAT).to_string();
        let vars = TemplateVars {
            number: &number,
            title,
            date: &date,
        };
        let content = templates::render(template_text, &vars);

        let path = dir.join(&filename);
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| AdrError::io(&path, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| AdrError::io(&path, e))?;
        self.diag.debug(&format!("Created record {}", path.display()));

        self.write_toc()?;
        Ok(filename)
    }

    /// Create a record from a template file in the records directory.
    /// Without `template_name` the configured template is used; an unreadable
    /// template falls back to the built-in short template.
    pub fn create_document_with_template(
        &self,
        title: &str,
        template_name: Option<&str>,
    ) -> Result<String> {
        let template = self.load_template(template_name.unwrap_or(&self.config.template_name));
        self.create_document(title, &template)
    }

    /// Create the "Record architecture decisions" record, status Accepted.
    pub fn create_first_record(&self) -> Result<String> {
        self.create_document(templates::FIRST_RECORD_TITLE, templates::FIRST_RECORD)
    }

    /// Template text from the records directory, or the built-in short template.
    pub fn load_template(&self, name: &str) -> String {
        let path = self.documents_dir().join(name);
        match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                self.diag.warn(&format!(
                    "Could not read template {}: {}; using the standard template",
                    path.display(),
                    e
                ));
                templates::for_language(&self.config.language)
                    .short
                    .to_string()
            }
        }
    }

    /// Index, title and path of every parsable record, ordered by index.
    pub fn toc_entries(&self) -> Result<Vec<TocEntry>> {
        let mut entries = Vec::new();
        for filename in self.document_files()? {
            let raw = match self.read_file(&filename) {
                Ok(raw) => raw,
                Err(e) => {
                    self.diag.warn(&format!("Skipping {} in TOC: {}", filename, e));
                    continue;
                }
            };
            match parser::extract_heading_info(&raw) {
                Ok(info) => entries.push(TocEntry {
                    index: info.index,
                    title: info.title,
                    relative_path: self.relative_path(&filename),
                    filename,
                }),
                Err(kind) => self
                    .diag
                    .warn(&format!("Skipping {} in TOC: {}", filename, kind)),
            }
        }
        entries.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.filename.cmp(&b.filename)));
        Ok(entries)
    }

    /// Render the table of contents.
    pub fn regenerate_toc(&self) -> Result<String> {
        Ok(render_toc(&self.toc_entries()?))
    }

    /// Render and overwrite `README.md` in the records directory.
    pub fn write_toc(&self) -> Result<PathBuf> {
        let toc = self.regenerate_toc()?;
        let path = self.toc_path();
        fs::write(&path, toc).map_err(|e| AdrError::io(&path, e))?;
        self.diag.debug(&format!("Wrote {}", path.display()));
        Ok(path)
    }

    /// Filename of the record with `index`.
    pub fn lookup_filename_by_index(&self, index: u32) -> Result<String> {
        self.document_files()?
            .into_iter()
            .find(|name| {
                allocator::parse_filename_index(name, self.config.digits, &self.config.prefix)
                    == Some(index)
            })
            .ok_or(AdrError::IndexNotFound(index))
    }

    /// Full path of the record with `index`.
    pub fn find_document_path(&self, index: u32) -> Result<PathBuf> {
        let filename = self.lookup_filename_by_index(index)?;
        Ok(self.documents_dir().join(filename))
    }

    /// Raw text of the record with `index`.
    pub fn read_document(&self, index: u32) -> Result<String> {
        let path = self.find_document_path(index)?;
        fs::read_to_string(&path).map_err(|e| AdrError::io(&path, e))
    }

    /// Status history of the record with `index`, oldest first.
    pub fn status_history(&self, index: u32) -> Result<Vec<StatusEntry>> {
        let path = self.find_document_path(index)?;
        let raw = fs::read_to_string(&path).map_err(|e| AdrError::io(&path, e))?;
        parser::read_status_entries(&raw).map_err(|kind| AdrError::parse(&path, kind))
    }

    /// Append `label` with today's date to the record with `index`.
    pub fn append_status(&self, index: u32, label: &str) -> Result<StatusEntry> {
        self.append_status_on(index, label, today())
    }

    /// Append `label` dated `date` to the record with `index`.
    pub fn append_status_on(&self, index: u32, label: &str, date: NaiveDate) -> Result<StatusEntry> {
        let path = self.find_document_path(index)?;
        let options = WriteOptions {
            backup: self.config.backup,
        };
        status::append_status(&path, label, date, options, self.diag.as_ref())
    }

    /// Every record with its newest status, ordered by index, plus the
    /// records that could not be parsed.
    pub fn scan_statuses(&self) -> Result<StatusScan> {
        let mut scan = StatusScan::default();
        for filename in self.document_files()? {
            let parsed = self.read_file(&filename).and_then(|raw| {
                parser::parse_record(&raw)
                    .map_err(|kind| AdrError::parse(self.documents_dir().join(&filename), kind))
            });
            match parsed {
                Ok(facts) => {
                    let (last_modified, last_status) = facts
                        .last_status()
                        .map(|e| (e.date.clone(), e.status.clone()))
                        .unwrap_or_default();
                    scan.records.push(DocumentStatus {
                        index: facts.heading.index,
                        title: facts.heading.title,
                        last_modified,
                        last_status,
                        filename,
                    });
                }
                Err(e) => {
                    self.diag.warn(&format!("Skipping {}: {}", filename, e));
                    scan.skipped.push(SkippedDocument {
                        filename,
                        reason: e.to_string(),
                    });
                }
            }
        }
        scan.records
            .sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.filename.cmp(&b.filename)));
        self.diag.debug(&format!(
            "Loaded {} records, skipped {}",
            scan.records.len(),
            scan.skipped.len()
        ));
        Ok(scan)
    }

    /// Every parsable record with its newest status, ordered by index.
    pub fn list_all_statuses(&self) -> Result<Vec<DocumentStatus>> {
        self.scan_statuses().map(|scan| scan.records)
    }

    /// Filenames of the records whose text matches every keyword.
    /// Keywords are regular expressions.
    pub fn filter_documents_by_keywords(
        &self,
        keywords: &[String],
        case_sensitive: bool,
    ) -> Result<Vec<String>> {
        let patterns = compile_keywords(keywords, case_sensitive)?;
        let mut matches = Vec::new();
        for filename in self.document_files()? {
            let raw = match self.read_file(&filename) {
                Ok(raw) => raw,
                Err(e) => {
                    self.diag.warn(&format!("Skipping {} in search: {}", filename, e));
                    continue;
                }
            };
            if patterns.iter().all(|re| re.is_match(&raw)) {
                matches.push(filename);
            }
        }
        Ok(matches)
    }

    /// Rename every record whose filename no longer matches its heading,
    /// then rewrite the TOC. Failures are isolated per record.
    pub fn update(&self) -> Result<UpdateReport> {
        let dir = self.documents_dir();
        let mut report = UpdateReport::default();

        for filename in self.document_files()? {
            match self.resync_filename(&dir, &filename) {
                Ok(Some(target)) => {
                    self.diag
                        .debug(&format!("Renamed {} to {}", filename, target));
                    report.renamed.push(Rename {
                        from: filename,
                        to: target,
                    });
                }
                Ok(None) => report.unchanged += 1,
                Err(e) => {
                    self.diag.warn(&format!("Could not update {}: {}", filename, e));
                    report.skipped.push(SkippedDocument {
                        filename,
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.write_toc()?;
        Ok(report)
    }

    /// Rename one record to its canonical name. `None` if it already has it.
    fn resync_filename(&self, dir: &Path, filename: &str) -> Result<Option<String>> {
        let path = dir.join(filename);
        let raw = fs::read_to_string(&path).map_err(|e| AdrError::io(&path, e))?;
        let info = parser::extract_heading_info(&raw).map_err(|kind| AdrError::parse(&path, kind))?;

        let target = self.canonical_filename(info.index, &info.title);
        if target == filename {
            return Ok(None);
        }

        let target_path = dir.join(&target);
        if target_path.exists() {
            return Err(AdrError::io(
                &target_path,
                std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "target filename is already taken",
                ),
            ));
        }
        fs::rename(&path, &target_path).map_err(|e| AdrError::io(&path, e))?;
        Ok(Some(target))
    }
}

/// Render the TOC markdown for `entries` in the given order.
pub fn render_toc(entries: &[TocEntry]) -> String {
    let mut toc = String::from(TOC_HEADER);
    for entry in entries {
        toc.push_str(&format!(
            "\n* [{}. {}]({})",
            entry.index, entry.title, entry.relative_path
        ));
    }
    toc.push('\n');
    toc
}

fn compile_keywords(keywords: &[String], case_sensitive: bool) -> Result<Vec<Regex>> {
    keywords
        .iter()
        .map(|keyword| {
            RegexBuilder::new(keyword)
                .case_insensitive(!case_sensitive)
                .build()
                .map_err(|source| AdrError::InvalidKeyword {
                    keyword: keyword.clone(),
                    source,
                })
        })
        .collect()
}
