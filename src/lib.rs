//! adrman - Architecture decision records, managed from the command line
//!
//! Create, number, list, search and export decision records kept as plain
//! Markdown files, and keep a generated table of contents in sync.
//!
//! # Record layout
//!
//! | Part | Convention |
//! |------|------------|
//! | Filename | `<prefix><zero-padded index>-<slug>.md` |
//! | First heading | `# <index>. <title>` |
//! | Status section | `## Status` followed by one `<date> <status>` line per change |
//!
//! # Quick Start
//!
//! ```no_run
//! use adrman::{null_sink, Repository};
//!
//! let repo = Repository::open(".", null_sink()).unwrap();
//!
//! // Record a decision
//! let file = repo.create_document_with_template("Use PostgreSQL", None).unwrap();
//!
//! // Move it along
//! repo.append_status(1, "Accepted").unwrap();
//!
//! for record in repo.list_all_statuses().unwrap() {
//!     println!("{} {} [{}]", record.index, record.title, record.last_status);
//! }
//! # let _ = file;
//! ```

pub mod allocator;
pub mod config;
pub mod diagnostics;
pub mod editor;
pub mod error;
pub mod export;
pub mod init;
pub mod markdown;
pub mod parser;
pub mod repository;
pub mod serve;
pub mod slug;
pub mod status;
pub mod templates;

pub use config::{RepoConfig, UserConfig};
pub use diagnostics::{null_sink, tracing_sink, DiagnosticSink, Diagnostics, NullSink, TracingSink};
pub use error::{AdrError, ParseError, Result};
pub use export::ExportFormat;
pub use parser::{extract_heading_info, parse_record, read_status_entries, HeadingInfo, StatusEntry};
pub use repository::{DocumentStatus, Repository, UpdateReport};
pub use status::Status;
