//! Project initialization for adrman
//!
//! `adrman init` creates the configuration, the records directory with its
//! templates, and (unless disabled) the first record.

use crate::config::{RepoConfig, CONFIG_FILE_NAME};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::repository::Repository;
use crate::templates::{LONG_TEMPLATE_FILE, SHORT_TEMPLATE_FILE};
use colored::Colorize;
use std::path::Path;

/// Initialize a repository in `root` and print what was created.
pub fn init_project(
    root: &Path,
    config: RepoConfig,
    first_record: bool,
    diag: Diagnostics,
) -> Result<Repository> {
    println!("\n{}", "Initializing decision records...".cyan().bold());
    println!("   Directory: {}\n", root.display());

    let repo = Repository::init(root, config, diag)?;
    let docs = repo.config().path.trim_end_matches('/').to_string();

    println!("   {} {}", "Creating".green(), CONFIG_FILE_NAME);
    println!("   {} {}/", "Creating".green(), docs);
    for template in [SHORT_TEMPLATE_FILE, LONG_TEMPLATE_FILE] {
        if repo.documents_dir().join(template).is_file() {
            println!("   {} {}", "Creating".green(), repo.relative_path(template));
        } else {
            println!("   {} {} (could not be written)", "Skipping".yellow(), template);
        }
    }

    if first_record {
        let filename = repo.create_first_record()?;
        println!("   {} {}", "Creating".green(), repo.relative_path(&filename));
        println!("   {} {}", "Updated".green(), repo.relative_path(crate::allocator::TOC_FILE_NAME));
    }

    println!("\n{}", "Decision records initialized!".green().bold());
    println!("\nNext steps:");
    println!("  1. Run {} to record a decision", "adrman new \"<title>\"".cyan());
    println!("  2. Run {} to see all records", "adrman list".cyan());
    println!("  3. Run {} to browse them", "adrman serve".cyan());
    println!();

    Ok(repo)
}
