use adrman::editor;
use adrman::export::{self, ExportFormat};
use adrman::init::init_project;
use adrman::repository::title_from_filename;
use adrman::{tracing_sink, AdrError, Diagnostics, RepoConfig, Repository, Status, UserConfig};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::{ColoredString, Colorize};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "adrman")]
#[command(author, version, about = "Manage architecture decision records")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Show detailed progress on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set up a decision record repository in the current directory
    Init {
        /// Directory where records are stored
        #[arg(short, long, default_value = "docs/adr/")]
        path: String,

        /// Prefix written in front of every record number
        #[arg(short = 'x', long, default_value = "")]
        prefix: String,

        /// Number of digits of record numbers
        #[arg(short, long, default_value_t = 4)]
        digits: usize,

        /// Language of the generated templates (en, de)
        #[arg(short, long, default_value = "en")]
        lang: String,

        /// Template used for new records
        #[arg(short, long, default_value = "template-short.md")]
        template: String,

        /// Don't create the "Record architecture decisions" record
        #[arg(long)]
        no_first_record: bool,

        /// Keep a .bak copy of a record before its status is changed
        #[arg(long)]
        backup: bool,
    },

    /// Create a new record
    New {
        /// Title of the decision
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,

        /// Template file (in the records directory) to use instead of the configured one
        #[arg(short, long)]
        template: Option<String>,
    },

    /// List all records with their current status
    List,

    /// Change the status of a record (asks when no status is given)
    Status {
        /// Record index
        #[arg(value_parser = parse_index)]
        index: u32,

        /// New status, e.g. Accepted
        status: Option<String>,
    },

    /// Show the status history of a record
    Logs {
        /// Record index
        #[arg(value_parser = parse_index)]
        index: u32,
    },

    /// Open a record in an editor
    Edit {
        /// Record index
        #[arg(value_parser = parse_index)]
        index: u32,

        /// Editor command (default: user config, then $EDITOR)
        #[arg(short, long)]
        editor: Option<String>,
    },

    /// Find records containing all keywords (regular expressions)
    Search {
        #[arg(required = true, num_args = 1..)]
        keywords: Vec<String>,

        /// Match case exactly
        #[arg(short, long)]
        case_sensitive: bool,
    },

    /// Rename records to match their titles and rewrite the table of contents
    Update,

    /// Export all records as csv, json or html
    Export {
        /// Output format
        format: String,

        /// Write export.<format> instead of printing
        #[arg(short, long)]
        store: bool,
    },

    /// Rewrite the table of contents (README.md)
    Toc,

    /// Serve the records over HTTP
    Serve {
        /// Address to bind
        #[arg(short, long, default_value = "localhost")]
        address: String,

        /// Port to listen on
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },

    /// Show or change the user configuration (~/.adrman.toml)
    Config {
        /// Default editor command
        #[arg(short, long)]
        editor: Option<String>,

        /// Path of a central record store
        #[arg(short, long)]
        store: Option<String>,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        shell: Shell,
    },
}

fn parse_index(s: &str) -> Result<u32, AdrError> {
    let trimmed = s.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AdrError::InvalidIndex(s.to_string()));
    }
    trimmed
        .parse()
        .map_err(|_| AdrError::InvalidIndex(s.to_string()))
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("warn,adrman={}", level))),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command, tracing_sink()) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn current_dir() -> adrman::Result<PathBuf> {
    std::env::current_dir().map_err(|e| AdrError::Io {
        path: PathBuf::from("."),
        source: e,
    })
}

fn run(command: Command, diag: Diagnostics) -> adrman::Result<()> {
    match command {
        Command::Init {
            path,
            prefix,
            digits,
            lang,
            template,
            no_first_record,
            backup,
        } => {
            let config = RepoConfig {
                language: lang,
                path,
                prefix,
                digits,
                template_name: template,
                backup,
            };
            init_project(&current_dir()?, config, !no_first_record, diag)?;
        }

        Command::New { title, template } => {
            let repo = Repository::open_current(diag)?;
            let title = title.join(" ");
            let filename = repo.create_document_with_template(&title, template.as_deref())?;
            println!("{} {}", "Created".green(), repo.relative_path(&filename));
        }

        Command::List => {
            let repo = Repository::open_current(diag)?;
            let scan = repo.scan_statuses()?;
            if scan.records.is_empty() {
                println!("No decision records yet. Create one with {}", "adrman new".cyan());
            }
            for record in &scan.records {
                println!(
                    "{:>5}  {:<10}  {}  {}",
                    record.index,
                    record.last_modified,
                    colored_status(&record.last_status),
                    record.title
                );
            }
            if !scan.skipped.is_empty() {
                eprintln!(
                    "{} {} record(s) could not be parsed (run with --verbose for details)",
                    "Skipped".yellow(),
                    scan.skipped.len()
                );
            }
        }

        Command::Status { index, status } => {
            let repo = Repository::open_current(diag)?;
            // Fail on unknown index before prompting
            let filename = repo.lookup_filename_by_index(index)?;
            let label = match status {
                Some(label) => label,
                None => prompt_status(&filename)?,
            };
            let entry = repo.append_status(index, &label)?;
            println!(
                "{} {} to {} ({})",
                "Set".green(),
                repo.relative_path(&filename),
                colored_status(&entry.status),
                entry.date
            );
        }

        Command::Logs { index } => {
            let repo = Repository::open_current(diag)?;
            let history = repo.status_history(index)?;
            if history.is_empty() {
                println!("No status entries for record {}", index);
            }
            for entry in history {
                println!("{}  {}", entry.date, colored_status(&entry.status));
            }
        }

        Command::Edit { index, editor } => {
            let repo = Repository::open_current(diag)?;
            let path = repo.find_document_path(index)?;
            let user = UserConfig::load();
            let Some(command) =
                editor::resolve_editor(editor.as_deref(), &user, std::env::var("EDITOR").ok())
            else {
                eprintln!(
                    "{} no editor configured: pass --editor, run 'adrman config --editor <cmd>' or set $EDITOR",
                    "Error:".red().bold()
                );
                std::process::exit(1);
            };
            editor::spawn_editor(&command, &path, repo.diagnostics())?;
            println!("{} {} in {}", "Opened".green(), path.display(), command);
        }

        Command::Search {
            keywords,
            case_sensitive,
        } => {
            let repo = Repository::open_current(diag)?;
            let matches = repo.filter_documents_by_keywords(&keywords, case_sensitive)?;
            for filename in &matches {
                let title = std::fs::read_to_string(repo.documents_dir().join(filename))
                    .ok()
                    .and_then(|raw| adrman::extract_heading_info(&raw).ok())
                    .map(|info| info.title)
                    .unwrap_or_else(|| {
                        let config = repo.config();
                        title_from_filename(filename, config.digits, &config.prefix)
                    });
                println!("{}  {}", repo.relative_path(filename).cyan(), title);
            }
            eprintln!("{} matching record(s)", matches.len());
        }

        Command::Update => {
            let repo = Repository::open_current(diag)?;
            let report = repo.update()?;
            for rename in &report.renamed {
                println!("   {} {} -> {}", "Renamed".green(), rename.from, rename.to);
            }
            for skipped in &report.skipped {
                println!("   {} {}: {}", "Skipping".yellow(), skipped.filename, skipped.reason);
            }
            println!(
                "{} records up to date, {} skipped",
                report.succeeded(),
                report.skipped.len()
            );
        }

        Command::Export { format, store } => {
            let format: ExportFormat = format.parse()?;
            let repo = Repository::open_current(diag)?;
            let output = export::export(&repo, format)?;
            if store {
                let path = current_dir()?.join(format.file_name());
                std::fs::write(&path, output).map_err(|e| AdrError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                println!("{} {}", "Wrote".green(), format.file_name());
            } else {
                println!("{}", output);
            }
        }

        Command::Toc => {
            let repo = Repository::open_current(diag)?;
            repo.write_toc()?;
            println!(
                "{} {}",
                "Updated".green(),
                repo.relative_path(adrman::allocator::TOC_FILE_NAME)
            );
        }

        Command::Serve { address, port } => {
            let repo = Repository::open_current(diag.clone())?;
            if let Err(e) = adrman::serve::start_server(repo.root(), &address, port, diag) {
                eprintln!("{} {}", "Server error:".red().bold(), e);
                std::process::exit(1);
            }
        }

        Command::Config { editor, store } => {
            let Some(path) = UserConfig::path() else {
                eprintln!("{} could not determine the home directory", "Error:".red().bold());
                std::process::exit(1);
            };
            let mut config = UserConfig::load_from(&path);
            if editor.is_some() || store.is_some() {
                if editor.is_some() {
                    config.editor = editor;
                }
                if store.is_some() {
                    config.central_store = store;
                }
                config.store_to(&path)?;
                println!("{} {}", "Updated".green(), path.display());
            }
            println!("editor        = {}", config.editor.as_deref().unwrap_or("(not set)"));
            println!(
                "central_store = {}",
                config.central_store.as_deref().unwrap_or("(not set)")
            );
        }

        Command::Completion { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "adrman", &mut io::stdout());
        }
    }
    Ok(())
}

/// Status label coloured by its meaning; unknown labels stay plain.
fn colored_status(label: &str) -> ColoredString {
    let padded = format!("{:<10}", label);
    match label.parse::<Status>() {
        Ok(Status::Proposed) => padded.yellow(),
        Ok(Status::Accepted) => padded.green(),
        Ok(Status::Done) => padded.blue(),
        Ok(Status::Deprecated) => padded.red(),
        Ok(Status::Superseded) => padded.magenta(),
        Err(_) => padded.normal(),
    }
}

/// Ask for a status on stdin: a number from the list or any label.
fn prompt_status(filename: &str) -> adrman::Result<String> {
    println!("New status for {}:", filename);
    for (i, status) in Status::ALL.iter().enumerate() {
        println!("  {}) {}", i + 1, status);
    }
    print!("> ");
    let stdin_err = |e: io::Error| AdrError::Io {
        path: PathBuf::from("<stdin>"),
        source: e,
    };
    io::stdout().flush().map_err(stdin_err)?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).map_err(stdin_err)?;
    let answer = line.trim();
    if answer.is_empty() {
        return Err(stdin_err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no status given",
        )));
    }

    let picked = answer
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| Status::ALL.get(i))
        .map(|s| s.to_string());
    Ok(picked.unwrap_or_else(|| answer.to_string()))
}
