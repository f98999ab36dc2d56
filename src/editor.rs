//! Opening records in an external editor

use crate::config::UserConfig;
use crate::diagnostics::DiagnosticSink;
use crate::error::{AdrError, Result};
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Editor command: the explicit choice, then the user configuration, then `$EDITOR`.
pub fn resolve_editor(
    explicit: Option<&str>,
    user: &UserConfig,
    env_editor: Option<String>,
) -> Option<String> {
    let non_empty = |s: &String| !s.trim().is_empty();
    explicit
        .map(str::to_string)
        .filter(non_empty)
        .or_else(|| user.editor.clone().filter(non_empty))
        .or_else(|| env_editor.filter(non_empty))
}

/// Split an editor command like `code --new-window` into program and arguments.
fn split_command(editor: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = editor.split_whitespace();
    let program = parts.next()?;
    Some((program, parts.collect()))
}

/// Start `editor` on `path` and return without waiting for it.
pub fn spawn_editor(editor: &str, path: &Path, diag: &dyn DiagnosticSink) -> Result<Child> {
    let (program, args) = split_command(editor).ok_or_else(|| {
        AdrError::io(
            editor,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty editor command"),
        )
    })?;

    diag.debug(&format!(
        "Launching {} {:?} on {}",
        program,
        args,
        path.display()
    ));
    Command::new(program)
        .args(args)
        .arg(path)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| AdrError::io(program, e))
}
