//! HTTP server for browsing decision records
//!
//! `adrman serve` → serves the HTML export plus a small JSON API.
//! The repository is re-read for every request.

use crate::diagnostics::Diagnostics;
use crate::error::AdrError;
use crate::export::{self, ExportFormat};
use crate::repository::Repository;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tiny_http::{Header, Method, Request, Response, Server};

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    fn failure(error: impl ToString) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// Entry of `GET /adrs`.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct RecordSummary {
    index: u32,
    title: String,
}

/// Query of `GET /api/search`.
#[derive(Debug, Deserialize, Default)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    case: bool,
}

/// A response before it is handed to `tiny_http`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reply {
    status: u16,
    content_type: &'static str,
    body: String,
}

impl Reply {
    fn ok(content_type: &'static str, body: String) -> Self {
        Self {
            status: 200,
            content_type,
            body,
        }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| format!("{{\"ok\":false,\"error\":\"{}\"}}", e));
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    fn not_found() -> Self {
        Self {
            status: 404,
            content_type: "text/plain; charset=utf-8",
            body: "Not found".to_string(),
        }
    }

    fn error(err: &AdrError) -> Self {
        Self {
            status: 500,
            content_type: "text/plain; charset=utf-8",
            body: err.to_string(),
        }
    }
}

/// Serve the repository at `root` until the process is stopped.
pub fn start_server(root: &Path, address: &str, port: u16, diag: Diagnostics) -> std::io::Result<()> {
    let addr = format!("{}:{}", address, port);
    let server = Server::http(&addr)
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    eprintln!("Serving decision records at http://{}", addr);
    eprintln!("Press Ctrl+C to stop");

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(root, &diag, request) {
            diag.warn(&format!("Failed to answer request: {}", e));
        }
    }

    Ok(())
}

fn handle_request(root: &Path, diag: &Diagnostics, request: Request) -> std::io::Result<()> {
    let reply = route(root, diag, request.method(), request.url());
    diag.debug(&format!(
        "{} {} -> {}",
        request.method(),
        request.url(),
        reply.status
    ));

    let mut response = Response::from_string(reply.body).with_status_code(reply.status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response = response.with_header(header);
    }
    request.respond(response)
}

fn route(root: &Path, diag: &Diagnostics, method: &Method, url: &str) -> Reply {
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url, ""),
    };
    if method != &Method::Get {
        return Reply::not_found();
    }

    let repo = match Repository::open(root, diag.clone()) {
        Ok(repo) => repo,
        Err(e) => return Reply::error(&e),
    };

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match segments.as_slice() {
        [""] => match export::export(&repo, ExportFormat::Html) {
            Ok(html) => Reply::ok(ExportFormat::Html.content_type(), html),
            Err(e) => Reply::error(&e),
        },
        ["adr", index] => match index.parse::<u32>() {
            Ok(index) => match repo.read_document(index) {
                Ok(raw) => Reply::ok("text/markdown; charset=utf-8", raw),
                Err(AdrError::IndexNotFound(_)) => Reply::not_found(),
                Err(e) => Reply::error(&e),
            },
            Err(_) => Reply::not_found(),
        },
        ["adrs"] => match repo.list_all_statuses() {
            Ok(records) => {
                let list: Vec<RecordSummary> = records
                    .into_iter()
                    .map(|r| RecordSummary {
                        index: r.index,
                        title: r.title,
                    })
                    .collect();
                Reply::json(200, &list)
            }
            Err(e) => Reply::error(&e),
        },
        ["adrs", cmd] if cmd.eq_ignore_ascii_case("count") => match repo.list_all_statuses() {
            Ok(records) => Reply::ok("text/plain; charset=utf-8", records.len().to_string()),
            Err(e) => Reply::error(&e),
        },
        ["api", "search"] => search(&repo, query),
        _ => Reply::not_found(),
    }
}

fn search(repo: &Repository, query: &str) -> Reply {
    let query: SearchQuery = match serde_urlencoded::from_str(query) {
        Ok(q) => q,
        Err(e) => return Reply::json(400, &ApiResponse::<()>::failure(e)),
    };
    let keywords: Vec<String> = query.q.split_whitespace().map(str::to_string).collect();
    match repo.filter_documents_by_keywords(&keywords, query.case) {
        Ok(files) => Reply::json(200, &ApiResponse::success(files)),
        Err(e @ AdrError::InvalidKeyword { .. }) => Reply::json(400, &ApiResponse::<()>::failure(e)),
        Err(e) => Reply::json(500, &ApiResponse::<()>::failure(e)),
    }
}
