//! Static file serving module
//!
//! Resolves request paths under a fixed root directory and serves files,
//! index files and directory listings. No path ever resolves outside the root.

use crate::http::{self, cache, mime, response::escape_html};
use crate::logger;
use hyper::body::Bytes;
use hyper::Response;
use http_body_util::Full;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Characters escaped in directory listing links
const LINK_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// What the static handler needs from a request
#[derive(Debug, Clone, Copy)]
pub struct StaticRequest<'a> {
    /// Raw request target: path plus optional query
    pub target: &'a str,
    pub is_head: bool,
    pub if_modified_since: Option<&'a str>,
    pub if_none_match_present: bool,
}

/// Serves files from one root directory
#[derive(Debug, Clone)]
pub struct StaticFileServer {
    root: PathBuf,
    index_files: Vec<String>,
    directory_listing: bool,
}

impl StaticFileServer {
    pub fn new(root: impl Into<PathBuf>, index_files: Vec<String>, directory_listing: bool) -> Self {
        Self {
            root: root.into(),
            index_files,
            directory_listing,
        }
    }

    /// Serve a GET or HEAD request
    pub async fn serve(&self, req: &StaticRequest<'_>) -> Response<Full<Bytes>> {
        let (path, query) = split_target(req.target);
        let relative = clean_path(path);
        let mut file_path = self.root.join(&relative);

        let Ok(metadata) = fs::metadata(&file_path).await else {
            return http::build_file_not_found_response();
        };

        if metadata.is_dir() {
            if !path.ends_with('/') {
                let location = match query {
                    Some(q) => format!("{path}/?{q}"),
                    None => format!("{path}/"),
                };
                return http::build_redirect_response(&location);
            }

            match self.find_index(&file_path).await {
                Some(index) => file_path = index,
                None if self.directory_listing => {
                    return self.serve_listing(&file_path, path, req.is_head).await;
                }
                None => return http::build_file_not_found_response(),
            }
        } else if path.ends_with('/') {
            // A trailing slash names a directory
            return http::build_file_not_found_response();
        }

        if !self.is_within_root(&file_path) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {} -> {}",
                req.target,
                file_path.display()
            ));
            return http::build_file_not_found_response();
        }

        self.serve_file(&file_path, req).await
    }

    async fn serve_file(&self, file_path: &Path, req: &StaticRequest<'_>) -> Response<Full<Bytes>> {
        let modified = fs::metadata(file_path).await.and_then(|m| m.modified()).ok();
        let last_modified = modified.map(cache::http_date);

        if let (Some(modified), Some(last_modified)) = (modified, last_modified.as_deref()) {
            if cache::not_modified_since(req.if_modified_since, req.if_none_match_present, modified) {
                return http::build_304_response(last_modified);
            }
        }

        let content = match fs::read(file_path).await {
            Ok(c) => c,
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to read file '{}': {}",
                    file_path.display(),
                    e
                ));
                return http::build_file_not_found_response();
            }
        };

        http::build_content_response(
            Bytes::from(content),
            mime::content_type_for(file_path),
            last_modified.as_deref(),
            req.is_head,
        )
    }

    /// First configured index file present in `dir`
    async fn find_index(&self, dir: &Path) -> Option<PathBuf> {
        for name in &self.index_files {
            let candidate = dir.join(name);
            if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
                return Some(candidate);
            }
        }
        None
    }

    async fn serve_listing(&self, dir: &Path, display_path: &str, is_head: bool) -> Response<Full<Bytes>> {
        if !self.is_within_root(dir) {
            return http::build_file_not_found_response();
        }
        match list_directory(dir, display_path).await {
            Ok(html) => http::build_content_response(
                Bytes::from(html),
                "text/html; charset=utf-8",
                None,
                is_head,
            ),
            Err(e) => {
                logger::log_warning(&format!(
                    "Failed to list directory '{}': {e}",
                    dir.display()
                ));
                http::build_error_response(
                    hyper::StatusCode::NOT_FOUND,
                    Some("No permission to list directory"),
                )
            }
        }
    }

    /// Canonical path check, so symlinks cannot lead outside the root
    fn is_within_root(&self, path: &Path) -> bool {
        let Ok(root) = self.root.canonicalize() else {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{}'",
                self.root.display()
            ));
            return false;
        };
        path.canonicalize().is_ok_and(|p| p.starts_with(&root))
    }
}

/// Split a request target into path and query, discarding any fragment
fn split_target(target: &str) -> (&str, Option<&str>) {
    let target = target.split_once('#').map_or(target, |(t, _)| t);
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

/// Turn a URL path into a relative filesystem path
///
/// Percent-decodes, then resolves `.` and `..` lexically; a `..` at the top is
/// dropped rather than escaping the root.
pub fn clean_path(path: &str) -> PathBuf {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let mut parts: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.iter().collect()
}

/// Render an HTML listing of `dir`
async fn list_directory(dir: &Path, display_path: &str) -> std::io::Result<String> {
    let mut entries = Vec::new();
    let mut reader = fs::read_dir(dir).await?;
    while let Some(entry) = reader.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            name.push('/');
        }
        entries.push(name);
    }
    entries.sort_by_key(|name| name.to_lowercase());

    let display_path = percent_decode_str(display_path).decode_utf8_lossy();
    let title = format!("Directory listing for {}", escape_html(&display_path));

    let mut html = String::new();
    html.push_str("<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{title}</title>\n</head>\n<body>\n"));
    html.push_str(&format!("<h1>{title}</h1>\n<hr>\n<ul>\n"));
    for name in &entries {
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            utf8_percent_encode(name, LINK_ESCAPE),
            escape_html(name)
        ));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Ok(html)
}
