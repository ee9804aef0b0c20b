//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: classifies each request through a
//! dispatch table, delegates to the upstream forwarder or the static file
//! server, and finalizes every response with the cross-origin headers.

use crate::config::{AppState, Config};
use crate::handler::normalize;
use crate::handler::proxy::UpstreamForwarder;
use crate::handler::static_files::{StaticFileServer, StaticRequest};
use crate::http::{self, headers};
use crate::logger::{self, AccessLogEntry};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{self, HeaderValue};
use hyper::http::uri::PathAndQuery;
use hyper::{HeaderMap, Method, Request, Response, Uri};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// How a request method is treated by the dispatch table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodClass {
    /// GET
    Read,
    /// HEAD: answered from the static root on every path
    Head,
    /// POST, PUT, DELETE, PATCH: carry a body upstream
    Write,
    /// OPTIONS
    Preflight,
    /// Anything else (TRACE, CONNECT, extension methods)
    Other,
}

impl MethodClass {
    pub fn of(method: &Method) -> Self {
        match *method {
            Method::GET => Self::Read,
            Method::HEAD => Self::Head,
            Method::POST | Method::PUT | Method::DELETE | Method::PATCH => Self::Write,
            Method::OPTIONS => Self::Preflight,
            _ => Self::Other,
        }
    }
}

/// What the router does with a matched request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    Preflight,
    Forward,
    Static,
    NotFound,
    Unsupported,
}

/// One dispatch table entry; an empty prefix matches every path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub methods: MethodClass,
    pub prefix: String,
    pub action: RouteAction,
}

impl RouteRule {
    fn new(methods: MethodClass, prefix: &str, action: RouteAction) -> Self {
        Self {
            methods,
            prefix: prefix.to_string(),
            action,
        }
    }

    fn matches(&self, class: MethodClass, path: &str) -> bool {
        self.methods == class && path.starts_with(&self.prefix)
    }
}

/// Build the dispatch table for a set of proxied prefixes
///
/// Rules are checked in order and the first match wins.
pub fn dispatch_table(proxied_prefixes: &[String]) -> Vec<RouteRule> {
    let mut rules = vec![RouteRule::new(MethodClass::Preflight, "", RouteAction::Preflight)];
    for prefix in proxied_prefixes {
        rules.push(RouteRule::new(MethodClass::Read, prefix, RouteAction::Forward));
        rules.push(RouteRule::new(MethodClass::Write, prefix, RouteAction::Forward));
    }
    rules.push(RouteRule::new(MethodClass::Read, "", RouteAction::Static));
    rules.push(RouteRule::new(MethodClass::Head, "", RouteAction::Static));
    rules.push(RouteRule::new(MethodClass::Write, "", RouteAction::NotFound));
    rules.push(RouteRule::new(MethodClass::Other, "", RouteAction::Unsupported));
    rules
}

/// Routes requests to the upstream forwarder or the static file server
pub struct Router {
    rules: Vec<RouteRule>,
    forwarder: UpstreamForwarder,
    static_files: StaticFileServer,
    max_body_size: u64,
    server_name: HeaderValue,
}

impl Router {
    pub fn new(config: &Config) -> Result<Self, String> {
        let base_url = config.upstream_base()?;
        let server_name = HeaderValue::from_str(&config.http.server_name)
            .map_err(|e| format!("Invalid server name '{}': {e}", config.http.server_name))?;

        Ok(Self {
            rules: dispatch_table(&config.upstream.prefixes),
            forwarder: UpstreamForwarder::new(
                base_url,
                Duration::from_secs(config.upstream.timeout_secs),
            ),
            static_files: StaticFileServer::new(
                PathBuf::from(&config.static_files.root),
                config.static_files.index_files.clone(),
                config.static_files.directory_listing,
            ),
            max_body_size: config.http.max_body_size,
            server_name,
        })
    }

    /// Action for a method and path; the table always ends in catch-alls
    pub fn resolve(&self, method: &Method, path: &str) -> RouteAction {
        let class = MethodClass::of(method);
        self.rules
            .iter()
            .find(|rule| rule.matches(class, path))
            .map_or(RouteAction::Unsupported, |rule| rule.action)
    }

    /// Handle one request and return the finalized response
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let action = self.resolve(req.method(), req.uri().path());
        let mut response = match action {
            RouteAction::Preflight => http::build_options_response(),
            RouteAction::Forward => self.forward(req).await,
            RouteAction::Static => {
                self.serve_static(req.method(), req.uri(), req.headers()).await
            }
            RouteAction::NotFound => http::build_404_response(),
            RouteAction::Unsupported => http::build_501_response(req.method().as_str()),
        };
        self.finalize(&mut response);
        response
    }

    /// Single point where headers common to every response are attached
    fn finalize(&self, response: &mut Response<Full<Bytes>>) {
        let headers = response.headers_mut();
        headers::apply_cors(headers);
        if !headers.contains_key(header::SERVER) {
            headers.insert(header::SERVER, self.server_name.clone());
        }
    }

    async fn forward<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();

        let body = if MethodClass::of(&parts.method) == MethodClass::Write {
            match self.read_body(&parts.headers, body).await {
                Ok(bytes) => bytes,
                Err(response) => return response,
            }
        } else {
            Bytes::new()
        };

        let path_and_query = parts.uri.path_and_query().map_or("/", PathAndQuery::as_str);
        match self
            .forwarder
            .forward(parts.method.clone(), path_and_query, &parts.headers, body)
            .await
        {
            Ok(upstream) => normalize::normalize(upstream).into_response(),
            Err(e) => {
                logger::log_error(&format!(
                    "Proxy {} {}{} failed: {e}",
                    parts.method,
                    self.forwarder.base_url(),
                    path_and_query
                ));
                http::build_502_response(&e.to_string())
            }
        }
    }

    /// Collect a request body, bounded by the configured maximum
    async fn read_body<B>(
        &self,
        headers: &HeaderMap,
        body: B,
    ) -> Result<Bytes, Response<Full<Bytes>>>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        if let Some(size) = declared_length(headers) {
            if size > self.max_body_size {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {})",
                    self.max_body_size
                ));
                return Err(http::build_413_response());
            }
        }

        let limit = usize::try_from(self.max_body_size).unwrap_or(usize::MAX);
        match Limited::new(body, limit).collect().await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(e) if e.is::<LengthLimitError>() => {
                logger::log_error(&format!(
                    "Request body exceeded {} bytes",
                    self.max_body_size
                ));
                Err(http::build_413_response())
            }
            Err(e) => {
                logger::log_warning(&format!("Failed to read request body: {e}"));
                Err(http::build_400_response("Failed to read request body"))
            }
        }
    }

    async fn serve_static(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
    ) -> Response<Full<Bytes>> {
        let target = uri.path_and_query().map_or("/", PathAndQuery::as_str);
        let static_req = StaticRequest {
            target,
            is_head: *method == Method::HEAD,
            if_modified_since: headers
                .get(header::IF_MODIFIED_SINCE)
                .and_then(|v| v.to_str().ok()),
            if_none_match_present: headers.contains_key(header::IF_NONE_MATCH),
        };
        self.static_files.serve(&static_req).await
    }
}

/// Parsed `Content-Length`, if present and valid
fn declared_length(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(header::CONTENT_LENGTH)?;
    match value.to_str().ok().and_then(|s| s.trim().parse::<u64>().ok()) {
        Some(size) => Some(size),
        None => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: {value:?}, skipping size check"
            ));
            None
        }
    }
}

/// Main entry point for HTTP request handling
///
/// Routes the request and records it in the access log.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let start = Instant::now();
    let entry = state
        .access_log
        .as_ref()
        .map(|format| (AccessLogEntry::from_request(&req, peer_addr), format));

    let response = state.router.handle(req).await;

    if let Some((mut entry, format)) = entry {
        entry.finish(
            response.status(),
            response.body().size_hint().exact().unwrap_or(0),
            start.elapsed(),
        );
        logger::log_access(&entry, format);
    }

    Ok(response)
}
