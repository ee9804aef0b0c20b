//! Access log line rendering
//!
//! `common` (CLF) is the default. `combined` appends referer and user agent,
//! `json` emits one object per line, and anything else is a pattern with
//! `$variables`.

use chrono::{DateTime, Local};
use hyper::{header, Method, Request, StatusCode, Version};
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Access log layout, parsed once from `logging.access_log_format`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessLogFormat {
    Common,
    Combined,
    Json,
    Custom(String),
}

impl FromStr for AccessLogFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "common" => Self::Common,
            "combined" => Self::Combined,
            "json" => Self::Json,
            pattern => Self::Custom(pattern.to_string()),
        })
    }
}

/// One request/response pair
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub client_ip: IpAddr,
    pub time: DateTime<Local>,
    pub method: Method,
    /// Request target as received: path plus optional `?query`
    pub target: String,
    pub version: Version,
    pub status: StatusCode,
    pub body_bytes: u64,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub elapsed: Duration,
}

impl AccessLogEntry {
    /// Capture the request side; response fields are filled in by `finish`
    pub fn from_request<B>(req: &Request<B>, peer_addr: SocketAddr) -> Self {
        let header_text = |name: header::HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Self {
            client_ip: peer_addr.ip(),
            time: Local::now(),
            method: req.method().clone(),
            target: req
                .uri()
                .path_and_query()
                .map_or_else(|| req.uri().path().to_string(), ToString::to_string),
            version: req.version(),
            status: StatusCode::OK,
            body_bytes: 0,
            referer: header_text(header::REFERER),
            user_agent: header_text(header::USER_AGENT),
            elapsed: Duration::ZERO,
        }
    }

    pub fn finish(&mut self, status: StatusCode, body_bytes: u64, elapsed: Duration) {
        self.status = status;
        self.body_bytes = body_bytes;
        self.elapsed = elapsed;
    }

    pub fn render(&self, format: &AccessLogFormat) -> String {
        match format {
            AccessLogFormat::Common => self.common(),
            AccessLogFormat::Combined => format!(
                "{} \"{}\" \"{}\"",
                self.common(),
                self.referer.as_deref().unwrap_or("-"),
                self.user_agent.as_deref().unwrap_or("-"),
            ),
            AccessLogFormat::Json => self.json(),
            AccessLogFormat::Custom(pattern) => self.substitute(pattern),
        }
    }

    fn request_line(&self) -> String {
        format!("{} {} {:?}", self.method, self.target, self.version)
    }

    fn common(&self) -> String {
        // CLF writes "-" for an empty body
        let bytes = match self.body_bytes {
            0 => "-".to_string(),
            n => n.to_string(),
        };
        format!(
            "{} - - [{}] \"{}\" {} {bytes}",
            self.client_ip,
            self.time.format(CLF_TIME),
            self.request_line(),
            self.status.as_u16(),
        )
    }

    fn json(&self) -> String {
        let (path, query) = match self.target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (self.target.as_str(), None),
        };
        serde_json::json!({
            "remote_addr": self.client_ip.to_string(),
            "time": self.time.to_rfc3339(),
            "method": self.method.as_str(),
            "path": path,
            "query": query,
            "http_version": format!("{:?}", self.version),
            "status": self.status.as_u16(),
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "request_time_us": u64::try_from(self.elapsed.as_micros()).unwrap_or(u64::MAX),
        })
        .to_string()
    }

    /// Replace `$remote_addr`, `$time_local`, `$time_iso8601`, `$request`,
    /// `$request_method`, `$request_uri`, `$status`, `$body_bytes_sent`,
    /// `$http_referer`, `$http_user_agent` and `$request_time` (seconds).
    fn substitute(&self, pattern: &str) -> String {
        // Longer names first so `$request` does not eat `$request_time`
        let vars: [(&str, String); 11] = [
            ("$remote_addr", self.client_ip.to_string()),
            ("$time_local", self.time.format(CLF_TIME).to_string()),
            ("$time_iso8601", self.time.to_rfc3339()),
            ("$request_time", format!("{:.3}", self.elapsed.as_secs_f64())),
            ("$request_method", self.method.to_string()),
            ("$request_uri", self.target.clone()),
            ("$request", self.request_line()),
            ("$status", self.status.as_u16().to_string()),
            ("$body_bytes_sent", self.body_bytes.to_string()),
            ("$http_referer", self.referer.clone().unwrap_or_else(|| "-".to_string())),
            ("$http_user_agent", self.user_agent.clone().unwrap_or_else(|| "-".to_string())),
        ];
        vars.iter()
            .fold(pattern.to_string(), |line, (name, value)| line.replace(name, value))
    }
}
