// Configuration module entry point
// Loads the startup configuration and builds the shared application state

mod state;
mod types;

use hyper::Uri;
use std::net::SocketAddr;

pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, StaticFilesConfig,
    UpstreamConfig,
};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_FILE: &str = "devproxy";

/// Values supplied on the command line; they win over file and environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub upstream: Option<String>,
    pub static_dir: Option<String>,
}

impl Config {
    /// Load configuration from specified file path (without extension is fine)
    ///
    /// Sources, lowest priority first: built-in defaults, the config file,
    /// `DEVPROXY__*` environment variables, command line overrides.
    pub fn load_from(config_path: &str, overrides: &Overrides) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("DEVPROXY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("upstream.prefixes")
                    .with_list_parse_key("static_files.index_files")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("upstream.base_url", "http://localhost:8080")?
            .set_default("upstream.prefixes", vec!["/api/", "/auth/"])?
            .set_default("upstream.timeout_secs", 10)?
            .set_default("static_files.root", "static")?
            .set_default("static_files.index_files", vec!["index.html", "index.htm"])?
            .set_default("static_files.directory_listing", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "common")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.read_timeout", 60)?
            .set_default("performance.write_timeout", 60)?
            .set_default("http.server_name", concat!("devproxy/", env!("CARGO_PKG_VERSION")))?
            .set_default("http.max_body_size", 10_485_760)?; // 10MB

        if let Some(host) = &overrides.host {
            builder = builder.set_override("server.host", host.as_str())?;
        }
        if let Some(port) = overrides.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(upstream) = &overrides.upstream {
            builder = builder.set_override("upstream.base_url", upstream.as_str())?;
        }
        if let Some(dir) = &overrides.static_dir {
            builder = builder.set_override("static_files.root", dir.as_str())?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate().map_err(config::ConfigError::Message)?;
        Ok(cfg)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<(), String> {
        self.upstream_base()?;
        for prefix in &self.upstream.prefixes {
            if !prefix.starts_with('/') {
                return Err(format!("Proxied prefix must start with '/': '{prefix}'"));
            }
        }
        if self.upstream.timeout_secs == 0 {
            return Err("upstream.timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Upstream base URL with any trailing slash removed
    pub fn upstream_base(&self) -> Result<String, String> {
        let base = self.upstream.base_url.trim_end_matches('/');
        let uri: Uri = base
            .parse()
            .map_err(|e| format!("Invalid upstream URL '{base}': {e}"))?;
        match (uri.scheme_str(), uri.authority()) {
            (Some("http"), Some(_)) => Ok(base.to_string()),
            (Some(scheme), Some(_)) => Err(format!(
                "Unsupported upstream scheme '{scheme}' (only http is supported)"
            )),
            _ => Err(format!("Upstream URL must be absolute: '{base}'")),
        }
    }
}
