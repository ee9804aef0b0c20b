use clap::Parser;
use devproxy::config::{Overrides, DEFAULT_CONFIG_FILE};

/// Local development server: static files plus an API proxy
#[derive(Debug, Parser)]
#[command(name = "devproxy", version, about)]
pub struct Cli {
    /// Config file (TOML); the extension may be omitted
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Address to listen on
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Upstream base URL, e.g. http://localhost:8080
    #[arg(short, long)]
    pub upstream: Option<String>,

    /// Directory served for non-proxied paths
    #[arg(short = 's', long = "static-dir")]
    pub static_dir: Option<String>,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            upstream: self.upstream.clone(),
            static_dir: self.static_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "devproxy",
            "--port",
            "4000",
            "--upstream",
            "http://127.0.0.1:9000",
            "-s",
            "dist",
        ]);
        let overrides = cli.overrides();
        assert_eq!(cli.config, DEFAULT_CONFIG_FILE);
        assert_eq!(overrides.port, Some(4000));
        assert_eq!(overrides.upstream.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(overrides.static_dir.as_deref(), Some("dist"));
        assert!(overrides.host.is_none());
    }
}
