// Application state module
// Immutable per-process state shared by every connection task

use super::types::Config;
use crate::handler::Router;
use crate::logger::AccessLogFormat;

/// Application state
///
/// Built once at startup; connection tasks only ever read it.
pub struct AppState {
    pub config: Config,
    pub router: Router,
    /// `None` when access logging is off
    pub access_log: Option<AccessLogFormat>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, String> {
        let router = Router::new(&config)?;
        let access_log = config.logging.access_log.then(|| {
            config
                .logging
                .access_log_format
                .parse()
                .unwrap_or(AccessLogFormat::Common)
        });
        Ok(Self {
            config,
            router,
            access_log,
        })
    }
}
