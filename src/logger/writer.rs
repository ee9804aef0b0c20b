//! Output sinks for the logger
//!
//! Access lines and info messages share one sink, warnings and errors use the
//! other. A sink is the console unless a file path is configured for it.

use crate::config::LoggingConfig;
use std::fs::{self, File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

static SINKS: OnceLock<Sinks> = OnceLock::new();

/// Which stream a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Access log and informational messages (stdout by default)
    Access,
    /// Warnings and errors (stderr by default)
    Error,
}

enum Sink {
    Console(Channel),
    File(Mutex<LineWriter<File>>),
}

impl Sink {
    fn open(path: Option<&str>, channel: Channel) -> io::Result<Self> {
        let Some(path) = path.map(Path::new) else {
            return Ok(Self::Console(channel));
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::File(Mutex::new(LineWriter::new(file))))
    }

    fn emit(&self, line: &str) {
        match self {
            Self::Console(Channel::Access) => println!("{line}"),
            Self::Console(Channel::Error) => eprintln!("{line}"),
            Self::File(file) => {
                // A poisoned lock only means another writer panicked mid-line
                let mut file = file.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                let _ = writeln!(file, "{line}");
            }
        }
    }
}

struct Sinks {
    access: Sink,
    error: Sink,
}

/// Open the configured sinks; may only succeed once per process
pub fn install(logging: &LoggingConfig) -> io::Result<()> {
    let sinks = Sinks {
        access: Sink::open(logging.access_log_file.as_deref(), Channel::Access)?,
        error: Sink::open(logging.error_log_file.as_deref(), Channel::Error)?,
    };
    SINKS
        .set(sinks)
        .map_err(|_| io::Error::new(io::ErrorKind::AlreadyExists, "log sinks already installed"))
}

/// Write one line, using the console until `install` has run
pub fn emit(channel: Channel, line: &str) {
    match (SINKS.get(), channel) {
        (Some(sinks), Channel::Access) => sinks.access.emit(line),
        (Some(sinks), Channel::Error) => sinks.error.emit(line),
        (None, channel) => Sink::Console(channel).emit(line),
    }
}
