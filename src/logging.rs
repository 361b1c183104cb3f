//! File-backed tracing. The TUI owns the terminal, so logs go to
//! `mediafeed.log` in the config directory; follow them with `tail -f`.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum LoggingError {
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The log path has no file name or no parent directory.
    InvalidPath(PathBuf),
    SubscriberAlreadySet,
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectoryCreation { path, source } => {
                write!(f, "Failed to create log directory at {path:?}: {source}")
            }
            Self::InvalidPath(path) => write!(f, "Invalid log file path: {path:?}"),
            Self::SubscriberAlreadySet => write!(f, "Tracing subscriber already initialized"),
        }
    }
}

impl std::error::Error for LoggingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DirectoryCreation { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Default filter when `RUST_LOG` is unset.
fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Install the global subscriber writing to `log_path`.
///
/// `RUST_LOG` wins over `verbose`. The log directory is created if missing,
/// even when the subscriber turns out to be installed already.
pub fn init(log_path: &Path, verbose: bool) -> Result<(), LoggingError> {
    let directory = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;
    let file_name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;

    std::fs::create_dir_all(directory).map_err(|source| LoggingError::DirectoryCreation {
        path: directory.to_path_buf(),
        source,
    })?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .with_ansi(false)
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)
}
