//! Session and error logs.
//!
//! Each run writes to stderr and appends to two files named after the run's
//! start time:
//!
//! - `embedding-sync-<start>.log`: everything at the active level
//! - `embedding-sync-errors-<start>.log`: errors only
//!
//! `RUST_LOG` wins over `--debug` when set.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use contrail_core::Result;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const START_FORMAT: &str = "%Y%m%d-%H%M%S";

const DEBUG_DIRECTIVES: &str = "info,contrail=debug,contrail_cli=debug,contrail_core=debug,\
contrail_store=debug,contrail_vector=debug,contrail_pipeline=debug";

/// The two log files of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFiles {
    /// All events.
    pub session: PathBuf,
    /// Errors only.
    pub errors: PathBuf,
}

impl LogFiles {
    /// File names for a run started at `started`, under `dir`.
    pub fn for_start(dir: &Path, started: DateTime<Local>) -> Self {
        let stamp = started.format(START_FORMAT);
        Self {
            session: dir.join(format!("embedding-sync-{stamp}.log")),
            errors: dir.join(format!("embedding-sync-errors-{stamp}.log")),
        }
    }

    /// Whether anything was written to the error log.
    pub fn has_errors(&self) -> bool {
        fs::metadata(&self.errors).is_ok_and(|m| m.len() > 0)
    }
}

fn append(path: &Path) -> io::Result<File> {
    File::options().create(true).append(true).open(path)
}

/// Filter for the active flags.
pub fn filter(debug: bool) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug {
        EnvFilter::new(DEBUG_DIRECTIVES)
    } else {
        EnvFilter::new("info")
    }
}

/// Create the log directory and files and install the global subscriber.
pub fn init(files: &LogFiles, debug: bool) -> Result<()> {
    if let Some(dir) = files.session.parent() {
        fs::create_dir_all(dir)?;
    }
    let session = append(&files.session)?;
    let errors = append(&files.errors)?;

    let subscriber = tracing_subscriber::registry()
        .with(filter(debug))
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(fmt::layer().with_writer(Mutex::new(session)).with_ansi(false))
        .with(
            fmt::layer()
                .with_writer(Mutex::new(errors))
                .with_ansi(false)
                .with_filter(LevelFilter::ERROR),
        );

    // Ignore error if a subscriber is already set (e.g. in tests).
    let _ = subscriber.try_init();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_names_use_start_time() {
        let started = Local.with_ymd_and_hms(2026, 10, 16, 8, 5, 9).unwrap();
        let files = LogFiles::for_start(Path::new("/var/log/contrail"), started);
        assert_eq!(
            files.session,
            PathBuf::from("/var/log/contrail/embedding-sync-20261016-080509.log")
        );
        assert_eq!(
            files.errors,
            PathBuf::from("/var/log/contrail/embedding-sync-errors-20261016-080509.log")
        );
    }

    #[test]
    fn test_has_errors_tracks_file_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let files = LogFiles::for_start(dir.path(), Local::now());
        assert!(!files.has_errors());
        fs::write(&files.errors, "").unwrap();
        assert!(!files.has_errors());
        fs::write(&files.errors, "ERROR boom\n").unwrap();
        assert!(files.has_errors());
    }

    #[test]
    fn test_init_creates_both_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let files = LogFiles::for_start(&dir.path().join("nested"), Local::now());
        init(&files, false).unwrap();
        assert!(files.session.exists());
        assert!(files.errors.exists());
    }
}
