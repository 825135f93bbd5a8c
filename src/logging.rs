//! Console and file logging. Lines the pages send through `log`/`warn`/`error`
//! carry the `fisher::ui` target.

use std::path::{Path, PathBuf};

use tauri::{AppHandle, Manager, Runtime};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const FILTER_ENV: &str = "FISHER_LOG";
const DEFAULT_FILTER: &str = "info,fisher=debug";
const KEEP_LOG_FILES: usize = 7;

/// Keeps the file writer flushing for the life of the app.
pub struct LoggingState {
    _guard: WorkerGuard,
}

fn log_dir<R: Runtime>(app: &AppHandle<R>) -> PathBuf {
    app.path()
        .app_log_dir()
        .or_else(|_| app.path().app_config_dir().map(|p| p.join("logs")))
        .unwrap_or_else(|_| PathBuf::from("logs"))
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `fisher.<date>.log`, one per day, the oldest removed past a week.
fn file_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("fisher")
        .filename_suffix("log")
        .max_log_files(KEEP_LOG_FILES)
        .build(dir)
}

/// Install the subscriber. Falls back to console only when the log file cannot be
/// opened; returns `None` in that case or when a subscriber is already set.
pub fn init_logging<R: Runtime>(app: &AppHandle<R>) -> Option<LoggingState> {
    let dir = log_dir(app);
    let (file_layer, guard) = match file_appender(&dir) {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        Err(e) => {
            eprintln!("[fisher] Logging to console only, {}: {e}", dir.display());
            (None, None)
        }
    };

    if tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().compact())
        .with(file_layer)
        .try_init()
        .is_err()
    {
        eprintln!("[fisher] Tracing subscriber was already initialized");
        return None;
    }

    let guard = guard?;
    info!(path = %dir.display(), "Logging initialized");
    Some(LoggingState { _guard: guard })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    #[test]
    fn default_filter_is_valid() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn log_file_lands_in_dir_with_date_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut appender = file_appender(dir.path()).expect("appender");
        appender.write_all(b"started\n").expect("write");
        appender.flush().expect("flush");

        let names: Vec<String> = fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("fisher.") && names[0].ends_with(".log"), "{names:?}");
    }
}
