//! Tracing bootstrap.
//!
//! Logs go to a daily-rolling file under `~/.config/chatdeck/logs/`; with
//! `--verbose` they are mirrored to stderr. `RUST_LOG` overrides the filter.

use chatdeck_infrastructure::ChatdeckPaths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

const LOG_FILE_PREFIX: &str = "chatdeck.log";

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("chatdeck=debug,warn")
        } else {
            EnvFilter::new("chatdeck=info,warn")
        }
    })
}

fn stderr_layer<S>(verbose: bool) -> Option<impl Layer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    verbose.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    })
}

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process. `None` when no log directory is usable.
pub fn init(verbose: bool) -> Option<WorkerGuard> {
    let log_dir = ChatdeckPaths::logs_dir()
        .ok()
        .filter(|dir| std::fs::create_dir_all(dir).is_ok());

    let Some(log_dir) = log_dir else {
        tracing_subscriber::registry()
            .with(filter(verbose))
            .with(stderr_layer(verbose))
            .init();
        return None;
    };

    let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer().with_writer(writer).with_ansi(false);

    tracing_subscriber::registry()
        .with(filter(verbose))
        .with(file_layer)
        .with(stderr_layer(verbose))
        .init();

    tracing::debug!("[Logging] Writing logs to {}", log_dir.display());
    Some(guard)
}
