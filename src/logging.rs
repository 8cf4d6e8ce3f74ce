//! Logging setup
//!
//! Logs go to a console stream and to an append-only `app.log` in the
//! configured directory. Each file line carries timestamp, level, target and
//! message.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::Result;

pub const LOG_FILE_NAME: &str = "app.log";

/// Stream the console layer writes to.
///
/// The server logs to stdout; the CLI keeps stdout for the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Console {
    Stdout,
    Stderr,
}

impl Console {
    fn writer(self) -> BoxMakeWriter {
        match self {
            Console::Stdout => BoxMakeWriter::new(std::io::stdout),
            Console::Stderr => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the process or buffered file lines are lost on exit.
///
/// Default level is `info`; `RUST_LOG` overrides it.
pub fn init_logging(log_dir: &Path, console: Console) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(console.writer()))
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Ok(guard)
}
