use anyhow::{Context, Result};
use forkgres_orchestrations::redact::redact;
use std::io::{self, Write};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Masks registered secrets in everything written through it
pub struct RedactingWriter<W> {
    inner: W,
}

impl<W: Write> RedactingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        self.inner.write_all(redact(&text).as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Initialize tracing:
/// 1. Console output (stderr), keeping stdout free for outputs
/// 2. Optional file output (`<log_dir>/forkgres.log`)
///
/// Both go through [`RedactingWriter`]. A log file that cannot be opened is
/// reported as a warning and logging continues on the console only. The
/// returned guards must be kept alive until exit or buffered lines are lost.
pub fn initialize_tracing(log_dir: Option<&Path>) -> Result<Vec<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "info,\
         forkgres_runner=debug,\
         forkgres_orchestrations=debug"
            .into()
    });

    let mut guards = Vec::new();

    let (console_writer, console_guard) =
        tracing_appender::non_blocking(RedactingWriter::new(io::stderr()));
    guards.push(console_guard);
    let console_layer = fmt::layer().with_writer(console_writer).with_target(false);

    let (file_appender, file_error) = match log_dir.map(open_log_file).transpose() {
        Ok(appender) => (appender, None),
        Err(err) => (None, Some(err)),
    };
    let file_layer = file_appender.map(|appender| {
        let (file_writer, file_guard) = tracing_appender::non_blocking(RedactingWriter::new(appender));
        guards.push(file_guard);
        fmt::layer().with_writer(file_writer).with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize tracing")?;

    if let Some(err) = file_error {
        tracing::warn!("Logging to the console only: {:#}", err);
    }

    Ok(guards)
}

fn open_log_file(dir: &Path) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("forkgres.log")
        .build(dir)
        .with_context(|| format!("Failed to open log file in {}", dir.display()))
}
