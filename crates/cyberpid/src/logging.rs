//! Log sink setup
//!
//! Two layers on one registry: a terse console layer (`INFO: message`) and
//! an append-only file layer with timestamps and targets. The subscriber is
//! scoped to the returned [`LogGuard`] rather than installed globally.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::{DefaultFields, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer};

/// Default filter for the file layer when `RUST_LOG` is unset
const FILE_FILTER: &str = "debug";

/// Keeps the subscriber installed and the log file open.
///
/// Dropping it uninstalls the subscriber and flushes the file.
pub struct LogGuard {
    _default: DefaultGuard,
    file: Arc<File>,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        let _ = (&*self.file).flush();
    }
}

/// Open `log_file` for appending and install the console + file subscriber
/// for the current thread.
pub fn init(log_file: &Path, verbose: bool) -> Result<LogGuard> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
    let file = Arc::new(file);

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(FILE_FILTER));

    let subscriber = tracing_subscriber::registry()
        .with(console_layer(std::io::stderr).with_filter(console_level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(file.clone())
                .with_filter(file_filter),
        );

    Ok(LogGuard {
        _default: tracing::subscriber::set_default(subscriber),
        file,
    })
}

type ConsoleLayer<S, W> = tracing_subscriber::fmt::Layer<S, DefaultFields, ConsoleFormat, W>;

/// Console layer printing `LEVEL: message` lines
fn console_layer<S, W>(writer: W) -> ConsoleLayer<S, W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    tracing_subscriber::fmt::layer()
        .event_format(ConsoleFormat)
        .with_writer(writer)
}

/// Message-only event format; structured fields go to the file layer
struct ConsoleFormat;

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut message = MessageVisitor::default();
        event.record(&mut message);
        writeln!(writer, "{}: {}", event.metadata().level(), message.0)
    }
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.0 = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use super::*;

    /// In-memory writer shared between the layer and the test
    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_console_prints_level_and_message_only() {
        let buffer = Buffer::default();
        let subscriber = tracing_subscriber::registry().with(console_layer(buffer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(
                pin = 21,
                label = "driver",
                "Relay on pin {} turned {} ({})",
                21,
                "ON",
                "driver"
            );
            tracing::warn!("Disconnect failed, discarding session");
        });

        assert_eq!(
            buffer.contents(),
            "INFO: Relay on pin 21 turned ON (driver)\n\
             WARN: Disconnect failed, discarding session\n"
        );
    }

    #[test]
    fn test_file_layer_appends_debug_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cyber_pi.log");
        std::fs::write(&path, "previous run\n").unwrap();

        {
            let _guard = init(&path, false).unwrap();
            tracing::info!(pin = 21, "Relay on pin 21 turned ON (Driver door)");
            tracing::debug!("Vehicle state");
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("previous run\n"));
        assert!(content.contains("Relay on pin 21 turned ON (Driver door)"));
        assert!(content.contains("pin=21"));
        assert!(content.contains("Vehicle state"));
    }

    #[test]
    fn test_events_after_guard_drop_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cyber_pi.log");

        drop(init(&path, false).unwrap());
        tracing::info!("after drop");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("after drop"));
    }

    #[test]
    fn test_unwritable_log_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("cyber_pi.log");

        assert!(init(&path, false).is_err());
    }
}
