use std::sync::{Arc, OnceLock};

/// Module path prefix of records emitted by this library.
const OWN_TARGET_PREFIX: &str = "sessionkit";

/// A host-provided sink for the library's log output.
///
/// Exported via `UniFFI` (feature `ffi`) so mobile and web hosts can route records into their
/// own logging. Records from dependencies (`reqwest`, `hyper`) are only forwarded at `Info`
/// and above.
///
/// # Examples
///
/// ```rust
/// use sessionkit_core::logger::{LogLevel, Logger};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, level: LogLevel, target: String, message: String) {
///         eprintln!("[{level:?}] {target}: {message}");
///     }
/// }
/// ```
///
/// ## Kotlin
///
/// ```kotlin
/// object SessionLogBridge : Logger {
///     override fun log(level: LogLevel, target: String, message: String) {
///         Log.println(level.toPriority(), target, message)
///     }
/// }
///
/// setLogger(SessionLogBridge) // first call wins
/// ```
#[cfg_attr(feature = "ffi", uniffi::export(with_foreign))]
pub trait Logger: Sync + Send {
    /// Receives one record. `target` is the emitting module path.
    fn log(&self, level: LogLevel, target: String, message: String);
}

/// Severity of a forwarded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum LogLevel {
    /// Very detailed tracing output.
    Trace,
    /// Debugging detail, such as requests sent and session transitions.
    Debug,
    /// Notable progress.
    Info,
    /// Recoverable problems, such as a remote logout that failed after local state was cleared.
    Warn,
    /// Failures the library could not recover from.
    Error,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

static HOST_LOGGER: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Adapts the `log` facade to the installed [`Logger`].
struct HostBridge;

impl log::Log for HostBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Info || metadata.target().starts_with(OWN_TARGET_PREFIX)
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(logger) = HOST_LOGGER.get() {
            logger.log(
                record.level().into(),
                record.target().to_string(),
                record.args().to_string(),
            );
        }
    }

    fn flush(&self) {}
}

/// Installs `logger` as the destination for the library's log records.
///
/// Only the first call takes effect. Hosts that already run a `log`-compatible logger of their
/// own (such as `tracing-subscriber` in the CLI) do not need this.
#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if HOST_LOGGER.set(logger).is_err() {
        log::warn!("logger already set");
        return;
    }

    static BRIDGE: HostBridge = HostBridge;
    if log::set_logger(&BRIDGE).is_ok() {
        log::set_max_level(log::LevelFilter::Trace);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingLogger {
        records: Mutex<Vec<(LogLevel, String, String)>>,
    }

    impl Logger for RecordingLogger {
        fn log(&self, level: LogLevel, target: String, message: String) {
            self.records.lock().unwrap().push((level, target, message));
        }
    }

    fn record_at<'a>(level: log::Level, target: &'a str) -> log::MetadataBuilder<'a> {
        let mut builder = log::Metadata::builder();
        builder.level(level).target(target);
        builder
    }

    #[test]
    fn test_level_conversion_keeps_ordering() {
        assert_eq!(LogLevel::from(log::Level::Warn), LogLevel::Warn);
        assert!(LogLevel::from(log::Level::Trace) < LogLevel::from(log::Level::Error));
    }

    #[test]
    fn test_dependency_debug_output_is_not_enabled() {
        let bridge = HostBridge;
        assert!(!log::Log::enabled(
            &bridge,
            &record_at(log::Level::Debug, "hyper::proto").build()
        ));
        assert!(log::Log::enabled(
            &bridge,
            &record_at(log::Level::Warn, "hyper::proto").build()
        ));
        assert!(log::Log::enabled(
            &bridge,
            &record_at(log::Level::Trace, "sessionkit_core::request").build()
        ));
    }

    #[test]
    fn test_records_reach_host_logger_with_target() {
        let recorder = Arc::new(RecordingLogger::default());
        set_logger(recorder.clone());

        log::Log::log(
            &HostBridge,
            &log::Record::builder()
                .level(log::Level::Debug)
                .target("hyper::proto")
                .args(format_args!("noise"))
                .build(),
        );
        log::Log::log(
            &HostBridge,
            &log::Record::builder()
                .level(log::Level::Debug)
                .target("sessionkit_core::session")
                .args(format_args!("session authenticated"))
                .build(),
        );

        let records = recorder.records.lock().unwrap();
        assert!(!records.iter().any(|(_, _, message)| message == "noise"));
        assert!(records.contains(&(
            LogLevel::Debug,
            "sessionkit_core::session".to_string(),
            "session authenticated".to_string(),
        )));
    }
}
