//! The logger value handed to callers.
//!
//! A `Logger` owns one sink (possibly a fan-out), stamps caller location
//! onto every record, and captures a backtrace for error-and-above
//! entries. The plain level methods swallow write-path errors after noting
//! them on the `log` facade; the `try_*` variants return them so callers
//! can decide between halting and carrying on.

use std::backtrace::Backtrace;
use std::panic::Location;
use std::sync::Arc;

use crate::error::Error;
use crate::fields::Field;
use crate::level::Level;
use crate::record::{Metadata, Record};
use crate::sink::{NoopSink, Sink};

/// Structured logger bound to a named sink pipeline.
#[derive(Clone)]
pub struct Logger {
    name: String,
    sink: Arc<dyn Sink>,
}

impl Logger {
    pub fn new(name: impl Into<String>, sink: Arc<dyn Sink>) -> Self {
        Self {
            name: name.into(),
            sink,
        }
    }

    /// A logger that discards everything.
    pub fn noop() -> Self {
        Self::new("noop", Arc::new(NoopSink))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    /// Derive a logger whose entries carry additional contextual fields.
    /// The receiver is left untouched.
    pub fn with_fields(&self, fields: &[Field]) -> Logger {
        Logger {
            name: self.name.clone(),
            sink: self.sink.with_fields(fields),
        }
    }

    /// Derive a logger with a different name sharing the same pipeline.
    pub fn named(&self, name: impl Into<String>) -> Logger {
        Logger {
            name: name.into(),
            sink: Arc::clone(&self.sink),
        }
    }

    #[track_caller]
    pub fn debug(&self, message: &str, fields: &[Field]) {
        self.emit(Level::Debug, message, fields, Location::caller());
    }

    #[track_caller]
    pub fn info(&self, message: &str, fields: &[Field]) {
        self.emit(Level::Info, message, fields, Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, message: &str, fields: &[Field]) {
        self.emit(Level::Warn, message, fields, Location::caller());
    }

    #[track_caller]
    pub fn error(&self, message: &str, fields: &[Field]) {
        self.emit(Level::Error, message, fields, Location::caller());
    }

    #[track_caller]
    pub fn critical(&self, message: &str, fields: &[Field]) {
        self.emit(Level::Critical, message, fields, Location::caller());
    }

    #[track_caller]
    pub fn fatal(&self, message: &str, fields: &[Field]) {
        self.emit(Level::Fatal, message, fields, Location::caller());
    }

    /// Log at `Info`, surfacing write-path errors.
    #[track_caller]
    pub fn try_info(&self, message: &str, fields: &[Field]) -> Result<(), Error> {
        self.write(Level::Info, message, fields, Location::caller())
    }

    /// Log at `Warn`, surfacing write-path errors.
    #[track_caller]
    pub fn try_warn(&self, message: &str, fields: &[Field]) -> Result<(), Error> {
        self.write(Level::Warn, message, fields, Location::caller())
    }

    /// Log at `Error`, surfacing write-path errors.
    #[track_caller]
    pub fn try_error(&self, message: &str, fields: &[Field]) -> Result<(), Error> {
        self.write(Level::Error, message, fields, Location::caller())
    }

    fn emit(&self, level: Level, message: &str, fields: &[Field], caller: &'static Location<'static>) {
        if let Err(err) = self.write(level, message, fields, caller) {
            log::warn!("log entry at {level} dropped: {err}");
        }
    }

    fn write(
        &self,
        level: Level,
        message: &str,
        fields: &[Field],
        caller: &'static Location<'static>,
    ) -> Result<(), Error> {
        if !self.sink.enabled(level) {
            return Ok(());
        }
        let metadata = Metadata {
            filename: caller.file().to_owned(),
            line_number: caller.line(),
            ..Metadata::default()
        };
        let mut record = Record::with_metadata(&self.name, level, message, metadata);
        if level >= Level::Error {
            record = record.with_stack(Backtrace::force_capture().to_string());
        }
        self.sink.write(&record, fields)
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::string;
    use crate::sink::test_support::RecordingSink;
    use static_assertions::assert_impl_all;

    assert_impl_all!(Logger: Send, Sync);

    fn recording_logger() -> (Logger, Arc<RecordingSink>) {
        let recording = RecordingSink::shared();
        let logger = Logger::new("app", Arc::new(Arc::clone(&recording)));
        (logger, recording)
    }

    #[test]
    fn stamps_caller_location_onto_records() {
        let (logger, recording) = recording_logger();
        logger.info("ready", &[]);

        let records = recording.records.lock();
        let (record, _) = &records[0];
        assert!(record.metadata.filename.ends_with("logger.rs"));
        assert!(record.metadata.line_number > 0);
        assert_eq!(record.logger, "app");
    }

    #[test]
    fn captures_a_stack_for_error_and_above() {
        let (logger, recording) = recording_logger();
        logger.warn("no stack", &[]);
        logger.error("with stack", &[]);

        let records = recording.records.lock();
        assert!(records[0].0.stack.is_none());
        assert!(records[1].0.stack.is_some());
    }

    #[test]
    fn skips_disabled_levels_without_touching_the_sink() {
        let recording = Arc::new(RecordingSink {
            min_level: Some(Level::Info),
            ..RecordingSink::default()
        });
        let logger = Logger::new("app", Arc::new(Arc::clone(&recording)));
        logger.debug("verbose", &[]);
        assert_eq!(recording.count(), 0);
    }

    #[test]
    fn try_variants_surface_sink_errors() {
        let failing = Arc::new(RecordingSink {
            fail_writes: true,
            ..RecordingSink::default()
        });
        let logger = Logger::new("app", Arc::new(Arc::clone(&failing)));

        let err = logger.try_error("oops", &[]).expect_err("sink error surfaces");
        assert!(matches!(err, Error::SendFailed { .. }));
    }

    #[test]
    fn plain_variants_swallow_sink_errors() {
        let failing = Arc::new(RecordingSink {
            fail_writes: true,
            ..RecordingSink::default()
        });
        let logger = Logger::new("app", Arc::new(Arc::clone(&failing)));
        logger.fatal("oops", &[string("code", "42")]);
        assert_eq!(failing.count(), 1, "record still reached the sink");
    }

    #[test]
    fn call_site_fields_pass_through_unchanged() {
        let (logger, recording) = recording_logger();
        logger.info("hello", &[string("a", "1"), string("b", "2")]);

        let records = recording.records.lock();
        let (_, fields) = &records[0];
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], string("a", "1"));
    }
}
