//! Sink abstraction and the built-in no-op and fan-out sinks.

use std::any::Any;
use std::sync::Arc;

use crate::error::Error;
use crate::fields::Field;
use crate::level::Level;
use crate::record::Record;

/// Destination for log records.
///
/// Sinks are `Send + Sync` and shared behind `Arc`, so a single backend can
/// serve every thread in the process. `with_fields` derives a child sink
/// with extended contextual fields and must never mutate the receiver.
pub trait Sink: Send + Sync {
    /// Whether this sink accepts entries at `level`.
    fn enabled(&self, level: Level) -> bool;

    /// Write one record together with its call-site fields.
    fn write(&self, record: &Record, fields: &[Field]) -> Result<(), Error>;

    /// Derive a sink with additional contextual fields.
    fn with_fields(&self, fields: &[Field]) -> Arc<dyn Sink>;

    fn as_any(&self) -> &dyn Any;
}

/// Sink that discards everything at zero cost. Test environments use it so
/// application logging stays silent.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl Sink for NoopSink {
    fn enabled(&self, _level: Level) -> bool {
        false
    }

    fn write(&self, _record: &Record, _fields: &[Field]) -> Result<(), Error> {
        Ok(())
    }

    fn with_fields(&self, _fields: &[Field]) -> Arc<dyn Sink> {
        Arc::new(NoopSink)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Fan-out sink writing every entry to all members.
///
/// Members are written in construction order and a member failure never
/// suppresses the remaining writes, so the console tier still sees an
/// entry when the network tier is down. The last observed error is
/// reported once all members have been attempted.
pub struct TeeSink {
    sinks: Vec<Arc<dyn Sink>>,
}

impl TeeSink {
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self { sinks }
    }

    #[cfg(test)]
    pub(crate) fn members(&self) -> &[Arc<dyn Sink>] {
        &self.sinks
    }
}

impl Sink for TeeSink {
    fn enabled(&self, level: Level) -> bool {
        self.sinks.iter().any(|s| s.enabled(level))
    }

    fn write(&self, record: &Record, fields: &[Field]) -> Result<(), Error> {
        let mut last_err = None;
        for sink in &self.sinks {
            if !sink.enabled(record.level) {
                continue;
            }
            if let Err(err) = sink.write(record, fields) {
                last_err = Some(err);
            }
        }
        match last_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn with_fields(&self, fields: &[Field]) -> Arc<dyn Sink> {
        Arc::new(TeeSink {
            sinks: self.sinks.iter().map(|s| s.with_fields(fields)).collect(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
