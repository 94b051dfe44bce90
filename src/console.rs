//! Console sink with two output streams.
//!
//! Sub-error severities go to standard out, error-and-above to standard
//! error, each human-readable and optionally colorized by level. Writers
//! are injectable so tests capture output in shared buffers instead of the
//! process streams.

use std::any::Any;
use std::io::{self, Write};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use colored::Colorize;
use parking_lot::Mutex;

use crate::error::Error;
use crate::fields::{Field, FieldSet};
use crate::level::Level;
use crate::record::Record;
use crate::sink::Sink;

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Human-readable sink for local output.
pub struct ConsoleSink {
    out: SharedWriter,
    err: SharedWriter,
    colors: bool,
    min_level: Level,
    context: FieldSet,
}

impl ConsoleSink {
    /// Sink writing to the process stdout/stderr streams.
    pub fn stdio(colors: bool, min_level: Level) -> Self {
        Self::with_writers(Box::new(io::stdout()), Box::new(io::stderr()), colors, min_level)
    }

    /// Sink writing to arbitrary streams; used by tests.
    pub fn with_writers(
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
        colors: bool,
        min_level: Level,
    ) -> Self {
        Self {
            out: Arc::new(Mutex::new(out)),
            err: Arc::new(Mutex::new(err)),
            colors,
            min_level,
            context: FieldSet::new(),
        }
    }

    fn level_tag(&self, level: Level) -> String {
        let name = level.as_str();
        if !self.colors {
            return name.to_owned();
        }
        match level {
            Level::Debug => name.blue().to_string(),
            Level::Info => name.green().to_string(),
            Level::Warn => name.yellow().to_string(),
            Level::Error => name.red().to_string(),
            Level::Critical | Level::Panic | Level::Fatal => name.red().bold().to_string(),
        }
    }

    fn format(&self, record: &Record, call_site: &[Field]) -> String {
        let timestamp: DateTime<Utc> = record.metadata.timestamp.into();
        let mut line = format!(
            "{}\t{}\t{}\t{}",
            timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.level_tag(record.level),
            record.logger,
            record.message,
        );

        let mut rendered = Vec::new();
        for field in self.context.iter() {
            rendered.push(format!("{}={}", field.key, field.value));
        }
        for field in call_site {
            rendered.push(format!("{}={}", field.key, field.value));
        }
        for (key, value) in &record.metadata.key_values {
            rendered.push(format!("{key}={value}"));
        }
        if !rendered.is_empty() {
            line.push_str("\t{");
            line.push_str(&rendered.join(" "));
            line.push('}');
        }

        if let Some(stack) = &record.stack {
            line.push('\n');
            line.push_str(stack);
        }
        line
    }
}

impl Sink for ConsoleSink {
    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn write(&self, record: &Record, fields: &[Field]) -> Result<(), Error> {
        let line = self.format(record, fields);
        let writer = if record.level >= Level::Error {
            &self.err
        } else {
            &self.out
        };
        let mut writer = writer.lock();
        // A dead console stream must not take the logging pipeline with it.
        if writeln!(writer, "{line}").and_then(|()| writer.flush()).is_err() {
            log::warn!("console sink write failed");
        }
        Ok(())
    }

    fn with_fields(&self, fields: &[Field]) -> Arc<dyn Sink> {
        Arc::new(ConsoleSink {
            out: Arc::clone(&self.out),
            err: Arc::clone(&self.err),
            colors: self.colors,
            min_level: self.min_level,
            context: self.context.extended(fields),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Thread-safe capture buffer for console output.

    use super::*;

    #[derive(Clone, Default)]
    pub struct SharedBuf {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl SharedBuf {
        pub fn contents(&self) -> String {
            String::from_utf8(self.buffer.lock().clone()).expect("console output is UTF-8")
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buffer.lock().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
