//! Log entry representation.
//!
//! A [`Record`] captures one log call together with its contextual
//! metadata: timestamp, source location, and any key/values stamped onto
//! the encoded entry itself. Records are ephemeral; they exist for the
//! duration of a single write and are never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::level::Level;

/// Contextual metadata attached to a record.
#[derive(Clone, Debug)]
pub struct Metadata {
    /// Source file of the log call.
    pub filename: String,
    /// Line number in the source file.
    pub line_number: u32,
    /// Time the record was created.
    pub timestamp: SystemTime,
    /// Key/values stamped onto the encoded entry. Highest merge
    /// precedence; see [`fields::merge`](crate::fields::merge).
    pub key_values: BTreeMap<String, String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            filename: String::new(),
            line_number: 0,
            timestamp: SystemTime::now(),
            key_values: BTreeMap::new(),
        }
    }
}

/// One structured log entry.
#[derive(Clone, Debug)]
pub struct Record {
    /// Name of the logger that produced the record.
    pub logger: String,
    pub level: Level,
    pub message: String,
    /// Captured backtrace text for error-and-above entries.
    pub stack: Option<String>,
    pub metadata: Metadata,
}

impl Record {
    pub fn new(logger: &str, level: Level, message: &str) -> Self {
        Self {
            logger: logger.to_owned(),
            level,
            message: message.to_owned(),
            stack: None,
            metadata: Metadata::default(),
        }
    }

    /// Construct a record with explicit source location and entry fields.
    pub fn with_metadata(logger: &str, level: Level, message: &str, metadata: Metadata) -> Self {
        Self {
            logger: logger.to_owned(),
            level,
            message: message.to_owned(),
            stack: None,
            metadata,
        }
    }

    pub fn with_stack(mut self, stack: String) -> Self {
        self.stack = Some(stack);
        self
    }

    /// Timestamp as Unix seconds, as carried on the GELF wire.
    pub fn unix_timestamp(&self) -> i64 {
        match self.metadata.timestamp.duration_since(UNIX_EPOCH) {
            Ok(dur) => dur.as_secs() as i64,
            Err(e) => -(e.duration().as_secs() as i64),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.level, self.message)
    }
}
