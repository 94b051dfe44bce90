//! GELF wire encoding and the network sink.
//!
//! `GelfSink` is the per-entry write path for network-enabled
//! environments: merge the field layers, map the severity, build the wire
//! message, and send it through the current transport handle. A failed
//! send triggers a bounded reconnect-and-resend cycle with a brand-new
//! transport per attempt; the first attempt that both connects and sends
//! becomes the sink's new handle. The handle lock is held across the whole
//! cycle so concurrent writers never observe a half-installed handle.

use std::any::Any;
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::Error;
use crate::fields::{self, Field, FieldSet};
use crate::level::Level;
use crate::record::Record;
use crate::sink::Sink;
use crate::transport::{Connector, Transport};

/// Transport reconstructions attempted after a failed send.
pub const MAX_RECONNECT_ATTEMPTS: usize = 3;

/// Static message details shared by every entry a sink forwards.
#[derive(Clone, Debug)]
pub struct GelfMeta {
    /// GELF version tag (`version` field).
    pub version: String,
    /// Resolved hostname (`host` field).
    pub hostname: String,
    /// Application name, seeded into the extension fields.
    pub app_name: String,
}

/// Network sink speaking GELF to the collector.
pub struct GelfSink {
    transport: Arc<Mutex<Box<dyn Transport>>>,
    connector: Arc<dyn Connector>,
    context: FieldSet,
    meta: Arc<GelfMeta>,
}

impl GelfSink {
    /// Construct the sink by opening an initial connection.
    ///
    /// An outright construction failure propagates; the caller decides
    /// whether to downgrade (the lazy handle does, initialization does not).
    pub fn connect(meta: GelfMeta, connector: Arc<dyn Connector>) -> Result<Self, Error> {
        let transport = connector.connect()?;
        Ok(Self::from_parts(meta, connector, transport))
    }

    /// Assemble a sink around an already-open transport.
    pub fn from_parts(
        meta: GelfMeta,
        connector: Arc<dyn Connector>,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            connector,
            context: FieldSet::new(),
            meta: Arc::new(meta),
        }
    }

    fn payload(&self, record: &Record, call_site: &[Field]) -> Result<Vec<u8>, Error> {
        let structural = [
            ("file", record.metadata.filename.clone()),
            ("line", record.metadata.line_number.to_string()),
            ("logger_name", record.logger.clone()),
            ("app_name", self.meta.app_name.clone()),
        ];
        let merged = fields::merge(
            &structural,
            &self.context,
            call_site,
            &record.metadata.key_values,
        );
        encode(&self.meta, record, &merged)
    }

    /// Send, reconnecting with a fresh transport on failure.
    ///
    /// Each reconnect attempt owns its own handle; only a fully successful
    /// connect-and-send installs it as the sink's transport. The previous
    /// handle is closed on replacement.
    fn send_with_retry(&self, payload: &[u8]) -> Result<(), Error> {
        let mut handle = self.transport.lock();
        let mut last_err = match handle.send(payload) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };

        for _ in 0..MAX_RECONNECT_ATTEMPTS {
            match self.connector.connect() {
                Ok(mut fresh) => match fresh.send(payload) {
                    Ok(()) => {
                        let mut old = std::mem::replace(&mut *handle, fresh);
                        let _ = old.close();
                        return Ok(());
                    }
                    Err(err) => last_err = err,
                },
                Err(Error::ConnectionFailed(err)) => last_err = err,
                Err(other) => last_err = io::Error::other(other.to_string()),
            }
        }

        Err(Error::SendFailed {
            attempts: MAX_RECONNECT_ATTEMPTS,
            source: last_err,
        })
    }
}

impl Sink for GelfSink {
    /// Debug entries stay off-box; the network tier accepts Info and above.
    fn enabled(&self, level: Level) -> bool {
        level >= Level::Info
    }

    fn write(&self, record: &Record, fields: &[Field]) -> Result<(), Error> {
        let payload = self.payload(record, fields)?;
        self.send_with_retry(&payload)
    }

    fn with_fields(&self, fields: &[Field]) -> Arc<dyn Sink> {
        Arc::new(GelfSink {
            transport: Arc::clone(&self.transport),
            connector: Arc::clone(&self.connector),
            context: self.context.extended(fields),
            meta: Arc::clone(&self.meta),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One GELF message as it goes on the wire.
#[derive(Serialize)]
struct WireMessage<'a> {
    version: &'a str,
    host: &'a str,
    short_message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    full_message: Option<&'a str>,
    timestamp: i64,
    level: u8,
    #[serde(flatten)]
    extras: BTreeMap<String, &'a str>,
}

/// Build the GELF message as JSON bytes.
///
/// Fixed fields first, then the merged extras with the underscore prefix
/// GELF requires. `_id` is reserved by the protocol and never emitted.
fn encode(
    meta: &GelfMeta,
    record: &Record,
    extras: &BTreeMap<String, String>,
) -> Result<Vec<u8>, Error> {
    let msg = WireMessage {
        version: &meta.version,
        host: &meta.hostname,
        short_message: &record.message,
        full_message: record.stack.as_deref(),
        timestamp: record.unix_timestamp(),
        level: record.level.syslog_severity(),
        extras: extras
            .iter()
            .filter(|(key, _)| key.as_str() != "id")
            .map(|(key, value)| (format!("_{key}"), value.as_str()))
            .collect(),
    };
    serde_json::to_vec(&msg).map_err(Error::EncodeFailed)
}


#[cfg(test)]
mod tests {
    use super::test_support::{FakeConnector, FakeTransport, meta};
    use super::*;
    use crate::fields::string;
    use serde_json::Value;
    use std::time::{Duration, UNIX_EPOCH};

    type SendLog = Arc<Mutex<Vec<(usize, Vec<u8>)>>>;

    fn record() -> Record {
        let mut record = Record::new("api", Level::Error, "oops");
        record.metadata.filename = "src/api.rs".to_owned();
        record.metadata.line_number = 42;
        record.metadata.timestamp = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        record
    }

    fn decode(payload: &[u8]) -> serde_json::Map<String, Value> {
        let value: Value = serde_json::from_slice(payload).expect("payload is JSON");
        value.as_object().expect("payload is an object").clone()
    }

    fn sink_with_failing_handle(
        initial_failures: usize,
        scripted: Vec<Result<Box<dyn Transport>, Error>>,
        log: &SendLog,
    ) -> GelfSink {
        let initial = FakeTransport::new(0, initial_failures, Arc::clone(log));
        GelfSink::from_parts(
            meta(),
            Arc::new(FakeConnector::scripted(scripted)),
            Box::new(initial),
        )
    }

    #[test]
    fn writes_without_retry_when_handle_is_healthy() {
        let log: SendLog = Arc::default();
        let sink = sink_with_failing_handle(0, vec![], &log);

        sink.write(&record(), &[string("code", "42")])
            .expect("healthy handle sends");

        let sent = log.lock();
        assert_eq!(sent.len(), 1);
        let msg = decode(&sent[0].1);
        assert_eq!(msg["version"], "1.1");
        assert_eq!(msg["host"], "unit-host");
        assert_eq!(msg["short_message"], "oops");
        assert_eq!(msg["timestamp"], 1_700_000_000_i64);
        assert_eq!(msg["level"], 3);
        assert_eq!(msg["_code"], "42");
        assert_eq!(msg["_file"], "src/api.rs");
        assert_eq!(msg["_line"], "42");
        assert_eq!(msg["_logger_name"], "api");
        assert_eq!(msg["_app_name"], "unit-app");
    }

    #[test]
    fn retry_installs_the_first_fully_successful_transport() {
        let log: SendLog = Arc::default();
        // Initial handle fails, reconnect 1 fails its send, reconnect 2
        // succeeds: three send attempts in total.
        let scripted: Vec<Result<Box<dyn Transport>, Error>> = vec![
            Ok(Box::new(FakeTransport::new(1, 1, Arc::clone(&log)))),
            Ok(Box::new(FakeTransport::new(2, 0, Arc::clone(&log)))),
        ];
        let sink = sink_with_failing_handle(usize::MAX, scripted, &log);

        sink.write(&record(), &[]).expect("third attempt succeeds");
        assert_eq!(log.lock().last().map(|(id, _)| *id), Some(2));

        // The successful transport is now the sink's handle.
        sink.write(&record(), &[]).expect("reuses installed handle");
        assert_eq!(log.lock().last().map(|(id, _)| *id), Some(2));
    }

    #[test]
    fn exhausted_retries_return_the_last_error() {
        let log: SendLog = Arc::default();
        let connector = Arc::new(FakeConnector::scripted(vec![
            Err(Error::ConnectionFailed(io::Error::other("refused-1"))),
            Err(Error::ConnectionFailed(io::Error::other("refused-2"))),
            Err(Error::ConnectionFailed(io::Error::other("refused-3"))),
        ]));
        let initial = FakeTransport::new(0, usize::MAX, Arc::clone(&log));
        let sink = GelfSink::from_parts(
            meta(),
            Arc::clone(&connector) as Arc<dyn Connector>,
            Box::new(initial),
        );

        let err = sink.write(&record(), &[]).expect_err("all attempts fail");
        match err {
            Error::SendFailed { attempts, source } => {
                assert_eq!(attempts, MAX_RECONNECT_ATTEMPTS);
                assert_eq!(source.to_string(), "refused-3");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*connector.connect_calls.lock(), MAX_RECONNECT_ATTEMPTS);
    }

    #[test]
    fn contextual_fields_merge_below_call_site_and_entry() {
        let log: SendLog = Arc::default();
        let sink = sink_with_failing_handle(0, vec![], &log);
        let derived = sink.with_fields(&[string("a", "1"), string("env", "staging")]);

        let mut record = record();
        record
            .metadata
            .key_values
            .insert("a".to_owned(), "4".to_owned());
        derived
            .write(&record, &[string("a", "2"), string("b", "3")])
            .expect("send succeeds");

        let sent = log.lock();
        let msg = decode(&sent[0].1);
        assert_eq!(msg["_a"], "4", "entry-derived layer wins");
        assert_eq!(msg["_b"], "3");
        assert_eq!(msg["_env"], "staging");
    }

    #[test]
    fn derivation_shares_the_transport_and_keeps_the_parent_clean() {
        let log: SendLog = Arc::default();
        let sink = sink_with_failing_handle(0, vec![], &log);
        let _derived = sink.with_fields(&[string("region", "eu")]);

        sink.write(&record(), &[]).expect("parent still writes");
        let msg = decode(&log.lock()[0].1);
        assert!(
            !msg.contains_key("_region"),
            "parent context must be unchanged"
        );
    }

    #[test]
    fn debug_entries_are_not_enabled() {
        let log: SendLog = Arc::default();
        let sink = sink_with_failing_handle(0, vec![], &log);
        assert!(!sink.enabled(Level::Debug));
        assert!(sink.enabled(Level::Info));
        assert!(sink.enabled(Level::Fatal));
    }

    #[test]
    fn full_message_is_omitted_without_a_stack() {
        let log: SendLog = Arc::default();
        let sink = sink_with_failing_handle(0, vec![], &log);

        sink.write(&record(), &[]).expect("send succeeds");
        let msg = decode(&log.lock()[0].1);
        assert!(!msg.contains_key("full_message"));
    }

    #[test]
    fn reserved_id_key_is_never_emitted() {
        let log: SendLog = Arc::default();
        let sink = sink_with_failing_handle(0, vec![], &log);

        sink.write(&record(), &[string("id", "123")])
            .expect("send succeeds");
        let msg = decode(&log.lock()[0].1);
        assert!(!msg.contains_key("_id"));
        assert!(!msg.contains_key("id"));
    }
}
