//! Environment-driven structured logging with a GELF network tier.
//!
//! gelfling picks a logging backend from the resolved deployment
//! environment: a no-op sink under test, a colored console in development,
//! and a console plus GELF-over-TCP/TLS (or UDP) fan-out in staging and
//! production. The network tier retries transient send failures with a
//! freshly constructed transport, bounded at three reconnect attempts, so
//! a flapping collector never crashes a long-running service and a dead
//! one is still reported to the caller.
//!
//! Most applications initialize once at boot and use the process-wide
//! handle:
//!
//! ```no_run
//! use gelfling::fields::string;
//!
//! gelfling::init().expect("logging configuration");
//! gelfling::info("server listening", &[string("port", "8080")]);
//!
//! let request_log = gelfling::logger().with_fields(&[string("request_id", "abc123")]);
//! request_log.warn("slow upstream", &[]);
//! ```
//!
//! Composition roots that prefer explicit ownership construct the logger
//! value directly with [`build`] and pass it around.

pub mod console;
pub mod env;
pub mod error;
pub mod fields;
pub mod gelf;
pub mod init;
pub mod level;
pub mod logger;
pub mod record;
pub mod settings;
pub mod sink;
pub mod transport;

pub use env::Environment;
pub use error::Error;
pub use fields::{Field, FieldValue};
pub use init::{build, build_for, init, logger, try_init};
pub use level::Level;
pub use logger::Logger;
pub use record::Record;
pub use settings::{Settings, TransportKind};

/// Log at `Debug` through the process-wide handle.
#[track_caller]
pub fn debug(message: &str, fields: &[Field]) {
    logger().debug(message, fields);
}

/// Log at `Info` through the process-wide handle.
#[track_caller]
pub fn info(message: &str, fields: &[Field]) {
    logger().info(message, fields);
}

/// Log at `Warn` through the process-wide handle.
#[track_caller]
pub fn warn(message: &str, fields: &[Field]) {
    logger().warn(message, fields);
}

/// Log at `Error` through the process-wide handle.
#[track_caller]
pub fn error(message: &str, fields: &[Field]) {
    logger().error(message, fields);
}

/// Log at `Critical` through the process-wide handle.
#[track_caller]
pub fn critical(message: &str, fields: &[Field]) {
    logger().critical(message, fields);
}
