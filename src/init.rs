//! Backend selection and the process-wide logger handle.
//!
//! A one-shot dispatch table maps the resolved environment to a backend
//! construction routine: no-op for tests, colored console for development,
//! console plus GELF network tee for staging and production. The lazy
//! process-wide handle wraps that dispatch with the console-only recovery
//! layer so an unreachable collector at boot never takes the process down.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::console::ConsoleSink;
use crate::env::Environment;
use crate::error::Error;
use crate::fields::string;
use crate::gelf::{GelfMeta, GelfSink};
use crate::level::Level;
use crate::logger::Logger;
use crate::settings::Settings;
use crate::sink::{NoopSink, Sink, TeeSink};
use crate::transport::ConfigConnector;

static HANDLE: OnceCell<Logger> = OnceCell::new();

type Initializer = fn(&Settings, Environment) -> Result<Logger, Error>;

/// Environment to construction-routine dispatch table.
static INITIALIZERS: &[(Environment, Initializer)] = &[
    (Environment::Test, build_test),
    (Environment::Dev, build_dev),
    (Environment::Staging, build_network),
    (Environment::Prod, build_network),
];

fn initializer_for(env: Environment) -> Result<Initializer, Error> {
    INITIALIZERS
        .iter()
        .find(|(candidate, _)| *candidate == env)
        .map(|(_, initializer)| *initializer)
        // An environment missing from the table is a configuration error,
        // never a silent default.
        .ok_or_else(|| Error::EnvUnparseable(env.as_str().to_owned()))
}

/// Construct a logger for the resolved environment.
///
/// This is the composition-root entry point: resolve once, build once, own
/// the result. The resolution is memoized for the process lifetime.
pub fn build(settings: &Settings) -> Result<Logger, Error> {
    let env = Environment::resolved(settings)?;
    build_for(env, settings)
}

/// Construct a logger for an explicitly supplied environment.
///
/// Skips environment resolution entirely; tests and embedders that resolve
/// the environment themselves use this to inject the outcome.
pub fn build_for(env: Environment, settings: &Settings) -> Result<Logger, Error> {
    let initializer = initializer_for(env)?;
    initializer(settings, env)
}

/// Initialize the process-wide handle from explicit settings.
///
/// Construction failures propagate; there is no silent downgrade at this
/// layer. The first successful initialization wins; later calls leave the
/// installed handle in place, without constructing (or connecting) a
/// backend that would only be dropped.
pub fn try_init(settings: &Settings) -> Result<(), Error> {
    if HANDLE.get().is_some() {
        return Ok(());
    }
    let logger = build(settings)?;
    let _ = HANDLE.set(logger);
    Ok(())
}

/// Initialize the process-wide handle from the process environment.
pub fn init() -> Result<(), Error> {
    try_init(&Settings::from_env()?)
}

/// The process-wide logger.
///
/// First access runs one full initialization from the process environment.
/// If that fails the handle retries once with networking forcibly disabled,
/// so the process can still log locally while the collector is unreachable.
/// The console-only construction itself has no failure path; were one ever
/// introduced it must be treated as fatal, since a process that cannot even
/// log locally is not worth keeping alive.
pub fn logger() -> &'static Logger {
    HANDLE.get_or_init(|| {
        let settings = Settings::from_env().unwrap_or_else(|err| {
            log::warn!("logging configuration invalid ({err}); using defaults");
            Settings::default()
        });
        match build(&settings) {
            Ok(logger) => logger,
            Err(err) => {
                log::warn!("logger initialization failed ({err}); retrying console-only");
                build_console_only(&settings)
            }
        }
    })
}

fn logger_name(settings: &Settings) -> &str {
    if settings.app_name.is_empty() {
        "root"
    } else {
        &settings.app_name
    }
}

fn build_test(settings: &Settings, _env: Environment) -> Result<Logger, Error> {
    Ok(Logger::new(logger_name(settings), Arc::new(NoopSink)))
}

fn build_dev(settings: &Settings, _env: Environment) -> Result<Logger, Error> {
    Ok(build_console_only(settings))
}

/// Console plus GELF tee for staging and production.
///
/// The console member comes first so every entry reaches local output
/// before the network send runs; a network failure never suppresses it.
fn build_network(settings: &Settings, env: Environment) -> Result<Logger, Error> {
    settings.validate_for_network()?;
    let console = ConsoleSink::stdio(settings.colors, Level::Debug);
    let gelf = GelfSink::connect(
        GelfMeta {
            version: settings.gelf_version.clone(),
            hostname: settings.hostname.clone(),
            app_name: settings.app_name.clone(),
        },
        Arc::new(ConfigConnector::new(settings.transport_config())),
    )?;
    let tee: Arc<dyn Sink> = Arc::new(TeeSink::new(vec![Arc::new(console), Arc::new(gelf)]));
    Ok(Logger::new(logger_name(settings), tee).with_fields(&[string("env", env.as_str())]))
}

fn build_console_only(settings: &Settings) -> Logger {
    let console = ConsoleSink::stdio(settings.colors, Level::Debug);
    Logger::new(logger_name(settings), Arc::new(console))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TransportKind;

    fn network_settings() -> Settings {
        Settings {
            app_name: "orders".into(),
            host: "127.0.0.1".into(),
            transport: TransportKind::Udp,
            ..Settings::default()
        }
    }

    #[test]
    fn test_environment_gets_a_noop_sink() {
        let logger = build_for(Environment::Test, &Settings::default()).expect("builds");
        assert!(logger.sink().as_any().is::<NoopSink>());
        assert!(!logger.sink().enabled(Level::Fatal));
    }

    #[test]
    fn dev_environment_gets_a_console_only_sink() {
        let logger = build_for(Environment::Dev, &Settings::default()).expect("builds");
        assert!(logger.sink().as_any().is::<ConsoleSink>());
    }

    #[test]
    fn staging_environment_gets_a_console_and_network_tee() {
        // UDP keeps construction collector-free.
        let logger = build_for(Environment::Staging, &network_settings()).expect("builds");
        // The env field is attached via with_fields, so the outermost sink
        // is the derived tee.
        let tee = logger
            .sink()
            .as_any()
            .downcast_ref::<TeeSink>()
            .expect("staging builds a tee");
        assert_eq!(tee.members().len(), 2);
        assert!(tee.members()[0].as_any().is::<ConsoleSink>());
        assert!(tee.members()[1].as_any().is::<GelfSink>());
    }

    #[test]
    fn prod_environment_gets_a_console_and_network_tee() {
        let logger = build_for(Environment::Prod, &network_settings()).expect("builds");
        assert!(logger.sink().as_any().is::<TeeSink>());
    }

    #[test]
    fn network_environments_demand_a_collector_address() {
        let settings = Settings {
            app_name: "orders".into(),
            ..Settings::default()
        };
        let err = build_for(Environment::Prod, &settings).expect_err("missing host fails");
        assert!(matches!(err, Error::ConfigInvalid(_)));
    }

    #[test]
    fn logger_name_prefers_the_app_name() {
        let logger = build_for(Environment::Test, &network_settings()).expect("builds");
        assert_eq!(logger.name(), "orders");

        let unnamed = build_for(Environment::Test, &Settings::default()).expect("builds");
        assert_eq!(unnamed.name(), "root");
    }
}
