//! Deployment-environment resolution.
//!
//! The environment is derived from configuration exactly once per process.
//! Running under a test harness forces [`Environment::Test`] regardless of
//! any configured indicator, so tests never require live collector
//! configuration just because application code logs.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::OnceCell;

use crate::error::Error;
use crate::settings::Settings;

static RESOLVED: OnceCell<Environment> = OnceCell::new();

/// The four recognized deployment environments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Environment {
    Test,
    Dev,
    Staging,
    Prod,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "test" => Ok(Self::Test),
            "dev" | "development" => Ok(Self::Dev),
            "staging" => Ok(Self::Staging),
            "prod" | "production" => Ok(Self::Prod),
            _ => Err(()),
        }
    }
}

impl Environment {
    /// Lower-case name, also the value of the `env` field attached to
    /// forwarded entries.
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Test => "test",
            Environment::Dev => "dev",
            Environment::Staging => "staging",
            Environment::Prod => "prod",
        }
    }

    /// Resolve the environment from settings.
    ///
    /// Test-harness detection wins unconditionally. Otherwise the explicit
    /// indicator is required: absent is [`Error::EnvUnset`], unknown is
    /// [`Error::EnvUnparseable`].
    pub fn resolve(settings: &Settings) -> Result<Self, Error> {
        Self::resolve_with_harness(settings, cfg!(test))
    }

    pub(crate) fn resolve_with_harness(
        settings: &Settings,
        in_test_harness: bool,
    ) -> Result<Self, Error> {
        if in_test_harness {
            return Ok(Self::Test);
        }
        let raw = settings.environment.as_deref().ok_or(Error::EnvUnset)?;
        raw.parse()
            .map_err(|()| Error::EnvUnparseable(raw.to_owned()))
    }

    /// Resolve once and memoize for the life of the process.
    ///
    /// Subsequent calls return the cached value without consulting the
    /// settings again.
    pub fn resolved(settings: &Settings) -> Result<Self, Error> {
        Self::resolved_with(settings, cfg!(test))
    }

    pub(crate) fn resolved_with(
        settings: &Settings,
        in_test_harness: bool,
    ) -> Result<Self, Error> {
        RESOLVED
            .get_or_try_init(|| Self::resolve_with_harness(settings, in_test_harness))
            .copied()
    }
}
