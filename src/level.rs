use std::fmt;
use std::str::FromStr;

/// Log severity levels, ordered from least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Critical,
    Panic,
    Fatal,
}

impl Default for Level {
    fn default() -> Self {
        Self::Info
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" => Ok(Self::Critical),
            "PANIC" => Ok(Self::Panic),
            "FATAL" => Ok(Self::Fatal),
            _ => Err(()),
        }
    }
}

impl Level {
    /// Upper-case name used by the console encoder.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
            Level::Panic => "PANIC",
            Level::Fatal => "FATAL",
        }
    }

    /// Map to the syslog-style numeric severity carried in GELF `level`.
    ///
    /// The mapping is total; every variant has a fixed severity and the
    /// result never changes between calls.
    pub fn syslog_severity(self) -> u8 {
        match self {
            Level::Debug => 7,
            Level::Info => 6,
            Level::Warn => 4,
            Level::Error => 3,
            Level::Critical => 2,
            Level::Panic => 2,
            Level::Fatal => 1,
        }
    }
}
