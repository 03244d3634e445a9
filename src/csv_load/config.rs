use std::env;
use std::fmt;

use crate::csv_load::error::LoaderError;

// Environment variables the loader requires before any I/O happens
pub const ENV_SERVER: &str = "AZURE_SERVER";
pub const ENV_DATABASE: &str = "AZURE_DATABASE";
pub const ENV_USERNAME: &str = "AZURE_USERNAME";
pub const ENV_PASSWORD: &str = "AZURE_PASSWORD";

// Optional override for the run mode, demo when unset
pub const ENV_MODE: &str = "LOADER_MODE";

// Seconds the postgres attach waits before giving up
pub const CONNECT_TIMEOUT_SECS: u32 = 30;

const DEFAULT_PORT: u16 = 5432;

/// Connection parameters for the destination database, validated once at
/// startup and passed down from there.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub server: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl LoaderConfig {
    /// Build the config from the process environment. Fails on the first
    /// missing variable so a bad deployment never reaches the connect step.
    pub fn from_env() -> Result<Self, LoaderError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Lookup-based constructor so validation can be exercised without
    // mutating the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LoaderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or(LoaderError::MissingConfig(key))
        };

        Ok(Self {
            server: require(ENV_SERVER)?,
            database: require(ENV_DATABASE)?,
            username: require(ENV_USERNAME)?,
            password: require(ENV_PASSWORD)?,
        })
    }

    /// Render the libpq keyword string used to attach the destination.
    pub fn postgres_conn_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={} connect_timeout={}",
            self.server,
            DEFAULT_PORT,
            self.database,
            self.username,
            self.password,
            CONNECT_TIMEOUT_SECS
        )
    }
}

/// Which variant of the load to run.
/// Demo clears the tables and reloads a small slice; production appends the
/// full files with chunked child inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Demo,
    Production,
}

impl RunMode {
    pub fn from_env() -> Self {
        match env::var(ENV_MODE) {
            Ok(value) if value.eq_ignore_ascii_case("production") => RunMode::Production,
            _ => RunMode::Demo,
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Demo => write!(f, "demo"),
            RunMode::Production => write!(f, "production"),
        }
    }
}
