//! Settings tree for the execution-control wrappers

use runguard_core::{
    constants::{
        DEFAULT_CACHE_TTL, DEFAULT_KEY_PREFIX, DEFAULT_MAX_ATTEMPTS,
        DEFAULT_MEMORY_CACHE_CAPACITY, DEFAULT_RETRY_DELAY_MS, RUNGUARD_CACHE_CAPACITY_VAR,
        RUNGUARD_CACHE_PREFIX_VAR, RUNGUARD_CACHE_TTL_SECS_VAR, RUNGUARD_LOG_VAR,
        RUNGUARD_MAX_WORKERS_VAR, RUNGUARD_RETRY_DELAY_MS_VAR, RUNGUARD_RETRY_MAX_ATTEMPTS_VAR,
        RUNGUARD_TIMEOUT_MS_VAR,
    },
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Complete configuration surface of the wrappers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub retry: RetrySettings,
    pub timeout: TimeoutSettings,
    pub offload: OffloadSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
}

/// Retry controller options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total executions per external call, including the first
    pub max_attempts: u32,
    /// Wait between failed attempts, in milliseconds
    pub delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl RetrySettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Store `delay` as whole milliseconds
    pub fn set_delay(&mut self, delay: Duration) -> Result<()> {
        self.delay_ms = whole_millis("retry.delay_ms", delay)?;
        Ok(())
    }
}

/// Timeout guard options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Wall-clock bound per invocation; no guard is applied when unset
    pub deadline_ms: Option<u64>,
}

impl TimeoutSettings {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    /// Store `deadline` as whole milliseconds, or clear it
    pub fn set_deadline(&mut self, deadline: Option<Duration>) -> Result<()> {
        self.deadline_ms = deadline
            .map(|deadline| whole_millis("timeout.deadline_ms", deadline))
            .transpose()?;
        Ok(())
    }
}

/// Executor offload options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffloadSettings {
    /// Worker count for a dedicated pool; the shared default is used when unset
    pub max_workers: Option<usize>,
    /// Return a handle instead of waiting for the result
    pub background: bool,
}

/// Memoization options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub key_prefix: String,
    pub ttl_secs: u64,
    /// Entry bound of the in-process backend
    pub capacity: usize,
    /// Serialize concurrent misses on one key
    pub single_flight: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            capacity: DEFAULT_MEMORY_CACHE_CAPACITY,
            single_flight: false,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Logging options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, overridden by `RUNGUARD_LOG` in `apply_env`
    pub filter: String,
    pub ansi: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            ansi: false,
        }
    }
}

impl ControlConfig {
    /// Parse a JSON document; missing sections and fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::json("invalid runguard configuration", e))
    }

    /// Read and parse a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::file_system(path, "read configuration", e))?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Self::from_json_str(&content)
    }

    /// Apply `RUNGUARD_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup`.
    ///
    /// A variable that is set but does not parse is a configuration error
    /// rather than being ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = parsed(&lookup, RUNGUARD_RETRY_MAX_ATTEMPTS_VAR)? {
            self.retry.max_attempts = value;
        }
        if let Some(value) = parsed(&lookup, RUNGUARD_RETRY_DELAY_MS_VAR)? {
            self.retry.delay_ms = value;
        }
        if let Some(value) = parsed(&lookup, RUNGUARD_TIMEOUT_MS_VAR)? {
            self.timeout.deadline_ms = Some(value);
        }
        if let Some(value) = parsed(&lookup, RUNGUARD_MAX_WORKERS_VAR)? {
            self.offload.max_workers = Some(value);
        }
        if let Some(prefix) = lookup(RUNGUARD_CACHE_PREFIX_VAR) {
            self.cache.key_prefix = prefix;
        }
        if let Some(value) = parsed(&lookup, RUNGUARD_CACHE_TTL_SECS_VAR)? {
            self.cache.ttl_secs = value;
        }
        if let Some(value) = parsed(&lookup, RUNGUARD_CACHE_CAPACITY_VAR)? {
            self.cache.capacity = value;
        }
        if let Some(filter) = lookup(RUNGUARD_LOG_VAR) {
            self.logging.filter = filter;
        }
        Ok(())
    }

    /// Load from an optional file, then apply environment overrides, then validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut loader = crate::ConfigLoader::new();
        if let Some(path) = path {
            loader = loader.file(path.to_path_buf());
        }
        loader.load()
    }

    /// Reject values no wrapper can be built from
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts < 1 {
            return Err(Error::configuration(
                "retry.max_attempts must be at least 1",
            ));
        }
        if self.timeout.deadline_ms == Some(0) {
            return Err(Error::configuration(
                "timeout.deadline_ms must be greater than zero",
            ));
        }
        if self.offload.max_workers == Some(0) {
            return Err(Error::configuration(
                "offload.max_workers must be at least 1",
            ));
        }
        if self.cache.ttl_secs == 0 {
            return Err(Error::configuration("cache.ttl_secs must be greater than zero"));
        }
        if self.cache.capacity == 0 {
            return Err(Error::configuration("cache.capacity must be at least 1"));
        }
        if self.cache.key_prefix.is_empty() {
            return Err(Error::configuration("cache.key_prefix must not be empty"));
        }
        Ok(())
    }
}

fn whole_millis(field: &str, duration: Duration) -> Result<u64> {
    u64::try_from(duration.as_millis()).map_err(|_| {
        Error::configuration(format!("{field} cannot hold {duration:?} in milliseconds"))
    })
}

fn parsed<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            Error::configuration(format!("{name}='{raw}' is not a valid value: {e}"))
        }),
    }
}
