//! Configuration for the runguard execution-control wrappers
//!
//! Settings come from an optional JSON file, then `RUNGUARD_*` environment
//! overrides, and are validated once before any wrapper is built from them.

pub mod config;
pub mod loader;


pub use config::{
    CacheSettings, ControlConfig, LoggingSettings, OffloadSettings, RetrySettings,
    TimeoutSettings,
};
pub use loader::ConfigLoader;
