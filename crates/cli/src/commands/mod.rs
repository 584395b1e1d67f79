use clap::{Subcommand, ValueEnum};

pub mod config;
pub mod demo;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the built-in scenarios against the wrappers and print each outcome
    Demo {
        #[arg(value_enum, default_value_t = Scenario::All)]
        scenario: Scenario,
    },

    /// Print the effective configuration as JSON
    Config,
}

/// Scenario group run by `demo`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    Retry,
    Timeout,
    Memoize,
    Offload,
    All,
}
