//! Command-line surface

use crate::commands::Commands;
use clap::Parser;
use runguard_config::{ConfigLoader, ControlConfig};
use runguard_core::Result;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "runguard")]
#[command(about = "Retry, timeout, offload and memoization for functions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (JSON); `RUNGUARD_CONFIG` is used when omitted
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Ignore `RUNGUARD_*` environment overrides
    #[arg(long)]
    pub no_env: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Effective configuration for this invocation
    pub fn load_config(&self) -> Result<ControlConfig> {
        let mut loader = ConfigLoader::new().use_env(!self.no_env);
        if let Some(path) = &self.config {
            loader = loader.file(path.clone());
        }
        loader.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Scenario;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_demo() {
        let cli =
            Cli::try_parse_from(["runguard", "--config", "rg.json", "demo", "retry"]).unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("rg.json")));
        assert!(matches!(
            cli.command,
            Commands::Demo {
                scenario: Scenario::Retry
            }
        ));
    }

    #[test]
    fn test_demo_defaults_to_all() {
        let cli = Cli::try_parse_from(["runguard", "demo"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Demo {
                scenario: Scenario::All
            }
        ));
    }

    #[test]
    fn test_unknown_scenario_rejected() {
        assert!(Cli::try_parse_from(["runguard", "demo", "teleport"]).is_err());
    }
}
