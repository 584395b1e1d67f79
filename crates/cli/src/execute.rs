use crate::commands::{self, Commands};
use runguard_config::ControlConfig;
use std::sync::Arc;

impl Commands {
    pub async fn execute(self, config: Arc<ControlConfig>) -> eyre::Result<()> {
        match self {
            Commands::Demo { scenario } => commands::demo::execute(&config, scenario).await,
            Commands::Config => commands::config::execute(&config),
        }
    }
}
