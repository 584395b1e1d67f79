use runguard_config::ControlConfig;

pub fn execute(config: &ControlConfig) -> eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
