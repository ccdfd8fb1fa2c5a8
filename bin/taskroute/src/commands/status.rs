use taskroute_agent::Agent;

use super::load_config;

pub async fn run() -> anyhow::Result<()> {
    let (paths, config) = load_config()?;

    println!("taskroute status");
    println!("================");
    println!();

    let config_path = paths.config_file();
    let config_exists = config_path.exists();
    println!(
        "Config:    {} {}",
        config_path.display(),
        if config_exists { "✓" } else { "✗ (not found, using defaults)" }
    );

    let agent = Agent::from_config(config.clone())?;
    agent.initialize().await?;
    let status = agent.status()?;

    println!("Mode:      {}", status.performance_mode);
    println!("Tools:     {}", status.tools_count);
    println!("Cache TTL: {}s", config.agent.cache_ttl_secs);
    println!("Gateway:   {}:{}", config.gateway.host, config.gateway.port);
    println!();

    for tool in agent.tools_info() {
        println!("  {:<16} {}", tool.name, tool.description);
    }

    if !config_exists {
        println!();
        println!("Run `taskroute onboard` to write a config file.");
    }

    Ok(())
}
