use taskroute_agent::Agent;
use taskroute_core::PerformanceMode;

use super::load_config;

/// Process one task and print the response.
pub async fn run(message: &str, mode: Option<&str>) -> anyhow::Result<()> {
    let (_, mut config) = load_config()?;
    if let Some(mode) = mode {
        config.agent.default_mode = mode.parse::<PerformanceMode>()?;
    }
    // One-shot runs never outlive a sweep interval.
    config.agent.sweep_interval_secs = 0;

    let agent = Agent::from_config(config)?;
    agent.initialize().await?;

    let response = agent.process_task(message).await?;
    println!("{}", response.result);
    println!();
    println!(
        "({} mode, {} ms{})",
        agent.performance_mode()?,
        response.processing_time_ms,
        if response.cached { ", cached" } else { "" }
    );

    Ok(())
}
