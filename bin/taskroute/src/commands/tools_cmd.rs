use taskroute_tools::ToolRegistry;

use super::load_config;

/// List all registered tools.
pub async fn list() -> anyhow::Result<()> {
    let (_, config) = load_config()?;
    let registry = ToolRegistry::with_defaults(&config)?;
    let tools = registry.tools_info();

    println!();
    println!("🔧 Registered tools ({} total)", tools.len());
    println!();

    for tool in &tools {
        let short_desc: String = tool.description.chars().take(60).collect();
        let ellipsis = if tool.description.chars().count() > 60 { "..." } else { "" };
        println!("     {:<22} {}{}", tool.name, short_desc, ellipsis);
    }

    for descriptor in registry.descriptors() {
        if !descriptor.aliases.is_empty() {
            println!();
            println!("  {} aliases: {}", descriptor.name, descriptor.aliases.join(", "));
        }
    }

    Ok(())
}
