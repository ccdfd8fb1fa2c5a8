use std::io::{self, Write};
use taskroute_core::{Config, Paths};

pub async fn run(force: bool) -> anyhow::Result<()> {
    let paths = Paths::new();

    if paths.config_file().exists() && !force {
        print!("Config already exists. Overwrite? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    write_default_config(&paths)?;
    println!("✓ Created config: {}", paths.config_file().display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to tune modes and tools", paths.config_file().display());
    println!("  2. Run `taskroute status` to verify configuration");
    println!("  3. Run `taskroute run -m \"Tell me about Pikachu\"`");

    Ok(())
}

fn write_default_config(paths: &Paths) -> anyhow::Result<()> {
    Config::default().save(&paths.config_file())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_loadable() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_base(dir.path().join("home"));
        write_default_config(&paths).unwrap();

        let config = Config::load(&paths.config_file()).unwrap();
        assert_eq!(config.gateway.port, 3000);
        assert_eq!(config.agent.cache_ttl_secs, 3600);
    }
}
