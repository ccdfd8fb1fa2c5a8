pub mod gateway;
pub mod onboard;
pub mod run_cmd;
pub mod status;
pub mod tools_cmd;

use taskroute_core::{Config, Paths};

/// Config from the default location, or defaults when none was written yet.
pub fn load_config() -> anyhow::Result<(Paths, Config)> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    Ok((paths, config))
}
