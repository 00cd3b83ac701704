// crates/yumasim-cli/src/config.rs
//
// Simulation configuration for the CLI.
// Loaded from a TOML file with `[simulation]` and `[yuma]` tables, or
// populated with the research defaults.

use std::fs;

use yumasim_core::YumaConfig;

/// Read and validate a configuration file.
pub fn load(path: &str) -> Result<YumaConfig, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)?;
    let config: YumaConfig = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

/// Load `path` if given, otherwise use the defaults.
///
/// A file that was asked for but cannot be read, parsed or validated is an
/// error; it never falls back to defaults.
pub fn load_or_default(path: Option<&str>) -> Result<YumaConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(YumaConfig::default());
    };
    let config = load(path).map_err(|e| format!("Could not load config from {}: {}", path, e))?;
    tracing::info!("Loaded configuration from {}", path);
    Ok(config)
}
