use super::config::{default_credentials_path, GovGateConfig};
use super::config_path;

/// Write a default configuration file
///
/// Creates a commented config file at the given path (or the user config
/// directory) with a credentials file location adjacent to it. Refuses to
/// overwrite an existing file.
pub fn execute(config: Option<String>) -> Result<i32, Box<dyn std::error::Error>> {
    let path = config_path(config);

    if path.exists() {
        return Err(format!("config file already exists: {}", path.display()).into());
    }

    let credentials_path = default_credentials_path();
    GovGateConfig::create_default(&path, &credentials_path)?;

    println!("Created: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Put signing keys in {}", credentials_path.display());
    println!("  2. Point [node].gateway_url at your governance gateway");
    println!("  3. Run `govgate deploy-registry` or set [registry].address");

    Ok(0)
}
