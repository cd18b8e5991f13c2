//! `parley init` — write a default config file.

use super::CliResult;
use parley_config::AppConfig;
use std::path::Path;

pub fn run(config_path: Option<&Path>, force: bool) -> CliResult {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));

    let written = write_default(&path, force)?;
    if written {
        println!("  Wrote default config to {}", path.display());
        println!();
        println!("  Next steps:");
        println!("    1. Set PARLEY_API_KEY (or api_key in the file)");
        println!("    2. Optionally set ALPHA_VANTAGE_API_KEY for stock quotes");
        println!("    3. Run: parley chat");
    } else {
        println!("  Config already exists at {} (use --force to overwrite)", path.display());
    }
    Ok(())
}

/// Returns false if the file exists and `force` is off.
fn write_default(path: &Path, force: bool) -> std::io::Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(true)
}
