//! `parley tools` — list the built-in tools.

use super::CliResult;
use std::path::Path;

pub fn run(config_path: Option<&Path>) -> CliResult {
    let config = super::load_config(config_path)?;
    let registry = parley_tools::default_registry(&config.tools)?;

    for def in registry.describe_all() {
        let args: Vec<String> = def.parameters["properties"]
            .as_object()
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default();
        println!("{}({})", def.name, args.join(", "));
        println!("    {}", def.description);
    }
    Ok(())
}
