//! Subcommand implementations and the wiring they share.

pub mod chat;
pub mod history;
pub mod init;
pub mod send;
pub mod sessions;
pub mod tools;

use parley_agent::Assistant;
use parley_config::AppConfig;
use parley_core::session::SessionStore;
use parley_providers::OpenAiCompatGateway;
use std::path::Path;
use std::sync::Arc;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub fn load_config(path: Option<&Path>) -> CliResult<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_with(path),
        None => AppConfig::load(),
    };
    Ok(config.map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Open the configured session store. The caller closes it.
pub async fn open_store(config: &AppConfig) -> CliResult<Arc<dyn SessionStore>> {
    let path = config.sessions_path();
    tracing::debug!(backend = %config.sessions.backend, path = %path.display(), "Opening session store");
    Ok(parley_sessions::open(&config.sessions.backend, &path).await?)
}

/// Build the full assistant: gateway, tools and store.
pub async fn build_assistant(config: &AppConfig) -> CliResult<Assistant> {
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    PARLEY_API_KEY=sk-...");
        eprintln!("    OPENAI_API_KEY=sk-...");
        eprintln!();
        eprintln!("  Or add `api_key` to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let gateway = Arc::new(OpenAiCompatGateway::from_config(config)?);
    let registry = Arc::new(parley_tools::default_registry(&config.tools)?);
    let store = open_store(config).await?;

    Ok(Assistant::with_settings(
        gateway,
        store,
        registry,
        &config.agent,
    ))
}
