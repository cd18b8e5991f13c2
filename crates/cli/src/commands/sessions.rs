//! `parley sessions` — list session ids.

use super::CliResult;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> CliResult {
    let config = super::load_config(config_path)?;
    let store = super::open_store(&config).await?;

    let ids = store.list_session_ids().await;
    store.close().await?;
    let ids = ids?;

    if ids.is_empty() {
        eprintln!("  No sessions yet.");
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}
