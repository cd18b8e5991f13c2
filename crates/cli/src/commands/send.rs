//! `parley send` — one turn, answer on stdout.

use super::CliResult;
use parley_core::message::SessionId;
use std::path::Path;

pub async fn run(config_path: Option<&Path>, session: Option<String>, message: String) -> CliResult {
    let config = super::load_config(config_path)?;
    let assistant = super::build_assistant(&config).await?;

    let session = match session {
        Some(id) => SessionId::from(id),
        None => {
            let id = assistant.new_session_id();
            eprintln!("  Session: {id}");
            id
        }
    };

    let result = assistant.send_message(&session, &message).await;
    assistant.shutdown().await?;
    println!("{}", result?);
    Ok(())
}
