//! `parley chat` — interactive chat on stdin.
//!
//! Lines starting with `/` are commands: `/new`, `/sessions`,
//! `/switch ID` and `/exit`. Everything else is sent to the assistant.

use super::CliResult;
use parley_agent::Assistant;
use parley_config::AppConfig;
use parley_core::event::TurnEvent;
use parley_core::message::SessionId;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

/// A parsed input line.
#[derive(Debug, PartialEq)]
enum Input {
    New,
    Sessions,
    Switch(String),
    Exit,
    Help,
    Message(String),
    Empty,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Message(line.to_string());
    };

    let mut parts = command.splitn(2, char::is_whitespace);
    match (parts.next(), parts.next().map(str::trim)) {
        (Some("new"), _) => Input::New,
        (Some("sessions"), _) => Input::Sessions,
        (Some("switch"), Some(id)) if !id.is_empty() => Input::Switch(id.to_string()),
        (Some("exit" | "quit"), _) => Input::Exit,
        _ => Input::Help,
    }
}

pub async fn run(config_path: Option<&Path>, session: Option<String>) -> CliResult {
    let config = super::load_config(config_path)?;
    let assistant = super::build_assistant(&config).await?;

    let result = chat_loop(&config, &assistant, session).await;
    assistant.shutdown().await?;
    result
}

async fn chat_loop(config: &AppConfig, assistant: &Assistant, session: Option<String>) -> CliResult {
    let mut session = session
        .map(SessionId::from)
        .unwrap_or_else(|| assistant.new_session_id());

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║          Parley — Interactive Mode           ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:     {}", config.model);
    println!("  Sessions:  {} ({})", config.sessions.backend, config.sessions_path().display());
    let tool_names: Vec<String> = assistant.tools().into_iter().map(|t| t.name).collect();
    println!("  Tools:     {}", tool_names.join(", "));
    println!("  Session:   {session}");
    println!();
    println!("  Type your message and press Enter.");
    println!("  Commands: /new, /sessions, /switch ID, /exit");
    println!();

    // Show tool activity while a turn runs
    let mut events = assistant.events().subscribe();
    let progress = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let TurnEvent::ToolExecuted {
                tool_name, success, ..
            } = event.as_ref()
            {
                let mark = if *success { "ok" } else { "error" };
                eprintln!("  [tool] {tool_name} ({mark})");
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Exit => break,
            Input::Help => println!("  Commands: /new, /sessions, /switch ID, /exit"),
            Input::New => {
                session = assistant.new_session_id();
                println!("  Started session {session}");
            }
            Input::Switch(id) => {
                session = SessionId::from(id);
                let count = assistant.history(&session).await?.len();
                println!("  Switched to {session} ({count} messages)");
            }
            Input::Sessions => {
                for id in assistant.list_sessions().await? {
                    let marker = if id == session { "*" } else { " " };
                    println!("  {marker} {id}");
                }
            }
            Input::Message(text) => match assistant.send_message(&session, &text).await {
                Ok(answer) => {
                    println!();
                    for line in answer.lines() {
                        println!("  Assistant > {line}");
                    }
                    println!();
                }
                Err(e) => {
                    eprintln!("  [Error] {e}");
                    println!();
                }
            },
        }
    }

    progress.abort();
    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}
