//! Interactive chat with the Toqan agent.
//!
//! Run with: cargo run -p toqan-agent --example chat
//!
//! Every line typed is sent as the next turn of one conversation. An empty
//! line or EOF quits.
//!
//! Make sure to set environment variables in .env:
//!   TOQAN_API_KEY - Toqan API key
//!   TOQAN_API_URL - optional base URL override

use std::sync::Arc;

use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use toqan_agent::{ChatMessage, ChatSession, PollProgress, PollSettings};
use toqan_client::ToqanClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let client = ToqanClient::from_env()?;
    let mut session = ChatSession::new(client)
        .with_poll(PollSettings::from_env(PollSettings::agent_default()))
        .with_progress(Arc::new(|progress: &PollProgress| {
            eprintln!("  ... {} ({:.0?})", progress.status, progress.elapsed);
        }));

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let line = match lines.next_line().await? {
            Some(line) if !line.trim().is_empty() => line,
            _ => break,
        };

        match session.generate(&[ChatMessage::user(line)]).await {
            Ok(generation) => {
                println!("{}", generation.text);
                for call in &generation.tool_calls {
                    println!("[tool call] {}({})", call.function.name, call.function.arguments);
                }
            }
            Err(e) => eprintln!("{}", e),
        }
    }

    if let Some(id) = session.conversation_id() {
        println!("Conversation: {}", id);
    }
    Ok(())
}
