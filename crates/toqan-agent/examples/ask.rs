//! Ask the Toqan agent one question and wait for the answer.
//!
//! Run with: cargo run -p toqan-agent --example ask
//! Or with a custom prompt: cargo run -p toqan-agent --example ask -- "Your question here"
//!
//! Make sure to set environment variables in .env:
//!   TOQAN_API_KEY - Toqan API key
//!   TOQAN_API_URL - optional base URL override
//!   TOQAN_POLL_INTERVAL_SECS / TOQAN_TIMEOUT_SECS - optional polling overrides
//!   TOQAN_FILE_IDS - optional comma-separated file ids to attach

use std::env;

use toqan_agent::{Agent, AgentRequest, PollSettings};
use toqan_client::ToqanClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let prompt = if args.len() > 1 {
        args[1..].join(" ")
    } else {
        "Hello! Please respond with a short greeting.".to_string()
    };

    let client = ToqanClient::from_env()?;
    println!("API URL: {}", client.config().base_url);

    let poll = PollSettings::from_env(PollSettings::agent_default());
    println!("Polling every {:?}, giving up after {:?}", poll.interval, poll.timeout);

    let mut request = AgentRequest::new(prompt).with_poll(poll);
    if let Ok(ids) = env::var("TOQAN_FILE_IDS") {
        request = request.with_file_ids(ids);
    }

    println!("Sending: \"{}\"", request.prompt);
    println!("Waiting for response...\n");

    let output = Agent::new(client).run(&request).await?;

    if let Some(ref thinking) = output.thinking {
        println!("=== Thinking ===");
        println!("{}", thinking);
    }
    println!("=== Response ===");
    println!("{}", output.output);
    println!("================");
    println!(
        "Conversation {} / request {} in {} ms",
        output.conversation_id, output.request_id, output.elapsed_ms
    );

    Ok(())
}
