//! Upload a file and start a conversation that references it.
//!
//! Run with: cargo run -p toqan-client --example upload_and_ask -- path/to/file.pdf "Summarise this"
//!
//! Make sure to set environment variables in .env:
//!   TOQAN_API_KEY - Toqan API key (starts with sk_)
//!   TOQAN_API_URL - optional base URL override

use std::env;

use toqan_client::{require_str, ConversationRequest, FileRef, FileUpload, ToqanApi, ToqanClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("usage: upload_and_ask <file> [message]");
        std::process::exit(2);
    }
    let path = &args[1];
    let message = if args.len() > 2 {
        args[2..].join(" ")
    } else {
        "Please describe the attached file.".to_string()
    };

    let client = ToqanClient::from_env()?;
    println!("Base URL: {}", client.config().base_url);

    client.verify_credentials().await?;
    println!("Credentials OK");

    let bytes = tokio::fs::read(path).await?;
    let filename = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let uploaded = client.upload_file(FileUpload::new(bytes, filename)).await?;
    let file_id = require_str(&uploaded, "file_id")?.to_string();
    println!("Uploaded file: {}", file_id);

    let request = ConversationRequest::new(message).with_file(FileRef::new(&file_id));
    let started = client.create_conversation(request).await?;
    println!("Conversation: {}", require_str(&started, "conversation_id")?);
    println!("Request: {}", require_str(&started, "request_id")?);

    Ok(())
}
