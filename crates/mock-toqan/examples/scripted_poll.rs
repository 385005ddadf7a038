//! Walk through a scripted conversation without a network.
//!
//! Run with: cargo run -p mock-toqan --example scripted_poll

use std::time::Duration;

use mock_toqan::{AnswerScript, DelayedApi, ScriptedApi};
use toqan_client::{AnswerStatus, ConversationRequest, ToqanApi};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api = DelayedApi::new(ScriptedApi::new(), Duration::from_millis(100));
    api.inner()
        .push_answer(AnswerScript::finished_after(3, "<think>easy</think> 4"));

    let started = api
        .create_conversation(ConversationRequest::new("What is 2 + 2?"))
        .await?;
    let conversation_id = started["conversation_id"].as_str().unwrap_or_default().to_string();
    let request_id = started["request_id"].as_str().unwrap_or_default().to_string();
    println!("Created {} / {}", conversation_id, request_id);

    loop {
        let answer = api.get_answer(&conversation_id, &request_id).await?;
        let status = AnswerStatus::of(&answer);
        println!("status: {}", status.as_str());
        if status.is_terminal() {
            println!("answer: {}", answer["answer"]);
            break;
        }
    }

    let history = api.find_conversation(&conversation_id).await?;
    println!("history: {}", serde_json::Value::Object(history));
    Ok(())
}
