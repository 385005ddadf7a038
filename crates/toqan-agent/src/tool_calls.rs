//! Tool call extraction from answers.
//!
//! The backend has no structured tool-calling channel, so calls are
//! recovered from the answer on a best-effort basis. Extraction sits behind
//! [`ToolCallParser`] so a chat session can swap strategies.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use toqan_client::Record;
use tracing::debug;

/// Greedy: from the first `{` to the last `}` around a `"tool_calls"` key.
static TOOL_CALLS_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)\{.*"tool_calls".*\}"#).unwrap());

static FUNCTION_CALL_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<function_call>(.*?)</function_call>").unwrap());

/// A function call requested by the model, in OpenAI format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Arguments as a JSON string.
    pub arguments: String,
}

impl ToolCall {
    pub fn function(id: impl Into<String>, name: impl Into<String>, arguments: String) -> Self {
        Self {
            id: id.into(),
            kind: "function".to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments,
            },
        }
    }
}

/// Extracts tool calls from a finished answer record.
pub trait ToolCallParser: Send + Sync {
    fn parse(&self, response: &Record) -> Vec<ToolCall>;
}

/// Never finds tool calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToolCalls;

impl ToolCallParser for NoToolCalls {
    fn parse(&self, _response: &Record) -> Vec<ToolCall> {
        Vec::new()
    }
}

/// Default parser. Tries, in order:
/// 1. a `tool_calls` array on the response record,
/// 2. a JSON object with a `tool_calls` array embedded in the answer text,
/// 3. a `<function_call>{"name": .., "arguments": ..}</function_call>` block.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupToolCallParser;

impl ToolCallParser for MarkupToolCallParser {
    fn parse(&self, response: &Record) -> Vec<ToolCall> {
        if let Some(Value::Array(entries)) = response.get("tool_calls") {
            let calls = from_entries(entries);
            if !calls.is_empty() {
                return calls;
            }
        }

        let answer = response.get("answer").and_then(Value::as_str).unwrap_or("");

        if let Some(m) = TOOL_CALLS_JSON.find(answer) {
            if let Ok(Value::Object(data)) = serde_json::from_str::<Value>(m.as_str()) {
                if let Some(Value::Array(entries)) = data.get("tool_calls") {
                    return from_entries(entries);
                }
            } else {
                debug!("Embedded tool_calls JSON did not parse");
            }
        }

        if let Some(caps) = FUNCTION_CALL_BLOCK.captures(answer) {
            let inner = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            if let Ok(data) = serde_json::from_str::<Value>(inner) {
                if let Some(name) = data.get("name").and_then(Value::as_str) {
                    return vec![ToolCall::function(
                        format!("call_{}", Utc::now().timestamp_millis()),
                        name,
                        arguments_json(data.get("arguments")),
                    )];
                }
            }
        }

        Vec::new()
    }
}

/// Map `[{id?, function: {name, arguments}}]` or `[{id?, name, arguments}]`
/// entries. Entries without a name are skipped.
fn from_entries(entries: &[Value]) -> Vec<ToolCall> {
    let millis = Utc::now().timestamp_millis();
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let function = entry.get("function");
            let name = function
                .and_then(|f| f.get("name"))
                .or_else(|| entry.get("name"))
                .and_then(Value::as_str)?;
            let arguments = function
                .and_then(|f| f.get("arguments"))
                .or_else(|| entry.get("arguments"));
            let id = entry
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("call_{}_{}", millis, index));
            Some(ToolCall::function(id, name, arguments_json(arguments)))
        })
        .collect()
}

/// Arguments as a JSON string. Strings are assumed to already be JSON.
fn arguments_json(arguments: Option<&Value>) -> String {
    match arguments {
        None | Some(Value::Null) => "{}".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toqan_client::into_record;

    fn answer(text: &str) -> Record {
        into_record(json!({ "status": "finished", "answer": text })).unwrap()
    }

    #[test]
    fn test_tool_calls_field_on_response() {
        let response = into_record(json!({
            "status": "finished",
            "answer": "",
            "tool_calls": [
                { "id": "abc", "function": { "name": "weather", "arguments": { "city": "Lisbon" } } },
                { "name": "clock" },
            ],
        }))
        .unwrap();

        let calls = MarkupToolCallParser.parse(&response);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "abc");
        assert_eq!(calls[0].kind, "function");
        assert_eq!(calls[0].function.name, "weather");
        assert_eq!(calls[0].function.arguments, r#"{"city":"Lisbon"}"#);
        assert_eq!(calls[1].function.name, "clock");
        assert_eq!(calls[1].function.arguments, "{}");
        assert!(calls[1].id.starts_with("call_"));
    }

    #[test]
    fn test_embedded_json_in_answer() {
        let response = answer(
            r#"Sure. {"tool_calls": [{"name": "search", "arguments": {"q": "rust"}}]} done"#,
        );
        let calls = MarkupToolCallParser.parse(&response);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.name, "search");
        assert_eq!(calls[0].function.arguments, r#"{"q":"rust"}"#);
    }

    #[test]
    fn test_function_call_block() {
        let response = answer(
            "Let me check.\n<function_call>{\"name\": \"lookup\", \"arguments\": {\"id\": 7}}</function_call>",
        );
        let calls = MarkupToolCallParser.parse(&response);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.name, "lookup");
        assert_eq!(calls[0].function.arguments, r#"{"id":7}"#);
    }

    #[test]
    fn test_plain_answer_has_no_calls() {
        assert!(MarkupToolCallParser.parse(&answer("Just text")).is_empty());
        assert!(MarkupToolCallParser
            .parse(&answer("<function_call>not json</function_call>"))
            .is_empty());
        assert!(MarkupToolCallParser
            .parse(&answer(r#"{"tool_calls": broken}"#))
            .is_empty());
    }

    #[test]
    fn test_no_tool_calls_parser() {
        let response = answer("<function_call>{\"name\": \"x\"}</function_call>");
        assert!(NoToolCalls.parse(&response).is_empty());
    }

    #[test]
    fn test_string_arguments_pass_through() {
        assert_eq!(arguments_json(Some(&json!("{\"a\":1}"))), "{\"a\":1}");
        assert_eq!(arguments_json(Some(&Value::Null)), "{}");
    }
}
