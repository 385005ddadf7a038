//! Reasoning block extraction.
//!
//! Models served through Toqan may prefix their answer with a
//! `<think>...</think>` block. These helpers split that block from the
//! answer the user should see, keeping the untouched text alongside.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use toqan_client::Record;

/// First `<think>...</think>` block plus the whitespace after it.
static THINKING_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>(.*?)</think>\s*").unwrap());

/// An answer split into its visible part and its reasoning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedAnswer {
    /// Answer with the reasoning block removed.
    pub answer: String,
    /// Answer exactly as received.
    pub answer_original: String,
    /// Trimmed reasoning, if a block was found.
    pub thinking: Option<String>,
    pub has_thinking: bool,
}

/// Split the first reasoning block out of a raw answer.
///
/// When a block is found the remaining answer is trimmed. Without a block
/// the answer is returned exactly as given.
pub fn split_thinking(raw: &str) -> ProcessedAnswer {
    match THINKING_BLOCK.captures(raw) {
        Some(caps) => {
            let thinking = caps
                .get(1)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            ProcessedAnswer {
                answer: THINKING_BLOCK.replacen(raw, 1, "").trim().to_string(),
                answer_original: raw.to_string(),
                thinking: Some(thinking),
                has_thinking: true,
            }
        }
        None => ProcessedAnswer {
            answer: raw.to_string(),
            answer_original: raw.to_string(),
            thinking: None,
            has_thinking: false,
        },
    }
}

/// Remove the first reasoning block and trim the rest.
pub fn strip_thinking(raw: &str) -> String {
    THINKING_BLOCK.replacen(raw, 1, "").trim().to_string()
}

/// Post-process an answer record in place of its `answer` field.
///
/// Adds `answer_original`, `thinking` and `has_thinking` and rewrites
/// `answer`; every other field is kept. A record whose `answer` is missing,
/// empty or not a string is returned unchanged.
pub fn process_thinking(mut record: Record) -> Record {
    let processed = match record.get("answer").and_then(Value::as_str) {
        Some(answer) if !answer.is_empty() => split_thinking(answer),
        _ => return record,
    };

    record.insert("answer".to_string(), Value::String(processed.answer));
    record.insert(
        "answer_original".to_string(),
        Value::String(processed.answer_original),
    );
    record.insert(
        "thinking".to_string(),
        processed.thinking.map(Value::String).unwrap_or(Value::Null),
    );
    record.insert("has_thinking".to_string(), Value::Bool(processed.has_thinking));
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toqan_client::into_record;

    #[test]
    fn test_split_with_block() {
        let processed = split_thinking("<think>step one</think>\nFinal answer");

        assert!(processed.has_thinking);
        assert_eq!(processed.thinking.as_deref(), Some("step one"));
        assert_eq!(processed.answer, "Final answer");
        assert_eq!(processed.answer_original, "<think>step one</think>\nFinal answer");
    }

    #[test]
    fn test_split_multiline_block_is_trimmed() {
        let processed = split_thinking("<think>\n  line one\n  line two\n</think>\n\n  Done.  ");
        assert_eq!(processed.thinking.as_deref(), Some("line one\n  line two"));
        assert_eq!(processed.answer, "Done.");
    }

    #[test]
    fn test_split_without_block() {
        let processed = split_thinking("  Just an answer ");
        assert!(!processed.has_thinking);
        assert!(processed.thinking.is_none());
        assert_eq!(processed.answer, processed.answer_original);
        assert_eq!(processed.answer, "  Just an answer ");
    }

    #[test]
    fn test_only_first_block_is_extracted() {
        let processed = split_thinking("<think>a</think> x <think>b</think> y");
        assert_eq!(processed.thinking.as_deref(), Some("a"));
        assert_eq!(processed.answer, "x <think>b</think> y");
    }

    #[test]
    fn test_markers_are_case_sensitive() {
        let processed = split_thinking("<THINK>a</THINK> b");
        assert!(!processed.has_thinking);
    }

    #[test]
    fn test_unclosed_block_is_left_alone() {
        let processed = split_thinking("<think>never closed");
        assert!(!processed.has_thinking);
        assert_eq!(processed.answer, "<think>never closed");
    }

    #[test]
    fn test_processing_is_idempotent_on_clean_answer() {
        let first = split_thinking("<think>plan</think>\nResult");
        let second = split_thinking(&first.answer);
        assert_eq!(second.answer, first.answer);
        assert!(!second.has_thinking);
    }

    #[test]
    fn test_strip_thinking() {
        assert_eq!(strip_thinking("<think>x</think>  hi "), "hi");
        assert_eq!(strip_thinking(" plain "), "plain");
    }

    #[test]
    fn test_process_record_keeps_other_fields() {
        let record = into_record(json!({
            "status": "finished",
            "answer": "<think>why</think> because",
            "request_id": "r1",
        }))
        .unwrap();

        let processed = process_thinking(record);
        assert_eq!(processed["status"], "finished");
        assert_eq!(processed["request_id"], "r1");
        assert_eq!(processed["answer"], "because");
        assert_eq!(processed["answer_original"], "<think>why</think> because");
        assert_eq!(processed["thinking"], "why");
        assert_eq!(processed["has_thinking"], true);
    }

    #[test]
    fn test_process_record_without_block() {
        let record = into_record(json!({ "answer": "plain" })).unwrap();
        let processed = process_thinking(record);
        assert_eq!(processed["answer"], "plain");
        assert_eq!(processed["answer_original"], "plain");
        assert_eq!(processed["thinking"], Value::Null);
        assert_eq!(processed["has_thinking"], false);
    }

    #[test]
    fn test_process_record_missing_or_empty_answer_is_unchanged() {
        let missing = into_record(json!({ "status": "finished" })).unwrap();
        assert_eq!(process_thinking(missing.clone()), missing);

        let empty = into_record(json!({ "status": "finished", "answer": "" })).unwrap();
        assert_eq!(process_thinking(empty.clone()), empty);
    }
}
