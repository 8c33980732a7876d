pub mod openrouter;
pub mod types;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use types::{ChatMessage, ChatRequest, TokenUsage};

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one chat request and return the assistant's text reply.
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
    fn usage(&self) -> TokenUsage;
}

/// A structured reply expected from the model. Deserialization checks the
/// shape; `validate` checks what serde cannot express.
pub trait LlmResponse: DeserializeOwned {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Request a structured reply, re-asking when the reply does not match `T`.
///
/// Transport errors from the model are returned immediately. A reply that
/// fails to parse or validate is sent back with a correction request, up to
/// `attempts` total calls.
pub async fn complete_json<T: LlmResponse>(
    model: &dyn ChatModel,
    request: &ChatRequest,
    attempts: u32,
) -> Result<T> {
    let attempts = attempts.max(1);
    let mut request = request.clone();
    let mut last_err = anyhow!("no attempts made");

    for attempt in 1..=attempts {
        let reply = model.complete(&request).await?;
        match parse_reply::<T>(&reply) {
            Ok(parsed) => return Ok(parsed),
            Err(e) => {
                tracing::warn!(
                    model = %request.model,
                    attempt,
                    attempts,
                    error = %e,
                    "LLM reply rejected"
                );
                request.messages.push(ChatMessage::assistant(reply));
                request.messages.push(ChatMessage::user(format!(
                    "Your reply was rejected: {}. Reply again with JSON only, matching the requested schema exactly.",
                    e
                )));
                last_err = e;
            }
        }
    }

    Err(last_err.context(format!(
        "{} gave no valid reply after {} attempt(s)",
        request.model, attempts
    )))
}

/// Parse a model reply into `T`, tolerating one surrounding Markdown code fence.
pub fn parse_reply<T: LlmResponse>(reply: &str) -> Result<T> {
    let body = strip_code_fence(reply);
    if body.is_empty() {
        anyhow::bail!("empty reply");
    }
    let parsed: T = serde_json::from_str(body).context("reply is not valid JSON for the schema")?;
    parsed.validate()?;
    Ok(parsed)
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening fence line.
    match inner.split_once('\n') {
        Some((info, body)) if !info.trim_start().starts_with(['{', '[']) => body.trim(),
        _ => inner.trim(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::types::{ChatRequest, TokenUsage};
    use super::ChatModel;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies in order and records every request.
    pub struct ReplayModel {
        replies: Mutex<VecDeque<Result<String>>>,
        pub requests: Mutex<Vec<ChatRequest>>,
    }

    impl ReplayModel {
        pub fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn ok(replies: &[&str]) -> Self {
            Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatModel for ReplayModel {
        async fn complete(&self, request: &ChatRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no reply scripted")))
        }

        fn usage(&self) -> TokenUsage {
            TokenUsage::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ReplayModel;
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Answer {
        value: u32,
    }

    impl LlmResponse for Answer {
        fn validate(&self) -> Result<()> {
            if self.value == 0 {
                anyhow::bail!("value must be non-zero");
            }
            Ok(())
        }
    }

    fn request() -> ChatRequest {
        ChatRequest::json_prompt("test/model", "Reply with JSON", &serde_json::json!({"q": 1}), 0.0)
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_reply_rejects_prose() {
        assert!(parse_reply::<Answer>("Sure! Here are the results.").is_err());
        assert!(parse_reply::<Answer>("").is_err());
        assert!(parse_reply::<Answer>("{\"value\":0}").is_err());
        assert_eq!(parse_reply::<Answer>("{\"value\":7}").unwrap().value, 7);
    }

    #[tokio::test]
    async fn test_retries_after_schema_mismatch() {
        let model = ReplayModel::ok(&["not json", "```json\n{\"value\": 3}\n```"]);
        let answer: Answer = complete_json(&model, &request(), 2).await.unwrap();
        assert_eq!(answer.value, 3);
        assert_eq!(model.calls(), 2);

        // The retry carries the rejected reply and a correction message.
        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[1].messages.len(), 4);
        assert_eq!(requests[1].messages[2].content, "not json");
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let model = ReplayModel::ok(&["{}", "{\"value\":0}", "{\"value\":1}"]);
        let err = complete_json::<Answer>(&model, &request(), 2).await.unwrap_err();
        assert_eq!(model.calls(), 2);
        assert!(format!("{:#}", err).contains("after 2 attempt(s)"));
    }

    #[tokio::test]
    async fn test_transport_error_not_retried() {
        let model = ReplayModel::new(vec![
            Err(anyhow::anyhow!("connection reset")),
            Ok("{\"value\":1}".to_string()),
        ]);
        let err = complete_json::<Answer>(&model, &request(), 3).await.unwrap_err();
        assert_eq!(model.calls(), 1);
        assert!(err.to_string().contains("connection reset"));
    }
}
