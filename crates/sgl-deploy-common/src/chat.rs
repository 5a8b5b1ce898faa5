use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Body of `POST /v1/chat/completions`.
///
/// `temperature` and `max_tokens` are typed so they always serialize as JSON
/// numbers, whatever form the configuration was read in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// The parts of an OpenAI-style completion response worth putting in a log line.
/// Every field is optional; servers disagree on what they fill in.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub message: Option<ResponseMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// Filled by reasoning models (e.g. DeepSeek-R1 distills) when the server
    /// runs with a reasoning parser.
    #[serde(default)]
    pub reasoning_content: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl ChatCompletion {
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.finish_reason.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_numbers_stay_numeric() {
        let req = ChatCompletionRequest {
            model: "default".to_string(),
            messages: vec![ChatMessage::system("s"), ChatMessage::user("u")],
            temperature: 0.1,
            max_tokens: 64,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["temperature"], serde_json::json!(0.1));
        assert_eq!(v["max_tokens"], serde_json::json!(64));
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["role"], "user");
    }

    #[test]
    fn test_parse_completion() {
        let body = r#"{
            "id": "cmpl-1",
            "object": "chat.completion",
            "model": "default",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Paris, Berlin, Rome", "reasoning_content": null},
                "finish_reason": "length"
            }],
            "usage": {"prompt_tokens": 20, "completion_tokens": 64, "total_tokens": 84}
        }"#;
        let c: ChatCompletion = serde_json::from_str(body).unwrap();
        assert_eq!(c.first_content(), Some("Paris, Berlin, Rome"));
        assert_eq!(c.finish_reason(), Some("length"));
        assert_eq!(c.usage.unwrap().total_tokens, 84);
    }

    #[test]
    fn test_parse_error_body_has_no_content() {
        let c: ChatCompletion =
            serde_json::from_str(r#"{"object": "error", "message": "boom", "code": 500}"#).unwrap();
        assert!(c.choices.is_empty());
        assert_eq!(c.first_content(), None);
    }
}
