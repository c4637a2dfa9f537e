use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            other => Err(format!("unknown chat role: {other}")),
        }
    }
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    /// Unix timestamp in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ChatRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, text)
    }

    /// Builds a message stamped with the current wall-clock time.
    pub fn now(role: ChatRole, text: impl Into<String>) -> Self {
        Self::new(role, text).with_timestamp(now_millis())
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

fn now_millis() -> u64 {
    // A clock before the epoch stamps 0 rather than failing.
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_without_timestamp() {
        let msg: ChatMessage =
            serde_json::from_value(json!({"role": "user", "text": "why did pump 3 trip?"}))
                .expect("message should parse");
        assert_eq!(msg, ChatMessage::user("why did pump 3 trip?"));
    }

    #[test]
    fn timestamp_is_omitted_when_absent() {
        let value = serde_json::to_value(ChatMessage::assistant("checking")).unwrap();
        assert_eq!(value, json!({"role": "assistant", "text": "checking"}));

        let value =
            serde_json::to_value(ChatMessage::user("hi").with_timestamp(42)).unwrap();
        assert_eq!(value, json!({"role": "user", "text": "hi", "timestamp": 42}));
    }

    #[test]
    fn now_stamps_message() {
        let msg = ChatMessage::now(ChatRole::User, "hello");
        assert!(msg.timestamp.unwrap_or_default() > 0);
    }

    #[test]
    fn rejects_unknown_role() {
        let err = serde_json::from_value::<ChatMessage>(json!({"role": "system", "text": "x"}));
        assert!(err.is_err());
        assert!("system".parse::<ChatRole>().is_err());
        assert_eq!("assistant".parse::<ChatRole>(), Ok(ChatRole::Assistant));
    }
}
