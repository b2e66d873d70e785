//! Conversation message primitives.
//!
//! Most graphs built with this crate carry a `"messages"` channel holding an
//! append-only conversation log. [`Message`] is the payload type for that
//! channel; it serializes to the JSON values the state container stores.
//!
//! # Examples
//!
//! ```rust
//! use stategraph::message::Message;
//!
//! let user = Message::user("What's the weather like?");
//! let reply = Message::assistant("Sunny.");
//! assert!(user.has_role(Message::USER));
//! assert_eq!(reply.content, "Sunny.");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single conversation message with a role and text content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sender role, e.g. `"user"`, `"assistant"`, `"system"`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl Message {
    pub const USER: &'static str = "user";
    pub const ASSISTANT: &'static str = "assistant";
    pub const SYSTEM: &'static str = "system";

    /// General constructor for arbitrary roles.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// A `"user"` message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Self::USER, content)
    }

    /// An `"assistant"` message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    /// A `"system"` message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    /// Role equality check.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}

impl From<Message> for Value {
    fn from(message: Message) -> Self {
        serde_json::json!({ "role": message.role, "content": message.content })
    }
}

/// Serialize a message slice into the JSON array shape of a messages channel.
pub fn messages_to_value(messages: &[Message]) -> Value {
    Value::Array(messages.iter().cloned().map(Value::from).collect())
}

/// Decode a messages-channel value back into typed messages.
pub fn messages_from_value(value: &Value) -> Result<Vec<Message>, serde_json::Error> {
    serde_json::from_value(value.clone())
}

/// Trim a conversation to at most `keep` non-system messages, retaining the
/// most recent ones.
///
/// A leading system message survives trimming unconditionally so the
/// instruction context is never dropped. Order is preserved.
///
/// # Examples
///
/// ```rust
/// use stategraph::message::{trim_messages, Message};
///
/// let log = vec![
///     Message::system("be terse"),
///     Message::user("one"),
///     Message::assistant("two"),
///     Message::user("three"),
/// ];
/// let trimmed = trim_messages(&log, 2);
/// assert_eq!(trimmed.len(), 3);
/// assert_eq!(trimmed[0].role, "system");
/// assert_eq!(trimmed[1].content, "two");
/// ```
pub fn trim_messages(messages: &[Message], keep: usize) -> Vec<Message> {
    let (system, rest): (Vec<_>, Vec<_>) = match messages.first() {
        Some(first) if first.has_role(Message::SYSTEM) => {
            (vec![first.clone()], messages[1..].to_vec())
        }
        _ => (Vec::new(), messages.to_vec()),
    };
    let start = rest.len().saturating_sub(keep);
    let mut out = system;
    out.extend_from_slice(&rest[start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_without_system_keeps_tail() {
        let log = vec![
            Message::user("a"),
            Message::assistant("b"),
            Message::user("c"),
        ];
        let trimmed = trim_messages(&log, 1);
        assert_eq!(trimmed, vec![Message::user("c")]);
    }

    #[test]
    fn trim_shorter_than_budget_is_identity() {
        let log = vec![Message::user("a")];
        assert_eq!(trim_messages(&log, 10), log);
    }

    #[test]
    fn messages_round_trip_through_value() {
        let log = vec![Message::system("s"), Message::user("u")];
        let value = messages_to_value(&log);
        assert_eq!(messages_from_value(&value).unwrap(), log);
    }
}
