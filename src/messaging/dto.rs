use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub sender_id: Option<i64>,
    pub recipient_id: Option<i64>,
    pub body: Option<String>,
}

/// One entry of a conversation view, body already decrypted (or the
/// fail-closed sentinel).
#[derive(Debug, Serialize)]
pub struct ConversationMessage {
    pub id: i64,
    pub sender_id: i64,
    pub body: String,
    pub sent_at: OffsetDateTime,
    pub read: bool,
}

/// Echo of a freshly sent message; the body is the submitted plaintext,
/// not a re-decryption of the stored token.
#[derive(Debug, Serialize)]
pub struct SentMessage {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub body: String,
    pub sent_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn conversation_message_serializes_body() {
        let msg = ConversationMessage {
            id: 1,
            sender_id: 2,
            body: "hola".into(),
            sent_at: datetime!(2024-05-01 12:00 UTC),
            read: false,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""body":"hola""#));
        assert!(json.contains(r#""read":false"#));
    }
}
