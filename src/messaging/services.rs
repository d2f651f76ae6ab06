use tracing::info;

use crate::{
    error::ServiceError,
    messaging::{
        dto::{ConversationMessage, SendMessageRequest, SentMessage},
        repo,
    },
    notifications,
    sponsorship::{self, repo::Partner},
    state::AppState,
};

/// Validates a send request before any cipher or storage work happens.
pub fn validate_send(request: &SendMessageRequest) -> Result<(i64, i64, &str), ServiceError> {
    let sender_id = request
        .sender_id
        .ok_or_else(|| ServiceError::validation("All fields are required."))?;
    let recipient_id = request
        .recipient_id
        .ok_or_else(|| ServiceError::validation("All fields are required."))?;
    let body = request
        .body
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .ok_or_else(|| ServiceError::validation("All fields are required."))?;
    Ok((sender_id, recipient_id, body))
}

pub fn new_message_notification(sender_alias: &str) -> String {
    format!("You have a new message from {sender_alias}.")
}

/// Persists the message and the recipient's notification as one atomic
/// step: either both rows exist afterwards or neither does.
pub async fn send(
    state: &AppState,
    request: &SendMessageRequest,
) -> Result<SentMessage, ServiceError> {
    let (sender_id, recipient_id, body) = validate_send(request)?;

    let ciphertext = state.cipher.encrypt(body)?;

    let mut tx = state.db.begin().await?;

    let row = repo::insert_message(&mut *tx, sender_id, recipient_id, &ciphertext).await?;

    let sender_alias = repo::member_alias(&mut *tx, sender_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Sender not found.".into()))?;

    notifications::repo::notify(
        &mut *tx,
        recipient_id,
        &new_message_notification(&sender_alias),
        &format!("/chat/{sender_id}"),
    )
    .await?;

    tx.commit().await?;

    info!(message_id = row.id, sender_id, recipient_id, "message sent");
    Ok(SentMessage {
        id: row.id,
        sender_id: row.sender_id,
        recipient_id: row.recipient_id,
        // The submitted plaintext is already known; no need to decrypt.
        body: body.to_string(),
        sent_at: row.sent_at,
    })
}

/// A decryption failure on one message yields the sentinel body and
/// never aborts retrieval of the rest.
pub async fn list_conversation(
    state: &AppState,
    member_a: i64,
    member_b: i64,
) -> Result<Vec<ConversationMessage>, ServiceError> {
    let rows = repo::fetch_conversation(&state.db, member_a, member_b).await?;
    Ok(rows
        .into_iter()
        .map(|row| ConversationMessage {
            id: row.id,
            sender_id: row.sender_id,
            body: state.cipher.decrypt(&row.body_ciphertext),
            sent_at: row.sent_at,
            read: row.read,
        })
        .collect())
}

pub async fn list_partners(state: &AppState, member_id: i64) -> Result<Vec<Partner>, ServiceError> {
    Ok(sponsorship::repo::conversation_partners_of(&state.db, member_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(
        sender_id: Option<i64>,
        recipient_id: Option<i64>,
        body: Option<&str>,
    ) -> SendMessageRequest {
        SendMessageRequest {
            sender_id,
            recipient_id,
            body: body.map(str::to_string),
        }
    }

    #[test]
    fn validate_accepts_complete_request() {
        let req = request(Some(1), Some(2), Some("hola"));
        let (sender, recipient, body) = validate_send(&req).expect("valid");
        assert_eq!((sender, recipient, body), (1, 2, "hola"));
    }

    #[test]
    fn validate_rejects_missing_fields() {
        for req in [
            request(None, Some(2), Some("hola")),
            request(Some(1), None, Some("hola")),
            request(Some(1), Some(2), None),
            request(Some(1), Some(2), Some("")),
            request(Some(1), Some(2), Some("   ")),
        ] {
            assert!(matches!(
                validate_send(&req),
                Err(ServiceError::Validation(_))
            ));
        }
    }

    #[test]
    fn notification_text_names_the_sender() {
        assert_eq!(
            new_message_notification("Luna"),
            "You have a new message from Luna."
        );
    }
}

// Run with: cargo test --features pg-tests (needs DATABASE_URL).
#[cfg(all(test, feature = "pg-tests"))]
mod pg_tests {
    use std::sync::Arc;

    use sqlx::PgPool;

    use super::*;
    use crate::config::{AppConfig, JwtConfig};
    use crate::crypto::MessageCipher;

    fn state_for(db: PgPool) -> AppState {
        let config = Arc::new(AppConfig {
            database_url: String::new(),
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 8 * 60,
            },
            message_key: "0123456789abcdef0123456789abcdef".into(),
        });
        let cipher = MessageCipher::new(config.message_key.as_bytes()).expect("test key");
        AppState::from_parts(db, config, cipher)
    }

    async fn seed_member(db: &PgPool, alias: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO members (code, alias, joined_on, sober_since, password_hash)
            VALUES ($1, $2, CURRENT_DATE, CURRENT_DATE, 'x')
            RETURNING id
            "#,
        )
        .bind(format!("AA-{alias}"))
        .bind(alias)
        .fetch_one(db)
        .await
        .expect("seed member")
    }

    fn hola(sender_id: i64, recipient_id: i64) -> SendMessageRequest {
        SendMessageRequest {
            sender_id: Some(sender_id),
            recipient_id: Some(recipient_id),
            body: Some("hola".into()),
        }
    }

    #[sqlx::test]
    async fn send_stores_ciphertext_and_notifies_recipient(pool: PgPool) {
        let state = state_for(pool.clone());
        let ana = seed_member(&pool, "Ana").await;
        let bruno = seed_member(&pool, "Bruno").await;

        let sent = send(&state, &hola(ana, bruno)).await.expect("send");
        assert_eq!(sent.body, "hola");

        // The row never holds the plaintext.
        let stored: String =
            sqlx::query_scalar("SELECT body_ciphertext FROM messages WHERE id = $1")
                .bind(sent.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_ne!(stored, "hola");

        let conversation = list_conversation(&state, ana, bruno).await.unwrap();
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation[0].body, "hola");

        let (text, link): (String, String) =
            sqlx::query_as("SELECT text, link FROM notifications WHERE recipient_id = $1")
                .bind(bruno)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(text, "You have a new message from Ana.");
        assert_eq!(link, format!("/chat/{ana}"));
    }

    #[sqlx::test]
    async fn send_rolls_back_message_when_notification_insert_fails(pool: PgPool) {
        let state = state_for(pool.clone());
        let ana = seed_member(&pool, "Ana").await;
        let bruno = seed_member(&pool, "Bruno").await;

        sqlx::query(
            r#"
            CREATE FUNCTION reject_notifications() RETURNS trigger AS $t$
            BEGIN RAISE EXCEPTION 'notifications unavailable'; END;
            $t$ LANGUAGE plpgsql
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            r#"
            CREATE TRIGGER reject_notifications BEFORE INSERT ON notifications
            FOR EACH ROW EXECUTE FUNCTION reject_notifications()
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        let result = send(&state, &hola(ana, bruno)).await;
        assert!(result.is_err());

        let messages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(messages, 0, "message row must not survive a failed fan-out");
    }

    #[sqlx::test]
    async fn conversation_reads_in_send_order_across_both_directions(pool: PgPool) {
        let state = state_for(pool.clone());
        let ana = seed_member(&pool, "Ana").await;
        let bruno = seed_member(&pool, "Bruno").await;

        let script = [(ana, bruno, "uno"), (bruno, ana, "dos"), (ana, bruno, "tres")];
        for (i, (from, to, text)) in script.into_iter().enumerate() {
            let ciphertext = state.cipher.encrypt(text).unwrap();
            sqlx::query(
                r#"
                INSERT INTO messages (sender_id, recipient_id, body_ciphertext, sent_at)
                VALUES ($1, $2, $3, now() + make_interval(secs => $4))
                "#,
            )
            .bind(from)
            .bind(to)
            .bind(&ciphertext)
            .bind(i as f64)
            .execute(&pool)
            .await
            .unwrap();
        }

        let conversation = list_conversation(&state, bruno, ana).await.unwrap();
        let bodies: Vec<&str> = conversation.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["uno", "dos", "tres"]);
        assert_eq!(conversation[0].sender_id, ana);
        assert_eq!(conversation[1].sender_id, bruno);
    }

    #[sqlx::test]
    async fn same_timestamp_messages_keep_insertion_order(pool: PgPool) {
        let state = state_for(pool.clone());
        let ana = seed_member(&pool, "Ana").await;
        let bruno = seed_member(&pool, "Bruno").await;

        for text in ["primero", "segundo"] {
            let ciphertext = state.cipher.encrypt(text).unwrap();
            sqlx::query(
                r#"
                INSERT INTO messages (sender_id, recipient_id, body_ciphertext, sent_at)
                VALUES ($1, $2, $3, TIMESTAMPTZ '2026-01-01 10:00:00+00')
                "#,
            )
            .bind(ana)
            .bind(bruno)
            .bind(&ciphertext)
            .execute(&pool)
            .await
            .unwrap();
        }

        let conversation = list_conversation(&state, ana, bruno).await.unwrap();
        let bodies: Vec<&str> = conversation.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["primero", "segundo"]);
    }
}
