use tracing::info;

use crate::{
    error::ServiceError,
    notifications,
    sessions::{
        dto::CreateSessionRequest,
        repo::{self, GroupSession},
    },
    state::AppState,
};

pub fn session_notification(topic: &str) -> String {
    format!("A new session has been scheduled: {topic}.")
}

/// Creates the session and fans out one notification per active member
/// inside the same transaction; if any insert fails, the session is
/// rolled back with it.
pub async fn create_session(
    state: &AppState,
    request: &CreateSessionRequest,
) -> Result<GroupSession, ServiceError> {
    let topic = request
        .topic
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ServiceError::validation("Topic and date are required."))?;
    let scheduled_at = request
        .scheduled_at
        .ok_or_else(|| ServiceError::validation("Topic and date are required."))?;

    let mut tx = state.db.begin().await?;

    let session = repo::insert(
        &mut *tx,
        topic.trim(),
        scheduled_at,
        request.description.as_deref(),
        request.location_id,
    )
    .await?;

    let recipients = repo::active_member_ids(&mut *tx).await?;
    let text = session_notification(&session.topic);
    for member_id in &recipients {
        notifications::repo::notify(&mut *tx, *member_id, &text, "/sessions").await?;
    }

    tx.commit().await?;

    info!(
        session_id = session.id,
        notified = recipients.len(),
        "session created"
    );
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_text_names_the_topic() {
        assert_eq!(
            session_notification("Step 4 workshop"),
            "A new session has been scheduled: Step 4 workshop."
        );
    }

    #[tokio::test]
    async fn create_rejects_missing_topic() {
        let state = AppState::fake();
        let request = CreateSessionRequest {
            topic: Some("   ".into()),
            scheduled_at: Some(time::OffsetDateTime::now_utc()),
            description: None,
            location_id: None,
        };
        let err = create_session(&state, &request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_missing_date() {
        let state = AppState::fake();
        let request = CreateSessionRequest {
            topic: Some("Open share".into()),
            scheduled_at: None,
            description: None,
            location_id: None,
        };
        let err = create_session(&state, &request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
