use serde::{Deserialize, Serialize};

/// The reaction vocabulary is closed; anything else is a validation
/// error before storage is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Support,
    Inspiration,
    Gratitude,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Support => "support",
            Self::Inspiration => "inspiration",
            Self::Gratitude => "gratitude",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTestimonialRequest {
    pub member_id: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReactRequest {
    pub member_id: i64,
    pub kind: ReactionKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_json() {
        let kind: ReactionKind = serde_json::from_str(r#""gratitude""#).unwrap();
        assert_eq!(kind, ReactionKind::Gratitude);
        assert_eq!(kind.as_str(), "gratitude");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(serde_json::from_str::<ReactionKind>(r#""applause""#).is_err());
    }
}
