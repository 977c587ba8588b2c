use serde::{Deserialize, Serialize};

/// A user's endorsement of a post, as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    #[serde(deserialize_with = "super::de::id")]
    pub id: String,
    #[serde(default, deserialize_with = "super::de::opt_id")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "super::de::opt_id")]
    pub post_id: Option<String>,
    #[serde(default, deserialize_with = "super::de::lenient_datetime")]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// What a like widget shows. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeViewState {
    pub liked: bool,
    pub like_count: i64,
    pub like_id: Option<String>,
    pub pending: bool,
}
