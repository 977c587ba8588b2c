use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::de::{lenient_datetime, opt_id};
use super::post::{count_of, AuthorRecord};
use super::Author;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub post_id: Option<String>,
    pub parent_id: Option<String>,
    pub author: Author,
    pub body: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub like_count: i64,
    pub liked: bool,
    pub replies: Vec<CommentView>,
}

impl CommentView {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value::<CommentRecord>(value).map(Self::from)
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentRecord {
    #[serde(deserialize_with = "super::de::id")]
    id: String,
    #[serde(default, deserialize_with = "opt_id")]
    post_id: Option<String>,
    #[serde(default, rename = "post_id", deserialize_with = "opt_id")]
    post_id_snake: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    parent_comment_id: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    parent_id: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    comment_id: Option<String>,
    #[serde(default, rename = "parent_comment_id", deserialize_with = "opt_id")]
    parent_comment_id_snake: Option<String>,
    #[serde(default)]
    author: Option<AuthorRecord>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    author_name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    is_liked: Option<bool>,
    #[serde(default)]
    is_liked_by_user: Option<bool>,
    #[serde(default)]
    likes: Option<Value>,
    #[serde(default)]
    likes_count: Option<Value>,
    #[serde(default)]
    replies: Option<Vec<Value>>,
}

impl From<CommentRecord> for CommentView {
    fn from(record: CommentRecord) -> Self {
        let author = match record.author {
            Some(author) => Author::from(author),
            None => match record.username.or(record.author_name) {
                Some(name) => Author::named(name),
                None => Author::unknown(),
            },
        };
        let author = Author {
            avatar_url: author.avatar_url.or(record.avatar_url),
            ..author
        };

        let id = record.id;
        let post_id = record.post_id.or(record.post_id_snake);
        let replies = record
            .replies
            .unwrap_or_default()
            .into_iter()
            .filter_map(|raw| match CommentView::from_value(raw) {
                Ok(reply) => Some(reply),
                Err(e) => {
                    tracing::warn!("Skipping undecodable reply of comment {}: {}", id, e);
                    None
                }
            })
            .map(|mut reply| {
                reply.parent_id.get_or_insert_with(|| id.clone());
                if reply.post_id.is_none() {
                    reply.post_id = post_id.clone();
                }
                reply
            })
            .collect();

        Self {
            parent_id: record
                .parent_comment_id
                .or(record.parent_id)
                .or(record.comment_id)
                .or(record.parent_comment_id_snake),
            id,
            post_id,
            author,
            body: record.body.or(record.content).unwrap_or_default(),
            created_at: record.created_at,
            like_count: count_of(record.likes.as_ref())
                .or_else(|| count_of(record.likes_count.as_ref()))
                .unwrap_or(0),
            liked: record.is_liked.or(record.is_liked_by_user).unwrap_or(false),
            replies,
        }
    }
}
