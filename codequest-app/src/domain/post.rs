use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::de::{lenient_datetime, opt_id};
use super::{Category, Tag};

const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl Author {
    pub fn unknown() -> Self {
        Self {
            id: String::new(),
            username: UNKNOWN_AUTHOR.to_string(),
            avatar_url: None,
        }
    }

    pub fn named(username: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            username: username.into(),
            avatar_url: None,
        }
    }
}

/// Display-ready projection of a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub author: Author,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub status: Option<String>,
    pub body: String,
    pub images: Vec<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub like_count: i64,
    pub comment_count: i64,
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
}

impl PostView {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value::<PostRecord>(value).map(Self::from)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum AuthorRecord {
    Name(String),
    Profile {
        #[serde(default, deserialize_with = "opt_id")]
        id: Option<String>,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default, rename = "avatarUrl")]
        avatar_url: Option<String>,
    },
}

impl From<AuthorRecord> for Author {
    fn from(record: AuthorRecord) -> Self {
        match record {
            AuthorRecord::Name(name) if name.trim().is_empty() => Author::unknown(),
            AuthorRecord::Name(name) => Author::named(name),
            AuthorRecord::Profile {
                id,
                username,
                name,
                avatar_url,
            } => Author {
                id: id.unwrap_or_default(),
                username: username
                    .or(name)
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
                avatar_url,
            },
        }
    }
}

/// Reads a counter sent either as a number or as the list being counted.
pub(crate) fn count_of(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::Array(items) => i64::try_from(items.len()).ok(),
        _ => None,
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostRecord {
    #[serde(deserialize_with = "super::de::id")]
    id: String,
    #[serde(default)]
    author: Option<AuthorRecord>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    likes: Option<Value>,
    #[serde(default)]
    likes_count: Option<Value>,
    #[serde(default)]
    like_count: Option<Value>,
    #[serde(default)]
    comments_count: Option<Value>,
    #[serde(default)]
    comment_count: Option<Value>,
    #[serde(default)]
    category: Option<Category>,
    #[serde(default)]
    tags: Option<Vec<Tag>>,
}

impl From<PostRecord> for PostView {
    fn from(record: PostRecord) -> Self {
        let like_count = count_of(record.likes.as_ref())
            .or_else(|| count_of(record.likes_count.as_ref()))
            .or_else(|| count_of(record.like_count.as_ref()))
            .unwrap_or(0);
        let comment_count = count_of(record.comments_count.as_ref())
            .or_else(|| count_of(record.comment_count.as_ref()))
            .unwrap_or(0);

        Self {
            id: record.id,
            author: record.author.map(Author::from).unwrap_or_else(Author::unknown),
            title: record.title,
            slug: record.slug,
            status: record.status,
            body: record.body.or(record.content).unwrap_or_default(),
            images: record.images.unwrap_or_default(),
            created_at: record.created_at,
            like_count,
            comment_count,
            category: record.category,
            tags: record.tags.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_falls_back_to_content() {
        let post = PostView::from_value(json!({
            "id": 3,
            "title": "Hola",
            "content": "cuerpo",
            "likes": 4,
            "commentsCount": 2
        }))
        .unwrap();

        assert_eq!(post.id, "3");
        assert_eq!(post.body, "cuerpo");
        assert_eq!(post.like_count, 4);
        assert_eq!(post.comment_count, 2);
        assert_eq!(post.author, Author::unknown());
    }

    #[test]
    fn test_like_list_is_counted() {
        let post = PostView::from_value(json!({
            "id": "p1",
            "body": "x",
            "likes": [{"id": "l1"}, {"id": "l2"}],
            "images": null
        }))
        .unwrap();

        assert_eq!(post.like_count, 2);
        assert!(post.images.is_empty());
    }

    #[test]
    fn test_author_shapes() {
        let post = PostView::from_value(json!({
            "id": "p1",
            "author": {"id": 9, "name": "Fernando", "avatarUrl": "a.png"}
        }))
        .unwrap();
        assert_eq!(post.author.id, "9");
        assert_eq!(post.author.username, "Fernando");
        assert_eq!(post.author.avatar_url.as_deref(), Some("a.png"));

        let post = PostView::from_value(json!({"id": "p2", "author": "devi"})).unwrap();
        assert_eq!(post.author.username, "devi");
    }
}
