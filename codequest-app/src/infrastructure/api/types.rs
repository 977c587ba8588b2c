use crate::domain::{PostDraft, RegisterForm, Role, User};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub roles: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<&'a str>,
}

impl<'a> SignupRequest<'a> {
    pub fn new(form: &'a RegisterForm, role: Role) -> Self {
        Self {
            username: form.username.trim(),
            email: form.email.trim(),
            password: &form.password,
            roles: role.as_str(),
            avatar_url: form.avatar_url.as_deref().filter(|url| !url.is_empty()),
        }
    }
}

/// Body of `auth/login` and `auth/signup`. The backend omits `user` and
/// `token` and sends `message` instead when it refuses.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLikeRequest<'a> {
    pub post_id: &'a str,
}

/// Payload of `POST posts` and `PUT posts/:id`. Optional lists are only
/// sent when they carry something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl PostPayload {
    pub fn for_create(draft: &PostDraft) -> Self {
        Self {
            status: Some("published"),
            ..Self::for_update(draft)
        }
    }

    /// Updates never touch the publication status.
    pub fn for_update(draft: &PostDraft) -> Self {
        let non_empty = |items: &[String]| Some(items.to_vec()).filter(|v| !v.is_empty());
        Self {
            title: draft.title.trim().to_string(),
            content: draft.content.trim().to_string(),
            status: None,
            category_ids: draft
                .category_id
                .as_ref()
                .filter(|id| !id.is_empty())
                .map(|id| vec![id.clone()]),
            tag_ids: non_empty(&draft.tag_ids),
            images: non_empty(&draft.images),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Flattens the backend's `message`, which is either a string or a list of
/// validation messages.
pub fn message_text(message: &Value) -> Option<String> {
    match message {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            Some(parts.join("; ")).filter(|joined| !joined.is_empty())
        }
        _ => None,
    }
}

impl ErrorBody {
    pub fn text(&self) -> Option<String> {
        self.message
            .as_ref()
            .and_then(message_text)
            .or_else(|| self.error.clone().filter(|e| !e.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_payload_skips_empty_lists() {
        let draft = PostDraft {
            title: "  Título  ".to_string(),
            content: " cuerpo ".to_string(),
            category_id: Some(String::new()),
            tag_ids: vec![],
            images: vec!["https://img/1.png".to_string()],
        };

        let json = serde_json::to_value(PostPayload::for_create(&draft)).unwrap();
        assert_eq!(
            json,
            json!({
                "title": "Título",
                "content": "cuerpo",
                "status": "published",
                "images": ["https://img/1.png"]
            })
        );
    }

    #[test]
    fn test_update_payload_has_no_status() {
        let draft = PostDraft {
            title: "t".to_string(),
            category_id: Some("c1".to_string()),
            tag_ids: vec!["t1".to_string()],
            ..PostDraft::default()
        };

        let json = serde_json::to_value(PostPayload::for_update(&draft)).unwrap();
        assert!(json.get("status").is_none());
        assert_eq!(json["categoryIds"], json!(["c1"]));
        assert_eq!(json["tagIds"], json!(["t1"]));
    }

    #[test]
    fn test_error_messages() {
        let body: ErrorBody = serde_json::from_value(json!({
            "message": ["password must be longer than or equal to 6 characters", "email must be an email"],
            "statusCode": 400
        }))
        .unwrap();
        assert_eq!(
            body.text().unwrap(),
            "password must be longer than or equal to 6 characters; email must be an email"
        );

        let body: ErrorBody = serde_json::from_value(json!({"error": "Conflict"})).unwrap();
        assert_eq!(body.text().unwrap(), "Conflict");
    }

    #[test]
    fn test_signup_request_shape() {
        let form = RegisterForm {
            username: " devi ".to_string(),
            email: "devi@devtalles.com".to_string(),
            password: "secreto".to_string(),
            avatar_url: None,
        };
        let json = serde_json::to_value(SignupRequest::new(&form, Role::User)).unwrap();
        assert_eq!(
            json,
            json!({
                "username": "devi",
                "email": "devi@devtalles.com",
                "password": "secreto",
                "roles": "user"
            })
        );
    }
}
