use serde::{Deserialize, Serialize};

use super::User;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        if raw.trim().eq_ignore_ascii_case("admin") {
            Self::Admin
        } else {
            Self::User
        }
    }
}

/// Client-held record of the signed-in user and their bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Session {
    pub fn from_user(user: User, token: String) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.roles,
            token,
            email: Some(user.email).filter(|email| !email.is_empty()),
            avatar: user.avatar_url,
        }
    }

    /// Session holding nothing but a token, used when the profile lookup
    /// after an OAuth callback fails.
    pub fn token_only(token: String) -> Self {
        Self {
            id: String::new(),
            username: String::new(),
            role: Role::User,
            token,
            email: None,
            avatar: None,
        }
    }

    pub fn bearer(&self) -> Option<&str> {
        Some(self.token.as_str()).filter(|token| !token.is_empty())
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins may edit anything; everyone else only their own posts.
    pub fn can_edit_post(&self, author_id: &str) -> bool {
        self.is_admin() || (!self.id.is_empty() && self.id == author_id)
    }

    pub fn can_delete_post(&self, author_id: &str) -> bool {
        self.can_edit_post(author_id)
    }
}
