use codequest_errors::AppError;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const MAX_USERNAME_CHARS: usize = 20;
const MIN_PASSWORD_CHARS: usize = 6;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\S+@\S+$").expect("static email pattern"))
}

fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("static slug pattern"))
}

fn required(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(field, "Campo obligatorio"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), AppError> {
        required("email", &self.email)?;
        required("password", &self.password)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), AppError> {
        required("username", &self.username)?;
        if self.username.trim().chars().count() > MAX_USERNAME_CHARS {
            return Err(AppError::validation(
                "username",
                format!("Máximo {} caracteres", MAX_USERNAME_CHARS),
            ));
        }

        required("email", &self.email)?;
        if !email_pattern().is_match(self.email.trim()) {
            return Err(AppError::validation("email", "El correo no es válido"));
        }

        required("password", &self.password)?;
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AppError::validation(
                "password",
                format!(
                    "La contraseña debe tener al menos {} caracteres",
                    MIN_PASSWORD_CHARS
                ),
            ));
        }

        Ok(())
    }
}

/// Fields of the post editor, shared by create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub category_id: Option<String>,
    pub tag_ids: Vec<String>,
    pub images: Vec<String>,
}

impl PostDraft {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::validation("title", "El título es obligatorio"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDraft {
    pub body: String,
    pub post_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<String>,
}

impl CommentDraft {
    pub fn validate(&self) -> Result<(), AppError> {
        required("body", &self.body)?;
        required("postId", &self.post_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    pub slug: String,
}

impl CategoryForm {
    pub fn validate(&self) -> Result<(), AppError> {
        required("name", &self.name)?;
        required("slug", &self.slug)?;
        if !slug_pattern().is_match(&self.slug) {
            return Err(AppError::validation(
                "slug",
                "Solo minúsculas, números y guiones",
            ));
        }
        Ok(())
    }
}
