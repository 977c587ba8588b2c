use super::require_session;
use crate::domain::{Category, CategoryForm, PostView, RegisterForm, Role, User};
use crate::infrastructure::api::{ApiClient, PageRequest};
use crate::infrastructure::session::SessionStore;
use codequest_errors::AppError;

/// Admin panel operations. The backend decides whether the caller is
/// allowed; here only a session is required.
#[derive(Clone)]
pub struct AdminService {
    api: ApiClient,
    session: SessionStore,
}

impl AdminService {
    pub fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    pub async fn users(&self, limit: Option<u32>, offset: Option<u32>) -> Result<Vec<User>, AppError> {
        require_session(&self.session)?;
        Ok(self.api.users(limit, offset).await?.decode_as())
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        require_session(&self.session)?;
        self.api.delete_user(user_id).await?;
        tracing::info!("User {} deleted", user_id);
        Ok(())
    }

    pub async fn posts(&self) -> Result<Vec<PostView>, AppError> {
        require_session(&self.session)?;
        Ok(self
            .api
            .posts(PageRequest::default())
            .await?
            .decode(PostView::from_value))
    }

    pub async fn delete_post(&self, post_id: &str) -> Result<(), AppError> {
        require_session(&self.session)?;
        self.api.delete_post(post_id).await?;
        tracing::info!("Post {} deleted by admin", post_id);
        Ok(())
    }

    /// Signs up another account with the admin role. The current session
    /// is left as it is.
    pub async fn create_admin(&self, form: &RegisterForm) -> Result<User, AppError> {
        form.validate()?;
        require_session(&self.session)?;
        let payload = self.api.signup(form, Role::Admin).await?;
        tracing::info!("Admin account {} created", payload.user.username);
        Ok(payload.user)
    }

    pub async fn create_category(&self, form: &CategoryForm) -> Result<Category, AppError> {
        form.validate()?;
        require_session(&self.session)?;
        self.api.create_category(form).await
    }
}
