use crate::domain::{LoginForm, RegisterForm, Role, Session};
use crate::infrastructure::api::{ApiClient, AuthPayload};
use crate::infrastructure::session::SessionStore;
use codequest_errors::AppError;

/// What the signed-in user may do with a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostPermissions {
    pub can_edit: bool,
    pub can_delete: bool,
}

/// Sign-in, sign-up and sign-out; every success replaces the stored session.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
    session: SessionStore,
}

impl AuthService {
    pub fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    pub async fn login(&self, form: &LoginForm) -> Result<Session, AppError> {
        form.validate()?;
        let payload = self.api.login(form).await?;
        tracing::info!("User {} logged in", payload.user.username);
        self.store(payload)
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<Session, AppError> {
        form.validate()?;
        let payload = self.api.signup(form, Role::User).await?;
        tracing::info!("User {} registered", payload.user.username);
        self.store(payload)
    }

    /// Completes the Discord sign-in with the token from the callback query.
    /// When the profile cannot be fetched the session carries only the token.
    pub async fn oauth_callback(&self, token: Option<&str>) -> Result<Session, AppError> {
        let token = token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthenticated)?;

        let session = match self.api.me_with_token(token).await {
            Ok(user) => Session::from_user(user, token.to_string()),
            Err(e) => {
                tracing::warn!("Error fetching profile after OAuth callback: {}", e);
                Session::token_only(token.to_string())
            }
        };

        self.session.set(&session)?;
        Ok(session)
    }

    pub fn logout(&self) -> Result<(), AppError> {
        self.session.clear()
    }

    pub fn current(&self) -> Option<Session> {
        self.session.get()
    }

    /// Profile of the signed-in user as the backend sees it.
    pub async fn profile(&self) -> Result<Session, AppError> {
        let session = self.current().ok_or(AppError::Unauthenticated)?;
        let user = self.api.me().await?;
        Ok(Session::from_user(user, session.token))
    }

    pub fn permissions(&self, author_id: &str) -> PostPermissions {
        self.current()
            .map(|session| PostPermissions {
                can_edit: session.can_edit_post(author_id),
                can_delete: session.can_delete_post(author_id),
            })
            .unwrap_or_default()
    }

    fn store(&self, payload: AuthPayload) -> Result<Session, AppError> {
        let session = Session::from_user(payload.user, payload.token);
        self.session.set(&session)?;
        Ok(session)
    }
}
