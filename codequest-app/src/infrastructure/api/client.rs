use super::endpoints::{Endpoints, PageRequest};
use super::envelope::{normalize_entity, normalize_list, Listing};
use super::types::{
    message_text, AuthResponse, CreateLikeRequest, ErrorBody, PostPayload, SignupRequest,
};
use crate::application::LikeApi;
use crate::config::ApiConfig;
use crate::domain::{
    CategoryForm, Category, CommentDraft, CommentView, Like, LoginForm, PostView, RegisterForm,
    Role, Session, User,
};
use crate::infrastructure::session::SessionStore;
use codequest_errors::AppError;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// A signed-in user together with the bearer token the backend issued.
#[derive(Debug, Clone)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
}

/// One request per call: no retries, no caching. The session token, when
/// there is one, goes out as a bearer header.
#[derive(Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    endpoints: Arc<Endpoints>,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: SessionStore) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoints: Arc::new(Endpoints::new(config)?),
            session,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    // Auth

    pub async fn login(&self, form: &LoginForm) -> Result<AuthPayload, AppError> {
        let request = self
            .request(Method::POST, self.endpoints.login())
            .json(form);
        self.auth_exchange(request).await
    }

    pub async fn signup(&self, form: &RegisterForm, role: Role) -> Result<AuthPayload, AppError> {
        let request = self
            .request(Method::POST, self.endpoints.signup())
            .json(&SignupRequest::new(form, role));
        self.auth_exchange(request).await
    }

    /// Profile of whoever holds `token`, independent of the stored session.
    pub async fn me_with_token(&self, token: &str) -> Result<User, AppError> {
        let request = self
            .http_client
            .get(self.endpoints.me())
            .header("Authorization", format!("Bearer {}", token));
        decode_entity(self.fetch_json(request).await?)
    }

    pub async fn me(&self) -> Result<User, AppError> {
        let request = self.request(Method::GET, self.endpoints.me());
        decode_entity(self.fetch_json(request).await?)
    }

    // Users

    pub async fn users(&self, limit: Option<u32>, offset: Option<u32>) -> Result<Listing, AppError> {
        self.fetch_list(self.endpoints.users(limit, offset)).await
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        let request = self.request(Method::DELETE, self.endpoints.user(user_id));
        self.execute(request).await.map(drop)
    }

    // Posts

    pub async fn posts(&self, page: PageRequest) -> Result<Listing, AppError> {
        self.fetch_list(self.endpoints.posts(page)).await
    }

    pub async fn post(&self, post_id: &str) -> Result<PostView, AppError> {
        let value = self
            .fetch_json(self.request(Method::GET, self.endpoints.post(post_id)))
            .await?;
        PostView::from_value(normalize_entity(value)).map_err(parse_failure)
    }

    pub async fn create_post(&self, payload: &PostPayload) -> Result<PostView, AppError> {
        let request = self
            .request(Method::POST, self.endpoints.posts(PageRequest::default()))
            .json(payload);
        let value = self.fetch_json(request).await?;
        PostView::from_value(normalize_entity(value)).map_err(parse_failure)
    }

    pub async fn update_post(
        &self,
        post_id: &str,
        payload: &PostPayload,
    ) -> Result<PostView, AppError> {
        let request = self
            .request(Method::PUT, self.endpoints.post(post_id))
            .json(payload);
        let value = self.fetch_json(request).await?;
        PostView::from_value(normalize_entity(value)).map_err(parse_failure)
    }

    pub async fn delete_post(&self, post_id: &str) -> Result<(), AppError> {
        let request = self.request(Method::DELETE, self.endpoints.post(post_id));
        self.execute(request).await.map(drop)
    }

    // Comments

    pub async fn post_comments(
        &self,
        post_id: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Listing, AppError> {
        self.fetch_list(self.endpoints.post_comments(post_id, limit, offset))
            .await
    }

    pub async fn comment_replies(&self, comment_id: &str) -> Result<Listing, AppError> {
        self.fetch_list(self.endpoints.comment_replies(comment_id))
            .await
    }

    pub async fn create_comment(&self, draft: &CommentDraft) -> Result<CommentView, AppError> {
        let request = self
            .request(Method::POST, self.endpoints.comments())
            .json(draft);
        let value = self.fetch_json(request).await?;
        CommentView::from_value(normalize_entity(value)).map_err(parse_failure)
    }

    // Taxonomy

    pub async fn categories(&self) -> Result<Listing, AppError> {
        self.fetch_list(self.endpoints.categories()).await
    }

    pub async fn category_posts(&self, slug: &str) -> Result<Listing, AppError> {
        self.fetch_list(self.endpoints.category(slug)).await
    }

    pub async fn create_category(&self, form: &CategoryForm) -> Result<Category, AppError> {
        let request = self
            .request(Method::POST, self.endpoints.categories())
            .json(form);
        decode_entity(self.fetch_json(request).await?)
    }

    pub async fn tags(&self) -> Result<Listing, AppError> {
        self.fetch_list(self.endpoints.tags()).await
    }

    // Plumbing

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!("{} {}", method, url);
        let builder = self.http_client.request(method, url);
        match self.session.get().as_ref().and_then(Session::bearer) {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    /// Refusals may also arrive as successful responses carrying only
    /// `message`.
    async fn auth_exchange(&self, request: RequestBuilder) -> Result<AuthPayload, AppError> {
        let response = self.execute(request).await?;
        let status = response.status().as_u16();
        let value = read_json(response).await?;
        let response: AuthResponse =
            serde_json::from_value(normalize_entity(value)).map_err(parse_failure)?;

        match (response.user, response.token) {
            (Some(user), Some(token)) if !token.is_empty() => Ok(AuthPayload { user, token }),
            _ => Err(AppError::ServerRejected {
                status,
                message: response
                    .message
                    .as_ref()
                    .and_then(message_text)
                    .unwrap_or_else(|| "Respuesta de autenticación incompleta".to_string()),
            }),
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, AppError> {
        let response = request.send().await.map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("API error: {} - {}", status, body);
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|error| error.text())
                .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());
            return Err(AppError::ServerRejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn fetch_json(&self, request: RequestBuilder) -> Result<Value, AppError> {
        let response = self.execute(request).await?;
        read_json(response).await
    }

    async fn fetch_list(&self, url: Url) -> Result<Listing, AppError> {
        let value = self.fetch_json(self.request(Method::GET, url)).await?;
        normalize_list(value)
    }
}

#[async_trait::async_trait]
impl LikeApi for ApiClient {
    async fn create_like(&self, post_id: &str) -> Result<Like, AppError> {
        let request = self
            .request(Method::POST, self.endpoints.likes())
            .json(&CreateLikeRequest { post_id });
        decode_entity(self.fetch_json(request).await?)
    }

    async fn delete_like(&self, like_id: &str) -> Result<(), AppError> {
        let request = self.request(Method::DELETE, self.endpoints.like(like_id));
        self.execute(request).await.map(drop)
    }

    async fn find_like(&self, post_id: &str, user_id: &str) -> Result<Option<Like>, AppError> {
        let request = self.request(Method::GET, self.endpoints.like_lookup(post_id, user_id));
        let value = match self.fetch_json(request).await {
            Ok(value) => value,
            // Not found just means the user has not liked the post.
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        // Anything other than a list (`{"data": null}`, `{}`) means no like.
        Ok(normalize_list(value)
            .ok()
            .and_then(|listing| listing.decode_as::<Like>().into_iter().next()))
    }
}

async fn read_json(response: Response) -> Result<Value, AppError> {
    let body = response.text().await.map_err(transport_error)?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(parse_failure)
}

fn decode_entity<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    serde_json::from_value(normalize_entity(value)).map_err(parse_failure)
}

fn parse_failure(e: serde_json::Error) -> AppError {
    AppError::ParseFailure(e.to_string())
}

fn transport_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Timeout
    } else {
        AppError::NetworkFailure(e.to_string())
    }
}
