use crate::application::{AdminService, AuthService, FeedService, LikeApi, LikeToggle, PostEditor};
use crate::config::{session_file_from_env, ApiConfig};
use crate::domain::PostView;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::session::{FileSlot, SessionStore};
use codequest_errors::AppError;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a front end needs, sharing one HTTP client and one session.
#[derive(Clone)]
pub struct AppContext {
    pub api: ApiClient,
    pub session: SessionStore,
    pub auth: AuthService,
    pub feed: FeedService,
    pub editor: PostEditor,
    pub admin: AdminService,
}

impl AppContext {
    pub fn new(config: &ApiConfig, session: SessionStore) -> Result<Self, AppError> {
        let api = ApiClient::new(config, session.clone())?;

        Ok(Self {
            auth: AuthService::new(api.clone(), session.clone()),
            feed: FeedService::new(api.clone()),
            editor: PostEditor::new(api.clone(), session.clone()),
            admin: AdminService::new(api.clone(), session.clone()),
            api,
            session,
        })
    }

    pub fn with_session_file(config: &ApiConfig, path: PathBuf) -> Result<Self, AppError> {
        tracing::debug!("Using session file {}", path.display());
        Self::new(config, SessionStore::new(FileSlot::new(path)))
    }

    pub fn from_env() -> Result<Self, AppError> {
        let config = ApiConfig::from_env();
        tracing::info!("Using API {}/api/{}", config.base_url, config.version);
        Self::with_session_file(&config, session_file_from_env())
    }

    /// A like button for `post`, starting from the post's like count.
    pub fn like_toggle(&self, post: &PostView) -> LikeToggle {
        self.like_toggle_for(Some(post.id.clone()), post.like_count)
    }

    pub fn like_toggle_for(&self, post_id: Option<String>, like_count: i64) -> LikeToggle {
        let api: Arc<dyn LikeApi> = Arc::new(self.api.clone());
        LikeToggle::new(api, self.session.clone(), post_id, like_count)
    }
}
