mod admin;
mod auth;
mod feed;
mod like_toggle;
mod posts;

pub use admin::AdminService;
pub use auth::{AuthService, PostPermissions};
pub use feed::{CategoryFeed, CommentThread, FeedService};
pub use like_toggle::{LikeApi, LikeToggle, LikeWatch, ToggleOutcome, ToggleReport};
pub use posts::PostEditor;

use crate::domain::Session;
use crate::infrastructure::session::SessionStore;
use codequest_errors::AppError;

/// The stored session, provided it carries a token.
fn require_session(session: &SessionStore) -> Result<Session, AppError> {
    session
        .get()
        .filter(|session| session.bearer().is_some())
        .ok_or(AppError::Unauthenticated)
}
