use super::require_session;
use crate::domain::{CommentDraft, CommentView, PostDraft, PostView};
use crate::infrastructure::api::{ApiClient, PostPayload};
use crate::infrastructure::session::SessionStore;
use codequest_errors::AppError;

/// Write side for signed-in users: posts and comments.
#[derive(Clone)]
pub struct PostEditor {
    api: ApiClient,
    session: SessionStore,
}

impl PostEditor {
    pub fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    pub async fn create(&self, draft: &PostDraft) -> Result<PostView, AppError> {
        draft.validate()?;
        require_session(&self.session)?;

        let post = self.api.create_post(&PostPayload::for_create(draft)).await?;
        tracing::info!("Post {} created", post.id);
        Ok(post)
    }

    pub async fn update(&self, post_id: &str, draft: &PostDraft) -> Result<PostView, AppError> {
        require_id(post_id)?;
        draft.validate()?;
        require_session(&self.session)?;

        self.api
            .update_post(post_id, &PostPayload::for_update(draft))
            .await
    }

    pub async fn delete(&self, post_id: &str) -> Result<(), AppError> {
        require_id(post_id)?;
        require_session(&self.session)?;

        self.api.delete_post(post_id).await?;
        tracing::info!("Post {} deleted", post_id);
        Ok(())
    }

    /// Posts a comment or, with `parent_comment_id`, a reply. The result
    /// is ready for `CommentThread::insert`.
    pub async fn comment(&self, draft: &CommentDraft) -> Result<CommentView, AppError> {
        draft.validate()?;
        require_session(&self.session)?;

        let mut comment = self.api.create_comment(draft).await?;
        comment.post_id.get_or_insert_with(|| draft.post_id.clone());
        if comment.parent_id.is_none() {
            comment.parent_id = draft.parent_comment_id.clone();
        }
        Ok(comment)
    }
}

fn require_id(post_id: &str) -> Result<(), AppError> {
    if post_id.trim().is_empty() {
        return Err(AppError::validation("id", "ID del post requerido"));
    }
    Ok(())
}
