use crate::domain::{Category, CommentView, PostView, Tag};
use crate::infrastructure::api::{ApiClient, PageRequest};
use codequest_errors::AppError;
use std::collections::HashMap;

/// Comments of one post: top-level comments in server order plus replies
/// grouped under their parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentThread {
    roots: Vec<CommentView>,
    replies: HashMap<String, Vec<CommentView>>,
}

impl CommentThread {
    pub fn from_comments(comments: Vec<CommentView>) -> Self {
        let mut thread = Self::default();
        for comment in comments {
            thread.insert(comment);
        }
        thread
    }

    pub fn roots(&self) -> &[CommentView] {
        &self.roots
    }

    pub fn replies_of(&self, comment_id: &str) -> &[CommentView] {
        self.replies
            .get(comment_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.roots.len() + self.replies.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty() && self.replies.is_empty()
    }

    /// Replaces the replies loaded for `parent_id`.
    pub fn attach_replies(&mut self, parent_id: &str, replies: Vec<CommentView>) {
        self.replies.remove(parent_id);
        for mut reply in replies {
            reply.parent_id = Some(parent_id.to_string());
            self.insert(reply);
        }
    }

    /// Adds a comment where it belongs. Embedded replies are moved into the
    /// reply map.
    pub fn insert(&mut self, mut comment: CommentView) {
        let embedded = std::mem::take(&mut comment.replies);
        let comment_id = comment.id.clone();

        match comment.parent_id.clone() {
            Some(parent_id) => self.replies.entry(parent_id).or_default().push(comment),
            None => self.roots.push(comment),
        }

        for mut reply in embedded {
            reply.parent_id.get_or_insert_with(|| comment_id.clone());
            self.insert(reply);
        }
    }
}

/// Posts of one category, with the category itself when any post embeds it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFeed {
    pub category: Option<Category>,
    pub posts: Vec<PostView>,
}

/// Read side of the blog: posts, comments and taxonomy.
#[derive(Clone)]
pub struct FeedService {
    api: ApiClient,
}

impl FeedService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn posts(&self, page: PageRequest) -> Result<Vec<PostView>, AppError> {
        Ok(self.api.posts(page).await?.decode(PostView::from_value))
    }

    pub async fn post(&self, post_id: &str) -> Result<PostView, AppError> {
        self.api.post(post_id).await
    }

    pub async fn comments(
        &self,
        post_id: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<CommentThread, AppError> {
        let listing = self.api.post_comments(post_id, limit, offset).await?;
        let comments = listing.decode(CommentView::from_value);
        Ok(CommentThread::from_comments(comments))
    }

    pub async fn replies(&self, comment_id: &str) -> Result<Vec<CommentView>, AppError> {
        Ok(self
            .api
            .comment_replies(comment_id)
            .await?
            .decode(CommentView::from_value))
    }

    /// Loads the replies of `comment_id` into `thread`.
    pub async fn load_replies(
        &self,
        thread: &mut CommentThread,
        comment_id: &str,
    ) -> Result<usize, AppError> {
        let replies = self.replies(comment_id).await?;
        let loaded = replies.len();
        thread.attach_replies(comment_id, replies);
        Ok(loaded)
    }

    pub async fn categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.api.categories().await?.decode_as())
    }

    pub async fn tags(&self) -> Result<Vec<Tag>, AppError> {
        Ok(self.api.tags().await?.decode_as())
    }

    pub async fn category_feed(&self, slug: &str) -> Result<CategoryFeed, AppError> {
        let posts = self
            .api
            .category_posts(slug)
            .await?
            .decode(PostView::from_value);
        let category = posts
            .iter()
            .filter_map(|post| post.category.as_ref())
            .find(|category| category.slug.is_empty() || category.slug == slug)
            .cloned();
        Ok(CategoryFeed { category, posts })
    }

    pub async fn posts_or_empty(&self, page: PageRequest) -> Vec<PostView> {
        or_empty("posts", self.posts(page).await)
    }

    pub async fn comments_or_empty(&self, post_id: &str) -> CommentThread {
        or_empty("comments", self.comments(post_id, None, None).await)
    }

    pub async fn categories_or_empty(&self) -> Vec<Category> {
        or_empty("categories", self.categories().await)
    }

    pub async fn tags_or_empty(&self) -> Vec<Tag> {
        or_empty("tags", self.tags().await)
    }
}

fn or_empty<T: Default>(what: &str, result: Result<T, AppError>) -> T {
    result.unwrap_or_else(|e| {
        tracing::error!("Error fetching {}: {}", what, e);
        T::default()
    })
}
