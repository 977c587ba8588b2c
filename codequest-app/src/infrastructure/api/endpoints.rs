use crate::config::ApiConfig;
use codequest_errors::AppError;
use url::Url;

/// Resource groups exposed under `/api/{version}/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Auth,
    Users,
    Posts,
    Comments,
    Likes,
    Categories,
    Tags,
}

impl Resource {
    pub fn segment(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Users => "users",
            Self::Posts => "posts",
            Self::Comments => "comments",
            Self::Likes => "likes",
            Self::Categories => "categories",
            Self::Tags => "tags",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    root: Url,
    version: String,
}

impl Endpoints {
    pub fn new(config: &ApiConfig) -> Result<Self, AppError> {
        let root = Url::parse(config.base_url.trim())
            .map_err(|e| AppError::Internal(format!("invalid API base URL: {}", e)))?;
        if root.cannot_be_a_base() {
            return Err(AppError::Internal(format!(
                "invalid API base URL: {}",
                config.base_url
            )));
        }

        Ok(Self {
            root,
            version: config.version.trim_matches('/').to_string(),
        })
    }

    /// `{base}/api/{version}/{resource}` plus an optional path suffix. The
    /// suffix may or may not start with `/`.
    pub fn url(&self, resource: Resource, path: Option<&str>) -> Url {
        let mut url = self.root.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", self.version.as_str(), resource.segment()]);
            if let Some(path) = path {
                segments.extend(path.split('/').filter(|s| !s.is_empty()));
            }
        }
        url
    }

    pub fn url_with_query<'a>(
        &self,
        resource: Resource,
        path: Option<&str>,
        query: impl IntoIterator<Item = (&'a str, Option<String>)>,
    ) -> Url {
        with_query(self.url(resource, path), query)
    }

    pub fn login(&self) -> Url {
        self.url(Resource::Auth, Some("/login"))
    }

    pub fn signup(&self) -> Url {
        self.url(Resource::Auth, Some("/signup"))
    }

    pub fn discord(&self) -> Url {
        self.url(Resource::Auth, Some("/discord"))
    }

    pub fn me(&self) -> Url {
        self.url(Resource::Users, Some("/me"))
    }

    pub fn users(&self, limit: Option<u32>, offset: Option<u32>) -> Url {
        self.url_with_query(
            Resource::Users,
            None,
            [
                ("limit", positive(limit)),
                ("offset", positive(offset)),
            ],
        )
    }

    pub fn user(&self, user_id: &str) -> Url {
        self.url(Resource::Users, Some(user_id))
    }

    pub fn posts(&self, page: PageRequest) -> Url {
        self.url_with_query(
            Resource::Posts,
            None,
            [
                ("page", page.page.map(|p| p.to_string())),
                ("limit", page.limit.map(|l| l.to_string())),
            ],
        )
    }

    pub fn post(&self, post_id: &str) -> Url {
        self.url(Resource::Posts, Some(post_id))
    }

    pub fn post_comments(&self, post_id: &str, limit: Option<u32>, offset: Option<u32>) -> Url {
        let mut url = self.post(post_id);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("comments");
        }
        with_query(
            url,
            [
                ("limit", limit.map(|l| l.to_string())),
                ("offset", offset.map(|o| o.to_string())),
            ],
        )
    }

    pub fn comments(&self) -> Url {
        self.url(Resource::Comments, None)
    }

    pub fn comment(&self, comment_id: &str) -> Url {
        self.url(Resource::Comments, Some(comment_id))
    }

    pub fn comment_replies(&self, comment_id: &str) -> Url {
        let mut url = self.comment(comment_id);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("replies");
        }
        url
    }

    pub fn likes(&self) -> Url {
        self.url(Resource::Likes, None)
    }

    pub fn like(&self, like_id: &str) -> Url {
        self.url(Resource::Likes, Some(like_id))
    }

    pub fn like_lookup(&self, post_id: &str, user_id: &str) -> Url {
        self.url_with_query(
            Resource::Likes,
            None,
            [
                ("postId", Some(post_id.to_string())),
                ("userId", Some(user_id.to_string())),
            ],
        )
    }

    pub fn categories(&self) -> Url {
        self.url(Resource::Categories, None)
    }

    pub fn category(&self, slug: &str) -> Url {
        self.url(Resource::Categories, Some(slug))
    }

    pub fn tags(&self) -> Url {
        self.url(Resource::Tags, None)
    }
}

fn with_query<'a>(mut url: Url, query: impl IntoIterator<Item = (&'a str, Option<String>)>) -> Url {
    let pairs: Vec<(&str, String)> = query
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect();
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    url
}

// Zero means "not set" for the users listing.
fn positive(value: Option<u32>) -> Option<String> {
    value.filter(|v| *v > 0).map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> Endpoints {
        Endpoints::new(&ApiConfig::new("https://api.example.com", "v1")).unwrap()
    }

    #[test]
    fn test_resource_urls() {
        let e = endpoints();
        assert_eq!(
            e.url(Resource::Posts, None).as_str(),
            "https://api.example.com/api/v1/posts"
        );
        assert_eq!(e.login().as_str(), "https://api.example.com/api/v1/auth/login");
        assert_eq!(e.discord().as_str(), "https://api.example.com/api/v1/auth/discord");
        assert_eq!(
            e.url(Resource::Comments, Some("post/9")).as_str(),
            "https://api.example.com/api/v1/comments/post/9"
        );
        assert_eq!(
            e.url(Resource::Comments, Some("/post/9")).as_str(),
            "https://api.example.com/api/v1/comments/post/9"
        );
    }

    #[test]
    fn test_base_with_path_and_trailing_slash() {
        let e = Endpoints::new(&ApiConfig::new("http://localhost:3000/backend/", "/v2/")).unwrap();
        assert_eq!(
            e.tags().as_str(),
            "http://localhost:3000/backend/api/v2/tags"
        );
    }

    #[test]
    fn test_query_parameters() {
        let e = endpoints();
        assert_eq!(
            e.users(Some(10), Some(0)).as_str(),
            "https://api.example.com/api/v1/users?limit=10"
        );
        assert_eq!(e.users(None, None).as_str(), "https://api.example.com/api/v1/users");
        assert_eq!(
            e.posts(PageRequest { page: Some(2), limit: Some(5) }).as_str(),
            "https://api.example.com/api/v1/posts?page=2&limit=5"
        );
        assert_eq!(
            e.post_comments("p1", Some(20), Some(0)).as_str(),
            "https://api.example.com/api/v1/posts/p1/comments?limit=20&offset=0"
        );
        assert_eq!(
            e.like_lookup("p 1", "u1").as_str(),
            "https://api.example.com/api/v1/likes?postId=p+1&userId=u1"
        );
    }

    #[test]
    fn test_ids_are_escaped_as_segments() {
        let e = endpoints();
        assert_eq!(
            e.like("a b").as_str(),
            "https://api.example.com/api/v1/likes/a%20b"
        );
        assert_eq!(
            e.comment_replies("c1").as_str(),
            "https://api.example.com/api/v1/comments/c1/replies"
        );
    }

    #[test]
    fn test_rejects_bad_base() {
        assert!(Endpoints::new(&ApiConfig::new("not a url", "v1")).is_err());
        assert!(Endpoints::new(&ApiConfig::new("mailto:me@example.com", "v1")).is_err());
    }
}
