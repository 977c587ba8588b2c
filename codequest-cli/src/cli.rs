use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codequest", version, about = "DevTalles CodeQuest blog from the terminal")]
pub struct Cli {
    /// Backend base URL, overrides CODEQUEST_API_BASE_URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// API version segment, overrides CODEQUEST_API_VERSION
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// Request timeout in seconds, overrides CODEQUEST_HTTP_TIMEOUT_SECS
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Session file, overrides CODEQUEST_SESSION_FILE
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CODEQUEST_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register(AccountArgs),
    /// Finish a Discord sign-in with the token from the callback URL;
    /// without a token, print the URL that starts it
    Oauth { token: Option<String> },
    Logout,
    /// Show the stored session
    Whoami {
        /// Ask the backend for the current profile
        #[arg(long)]
        remote: bool,
    },
    /// List posts
    Feed {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show a post's comment thread
    Comments {
        post_id: String,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
        /// Also load the replies of every top-level comment
        #[arg(long)]
        with_replies: bool,
    },
    Categories,
    Tags,
    /// List the posts of a category
    Category { slug: String },
    #[command(subcommand)]
    Post(PostCommand),
    /// Comment on a post, or reply with --parent
    Comment {
        post_id: String,
        body: String,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Toggle your like on a post
    Like {
        post_id: String,
        /// Current like count; fetched from the post when omitted
        #[arg(long, allow_hyphen_values = true)]
        count: Option<i64>,
    },
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Subcommand)]
pub enum PostCommand {
    Show { post_id: String },
    Create(DraftArgs),
    Update {
        post_id: String,
        #[command(flatten)]
        draft: DraftArgs,
    },
    Delete { post_id: String },
}

#[derive(Subcommand)]
pub enum AdminCommand {
    Users {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    Posts,
    DeleteUser { user_id: String },
    DeletePost { post_id: String },
    CreateAdmin(AccountArgs),
    CreateCategory {
        #[arg(long)]
        name: String,
        #[arg(long)]
        slug: String,
    },
}

#[derive(Args)]
pub struct AccountArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "CODEQUEST_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long)]
    pub avatar_url: Option<String>,
}

#[derive(Args)]
pub struct DraftArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub content: String,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    #[arg(long = "image")]
    pub images: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_post_create() {
        let cli = Cli::parse_from([
            "codequest", "post", "create", "--title", "Hola", "--tag", "t1", "--tag", "t2",
        ]);
        match cli.command {
            Command::Post(PostCommand::Create(draft)) => {
                assert_eq!(draft.title, "Hola");
                assert_eq!(draft.tags, ["t1", "t2"]);
                assert!(draft.content.is_empty());
            }
            _ => panic!("expected post create"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["codequest", "feed", "--page", "2", "--api-url", "http://localhost:3000"]);
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:3000"));
        assert!(matches!(cli.command, Command::Feed { page: Some(2), limit: None }));
    }
}
