mod cli;

use clap::Parser;
use cli::{AccountArgs, AdminCommand, Cli, Command, DraftArgs, PostCommand};
use codequest_app::application::{CommentThread, ToggleOutcome, ToggleReport};
use codequest_app::config::{session_file_from_env, ApiConfig};
use codequest_app::domain::{
    CategoryForm, CommentDraft, CommentView, LoginForm, PostDraft, PostView, RegisterForm, Session,
};
use codequest_app::infrastructure::api::PageRequest;
use codequest_app::AppContext;
use codequest_errors::AppError;
use std::process::ExitCode;
use std::time::Duration;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Command failed: {}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = ApiConfig::from_env();
    if let Some(base_url) = cli.api_url {
        config.base_url = base_url;
    }
    if let Some(version) = cli.api_version {
        config.version = version;
    }
    if let Some(secs) = cli.timeout.filter(|secs| *secs > 0) {
        config.timeout = Duration::from_secs(secs);
    }
    let session_file = cli.session_file.unwrap_or_else(session_file_from_env);
    let ctx = AppContext::with_session_file(&config, session_file)?;

    match cli.command {
        Command::Login { email, password } => {
            let session = ctx.auth.login(&LoginForm { email, password }).await?;
            println!("Bienvenido, {}", session.username);
        }
        Command::Register(account) => {
            let session = ctx.auth.register(&register_form(account)).await?;
            println!("Cuenta creada. Bienvenido, {}", session.username);
        }
        Command::Oauth { token: None } => {
            println!("Inicia sesión con Discord en: {}", ctx.api.endpoints().discord());
        }
        Command::Oauth { token } => {
            let session = ctx.auth.oauth_callback(token.as_deref()).await?;
            print_session(&session);
        }
        Command::Logout => {
            ctx.auth.logout()?;
            println!("Sesión cerrada");
        }
        Command::Whoami { remote } => {
            let session = if remote {
                ctx.auth.profile().await?
            } else {
                ctx.auth.current().ok_or(AppError::Unauthenticated)?
            };
            print_session(&session);
        }
        Command::Feed { page, limit } => {
            let posts = ctx.feed.posts(PageRequest { page, limit }).await?;
            print_posts(&posts);
        }
        Command::Comments {
            post_id,
            limit,
            offset,
            with_replies,
        } => {
            let mut thread = ctx.feed.comments(&post_id, limit, offset).await?;
            if with_replies {
                let root_ids: Vec<String> = thread
                    .roots()
                    .iter()
                    .filter(|root| thread.replies_of(&root.id).is_empty())
                    .map(|root| root.id.clone())
                    .collect();
                for comment_id in root_ids {
                    if let Err(e) = ctx.feed.load_replies(&mut thread, &comment_id).await {
                        tracing::warn!("Error loading replies of {}: {}", comment_id, e);
                    }
                }
            }
            print_thread(&thread);
        }
        Command::Categories => {
            for category in ctx.feed.categories().await? {
                println!("{}\t{}\t{}", category.id, category.slug, category.name);
            }
        }
        Command::Tags => {
            for tag in ctx.feed.tags().await? {
                println!("{}\t{}", tag.id, tag.name);
            }
        }
        Command::Category { slug } => {
            let feed = ctx.feed.category_feed(&slug).await?;
            if let Some(category) = &feed.category {
                println!("# {}", category.name);
            }
            print_posts(&feed.posts);
        }
        Command::Post(command) => run_post(&ctx, command).await?,
        Command::Comment {
            post_id,
            body,
            parent,
        } => {
            let comment = ctx
                .editor
                .comment(&CommentDraft {
                    body,
                    post_id,
                    parent_comment_id: parent,
                })
                .await?;
            println!("Comentario {} publicado", comment.id);
        }
        Command::Like { post_id, count } => {
            let count = match count {
                Some(count) => count,
                None => ctx.feed.post(&post_id).await?.like_count,
            };
            let toggle = ctx.like_toggle_for(Some(post_id), count);
            toggle.reconcile().await?;

            let result = toggle.toggle().await;
            tracing::debug!("Like toggle: {:?}", ToggleReport::from(&result));
            match result? {
                ToggleOutcome::Applied(view) => {
                    let verb = if view.liked { "Te gusta" } else { "Ya no te gusta" };
                    println!("{} ({} me gusta)", verb, view.like_count);
                }
                ToggleOutcome::Ignored => println!("Hay otra acción en curso"),
            }
        }
        Command::Admin(command) => run_admin(&ctx, command).await?,
    }

    Ok(())
}

async fn run_post(ctx: &AppContext, command: PostCommand) -> Result<(), AppError> {
    match command {
        PostCommand::Show { post_id } => {
            let post = ctx.feed.post(&post_id).await?;
            let json = serde_json::to_string_pretty(&post)
                .map_err(|e| AppError::Internal(e.to_string()))?;
            println!("{}", json);

            let permissions = ctx.auth.permissions(&post.author.id);
            if permissions.can_edit {
                println!("Puedes editar este post");
            }
            if permissions.can_delete {
                println!("Puedes eliminar este post");
            }
        }
        PostCommand::Create(draft) => {
            let post = ctx.editor.create(&post_draft(draft)).await?;
            println!("Post {} publicado", post.id);
        }
        PostCommand::Update { post_id, draft } => {
            let post = ctx.editor.update(&post_id, &post_draft(draft)).await?;
            println!("Post {} actualizado", post.id);
        }
        PostCommand::Delete { post_id } => {
            ctx.editor.delete(&post_id).await?;
            println!("Post {} eliminado", post_id);
        }
    }
    Ok(())
}

async fn run_admin(ctx: &AppContext, command: AdminCommand) -> Result<(), AppError> {
    match command {
        AdminCommand::Users { limit, offset } => {
            for user in ctx.admin.users(limit, offset).await? {
                println!("{}\t{}\t{}\t{}", user.id, user.username, user.email, user.roles.as_str());
            }
        }
        AdminCommand::Posts => print_posts(&ctx.admin.posts().await?),
        AdminCommand::DeleteUser { user_id } => {
            ctx.admin.delete_user(&user_id).await?;
            println!("Usuario {} eliminado", user_id);
        }
        AdminCommand::DeletePost { post_id } => {
            ctx.admin.delete_post(&post_id).await?;
            println!("Post {} eliminado", post_id);
        }
        AdminCommand::CreateAdmin(account) => {
            let user = ctx.admin.create_admin(&register_form(account)).await?;
            println!("Administrador {} creado", user.username);
        }
        AdminCommand::CreateCategory { name, slug } => {
            let category = ctx.admin.create_category(&CategoryForm { name, slug }).await?;
            println!("Categoría {} creada", category.slug);
        }
    }
    Ok(())
}

fn register_form(account: AccountArgs) -> RegisterForm {
    RegisterForm {
        username: account.username,
        email: account.email,
        password: account.password,
        avatar_url: account.avatar_url,
    }
}

fn post_draft(args: DraftArgs) -> PostDraft {
    PostDraft {
        title: args.title,
        content: args.content,
        category_id: args.category,
        tag_ids: args.tags,
        images: args.images,
    }
}

fn print_session(session: &Session) {
    let name = if session.username.is_empty() {
        "(sin perfil)"
    } else {
        session.username.as_str()
    };
    println!("{} [{}]", name, session.role.as_str());
    if let Some(email) = &session.email {
        println!("{}", email);
    }
}

fn print_posts(posts: &[PostView]) {
    if posts.is_empty() {
        println!("No hay posts");
        return;
    }
    for post in posts {
        println!(
            "{}\t{}\t@{}\t♥ {}\t💬 {}",
            post.id,
            post.title.as_deref().unwrap_or("(sin título)"),
            post.author.username,
            post.like_count,
            post.comment_count
        );
    }
}

fn print_thread(thread: &CommentThread) {
    if thread.is_empty() {
        println!("Sin comentarios");
        return;
    }
    for root in thread.roots() {
        print_comment(thread, root, 0);
    }
}

fn print_comment(thread: &CommentThread, comment: &CommentView, depth: usize) {
    println!(
        "{}{} @{}: {}",
        "  ".repeat(depth),
        comment.id,
        comment.author.username,
        comment.body
    );
    for reply in thread.replies_of(&comment.id) {
        print_comment(thread, reply, depth + 1);
    }
}
