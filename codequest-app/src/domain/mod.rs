pub(crate) mod de;

mod comment;
mod forms;
mod like;
mod post;
mod session;
mod taxonomy;
mod user;

pub use comment::CommentView;
pub use de::parse_datetime;
pub use forms::{CategoryForm, CommentDraft, LoginForm, PostDraft, RegisterForm};
pub use like::{Like, LikeViewState};
pub use post::{Author, PostView};
pub use session::{Role, Session};
pub use taxonomy::{Category, Tag};
pub use user::User;
