pub mod post;
pub mod tag;
pub mod user;

pub use post::{Post, PostInput, PostPage};
pub use tag::{Tag, TagType, TagTypeRef};
pub use user::{Credentials, SessionUser, SignInResponse, UserExists};
