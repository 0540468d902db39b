//! Demo records used by the CLI and the tests.

mod post;
pub mod schema;
mod user;

pub use post::{Post, PostController, PostRepository};
pub use user::{User, UserController, UserRepository};
