pub mod clause;
pub mod user;

pub use user::{UserRepository, UserStore};
