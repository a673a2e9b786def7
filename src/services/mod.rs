pub mod hooks;
pub mod user;
