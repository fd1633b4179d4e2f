//! Data models for the anime server

pub mod anime;
pub mod user;

pub use anime::Anime;
pub use user::{Credential, Principal, Role};
