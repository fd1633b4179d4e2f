//! Request pipeline middleware

pub mod access;
pub mod normalize;

pub use access::enforce_access_policy;
pub use normalize::normalize_errors;
