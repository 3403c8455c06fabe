pub mod access;
pub mod authorize;

pub use authorize::{require_all, require_any};
