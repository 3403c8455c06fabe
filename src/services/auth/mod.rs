pub mod account;
pub mod denylist;
pub mod password;
pub mod permissions;
pub mod token_codec;
pub mod token_service;

pub use account::{AccountService, Registration};
pub use denylist::{CacheDenylist, DenylistError, TokenDenylist};
pub use password::{Argon2PasswordHasher, HashError, PasswordHasher};
pub use permissions::{PermissionHierarchy, PermissionResolver};
pub use token_codec::{AuthError, Claims, ClaimsData, TokenCodec, TokenType};
pub use token_service::{IssuedTokenPair, TokenService};
