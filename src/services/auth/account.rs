/*
 * Responsibility
 * - register / login / change password / bootstrap admin
 * - 資格情報の検証は PasswordHasher、永続化は UserStore に委譲する
 */
use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::BootstrapAdmin;
use crate::error::AppError;
use crate::repos::{NewUser, RepoError, UserRecord, UserStore};
use crate::services::auth::password::PasswordHasher;
use crate::services::auth::permissions::{SYSTEM_ADMIN, USER_READ};
use crate::services::auth::token_service::{IssuedTokenPair, TokenService};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<TokenService>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// New accounts start with `user:read` only.
    pub async fn register(&self, input: Registration) -> Result<UserRecord, AppError> {
        let email = input.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::InvalidRequest("email is invalid".into()));
        }
        validate_password(&input.password)?;

        let user = self
            .users
            .create(NewUser {
                email: email.to_string(),
                password_hash: self.hasher.hash(&input.password)?,
                first_name: input.first_name.trim().to_string(),
                last_name: input.last_name.trim().to_string(),
                permissions: BTreeSet::from([USER_READ.to_string()]),
            })
            .await?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Unknown email, wrong password and inactive account all look the same
    /// to the caller.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(UserRecord, IssuedTokenPair), AppError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .filter(|u| self.hasher.verify(password, &u.password_hash))
            .ok_or_else(|| {
                warn!("login failed");
                AppError::Unauthorized
            })?;

        if !user.is_active {
            warn!(user_id = %user.id, "login attempt on inactive account");
            return Err(AppError::Unauthorized);
        }

        let tokens = self.tokens.issue_token_pair(&user)?;
        info!(user_id = %user.id, "user logged in");
        Ok((user, tokens))
    }

    /// Re-hash the password of `user_id` after checking the current one.
    /// Tokens already issued stay valid until they expire.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if !self.hasher.verify(current_password, &user.password_hash) {
            warn!(user_id = %user.id, "password change with wrong current password");
            return Err(AppError::Unauthorized);
        }
        validate_password(new_password)?;

        let hash = self.hasher.hash(new_password)?;
        if !self.users.update_password(user.id, hash).await? {
            return Err(AppError::NotFound);
        }

        info!(user_id = %user.id, "password changed");
        Ok(())
    }

    /// Seed a `system:admin` account. An existing account with the same
    /// email is left untouched.
    pub async fn ensure_admin(&self, admin: &BootstrapAdmin) -> Result<(), AppError> {
        let created = self
            .users
            .create(NewUser {
                email: admin.email.clone(),
                password_hash: self.hasher.hash(&admin.password)?,
                first_name: "Admin".to_string(),
                last_name: String::new(),
                permissions: BTreeSet::from([SYSTEM_ADMIN.to_string()]),
            })
            .await;

        match created {
            Ok(user) => {
                info!(user_id = %user.id, "bootstrap admin created");
                Ok(())
            }
            Err(RepoError::Conflict) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidRequest(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::InMemoryUserStore;
    use crate::services::auth::denylist::CacheDenylist;
    use crate::services::auth::password::Argon2PasswordHasher;
    use crate::services::auth::token_codec::{TokenCodec, TokenType};

    fn service() -> AccountService {
        let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
        let codec = Arc::new(TokenCodec::new(b"test-secret", 60, 3600).unwrap());
        let tokens = Arc::new(TokenService::new(
            codec,
            Arc::new(CacheDenylist::in_memory()),
            users.clone(),
        ));
        AccountService::new(users, Arc::new(Argon2PasswordHasher::new()), tokens)
    }

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            email: email.into(),
            password: password.into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let accounts = service();
        let user = accounts
            .register(registration("ada@example.com", "password123"))
            .await
            .unwrap();
        assert_eq!(user.permissions, BTreeSet::from([USER_READ.to_string()]));

        let (logged_in, pair) = accounts.login("ada@example.com", "password123").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        let claims = accounts
            .tokens
            .codec()
            .verify(&pair.access_token, TokenType::Access)
            .unwrap();
        assert_eq!(claims.sub, user.id.to_string());
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let accounts = service();
        accounts
            .register(registration("ada@example.com", "password123"))
            .await
            .unwrap();

        assert!(matches!(
            accounts.login("ada@example.com", "wrong-password").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            accounts.login("nobody@example.com", "password123").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn register_validates_and_detects_duplicates() {
        let accounts = service();

        assert!(matches!(
            accounts.register(registration("not-an-email", "password123")).await,
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            accounts.register(registration("ada@example.com", "short")).await,
            Err(AppError::InvalidRequest(_))
        ));

        accounts
            .register(registration("ada@example.com", "password123"))
            .await
            .unwrap();
        assert!(matches!(
            accounts.register(registration("ADA@example.com", "password123")).await,
            Err(AppError::Conflict)
        ));
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let accounts = service();
        let admin = BootstrapAdmin {
            email: "root@example.com".into(),
            password: "rootpassword".into(),
        };

        accounts.ensure_admin(&admin).await.unwrap();
        accounts.ensure_admin(&admin).await.unwrap();

        let (_, pair) = accounts.login("root@example.com", "rootpassword").await.unwrap();
        let claims = accounts
            .tokens
            .codec()
            .verify(&pair.access_token, TokenType::Access)
            .unwrap();
        assert!(claims.permissions.contains(SYSTEM_ADMIN));
    }

    #[tokio::test]
    async fn change_password_swaps_credentials() {
        let accounts = service();
        let user = accounts
            .register(registration("ada@example.com", "password123"))
            .await
            .unwrap();

        assert!(matches!(
            accounts.change_password(user.id, "wrong-password", "newpassword1").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            accounts.change_password(user.id, "password123", "short").await,
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            accounts.change_password(Uuid::new_v4(), "password123", "newpassword1").await,
            Err(AppError::NotFound)
        ));

        accounts
            .change_password(user.id, "password123", "newpassword1")
            .await
            .unwrap();

        assert!(matches!(
            accounts.login("ada@example.com", "password123").await,
            Err(AppError::Unauthorized)
        ));
        accounts.login("ada@example.com", "newpassword1").await.unwrap();
    }
}
