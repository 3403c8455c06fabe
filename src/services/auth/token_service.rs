use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::repos::{UserRecord, UserStore};
use crate::services::auth::denylist::{TokenDenylist, fingerprint};
use crate::services::auth::token_codec::{Claims, ClaimsData, TokenCodec, TokenType};

/// Orchestrates token-pair issuance, refresh rotation and logout.
///
/// - TokenCodec signs and verifies the JWTs.
/// - TokenDenylist remembers refresh tokens that were already used or logged out.
/// - UserStore is re-read on refresh so deactivated users cannot mint new tokens.
#[derive(Clone)]
pub struct TokenService {
    codec: Arc<TokenCodec>,
    denylist: Arc<dyn TokenDenylist>,
    users: Arc<dyn UserStore>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("codec", &self.codec)
            .finish()
    }
}

impl TokenService {
    pub fn new(
        codec: Arc<TokenCodec>,
        denylist: Arc<dyn TokenDenylist>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            codec,
            denylist,
            users,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Access token carries the user's stored permissions; the refresh token
    /// carries the subject only.
    pub fn issue_token_pair(&self, user: &UserRecord) -> Result<IssuedTokenPair, AppError> {
        let sub = user.id.to_string();

        let access_token = self
            .codec
            .issue_access(&ClaimsData::new(&sub, &user.permissions))?;
        let refresh_token = self.codec.issue_refresh(&ClaimsData::subject_only(&sub))?;

        debug!(user_id = %user.id, "issued token pair");

        Ok(IssuedTokenPair {
            access_token,
            refresh_token,
            token_type: "bearer",
            expires_in: self.codec.access_ttl_seconds(),
        })
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// The presented token is revoked in the same check-and-store step that
    /// decides whether it may be used, so it works at most once.
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedTokenPair, AppError> {
        let claims = self.codec.verify(refresh_token, TokenType::Refresh)?;

        if !self.consume(refresh_token, &claims).await? {
            warn!(sub = %claims.sub, "refresh token reused");
            return Err(AppError::Unauthorized);
        }

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::Unauthorized)?;

        self.issue_token_pair(&user)
    }

    /// Logout: revoke a refresh token for the rest of its lifetime.
    ///
    /// Only the token's own subject may revoke it. Revoking an already
    /// revoked token is not an error.
    pub async fn revoke(&self, refresh_token: &str, owner: &str) -> Result<(), AppError> {
        let claims = self.codec.verify(refresh_token, TokenType::Refresh)?;

        if claims.sub != owner {
            warn!(sub = %claims.sub, caller = %owner, "refresh token belongs to another subject");
            return Err(AppError::Forbidden);
        }

        self.consume(refresh_token, &claims).await?;
        info!(sub = %claims.sub, "refresh token revoked");
        Ok(())
    }

    async fn consume(&self, refresh_token: &str, claims: &Claims) -> Result<bool, AppError> {
        let ttl_secs = claims.remaining_seconds(Utc::now()).max(1);
        Ok(self
            .denylist
            .revoke(&fingerprint(refresh_token), ttl_secs)
            .await?)
    }
}

/// Service-level return type to keep handlers thin.
#[derive(Clone, Debug)]
pub struct IssuedTokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::repos::{InMemoryUserStore, NewUser};
    use crate::services::auth::denylist::CacheDenylist;
    use crate::services::auth::token_codec::AuthError;

    async fn setup() -> (TokenService, UserRecord) {
        let users = Arc::new(InMemoryUserStore::new());
        let user = users
            .create(NewUser {
                email: "ada@example.com".into(),
                password_hash: "x".into(),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                permissions: BTreeSet::from(["user:read".to_string()]),
            })
            .await
            .unwrap();

        let codec = Arc::new(TokenCodec::new(b"test-secret", 60, 3600).unwrap());
        let service = TokenService::new(codec, Arc::new(CacheDenylist::in_memory()), users);
        (service, user)
    }

    #[tokio::test]
    async fn pair_carries_permissions_only_in_access_token() {
        let (service, user) = setup().await;
        let pair = service.issue_token_pair(&user).unwrap();

        assert_eq!(pair.token_type, "bearer");
        assert_eq!(pair.expires_in, 60);

        let access = service.codec().verify(&pair.access_token, TokenType::Access).unwrap();
        assert_eq!(access.sub, user.id.to_string());
        assert!(access.permissions.contains("user:read"));

        let refresh = service.codec().verify(&pair.refresh_token, TokenType::Refresh).unwrap();
        assert!(refresh.permissions.is_empty());
    }

    #[tokio::test]
    async fn refresh_rotates_and_rejects_reuse() {
        let (service, user) = setup().await;
        let pair = service.issue_token_pair(&user).unwrap();

        let next = service.refresh(&pair.refresh_token).await.unwrap();
        assert_ne!(next.refresh_token, pair.refresh_token);

        let reused = service.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(reused, AppError::Unauthorized));

        assert!(service.refresh(&next.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn refresh_after_logout_is_rejected() {
        let (service, user) = setup().await;
        let pair = service.issue_token_pair(&user).unwrap();

        let owner = user.id.to_string();
        service.revoke(&pair.refresh_token, &owner).await.unwrap();
        // idempotent
        assert!(service.revoke(&pair.refresh_token, &owner).await.is_ok());

        assert!(matches!(
            service.refresh(&pair.refresh_token).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn only_the_owner_can_revoke() {
        let (service, user) = setup().await;
        let pair = service.issue_token_pair(&user).unwrap();

        assert!(matches!(
            service.revoke(&pair.refresh_token, "someone-else").await,
            Err(AppError::Forbidden)
        ));
        // still good for its owner
        assert!(service.refresh(&pair.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn access_token_cannot_refresh() {
        let (service, user) = setup().await;
        let pair = service.issue_token_pair(&user).unwrap();

        let err = service.refresh(&pair.access_token).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Authentication(AuthError::WrongType {
                expected: TokenType::Refresh
            })
        ));
    }

    #[tokio::test]
    async fn unknown_subject_cannot_refresh() {
        let (service, _) = setup().await;
        let orphan = service
            .codec()
            .issue_refresh(&ClaimsData::subject_only(Uuid::new_v4().to_string()))
            .unwrap();

        assert!(matches!(
            service.refresh(&orphan).await,
            Err(AppError::Unauthorized)
        ));
    }
}
