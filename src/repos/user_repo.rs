/*
 * Responsibility
 * - ユーザー / 資格情報の参照口 (UserStore trait)
 * - 実際の永続化は外部ストアの責務。ここでは trait と in-memory 実装のみ持つ
 * - ストアのエラーは RepoError に変換して返す
 */
use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub permissions: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub permissions: BTreeSet<String>,
}

/// External user/credential store.
///
/// Emails are matched case-insensitively.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<UserRecord>>;

    /// `RepoError::Conflict` if the email is taken.
    async fn create(&self, new_user: NewUser) -> RepoResult<UserRecord>;

    /// `Ok(false)` if no such user.
    async fn update_password(&self, id: Uuid, password_hash: String) -> RepoResult<bool>;

    async fn ping(&self) -> RepoResult<()>;
}

/// Process-local stand-in for the external store.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>> {
        let email = normalize_email(email);
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<UserRecord>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> RepoResult<UserRecord> {
        let email = normalize_email(&new_user.email);
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == email) {
            return Err(RepoError::Conflict);
        }

        let row = UserRecord {
            id: Uuid::new_v4(),
            email,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            is_active: true,
            permissions: new_user.permissions,
            created_at: Utc::now(),
        };
        users.insert(row.id, row.clone());

        Ok(row)
    }

    async fn update_password(&self, id: Uuid, password_hash: String) -> RepoResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> RepoResult<()> {
        Ok(())
    }
}
