/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - ex: token service, permission resolver, version negotiator, user store など
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::repos::UserStore;
use crate::services::auth::{
    AccountService, PermissionResolver, TokenCodec, TokenDenylist, TokenService,
};
use crate::services::versioning::VersionNegotiator;

#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub accounts: Arc<AccountService>,
    pub permissions: Arc<PermissionResolver>,
    pub versions: Arc<VersionNegotiator>,
    pub users: Arc<dyn UserStore>,
    pub denylist: Arc<dyn TokenDenylist>,
}

impl AppState {
    pub fn new(
        tokens: Arc<TokenService>,
        accounts: Arc<AccountService>,
        permissions: Arc<PermissionResolver>,
        versions: Arc<VersionNegotiator>,
        users: Arc<dyn UserStore>,
        denylist: Arc<dyn TokenDenylist>,
    ) -> Self {
        Self {
            tokens,
            accounts,
            permissions,
            versions,
            users,
            denylist,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        self.tokens.codec()
    }
}
