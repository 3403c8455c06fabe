/*
 * Responsibility
 * - 1 リクエスト分のコンテキスト (request id / 交渉済み version / 検証済み claims)
 * - context middleware が生成し、認証 middleware が claims 付きのコピーに置き換える
 * - handler はこの型を extractor 経由でのみ受け取る
 */
use std::sync::Arc;

use uuid::Uuid;

use crate::services::auth::token_codec::Claims;
use crate::services::versioning::{ApiVersion, NegotiationResult};

/// Per-request context, stored in request extensions.
///
/// `claims` is `None` until the authentication stage has accepted a bearer token.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    negotiation: NegotiationResult,
    claims: Option<Arc<Claims>>,
}

impl RequestContext {
    pub fn new(negotiation: NegotiationResult) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            negotiation,
            claims: None,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn api_version(&self) -> ApiVersion {
        self.negotiation.version
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_deref()
    }

    pub fn shared_claims(&self) -> Option<Arc<Claims>> {
        self.claims.clone()
    }

    /// Same request id and version, with verified claims attached.
    pub fn with_claims(&self, claims: Claims) -> Self {
        Self {
            request_id: self.request_id,
            negotiation: self.negotiation,
            claims: Some(Arc::new(claims)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::services::auth::token_codec::TokenType;
    use crate::services::versioning::NegotiationSource;

    fn negotiation() -> NegotiationResult {
        NegotiationResult {
            version: ApiVersion::new(2),
            source: NegotiationSource::Path,
        }
    }

    #[test]
    fn each_context_gets_its_own_request_id() {
        let a = RequestContext::new(negotiation());
        let b = RequestContext::new(negotiation());
        assert_ne!(a.request_id(), b.request_id());
        assert!(a.claims().is_none());
    }

    #[test]
    fn with_claims_keeps_identity_of_the_request() {
        let ctx = RequestContext::new(negotiation());
        let claims = Claims {
            sub: "u1".into(),
            permissions: BTreeSet::from(["user:read".to_string()]),
            token_type: TokenType::Access,
            exp: 2,
            iat: 1,
            jti: Uuid::new_v4(),
        };

        let authed = ctx.with_claims(claims.clone());

        assert_eq!(authed.request_id(), ctx.request_id());
        assert_eq!(authed.api_version(), ApiVersion::new(2));
        assert_eq!(authed.claims(), Some(&claims));
        assert!(ctx.claims().is_none());
    }
}
