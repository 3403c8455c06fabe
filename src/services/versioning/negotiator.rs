//! Per-request API version negotiation.
//!
//! Sources are consulted in a fixed order and the first one that names a
//! supported version wins:
//!
//! 1. path segment `/v<N>/`
//! 2. `X-API-Version: v<N>`
//! 3. `Accept: ...; version=<N>`
//! 4. the configured default
//!
//! A source that is present but names an unsupported version is treated as
//! absent. Negotiation never fails.

use axum::http::{HeaderMap, HeaderName, header};
use serde::Serialize;

use super::types::{ApiVersion, VersionPolicy};

pub const API_VERSION_HEADER: HeaderName = HeaderName::from_static("x-api-version");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationSource {
    Path,
    HeaderExplicit,
    HeaderAccept,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NegotiationResult {
    pub version: ApiVersion,
    pub source: NegotiationSource,
}

#[derive(Debug, Clone)]
pub struct VersionNegotiator {
    policy: VersionPolicy,
}

impl VersionNegotiator {
    pub fn new(policy: VersionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &VersionPolicy {
        &self.policy
    }

    pub fn negotiate(&self, path: &str, headers: &HeaderMap) -> NegotiationResult {
        if let Some(version) = path_version(path).and_then(|d| self.policy.resolve_digits(d)) {
            return NegotiationResult {
                version,
                source: NegotiationSource::Path,
            };
        }

        if let Some(version) = explicit_version(headers).and_then(|raw| self.policy.resolve(raw)) {
            return NegotiationResult {
                version,
                source: NegotiationSource::HeaderExplicit,
            };
        }

        if let Some(version) = accept_version(headers).and_then(|d| self.policy.resolve_digits(d)) {
            return NegotiationResult {
                version,
                source: NegotiationSource::HeaderAccept,
            };
        }

        NegotiationResult {
            version: self.policy.default_version(),
            source: NegotiationSource::Default,
        }
    }
}

/// Digits of the first `/v<digits>/` in `path`.
fn path_version(path: &str) -> Option<&str> {
    path.match_indices("/v").find_map(|(idx, _)| {
        let rest = &path[idx + 2..];
        let len = rest.bytes().take_while(u8::is_ascii_digit).count();
        (len > 0 && rest[len..].starts_with('/')).then(|| &rest[..len])
    })
}

fn explicit_version(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_VERSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Digits of the first `version=<digits>` media-type parameter across all
/// `Accept` headers. Quoted values are accepted.
fn accept_version(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .flat_map(|range| range.split(';').skip(1))
        .find_map(|param| {
            let (key, value) = param.split_once('=')?;
            if !key.trim().eq_ignore_ascii_case("version") {
                return None;
            }
            let value = value.trim().trim_matches('"');
            (!value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())).then_some(value)
        })
}
