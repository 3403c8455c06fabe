/*
 * Responsibility
 * - API version tag (`v<N>`) and the configured, closed set of supported versions
 * - default / latest / deprecated queries over that set
 */
use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// `v<N>`; ordered by `N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion(u32);

impl ApiVersion {
    pub const fn new(ordinal: u32) -> Self {
        Self(ordinal)
    }

    pub fn ordinal(&self) -> u32 {
        self.0
    }

    /// Accepts `v2`, `V2` or `2` (surrounding whitespace ignored).
    /// Leading zeros are not a canonical spelling and do not parse.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let digits = raw
            .strip_prefix('v')
            .or_else(|| raw.strip_prefix('V'))
            .unwrap_or(raw);
        Self::from_digits(digits)
    }

    pub(crate) fn from_digits(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if digits.len() > 1 && digits.starts_with('0') {
            return None;
        }
        digits.parse().ok().map(Self)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionPolicyError {
    #[error("at least one API version must be supported")]
    Empty,
    #[error("default API version {0} is not supported")]
    UnsupportedDefault(ApiVersion),
    #[error("deprecated API version {0} is not supported")]
    UnsupportedDeprecated(ApiVersion),
}

/// The supported versions plus default and deprecation settings.
///
/// Built once from configuration; adding a version is a configuration change.
#[derive(Debug, Clone)]
pub struct VersionPolicy {
    supported: BTreeSet<ApiVersion>,
    default: ApiVersion,
    deprecated: BTreeSet<ApiVersion>,
    sunset: Option<String>,
}

impl VersionPolicy {
    pub fn new(
        supported: impl IntoIterator<Item = ApiVersion>,
        default: ApiVersion,
    ) -> Result<Self, VersionPolicyError> {
        let supported: BTreeSet<ApiVersion> = supported.into_iter().collect();
        if supported.is_empty() {
            return Err(VersionPolicyError::Empty);
        }
        if !supported.contains(&default) {
            return Err(VersionPolicyError::UnsupportedDefault(default));
        }

        Ok(Self {
            supported,
            default,
            deprecated: BTreeSet::new(),
            sunset: None,
        })
    }

    pub fn with_deprecated(
        mut self,
        deprecated: impl IntoIterator<Item = ApiVersion>,
        sunset: Option<String>,
    ) -> Result<Self, VersionPolicyError> {
        let deprecated: BTreeSet<ApiVersion> = deprecated.into_iter().collect();
        if let Some(v) = deprecated.iter().find(|v| !self.supported.contains(v)) {
            return Err(VersionPolicyError::UnsupportedDeprecated(*v));
        }
        self.deprecated = deprecated;
        self.sunset = sunset;
        Ok(self)
    }

    /// Parse `raw` and keep it only if it names a supported version.
    pub fn resolve(&self, raw: &str) -> Option<ApiVersion> {
        ApiVersion::parse(raw).filter(|v| self.supported.contains(v))
    }

    pub(crate) fn resolve_digits(&self, digits: &str) -> Option<ApiVersion> {
        ApiVersion::from_digits(digits).filter(|v| self.supported.contains(v))
    }

    pub fn is_supported(&self, version: ApiVersion) -> bool {
        self.supported.contains(&version)
    }

    pub fn default_version(&self) -> ApiVersion {
        self.default
    }

    pub fn latest(&self) -> ApiVersion {
        // `new` rejects an empty set
        self.supported.last().copied().unwrap_or(self.default)
    }

    pub fn is_deprecated(&self, version: ApiVersion) -> bool {
        self.deprecated.contains(&version)
    }

    pub fn sunset(&self) -> Option<&str> {
        self.sunset.as_deref()
    }

    pub fn info(&self) -> VersionInfo {
        VersionInfo {
            supported_versions: self.supported.iter().copied().collect(),
            default_version: self.default,
            latest_version: self.latest(),
            deprecated_versions: self.deprecated.iter().copied().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VersionInfo {
    pub supported_versions: Vec<ApiVersion>,
    pub default_version: ApiVersion,
    pub latest_version: ApiVersion,
    pub deprecated_versions: Vec<ApiVersion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const V1: ApiVersion = ApiVersion::new(1);
    const V2: ApiVersion = ApiVersion::new(2);
    const V3: ApiVersion = ApiVersion::new(3);

    #[test]
    fn parses_common_spellings() {
        assert_eq!(ApiVersion::parse("v2"), Some(V2));
        assert_eq!(ApiVersion::parse(" V2 "), Some(V2));
        assert_eq!(ApiVersion::parse("2"), Some(V2));
        assert_eq!(ApiVersion::parse("v12").map(|v| v.ordinal()), Some(12));
    }

    #[test]
    fn rejects_non_canonical_tags() {
        for raw in ["", "v", "vv2", "v2.0", "v-1", "v02", "two", "v99999999999"] {
            assert_eq!(ApiVersion::parse(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn displays_and_serializes_as_tag() {
        assert_eq!(V2.to_string(), "v2");
        assert_eq!(serde_json::to_value(V2).unwrap(), serde_json::json!("v2"));
    }

    #[test]
    fn policy_requires_supported_default() {
        assert_eq!(
            VersionPolicy::new([], V1).unwrap_err(),
            VersionPolicyError::Empty
        );
        assert_eq!(
            VersionPolicy::new([V1, V2], V3).unwrap_err(),
            VersionPolicyError::UnsupportedDefault(V3)
        );
    }

    #[test]
    fn policy_resolves_only_supported_versions() {
        let policy = VersionPolicy::new([V1, V2], V1).unwrap();

        assert_eq!(policy.resolve("v2"), Some(V2));
        assert_eq!(policy.resolve("v3"), None);
        assert_eq!(policy.resolve("garbage"), None);
        assert_eq!(policy.latest(), V2);
        assert_eq!(policy.default_version(), V1);
    }

    #[test]
    fn deprecation_is_reported_in_info() {
        let policy = VersionPolicy::new([V1, V2, V3], V2)
            .unwrap()
            .with_deprecated([V1], Some("2027-01-01".to_string()))
            .unwrap();

        assert!(policy.is_deprecated(V1));
        assert!(!policy.is_deprecated(V2));
        assert_eq!(policy.sunset(), Some("2027-01-01"));
        assert_eq!(
            policy.info(),
            VersionInfo {
                supported_versions: vec![V1, V2, V3],
                default_version: V2,
                latest_version: V3,
                deprecated_versions: vec![V1],
            }
        );

        let err = VersionPolicy::new([V1], V1)
            .unwrap()
            .with_deprecated([V2], None)
            .unwrap_err();
        assert_eq!(err, VersionPolicyError::UnsupportedDeprecated(V2));
    }
}
