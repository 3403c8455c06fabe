mod negotiator;
mod types;

pub use negotiator::{
    API_VERSION_HEADER, NegotiationResult, NegotiationSource, VersionNegotiator,
};
pub use types::{ApiVersion, VersionInfo, VersionPolicy, VersionPolicyError};
