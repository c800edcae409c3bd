//! Actor identity type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of principal invoking an operation.
///
/// Identity issuance and permission checking happen outside this engine;
/// the actor type is carried only for version attribution and personal
/// secret ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    /// A human user session.
    User,
    /// A machine identity.
    Identity,
    /// A legacy service token.
    ServiceToken,
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Identity => write!(f, "identity"),
            Self::ServiceToken => write!(f, "service-token"),
        }
    }
}
