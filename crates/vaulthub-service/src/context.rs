//! Request context carrying the authenticated actor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vaulthub_core::types::ActorType;

/// Context for the current authenticated request.
///
/// Built by the caller's auth layer and passed into service methods so
/// that every operation knows *who* is acting. Personal-secret
/// visibility keys off `actor_id` when the actor is a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// What kind of principal is acting.
    pub actor_type: ActorType,
    /// The acting principal's ID.
    pub actor_id: Uuid,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(actor_type: ActorType, actor_id: Uuid) -> Self {
        Self {
            actor_type,
            actor_id,
            request_time: Utc::now(),
        }
    }

    /// The owner id to use for Personal-secret scoping, if the actor
    /// is a user. Machine identities never see Personal secrets.
    pub fn personal_owner_id(&self) -> Option<Uuid> {
        match self.actor_type {
            ActorType::User => Some(self.actor_id),
            ActorType::Identity | ActorType::ServiceToken => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_actors_have_no_personal_scope() {
        let user = RequestContext::new(ActorType::User, Uuid::new_v4());
        assert_eq!(user.personal_owner_id(), Some(user.actor_id));

        let identity = RequestContext::new(ActorType::Identity, Uuid::new_v4());
        assert_eq!(identity.personal_owner_id(), None);
    }
}
