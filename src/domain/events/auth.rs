//! Session events

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interfaces::messaging::DomainEvent;

/// Published when a user's tokens are revoked wholesale (logout-all)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserTokensRevokedEvent {
    pub user_id: Uuid,
}

impl UserTokensRevokedEvent {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

impl DomainEvent for UserTokensRevokedEvent {
    fn event_type(&self) -> &'static str {
        "UserTokensRevoked"
    }
}
