//! User entity and permission tags

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Permission tags granted to users and required by routes and realtime
/// topics.
pub mod permissions {
    pub const MEDIA_ACCESS: &str = "media:access";
    pub const INGEST_ACCESS: &str = "ingest:access";
    pub const TRANSCODE_ACCESS: &str = "transcode:access";
    pub const WORKFLOW_ACCESS: &str = "workflow:access";
    pub const SETTINGS_MANAGE: &str = "settings:manage";
    pub const USER_ADMIN: &str = "user:admin";

    /// Every tag; granted to the bootstrap administrator.
    pub const ALL: &[&str] = &[
        MEDIA_ACCESS,
        INGEST_ACCESS,
        TRANSCODE_ACCESS,
        WORKFLOW_ACCESS,
        SETTINGS_MANAGE,
        USER_ADMIN,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Argon2 hash, never the password itself
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(username: String, password_hash: String, permissions: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            permissions,
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    pub fn has_permission(&self, tag: &str) -> bool {
        self.permissions.iter().any(|p| p == tag)
    }
}
