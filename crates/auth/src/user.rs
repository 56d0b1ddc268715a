//! User identity records.
//!
//! Users are created by a separate registration flow and are read-only here.
//! [`UserRecord`] is the stored shape (including the credential hash);
//! [`User`] is the projection handed to request handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bookshelf_core::{Entity, UserId};

/// Authenticated identity, without secret fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Stored user row.
///
/// The credential hash is opaque to this service. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Project out the credential hash.
    pub fn to_public(&self) -> User {
        User {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

impl core::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Entity for UserRecord {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
