use bookshelf_auth::User;
use bookshelf_core::UserId;

/// Authenticated identity attached to a request by the auth gate.
///
/// Only present on protected routes, and only after the user record was
/// loaded successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    user: User,
}

impl AuthenticatedUser {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn user(&self) -> &User {
        &self.user
    }
}
