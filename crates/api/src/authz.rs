//! API-side ownership guard for book mutations.
//!
//! This runs after the book was found (a missing book is reported as 404
//! before ownership is evaluated) and before any write.

use bookshelf_auth::{MutatingAction, authorize};
use bookshelf_books::Book;

use crate::app::errors::ApiError;
use crate::context::AuthenticatedUser;

/// Check that `actor` owns `book` before performing `action`.
pub fn authorize_book(book: &Book, actor: &AuthenticatedUser, action: MutatingAction) -> Result<(), ApiError> {
    authorize(book, actor.id(), action).map_err(|denied| {
        tracing::warn!(
            book_id = %book.id,
            owner_id = %denied.owner,
            actor_id = %denied.actor,
            action = %denied.action,
            "ownership check failed"
        );
        ApiError::from(denied)
    })
}
