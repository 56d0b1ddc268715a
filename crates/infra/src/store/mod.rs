//! Storage ports for books and users.
//!
//! Stores are addressed by unique identifier only. Writes are last-write-wins;
//! there is no optimistic concurrency control at this layer.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use bookshelf_auth::{User, UserRecord};
use bookshelf_books::Book;
use bookshelf_core::{BookId, UserId};

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryBookStore, InMemoryUserStore};
pub use postgres::{PostgresBookStore, PostgresUserStore, connect, ensure_schema};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored row could not be mapped back into a domain value.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// Connection, pool or driver failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books, oldest first.
    async fn list(&self) -> Result<Vec<Book>, StoreError>;

    async fn get(&self, id: BookId) -> Result<Option<Book>, StoreError>;

    async fn insert(&self, book: Book) -> Result<Book, StoreError>;

    /// Replace the mutable fields of an existing book.
    ///
    /// Returns `None` if the book no longer exists.
    async fn update(&self, book: Book) -> Result<Option<Book>, StoreError>;

    /// Remove a book. Returns whether a record was deleted.
    async fn delete(&self, id: BookId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Identity loader: fetch a user without secret fields.
    async fn find_public(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn insert(&self, user: UserRecord) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> BookStore for Arc<S>
where
    S: BookStore + ?Sized,
{
    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        (**self).list().await
    }

    async fn get(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        (**self).get(id).await
    }

    async fn insert(&self, book: Book) -> Result<Book, StoreError> {
        (**self).insert(book).await
    }

    async fn update(&self, book: Book) -> Result<Option<Book>, StoreError> {
        (**self).update(book).await
    }

    async fn delete(&self, id: BookId) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    async fn find_public(&self, id: UserId) -> Result<Option<User>, StoreError> {
        (**self).find_public(id).await
    }

    async fn insert(&self, user: UserRecord) -> Result<(), StoreError> {
        (**self).insert(user).await
    }
}
