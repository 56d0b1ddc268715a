//! In-memory stores for tests/dev.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use bookshelf_auth::{User, UserRecord};
use bookshelf_books::Book;
use bookshelf_core::{BookId, Entity, UserId};

use super::{BookStore, StoreError, UserStore};

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

/// Books keyed by id. `BookId` is time-ordered, so iteration order is
/// insertion order.
#[derive(Debug, Default)]
pub struct InMemoryBookStore {
    inner: RwLock<BTreeMap<BookId, Book>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }

    async fn get(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn insert(&self, book: Book) -> Result<Book, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(book.id()) {
            return Err(StoreError::Conflict(format!("book {} already exists", book.id)));
        }
        map.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update(&self, book: Book) -> Result<Option<Book>, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.get_mut(book.id()) {
            Some(slot) => {
                *slot = book.clone();
                Ok(Some(book))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: BookId) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(&id).is_some())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_public(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).map(UserRecord::to_public))
    }

    async fn insert(&self, user: UserRecord) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let email_taken = map.values().any(|u| u.email.eq_ignore_ascii_case(&user.email));
        if map.contains_key(user.id()) || email_taken {
            return Err(StoreError::Conflict(format!("user {} already exists", user.email)));
        }
        map.insert(user.id, user);
        Ok(())
    }
}
