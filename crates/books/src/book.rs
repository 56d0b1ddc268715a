use serde::{Deserialize, Serialize};
use thiserror::Error;

use bookshelf_auth::Owned;
use bookshelf_core::{BookId, Entity, UserId};

/// A book record.
///
/// # Invariants
/// - `owner` is set once at creation and never reassigned.
/// - `in_stock` is always a boolean; it defaults to `true` at creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    owner: UserId,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub price: f64,
    pub in_stock: bool,
}

impl Book {
    /// Build a record from a validated request. The owner is always the
    /// authenticated actor.
    pub fn create(id: BookId, owner: UserId, valid: ValidBook) -> Self {
        Self {
            id,
            owner,
            title: valid.title,
            author: valid.author,
            genre: valid.genre,
            price: valid.price,
            in_stock: valid.in_stock,
        }
    }

    /// Rehydrate a record from storage.
    pub fn from_parts(
        id: BookId,
        owner: UserId,
        title: String,
        author: String,
        genre: String,
        price: f64,
        in_stock: bool,
    ) -> Self {
        Self {
            id,
            owner,
            title,
            author,
            genre,
            price,
            in_stock,
        }
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// Apply a partial update in place.
    ///
    /// Text fields are replaced when present and non-empty. `price` and
    /// `in_stock` are replaced whenever present, so `0` and `false` are real
    /// values rather than "absent".
    pub fn apply_patch(&mut self, patch: &BookPatch) {
        if let Some(title) = non_empty(&patch.title) {
            self.title = title.to_string();
        }
        if let Some(author) = non_empty(&patch.author) {
            self.author = author.to_string();
        }
        if let Some(genre) = non_empty(&patch.genre) {
            self.genre = genre.to_string();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(in_stock) = patch.in_stock {
            self.in_stock = in_stock;
        }
    }
}

impl Entity for Book {
    type Id = BookId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Owned for Book {
    fn owner(&self) -> UserId {
        self.owner
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookValidationError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// Create request body. Every field is optional on the wire so that missing
/// fields can be reported together. Unknown fields (including any `owner`)
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub price: Option<f64>,
    pub in_stock: Option<bool>,
}

/// A create request that passed presence checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub price: f64,
    pub in_stock: bool,
}

impl NewBook {
    /// Presence checks for `title`, `author`, `genre` and `price`.
    pub fn validate(self) -> Result<ValidBook, BookValidationError> {
        let mut missing = Vec::new();
        if non_empty(&self.title).is_none() {
            missing.push("title");
        }
        if non_empty(&self.author).is_none() {
            missing.push("author");
        }
        if non_empty(&self.genre).is_none() {
            missing.push("genre");
        }
        if self.price.is_none() {
            missing.push("price");
        }

        match (self.title, self.author, self.genre, self.price) {
            (Some(title), Some(author), Some(genre), Some(price)) if missing.is_empty() => Ok(ValidBook {
                title,
                author,
                genre,
                price,
                in_stock: self.in_stock.unwrap_or(true),
            }),
            _ => Err(BookValidationError::MissingFields(missing)),
        }
    }
}

/// Update request body: any subset of the mutable fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub price: Option<f64>,
    pub in_stock: Option<bool>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
