//! Postgres-backed stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Backend` |
//! | ColumnDecode / ColumnNotFound | N/A | `Corrupt` |
//! | Other | N/A | `Backend` |
//!
//! ## Thread Safety
//!
//! Both stores wrap a `PgPool`, which is cheap to clone and `Send + Sync`.

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use bookshelf_auth::{User, UserRecord};
use bookshelf_books::Book;
use bookshelf_core::{BookId, UserId};

use super::{BookStore, StoreError, UserStore};

const MAX_CONNECTIONS: u32 = 10;

/// Open a connection pool for `database_url`.
pub async fn connect(database_url: &str) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Create the `users` and `books` tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id            UUID PRIMARY KEY,
            name          TEXT NOT NULL,
            email         TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| map_sqlx_error("create users table", e))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id       UUID PRIMARY KEY,
            owner_id UUID NOT NULL REFERENCES users (id),
            title    TEXT NOT NULL,
            author   TEXT NOT NULL,
            genre    TEXT NOT NULL,
            price    DOUBLE PRECISION NOT NULL,
            in_stock BOOLEAN NOT NULL DEFAULT TRUE
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| map_sqlx_error("create books table", e))?;

    Ok(())
}

#[derive(Debug, Clone)]
pub struct PostgresBookStore {
    pool: PgPool,
}

impl PostgresBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn book_from_row(row: &PgRow) -> Result<Book, sqlx::Error> {
    Ok(Book::from_parts(
        BookId::from_uuid(row.try_get::<Uuid, _>("id")?),
        UserId::from_uuid(row.try_get::<Uuid, _>("owner_id")?),
        row.try_get("title")?,
        row.try_get("author")?,
        row.try_get("genre")?,
        row.try_get("price")?,
        row.try_get("in_stock")?,
    ))
}

#[async_trait]
impl BookStore for PostgresBookStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, title, author, genre, price, in_stock
            FROM books
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list books", e))?;

        rows.iter()
            .map(|row| book_from_row(row).map_err(|e| map_sqlx_error("list books", e)))
            .collect()
    }

    #[instrument(skip(self), fields(book_id = %id), err)]
    async fn get(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, title, author, genre, price, in_stock
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get book", e))?;

        row.as_ref()
            .map(book_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get book", e))
    }

    #[instrument(skip(self, book), fields(book_id = %book.id, owner_id = %book.owner()), err)]
    async fn insert(&self, book: Book) -> Result<Book, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO books (id, owner_id, title, author, genre, price, in_stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(book.id.as_uuid())
        .bind(book.owner().as_uuid())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.price)
        .bind(book.in_stock)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert book", e))?;

        Ok(book)
    }

    #[instrument(skip(self, book), fields(book_id = %book.id), err)]
    async fn update(&self, book: Book) -> Result<Option<Book>, StoreError> {
        // owner_id is immutable and never part of the SET list.
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $2, author = $3, genre = $4, price = $5, in_stock = $6
            WHERE id = $1
            "#,
        )
        .bind(book.id.as_uuid())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.price)
        .bind(book.in_stock)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update book", e))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(book))
    }

    #[instrument(skip(self), fields(book_id = %id), err)]
    async fn delete(&self, id: BookId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete book", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl UserStore for PostgresUserStore {
    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_public(&self, id: UserId) -> Result<Option<User>, StoreError> {
        // password_hash is never selected.
        let row = sqlx::query("SELECT id, name, email, created_at FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find user", e))?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("find user", e))
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert(&self, user: UserRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert user", e))?;

        Ok(())
    }
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
            StoreError::Corrupt(format!("{} in {}", err, operation))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
