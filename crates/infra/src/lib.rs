//! Infrastructure layer: storage adapters and process configuration.

pub mod config;
pub mod store;

pub use config::{Config, ConfigError};
pub use store::{BookStore, InMemoryBookStore, InMemoryUserStore, PostgresBookStore, PostgresUserStore, StoreError, UserStore};
