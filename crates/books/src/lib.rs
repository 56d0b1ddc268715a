//! Books domain module.
//!
//! This crate contains the book record and the rules for creating and patching
//! it, implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage).

pub mod book;

pub use book::{Book, BookPatch, BookValidationError, NewBook, ValidBook};
