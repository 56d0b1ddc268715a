//! `bookshelf-auth` — bearer-token authentication and ownership policy.
//!
//! This crate is intentionally decoupled from HTTP and storage: it verifies
//! credentials, describes identities, and decides whether an actor may mutate
//! a resource. Loading users and producing responses is done by callers.

pub mod authorize;
pub mod claims;
pub mod token;
pub mod user;

pub use authorize::{AccessDenied, MutatingAction, Owned, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use token::{Hs256TokenIssuer, Hs256TokenVerifier, TokenError, TokenVerifier, parse_bearer};
pub use user::{User, UserRecord};
