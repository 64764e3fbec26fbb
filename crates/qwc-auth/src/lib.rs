//! Authentication helpers for QWC services.
//!
//! JWT access tokens in the Authorization header or an access cookie,
//! identity helpers, an optional Basic auth fallback user and group name
//! mapping.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod extract;
pub mod group_mapper;
pub mod identity;
pub mod jwt;
pub mod prelude;

pub use config::AuthConfig;
pub use extract::{Auth, OptionalAuth, optional_auth};
pub use group_mapper::GroupNameMapper;
pub use identity::{AuthIdentity, IdentityRecord, auth_user, get_groups, get_username};
pub use jwt::{AccessClaims, JwtManager};

// vim: ts=4
