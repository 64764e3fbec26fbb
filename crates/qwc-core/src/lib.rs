//! Core infrastructure for multi-tenant QWC services.
//!
//! Tenant resolution, per-tenant config and permission loading, expiring
//! caches, the tenant handler registry and the axum glue that ties them to
//! requests.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod clock;
pub mod config;
pub mod database;
pub mod extract;
pub mod middleware;
pub mod permissions_reader;
pub mod prelude;
pub mod runtime_config;
pub mod tenant;
pub mod tenant_handler;

// Re-export commonly used types
pub use cache::{Cache, ExpiringDict};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigPaths, CoreConfig};
pub use database::DatabaseEngine;
pub use extract::{CaseInsensitiveQuery, TenantPathPrefix, TenantResolverState};
pub use permissions_reader::PermissionsReader;
pub use runtime_config::RuntimeConfig;
pub use tenant::{Environ, TenantResolver, TenantSource};
pub use tenant_handler::TenantHandler;

// vim: ts=4
