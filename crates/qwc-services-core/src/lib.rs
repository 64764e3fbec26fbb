//! Shared infrastructure for multi-tenant QWC services.
//!
//! # Features
//!
//! - Tenant resolution from a fixed name, a request header or the request URL
//! - Per-tenant service configs with environment overrides
//! - Tenant handler registry, invalidated when config files change
//! - Expiring caches scoped by service, caller identity and keys
//! - JWT access tokens in headers or cookies, group name mapping
//! - Permission document models

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

// Re-export shared types from qwc-types
pub use qwc_types::env;
pub use qwc_types::error;
pub use qwc_types::permissions;
pub use qwc_types::types;
pub use qwc_types::utils;

// Re-export core infrastructure
pub use qwc_core::cache;
pub use qwc_core::clock;
pub use qwc_core::config;
pub use qwc_core::database;
pub use qwc_core::extract;
pub use qwc_core::middleware;
pub use qwc_core::permissions_reader;
pub use qwc_core::runtime_config;
pub use qwc_core::tenant;
pub use qwc_core::tenant_handler;

pub use qwc_auth as auth;

// Local modules
pub mod app;
pub mod prelude;

pub use crate::app::{App, AppState, init_logging, with_service_layers};

// vim: ts=4
