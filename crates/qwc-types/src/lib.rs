//! Shared types, error type and permission document models for QWC services.
//!
//! This crate contains the foundational types shared by `qwc-core`,
//! `qwc-auth` and the services built on top of them.

pub mod env;
pub mod error;
pub mod extract;
pub mod permissions;
pub mod prelude;
pub mod types;
pub mod utils;

// vim: ts=4
