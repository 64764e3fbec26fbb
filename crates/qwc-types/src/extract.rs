//! Axum extractors for QWC types.
//!
//! [`Tenant`] is taken from the request extensions (set by the tenant
//! context middleware) or resolved through the router state.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::Error;
use crate::types::Tenant;

// Tenant //
//********//
/// Resolves the tenant of a request.
///
/// Implement this on your application state type to enable the `Tenant`
/// Axum extractor without the tenant context middleware.
pub trait TenantResolverState: Send + Sync {
	fn resolve_tenant(&self, parts: &Parts) -> Tenant;
}

/// Blanket impl for `Arc<T>` so that shared states work
/// when the inner state implements `TenantResolverState`.
impl<T: TenantResolverState + ?Sized> TenantResolverState for Arc<T> {
	fn resolve_tenant(&self, parts: &Parts) -> Tenant {
		(**self).resolve_tenant(parts)
	}
}

impl<S> FromRequestParts<S> for Tenant
where
	S: TenantResolverState + Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		if let Some(tenant) = parts.extensions.get::<Tenant>().cloned() {
			Ok(tenant)
		} else {
			Ok(state.resolve_tenant(parts))
		}
	}
}

// vim: ts=4
