//! Custom extractors for QWC services

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::prelude::*;
use crate::tenant::TenantResolver;

// Re-export the Tenant extractor trait from qwc-types
pub use qwc_types::extract::TenantResolverState;

// `Arc<TenantResolver>` works as router state through the blanket impl in qwc-types.
impl TenantResolverState for TenantResolver {
	fn resolve_tenant(&self, parts: &Parts) -> Tenant {
		self.tenant(parts)
	}
}

// TenantPathPrefix //
//******************//
/// URL path prefix of the current tenant, set by the tenant context middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantPathPrefix(pub Box<str>);

impl TenantPathPrefix {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl<S> FromRequestParts<S> for TenantPathPrefix
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		parts
			.extensions
			.get::<TenantPathPrefix>()
			.cloned()
			.ok_or_else(|| Error::Internal("tenant context middleware not installed".into()))
	}
}

// CaseInsensitiveQuery //
//**********************//
/// Query parameters with case-insensitive names.
///
/// OGC style requests (`SERVICE=WMS&request=GetMap`) do not agree on the
/// case of parameter names. Values keep their case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseInsensitiveQuery {
	params: Vec<(Box<str>, Box<str>)>,
}

impl CaseInsensitiveQuery {
	pub fn parse(query: &str) -> QwcResult<Self> {
		let params: Vec<(String, String)> = serde_urlencoded::from_str(query)
			.map_err(|err| Error::ValidationError(format!("invalid query string: {}", err)))?;
		Ok(Self { params: params.into_iter().map(|(k, v)| (k.into(), v.into())).collect() })
	}

	/// First value of the parameter
	pub fn get(&self, name: &str) -> Option<&str> {
		self.params.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| &**v)
	}

	pub fn get_all<'a, 'b>(&'a self, name: &'b str) -> impl Iterator<Item = &'a str> + use<'a, 'b> {
		self.params.iter().filter(move |(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| &**v)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	pub fn len(&self) -> usize {
		self.params.len()
	}

	pub fn is_empty(&self) -> bool {
		self.params.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.params.iter().map(|(k, v)| (&**k, &**v))
	}
}

impl<S> FromRequestParts<S> for CaseInsensitiveQuery
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		Self::parse(parts.uri.query().unwrap_or(""))
	}
}


// vim: ts=4
