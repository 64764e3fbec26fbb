//! Tenant resolution
//!
//! The tenant of a request is determined by the first configured strategy:
//! - a fixed tenant name (`QWC_TENANT`),
//! - a request header (`TENANT_HEADER`),
//! - a pattern matched against the request URL (`TENANT_URL_RE`).
//!
//! Without any strategy the service runs in single-tenant mode and every
//! request belongs to [`DEFAULT_TENANT`].

use axum::extract::OriginalUri;
use axum::http::{Extensions, HeaderMap, Request, Uri, header, request::Parts};
use std::collections::HashMap;

use crate::config::{CoreConfig, TenantConfig};
use crate::prelude::*;

/// Anything a tenant can be read from
pub trait TenantSource {
	/// Value of a request header, `name` as configured
	fn header(&self, name: &str) -> Option<&str>;

	/// Request URL without query string: scheme, host, mount prefix and path
	fn base_url(&self) -> String;
}

// HTTP requests //
//***************//
fn request_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name).and_then(|v| v.to_str().ok())
}

fn request_base_url(headers: &HeaderMap, uri: &Uri, extensions: &Extensions) -> String {
	let scheme = uri.scheme_str().unwrap_or("http");
	let host = uri
		.authority()
		.map(|a| a.as_str())
		.or_else(|| request_header(headers, header::HOST.as_str()))
		.unwrap_or("");
	// Nested routers strip their mount prefix from the URI, the original keeps it
	let path = extensions.get::<OriginalUri>().map_or_else(|| uri.path(), |orig| orig.0.path());
	format!("{}://{}{}", scheme, host, path)
}

impl TenantSource for Parts {
	fn header(&self, name: &str) -> Option<&str> {
		request_header(&self.headers, name)
	}

	fn base_url(&self) -> String {
		request_base_url(&self.headers, &self.uri, &self.extensions)
	}
}

impl<B> TenantSource for Request<B> {
	fn header(&self, name: &str) -> Option<&str> {
		request_header(self.headers(), name)
	}

	fn base_url(&self) -> String {
		request_base_url(self.headers(), self.uri(), self.extensions())
	}
}

// Environ //
//*********//
pub const ENVIRON_SCHEME: &str = "REQUEST_SCHEME";
pub const ENVIRON_HOST: &str = "HTTP_HOST";
pub const ENVIRON_SCRIPT_NAME: &str = "SCRIPT_NAME";
pub const ENVIRON_PATH_INFO: &str = "PATH_INFO";

/// CGI-style server environment, available before a request object exists.
///
/// Headers are stored as `HTTP_<NAME>` with the name upper-cased and `-`
/// replaced by `_`. The mount prefix is in `SCRIPT_NAME`, the rest of the
/// path in `PATH_INFO`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environ {
	vars: HashMap<Box<str>, Box<str>>,
}

impl Environ {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<Box<str>>,
		V: Into<Box<str>>,
	{
		Self { vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
	}

	pub fn header_key(name: &str) -> String {
		format!("HTTP_{}", name.to_ascii_uppercase().replace('-', "_"))
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.vars.get(key).map(AsRef::as_ref)
	}

	pub fn set(&mut self, key: impl Into<Box<str>>, value: impl Into<Box<str>>) {
		self.vars.insert(key.into(), value.into());
	}
}

impl TenantSource for Environ {
	fn header(&self, name: &str) -> Option<&str> {
		self.get(&Self::header_key(name))
	}

	fn base_url(&self) -> String {
		format!(
			"{}://{}{}{}",
			self.get(ENVIRON_SCHEME).unwrap_or(""),
			self.get(ENVIRON_HOST).unwrap_or(""),
			self.get(ENVIRON_SCRIPT_NAME).unwrap_or(""),
			self.get(ENVIRON_PATH_INFO).unwrap_or(""),
		)
	}
}

// TenantResolver //
//****************//
/// Which strategy produced a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantStrategy {
	Name,
	Header,
	UrlPattern,
	Default,
}

#[derive(Debug, Clone)]
pub struct TenantResolver {
	config: TenantConfig,
	service_prefix: Box<str>,
}

impl TenantResolver {
	pub fn new(config: &CoreConfig) -> Self {
		Self { config: config.tenant.clone(), service_prefix: config.service_prefix.clone() }
	}

	pub fn from_tenant_config(config: TenantConfig, service_prefix: &str) -> Self {
		Self { config, service_prefix: Box::from(service_prefix) }
	}

	pub fn config(&self) -> &TenantConfig {
		&self.config
	}

	pub fn service_prefix(&self) -> &str {
		&self.service_prefix
	}

	/// Multi-tenancy is enabled if any strategy is configured
	pub fn is_multi(&self) -> bool {
		self.config.name.is_some() || self.config.header.is_some() || self.config.url_re.is_some()
	}

	pub fn strategy(&self) -> TenantStrategy {
		if self.config.name.is_some() {
			TenantStrategy::Name
		} else if self.config.header.is_some() {
			TenantStrategy::Header
		} else if self.config.url_re.is_some() {
			TenantStrategy::UrlPattern
		} else {
			TenantStrategy::Default
		}
	}

	/// Tenant of a request, [`DEFAULT_TENANT`] if it cannot be determined
	pub fn tenant<S: TenantSource + ?Sized>(&self, source: &S) -> Tenant {
		if let Some(name) = &self.config.name {
			return Tenant::new(name);
		}
		if let Some(header) = &self.config.header {
			return source.header(header).map_or_else(Tenant::default_tenant, request_tenant);
		}
		if let Some(url_re) = &self.config.url_re {
			let base_url = source.base_url();
			// Anchored at the start of the URL
			return url_re
				.captures(&base_url)
				.filter(|caps| caps.get(0).is_some_and(|m| m.start() == 0))
				.and_then(|caps| caps.get(1))
				.map_or_else(Tenant::default_tenant, |m| request_tenant(m.as_str()));
		}
		Tenant::default_tenant()
	}

	/// Path prefix of the current tenant (`{QWC_SERVICE_PREFIX}{tenant}`), e.g. for cookie paths
	pub fn tenant_path_prefix<S: TenantSource + ?Sized>(&self, source: &S) -> String {
		if self.is_multi() {
			format!("{}{}", self.service_prefix, self.tenant(source))
		} else {
			self.service_prefix.to_string()
		}
	}

	/// Inject the tenant path prefix into `SCRIPT_NAME`.
	///
	/// Only applies to the name and header strategies, with a URL pattern
	/// the tenant is already part of the path.
	pub fn apply_tenant_prefix(&self, environ: &mut Environ) -> Tenant {
		let tenant = self.tenant(environ);
		if !tenant.as_str().is_empty()
			&& matches!(self.strategy(), TenantStrategy::Name | TenantStrategy::Header)
		{
			let script_name = format!(
				"{}{}{}",
				self.service_prefix,
				tenant,
				environ.get(ENVIRON_SCRIPT_NAME).unwrap_or("")
			);
			debug!("Tenant prefix for {}: SCRIPT_NAME={}", tenant, script_name);
			environ.set(ENVIRON_SCRIPT_NAME, script_name);
		}
		tenant
	}
}

/// Tenant names taken from a request end up in cookie paths, so separators
/// and whitespace are not accepted.
fn is_valid_tenant_name(name: &str) -> bool {
	!name.chars().any(|c| c.is_whitespace() || c.is_control() || matches!(c, ';' | ',' | '"'))
}

fn request_tenant(name: &str) -> Tenant {
	if is_valid_tenant_name(name) {
		Tenant::new(name)
	} else {
		warn!("Ignoring invalid tenant name {:?}", name);
		Tenant::default_tenant()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use qwc_types::env::EnvVars;
	use regex::Regex;

	fn resolver(pairs: &[(&str, &str)]) -> TenantResolver {
		let env = EnvVars::from_pairs(pairs.iter().copied());
		TenantResolver::new(&CoreConfig::from_env(&env).unwrap())
	}

	fn url_resolver(pattern: &str) -> TenantResolver {
		let config = TenantConfig { url_re: Some(Regex::new(pattern).unwrap()), ..Default::default() };
		TenantResolver::from_tenant_config(config, "/")
	}

	fn request(uri: &str, headers: &[(&str, &str)]) -> Parts {
		let mut builder = Request::builder().uri(uri);
		for (name, value) in headers {
			builder = builder.header(*name, *value);
		}
		builder.body(()).unwrap().into_parts().0
	}

	#[test]
	fn test_is_multi() {
		assert!(!resolver(&[]).is_multi());
		assert!(!resolver(&[("QWC_TENANT", ""), ("TENANT_HEADER", ""), ("TENANT_URL_RE", "")]).is_multi());
		assert!(resolver(&[("QWC_TENANT", "foo")]).is_multi());
		assert!(resolver(&[("TENANT_HEADER", "bar")]).is_multi());
		assert!(resolver(&[("TENANT_URL_RE", "baz")]).is_multi());
	}

	#[test]
	fn test_using_name() {
		let resolver = resolver(&[
			("QWC_TENANT", "foo"),
			("TENANT_HEADER", "bar"),
			("TENANT_URL_RE", "^http://localhost/(\\w+)/"),
		]);
		let req = request("http://localhost/other/path", &[("bar", "baz")]);
		assert_eq!(resolver.tenant(&req).as_str(), "foo");
		assert_eq!(resolver.tenant(&Environ::new()).as_str(), "foo");
		assert_eq!(resolver.strategy(), TenantStrategy::Name);
	}

	#[test]
	fn test_using_header_and_environ() {
		let resolver = resolver(&[("TENANT_HEADER", "bar")]);

		let environ = Environ::from_pairs([("HTTP_BAR", "foo")]);
		assert_eq!(resolver.tenant(&environ).as_str(), "foo");

		let environ = Environ::from_pairs([("NO_HTTP_BAR", "foo")]);
		assert_eq!(resolver.tenant(&environ).as_str(), "default");
	}

	#[test]
	fn test_environ_header_key() {
		assert_eq!(Environ::header_key("x-tenant"), "HTTP_X_TENANT");
		let resolver = resolver(&[("TENANT_HEADER", "X-Tenant")]);
		let environ = Environ::from_pairs([("HTTP_X_TENANT", "org1")]);
		assert_eq!(resolver.tenant(&environ).as_str(), "org1");
	}

	#[test]
	fn test_using_header_and_request() {
		let resolver = resolver(&[("TENANT_HEADER", "bar")]);
		assert_eq!(resolver.tenant(&request("/", &[("bar", "foo")])).as_str(), "foo");
		assert_eq!(resolver.tenant(&request("/", &[])).as_str(), "default");
	}

	#[test]
	fn test_using_url_re_and_environ() {
		let url = "http://localhost/foo/bar";
		let resolver = url_resolver(&format!("^({})$", url));
		let environ = Environ::from_pairs([
			("REQUEST_SCHEME", "http"),
			("HTTP_HOST", "localhost"),
			("SCRIPT_NAME", "/foo"),
			("PATH_INFO", "/bar"),
		]);
		assert_eq!(resolver.tenant(&environ).as_str(), url);

		let environ = Environ::from_pairs([("PATH_INFO", "lorem")]);
		assert_eq!(resolver.tenant(&environ).as_str(), "default");
	}

	#[test]
	fn test_using_url_re_and_request() {
		let resolver = url_resolver("^https?://[^/]+/map/(\\w+)");
		let req = request("/map/org1/api/v1?tenant=ignored", &[("host", "example.com")]);
		assert_eq!(req.base_url(), "http://example.com/map/org1/api/v1");
		assert_eq!(resolver.tenant(&req).as_str(), "org1");

		assert_eq!(resolver.tenant(&request("/other", &[("host", "example.com")])).as_str(), "default");
	}

	#[test]
	fn test_url_re_is_anchored_at_start() {
		let resolver = url_resolver("map/(\\w+)");
		let req = request("/map/org1", &[("host", "example.com")]);
		assert_eq!(resolver.tenant(&req).as_str(), "default");
	}

	#[test]
	fn test_url_uses_original_uri() {
		let resolver = url_resolver("^http://localhost/(\\w+)/");
		let mut req = request("/api", &[("host", "localhost")]);
		req.extensions.insert(OriginalUri(Uri::from_static("/org2/api")));
		assert_eq!(resolver.tenant(&req).as_str(), "org2");
	}

	#[test]
	fn test_empty() {
		let resolver = resolver(&[]);
		assert_eq!(resolver.tenant(&Environ::new()).as_str(), "default");
		assert_eq!(resolver.strategy(), TenantStrategy::Default);
	}

	#[test]
	fn test_tenant_path_prefix() {
		let single = resolver(&[("QWC_SERVICE_PREFIX", "/map")]);
		assert_eq!(single.tenant_path_prefix(&Environ::new()), "/map/");

		let multi = resolver(&[("QWC_SERVICE_PREFIX", "/map/"), ("TENANT_HEADER", "tenant")]);
		let environ = Environ::from_pairs([("HTTP_TENANT", "org1")]);
		assert_eq!(multi.tenant_path_prefix(&environ), "/map/org1");
	}

	#[test]
	fn test_apply_tenant_prefix() {
		let resolver = resolver(&[("TENANT_HEADER", "tenant")]);
		let mut environ = Environ::from_pairs([("HTTP_TENANT", "org1"), ("SCRIPT_NAME", "/base")]);
		assert_eq!(resolver.apply_tenant_prefix(&mut environ).as_str(), "org1");
		assert_eq!(environ.get("SCRIPT_NAME"), Some("/org1/base"));

		// URL pattern tenants are already part of the path
		let resolver = url_resolver("^http://localhost/(\\w+)");
		let mut environ = Environ::from_pairs([
			("REQUEST_SCHEME", "http"),
			("HTTP_HOST", "localhost"),
			("SCRIPT_NAME", "/org1"),
		]);
		assert_eq!(resolver.apply_tenant_prefix(&mut environ).as_str(), "org1");
		assert_eq!(environ.get("SCRIPT_NAME"), Some("/org1"));
	}

	#[test]
	fn test_empty_tenant_header_keeps_script_name() {
		let resolver = resolver(&[("TENANT_HEADER", "tenant"), ("QWC_SERVICE_PREFIX", "/ows")]);
		let mut environ = Environ::from_pairs([("HTTP_TENANT", ""), ("SCRIPT_NAME", "/base")]);
		assert_eq!(resolver.apply_tenant_prefix(&mut environ).as_str(), "");
		assert_eq!(environ.get("SCRIPT_NAME"), Some("/base"));
	}

	#[test]
	fn test_invalid_tenant_names_fall_back_to_default() {
		let resolver = resolver(&[("TENANT_HEADER", "tenant"), ("QWC_SERVICE_PREFIX", "/map")]);
		for name in ["org1; Domain=evil.example", "org1,org2", "org 1"] {
			let req = request("/", &[("tenant", name)]);
			assert!(resolver.tenant(&req).is_default(), "{}", name);
			assert_eq!(resolver.tenant_path_prefix(&req), "/map/default");
		}
		assert_eq!(resolver.tenant(&request("/", &[("tenant", "org-1_a.b")])).as_str(), "org-1_a.b");

		let url = url_resolver("^http://localhost/([^/]+)/");
		let req = request("/org1;x=y/api", &[("host", "localhost")]);
		assert!(url.tenant(&req).is_default());
	}
}

// vim: ts=4
