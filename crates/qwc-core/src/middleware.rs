//! Request middlewares

use axum::{
	body::Body,
	extract::State,
	http::{HeaderValue, Request, header, response::Response},
	middleware::Next,
};
use std::sync::Arc;

use crate::extract::TenantPathPrefix;
use crate::prelude::*;
use crate::tenant::TenantResolver;

/// Resolve the tenant once and store it with its path prefix in the request extensions
pub async fn tenant_context(
	State(resolver): State<Arc<TenantResolver>>,
	mut req: Request<Body>,
	next: Next,
) -> Response<Body> {
	let tenant = resolver.tenant(&req);
	let prefix = resolver.tenant_path_prefix(&req);
	debug!("Request {} {} for tenant {}", req.method(), req.uri().path(), tenant);

	req.extensions_mut().insert(TenantPathPrefix(prefix.into_boxed_str()));
	req.extensions_mut().insert(tenant);
	next.run(req).await
}

/// Disable client side caching of responses
pub async fn no_cache(req: Request<Body>, next: Next) -> Response<Body> {
	let mut res = next.run(req).await;
	let headers = res.headers_mut();
	headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=0"));
	headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
	headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
	res
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::{Router, middleware, routing::get};
	use qwc_types::env::EnvVars;
	use tower::ServiceExt;

	use crate::config::CoreConfig;

	async fn show_tenant(tenant: Tenant, TenantPathPrefix(prefix): TenantPathPrefix) -> String {
		format!("{} {}", tenant, prefix)
	}

	async fn show_resolved_tenant(tenant: Tenant) -> String {
		tenant.to_string()
	}

	fn resolver(pairs: &[(&str, &str)]) -> Arc<TenantResolver> {
		let env = EnvVars::from_pairs(pairs.iter().copied());
		Arc::new(TenantResolver::new(&CoreConfig::from_env(&env).unwrap()))
	}

	async fn body_text(res: Response<Body>) -> String {
		let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
		String::from_utf8(bytes.to_vec()).unwrap()
	}

	#[tokio::test]
	async fn test_tenant_context() {
		let resolver = resolver(&[("TENANT_HEADER", "x-tenant"), ("QWC_SERVICE_PREFIX", "/map")]);
		let app = Router::new()
			.route("/", get(show_tenant))
			.layer(middleware::from_fn_with_state(resolver.clone(), tenant_context))
			.with_state(resolver);

		let req = Request::builder().uri("/").header("x-tenant", "org1").body(Body::empty()).unwrap();
		let res = app.clone().oneshot(req).await.unwrap();
		assert_eq!(body_text(res).await, "org1 /map/org1");

		let req = Request::builder().uri("/").body(Body::empty()).unwrap();
		let res = app.oneshot(req).await.unwrap();
		assert_eq!(body_text(res).await, "default /map/default");
	}

	#[tokio::test]
	async fn test_tenant_from_state() {
		let resolver = resolver(&[("TENANT_URL_RE", "^https?://[^/]+/(\\w+)/")]);
		let app = Router::new().nest(
			"/org2",
			Router::new().route("/api", get(show_resolved_tenant)).with_state(resolver),
		);

		let req =
			Request::builder().uri("/org2/api").header("host", "localhost").body(Body::empty()).unwrap();
		let res = app.oneshot(req).await.unwrap();
		assert_eq!(body_text(res).await, "org2");
	}

	#[tokio::test]
	async fn test_no_cache() {
		let app = Router::new()
			.route("/", get(|| async { "ok" }))
			.layer(middleware::from_fn(no_cache));

		let res = app.oneshot(Request::builder().uri("/").body(Body::empty()).unwrap()).await.unwrap();
		assert_eq!(res.headers()[header::CACHE_CONTROL], "public, max-age=0");
		assert_eq!(res.headers()[header::PRAGMA], "no-cache");
		assert_eq!(res.headers()[header::EXPIRES], "0");
		assert_eq!(body_text(res).await, "ok");
	}
}

// vim: ts=4
