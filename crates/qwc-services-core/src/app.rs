//! Shared state of a QWC service
//!
//! [`AppState`] bundles the components every service needs, built once from
//! the environment at startup:
//!
//! ```ignore
//! let app = AppState::from_env("search", &EnvVars::from_process())?;
//! let router = with_service_layers(&app, Router::new().route("/", get(search)))
//!     .with_state(app);
//! ```

use axum::{Router, http::request::Parts, middleware};
use std::sync::Arc;

use qwc_auth::{AuthConfig, GroupNameMapper, JwtManager, optional_auth};
use qwc_core::middleware::{no_cache, tenant_context};
use qwc_core::{
	CoreConfig, DatabaseEngine, PermissionsReader, RuntimeConfig, TenantHandler, TenantResolver,
	TenantResolverState, TenantSource,
};
use qwc_types::env::EnvVars;

use crate::prelude::*;

pub type App = Arc<AppState>;

pub struct AppState {
	pub service: Box<str>,
	pub config: CoreConfig,
	pub resolver: Arc<TenantResolver>,
	pub handlers: TenantHandler,
	pub permissions: PermissionsReader,
	pub jwt: Arc<JwtManager>,
	pub group_mapper: GroupNameMapper,
	pub db: DatabaseEngine,
}

impl AppState {
	pub fn new(service: &str, config: CoreConfig, auth: AuthConfig) -> QwcResult<App> {
		let group_mapper = GroupNameMapper::from_config(&auth)?;
		let resolver = Arc::new(TenantResolver::new(&config));
		info!(
			"Starting {} service ({} tenant mode)",
			service,
			if resolver.is_multi() { "multi" } else { "single" }
		);

		Ok(Arc::new(AppState {
			service: Box::from(service),
			resolver,
			handlers: TenantHandler::new(&config),
			permissions: PermissionsReader::new(&config),
			jwt: Arc::new(JwtManager::new(auth)),
			group_mapper,
			db: DatabaseEngine::new(&config),
			config,
		}))
	}

	pub fn from_env(service: &str, env: &EnvVars) -> QwcResult<App> {
		Self::new(service, CoreConfig::from_env(env)?, AuthConfig::from_env(env)?)
	}

	/// Service config of a tenant, read from disk
	pub fn runtime_config(&self, tenant: &str) -> RuntimeConfig {
		let mut config = RuntimeConfig::new(&self.service, &self.config);
		config.read_config(tenant);
		config
	}

	/// Up to date tenant handler of this service, built with `build` if missing or outdated
	pub fn tenant_handler<H, F>(&self, handler_name: &str, tenant: &str, build: F) -> QwcResult<Arc<H>>
	where
		H: Send + Sync + 'static,
		F: FnOnce() -> QwcResult<H>,
	{
		self.handlers.handler_or_register(&self.service, handler_name, tenant, build)
	}

	/// `Set-Cookie` value for an access token, scoped to the tenant's path prefix
	pub fn access_cookie<S: TenantSource + ?Sized>(&self, token: &str, source: &S) -> String {
		self.jwt.access_cookie(token, &self.resolver.tenant_path_prefix(source))
	}
}

impl TenantResolverState for AppState {
	fn resolve_tenant(&self, parts: &Parts) -> Tenant {
		self.resolver.tenant(parts)
	}
}

impl std::fmt::Debug for AppState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AppState")
			.field("service", &self.service)
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

/// Add the request layers every service uses: tenant context, optional auth and no-cache headers
pub fn with_service_layers<S>(app: &App, router: Router<S>) -> Router<S>
where
	S: Clone + Send + Sync + 'static,
{
	router
		.layer(middleware::from_fn(no_cache))
		.layer(middleware::from_fn_with_state(app.jwt.clone(), optional_auth))
		.layer(middleware::from_fn_with_state(app.resolver.clone(), tenant_context))
}

/// Install a `tracing` subscriber configured by `RUST_LOG`
pub fn init_logging() {
	let res = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_target(false)
		.try_init();
	if res.is_err() {
		debug!("Logging already initialized");
	}
}

// vim: ts=4
