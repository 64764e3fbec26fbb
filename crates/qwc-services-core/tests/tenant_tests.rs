//! Tenant resolution, tenant config files and the handler registry

mod common;

use axum::http::Request;
use serde_json::json;
use std::sync::Arc;

use common::{ConfigDir, set_modified, timestamp};
use qwc_services_core::clock::ManualClock;
use qwc_services_core::config::CoreConfig;
use qwc_services_core::env::EnvVars;
use qwc_services_core::permissions::ServicesPermissions;
use qwc_services_core::permissions_reader::PermissionsReader;
use qwc_services_core::prelude::*;
use qwc_services_core::runtime_config::RuntimeConfig;
use qwc_services_core::tenant::{Environ, TenantResolver};
use qwc_services_core::tenant_handler::TenantHandler;

fn resolver(pairs: &[(&str, &str)]) -> TenantResolver {
	TenantResolver::new(&CoreConfig::from_env(&EnvVars::from_pairs(pairs.iter().copied())).unwrap())
}

fn request(uri: &str, headers: &[(&str, &str)]) -> Request<()> {
	let mut req = Request::builder().uri(uri);
	for (name, value) in headers {
		req = req.header(*name, *value);
	}
	req.body(()).unwrap()
}

#[test]
fn test_tenant_precedence() {
	let all = resolver(&[
		("QWC_TENANT", "fixed"),
		("TENANT_HEADER", "x-tenant"),
		("TENANT_URL_RE", "^http://localhost/(\\w+)/"),
	]);
	let req = request("/org1/api", &[("host", "localhost"), ("x-tenant", "org2")]);
	assert_eq!(all.tenant(&req).as_str(), "fixed");

	let header = resolver(&[("TENANT_HEADER", "x-tenant"), ("TENANT_URL_RE", "^http://localhost/(\\w+)/")]);
	assert_eq!(header.tenant(&req).as_str(), "org2");
	assert_eq!(header.tenant(&request("/org1/api", &[("host", "localhost")])).as_str(), "default");

	let url = resolver(&[("TENANT_URL_RE", "^http://localhost/(\\w+)/")]);
	assert_eq!(url.tenant(&req).as_str(), "org1");
	assert_eq!(url.tenant(&request("/", &[("host", "localhost")])).as_str(), "default");

	let single = resolver(&[]);
	assert!(!single.is_multi());
	assert!(single.tenant(&req).is_default());
}

#[test]
fn test_environ_prefix_injection() {
	let resolver = resolver(&[("TENANT_HEADER", "tenant"), ("QWC_SERVICE_PREFIX", "/ows")]);
	let mut environ = Environ::from_pairs([
		("HTTP_TENANT", "org1"),
		("SCRIPT_NAME", ""),
		("PATH_INFO", "/pages/test.html"),
	]);
	let tenant = resolver.apply_tenant_prefix(&mut environ);
	assert_eq!(tenant.as_str(), "org1");
	assert_eq!(environ.get("SCRIPT_NAME"), Some("/ows/org1"));
	assert_eq!(resolver.tenant_path_prefix(&environ), "/ows/org1");
}

struct SearchHandler {
	backend: String,
	limit: u64,
}

impl SearchHandler {
	fn new(config: &RuntimeConfig) -> QwcResult<Self> {
		let backend = config
			.get("search_backend")
			.and_then(|v| v.as_str().map(str::to_string))
			.ok_or_else(|| Error::ConfigError("search_backend missing".into()))?;
		let limit = config.get_or("search_result_limit", json!(50)).as_u64().unwrap_or(50);
		Ok(Self { backend, limit })
	}
}

#[test]
fn test_handler_rebuilt_after_config_change() {
	let dir = ConfigDir::new();
	let config_file = dir.write_service_config(
		"org1",
		"search",
		&json!({"service": "search", "config": {"search_backend": "solr"}}),
	);
	set_modified(&config_file, 900);
	let env = dir.env(&[("TENANT_HEADER", "tenant"), ("SEARCH_RESULT_LIMIT", "20")]);
	let core = CoreConfig::from_env(&env).unwrap();

	let clock = Arc::new(ManualClock::new(timestamp(1_000)));
	let handlers = TenantHandler::with_clock(&core, clock.clone());
	let build = |tenant: &str| {
		let mut config = RuntimeConfig::new("search", &core);
		config.read_config(tenant);
		SearchHandler::new(&config)
	};

	let tenant = handlers.tenant(&request("/", &[("tenant", "org1")]));
	assert_eq!(tenant.as_str(), "org1");
	let handler = handlers.handler_or_register("search", "search", tenant.as_str(), || build("org1")).unwrap();
	assert_eq!(handler.backend, "solr");
	assert_eq!(handler.limit, 20);

	// Unchanged config: same instance
	let cached = handlers.handler::<SearchHandler>("search", "search", "org1").unwrap().unwrap();
	assert!(Arc::ptr_eq(&handler, &cached));

	// Config updated after registration
	dir.write_service_config(
		"org1",
		"search",
		&json!({"service": "search", "config": {"search_backend": "trgm"}}),
	);
	set_modified(&config_file, 1_500);
	clock.set(timestamp(2_000));
	assert!(handlers.handler::<SearchHandler>("search", "search", "org1").unwrap().is_none());

	let rebuilt = handlers.handler_or_register("search", "search", "org1", || build("org1")).unwrap();
	assert_eq!(rebuilt.backend, "trgm");
	assert!(handlers.handler::<SearchHandler>("search", "search", "org1").unwrap().is_some());
}

#[test]
fn test_permissions_change_invalidates_handlers() {
	let dir = ConfigDir::new();
	let config_file = dir.write_service_config("org1", "data", &json!({"config": {}}));
	let permissions_file = dir.write_permissions("org1", &json!({"users": [], "groups": [], "roles": []}));
	set_modified(&config_file, 100);
	set_modified(&permissions_file, 200);
	let core = CoreConfig::from_env(&dir.env(&[])).unwrap();

	let clock = Arc::new(ManualClock::new(timestamp(1_000)));
	let handlers = TenantHandler::with_clock(&core, clock);
	let reader = PermissionsReader::new(&core);

	let permissions = handlers
		.handler_or_register("data", "permissions", "org1", || reader.read_services_permissions("org1"))
		.unwrap();
	assert!(permissions.users.is_empty());
	assert_eq!(handlers.last_config_update("data", "org1").unwrap(), Some(timestamp(200)));

	set_modified(&permissions_file, 1_000);
	assert_eq!(handlers.last_config_update("data", "org1").unwrap(), Some(timestamp(1_000)));
	let cached = handlers.handler::<ServicesPermissions>("data", "permissions", "org1").unwrap();
	assert!(cached.is_none());
}

#[test]
fn test_failed_build_registers_nothing() {
	let dir = ConfigDir::new();
	let config_file = dir.write_service_config("org1", "search", &json!({"config": {}}));
	set_modified(&config_file, 100);
	let core = CoreConfig::from_env(&dir.env(&[])).unwrap();
	let handlers = TenantHandler::new(&core);

	let res = handlers.handler_or_register("search", "search", "org1", || {
		let mut config = RuntimeConfig::new("search", &core);
		config.read_config("org1");
		SearchHandler::new(&config)
	});
	assert!(matches!(res, Err(Error::ConfigError(_))));
	assert!(handlers.handler::<SearchHandler>("search", "search", "org1").unwrap().is_none());
}

// vim: ts=4
