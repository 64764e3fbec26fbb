//! Service configuration read once at startup.
//!
//! [`CoreConfig`] replaces ad-hoc environment lookups: it is built from an
//! [`EnvVars`] snapshot when the service starts and passed to the
//! constructors of the tenant resolver, the handler registry and the
//! config readers.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use qwc_types::env::EnvVars;
use qwc_types::utils::safe_join;

use crate::prelude::*;

pub const ENV_TENANT: &str = "QWC_TENANT";
pub const ENV_TENANT_HEADER: &str = "TENANT_HEADER";
pub const ENV_TENANT_URL_RE: &str = "TENANT_URL_RE";
pub const ENV_CONFIG_PATH: &str = "CONFIG_PATH";
pub const ENV_SERVICE_PREFIX: &str = "QWC_SERVICE_PREFIX";

pub const DEFAULT_CONFIG_PATH: &str = "config";
pub const PERMISSIONS_FILE: &str = "permissions.json";

/// Tenant resolution strategies, at most one of them is used per request
#[derive(Debug, Clone, Default)]
pub struct TenantConfig {
	/// Fixed tenant name (`QWC_TENANT`)
	pub name: Option<Box<str>>,
	/// Request header carrying the tenant name (`TENANT_HEADER`)
	pub header: Option<Box<str>>,
	/// Pattern matched against the request URL, capture group 1 is the tenant (`TENANT_URL_RE`)
	pub url_re: Option<Regex>,
}

impl TenantConfig {
	pub fn from_env(env: &EnvVars) -> QwcResult<Self> {
		let url_re = match env.get_nonempty(ENV_TENANT_URL_RE) {
			Some(pattern) => Some(Regex::new(pattern).map_err(|err| {
				Error::ConfigError(format!("invalid {} '{}': {}", ENV_TENANT_URL_RE, pattern, err))
			})?),
			None => None,
		};

		Ok(Self {
			name: env.get_nonempty(ENV_TENANT).map(Box::from),
			header: env.get_nonempty(ENV_TENANT_HEADER).map(Box::from),
			url_re,
		})
	}
}

/// Locations of the per-tenant config and permission files
#[derive(Debug, Clone)]
pub struct ConfigPaths {
	config_path: Box<Path>,
}

impl ConfigPaths {
	pub fn new(config_path: impl AsRef<Path>) -> Self {
		Self { config_path: config_path.as_ref().into() }
	}

	pub fn config_path(&self) -> &Path {
		&self.config_path
	}

	/// `{CONFIG_PATH}/{tenant}/{service}Config.json`
	pub fn config_file_path(&self, service: &str, tenant: &str) -> Option<PathBuf> {
		let filename = format!("{}Config.json", service);
		safe_join(&self.config_path, &[tenant, &filename])
	}

	/// `{CONFIG_PATH}/{tenant}/permissions.json`
	pub fn permissions_file_path(&self, tenant: &str) -> Option<PathBuf> {
		safe_join(&self.config_path, &[tenant, PERMISSIONS_FILE])
	}
}

impl Default for ConfigPaths {
	fn default() -> Self {
		Self::new(DEFAULT_CONFIG_PATH)
	}
}

#[derive(Debug, Clone)]
pub struct CoreConfig {
	pub tenant: TenantConfig,
	pub paths: ConfigPaths,
	/// URL mount prefix, always ending with a single `/`
	pub service_prefix: Box<str>,
	/// Environment snapshot for config value overrides
	pub env: Arc<EnvVars>,
}

impl CoreConfig {
	pub fn from_env(env: &EnvVars) -> QwcResult<Self> {
		let config = Self {
			tenant: TenantConfig::from_env(env)?,
			paths: ConfigPaths::new(env.get_or(ENV_CONFIG_PATH, DEFAULT_CONFIG_PATH)),
			service_prefix: normalize_prefix(env.get_or(ENV_SERVICE_PREFIX, "/")),
			env: Arc::new(env.clone()),
		};
		debug!(
			"Core config: tenant={:?} header={:?} url_re={:?} config_path={} prefix={}",
			config.tenant.name,
			config.tenant.header,
			config.tenant.url_re.as_ref().map(Regex::as_str),
			config.paths.config_path().display(),
			config.service_prefix
		);
		Ok(config)
	}

	pub fn from_process_env() -> QwcResult<Self> {
		Self::from_env(&EnvVars::from_process())
	}
}

impl Default for CoreConfig {
	fn default() -> Self {
		Self {
			tenant: TenantConfig::default(),
			paths: ConfigPaths::default(),
			service_prefix: Box::from("/"),
			env: Arc::new(EnvVars::default()),
		}
	}
}

/// Strip trailing slashes and append exactly one
fn normalize_prefix(prefix: &str) -> Box<str> {
	format!("{}/", prefix.trim_end_matches('/')).into_boxed_str()
}


// vim: ts=4
