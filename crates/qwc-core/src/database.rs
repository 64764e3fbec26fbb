//! Database connection pools
//!
//! Pools are created lazily (no connection is opened before the first
//! query) and shared per connection string.
//!
//! The default `GEODB_URL`/`CONFIGDB_URL` values name libpq services, which
//! sqlx cannot resolve. Deployments set both variables to full URLs.

use parking_lot::Mutex;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;
use std::sync::Arc;

use qwc_types::env::EnvVars;

use crate::config::CoreConfig;
use crate::prelude::*;

pub const ENV_GEODB_URL: &str = "GEODB_URL";
pub const ENV_CONFIGDB_URL: &str = "CONFIGDB_URL";
pub const DEFAULT_GEODB_URL: &str = "postgresql:///?service=qwc_geodb";
pub const DEFAULT_CONFIGDB_URL: &str = "postgresql:///?service=qwc_configdb";

pub struct DatabaseEngine {
	env: Arc<EnvVars>,
	engines: Mutex<HashMap<Box<str>, PgPool>>,
}

impl DatabaseEngine {
	pub fn new(config: &CoreConfig) -> Self {
		Self { env: config.env.clone(), engines: Mutex::new(HashMap::new()) }
	}

	/// Pool for the connection string, created on first use.
	///
	/// Must be called from within a Tokio runtime.
	pub fn db_engine(&self, conn_str: &str) -> QwcResult<PgPool> {
		let mut engines = self.engines.lock();
		if let Some(pool) = engines.get(conn_str) {
			return Ok(pool.clone());
		}
		if uses_service_name(conn_str) {
			return Err(Error::ConfigError(format!(
				"connection service names are not supported, set a full URL instead of {}",
				conn_str
			)));
		}

		let pool = PgPoolOptions::new()
			.test_before_acquire(true)
			.connect_lazy(conn_str)
			.inspect_err(|err| error!("Invalid database connection string: {}", err))?;
		debug!("Created database pool for {}", redact_password(conn_str));
		engines.insert(Box::from(conn_str), pool.clone());
		Ok(pool)
	}

	/// Pool for the connection string in env var `env_name`
	pub fn db_engine_env(&self, env_name: &str, default: Option<&str>) -> QwcResult<PgPool> {
		let Some(conn_str) = self.env.get(env_name).or(default) else {
			return Err(Error::ConfigError(format!("environment variable {} not set", env_name)));
		};
		self.db_engine(conn_str)
	}

	/// Pool for the default GeoDB
	pub fn geo_db(&self) -> QwcResult<PgPool> {
		self.db_engine_env(ENV_GEODB_URL, Some(DEFAULT_GEODB_URL))
	}

	/// Pool for the default ConfigDB
	pub fn config_db(&self) -> QwcResult<PgPool> {
		self.db_engine_env(ENV_CONFIGDB_URL, Some(DEFAULT_CONFIGDB_URL))
	}

	/// Number of pools created so far
	pub fn len(&self) -> usize {
		self.engines.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.engines.lock().is_empty()
	}
}

impl std::fmt::Debug for DatabaseEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DatabaseEngine").field("engines", &self.len()).finish()
	}
}

/// `?service=` names are resolved through pg_service.conf by libpq only
fn uses_service_name(conn_str: &str) -> bool {
	conn_str.split_once('?').is_some_and(|(_, query)| {
		serde_urlencoded::from_str::<Vec<(String, String)>>(query)
			.is_ok_and(|params| params.iter().any(|(key, _)| key == "service"))
	})
}

/// Connection string with the password replaced, for logging
fn redact_password(conn_str: &str) -> String {
	let Some((scheme, rest)) = conn_str.split_once("://") else {
		return conn_str.to_string();
	};
	let authority_end = rest.find('/').unwrap_or(rest.len());
	let (authority, path) = rest.split_at(authority_end);
	match authority.rsplit_once('@') {
		Some((userinfo, host)) => match userinfo.split_once(':') {
			Some((user, _)) => format!("{}://{}:***@{}{}", scheme, user, host, path),
			None => conn_str.to_string(),
		},
		None => conn_str.to_string(),
	}
}


// vim: ts=4
