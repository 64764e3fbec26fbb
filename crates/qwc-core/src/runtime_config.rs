//! Per-tenant service configuration
//!
//! Service configs live in `{CONFIG_PATH}/{tenant}/{service}Config.json`:
//!
//! ```json
//! {
//!   "$schema": "...",
//!   "service": "search",
//!   "config": { "search_backend": "solr", "search_result_limit": 50 },
//!   "resources": { ... }
//! }
//! ```
//!
//! `$$NAME$$` placeholders in the file are replaced with environment values
//! before parsing. Single `config` values can be overridden by an
//! environment variable with the upper-cased name.

use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::path::PathBuf;
use std::sync::Arc;

use qwc_types::env::EnvVars;
use qwc_types::utils::str_to_bool;

use crate::config::{ConfigPaths, CoreConfig};
use crate::prelude::*;

const ENV_PLACEHOLDER_RE: &str = r"\$\$(\w+)\$\$";

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
	service: Box<str>,
	paths: ConfigPaths,
	env: Arc<EnvVars>,
	config: Value,
}

impl RuntimeConfig {
	pub fn new(service: &str, config: &CoreConfig) -> Self {
		Self {
			service: Box::from(service),
			paths: config.paths.clone(),
			env: config.env.clone(),
			config: Value::Object(Map::new()),
		}
	}

	pub fn service(&self) -> &str {
		&self.service
	}

	/// Parsed config document, an empty object if none was read
	pub fn config(&self) -> &Value {
		&self.config
	}

	pub fn set_config(&mut self, config: Value) {
		self.config = config;
	}

	pub fn config_file_path(&self, tenant: &str) -> Option<PathBuf> {
		self.paths.config_file_path(&self.service, tenant)
	}

	/// Read the tenant's service config.
	///
	/// Errors are logged and leave an empty config behind.
	pub fn read_config(&mut self, tenant: &str) -> &mut Self {
		self.config = match self.load(tenant) {
			Ok(config) => config,
			Err(err) => {
				error!("Could not load {} runtime config for tenant {}: {}", self.service, tenant, err);
				Value::Object(Map::new())
			}
		};
		self
	}

	fn load(&self, tenant: &str) -> QwcResult<Value> {
		let Some(path) = self.config_file_path(tenant) else {
			return Err(Error::ConfigError(format!("invalid tenant name '{}'", tenant)));
		};
		info!("Reading runtime config '{}'", path.display());

		let data = std::fs::read_to_string(&path)?;
		let data = substitute_env(&data, &self.env)?;
		Ok(serde_json::from_str(&data)?)
	}

	/// Config value, optionally overridden by the env var `NAME`
	pub fn get(&self, name: &str) -> Option<Value> {
		self.with_env_override(name, self.config_value(name).cloned())
	}

	/// Config value or `default`, optionally overridden by the env var `NAME`
	pub fn get_or(&self, name: &str, default: Value) -> Value {
		let value = self.config_value(name).cloned().unwrap_or(default);
		self.with_env_override(name, Some(value)).unwrap_or(Value::Null)
	}

	/// Config value deserialized into `T`
	pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> QwcResult<Option<T>> {
		self.get(name).map(serde_json::from_value).transpose().map_err(Error::from)
	}

	pub fn resources(&self) -> Option<&Value> {
		self.config.get("resources")
	}

	pub fn resource(&self, name: &str) -> Option<&Value> {
		self.resources()?.get(name)
	}

	fn config_value(&self, name: &str) -> Option<&Value> {
		self.config.get("config")?.get(name)
	}

	fn with_env_override(&self, name: &str, value: Option<Value>) -> Option<Value> {
		let env_name = name.to_uppercase();
		let Some(env_value) = self.env.get(&env_name) else {
			return value;
		};

		match convert_env_value(env_value, value.as_ref()) {
			Ok(converted) => Some(converted),
			Err(err) => {
				warn!(
					"Could not convert config override from env '{}={}' to {}: {}",
					env_name,
					env_value,
					value.as_ref().map_or("null", value_type),
					err
				);
				value
			}
		}
	}
}

/// Replace `$$NAME$$` with the env value, unset variables become empty
fn substitute_env(data: &str, env: &EnvVars) -> QwcResult<String> {
	let re = Regex::new(ENV_PLACEHOLDER_RE)?;
	Ok(re.replace_all(data, |caps: &Captures| env.get(&caps[1]).unwrap_or("").to_string()).into_owned())
}

/// Convert an env override to the type of the value it replaces
fn convert_env_value(env_value: &str, current: Option<&Value>) -> QwcResult<Value> {
	match current {
		None | Some(Value::Null | Value::String(_)) => Ok(Value::String(env_value.to_string())),
		Some(Value::Array(_) | Value::Object(_)) => Ok(serde_json::from_str(env_value)?),
		Some(Value::Bool(_)) => str_to_bool(env_value).map(Value::Bool).ok_or_else(|| {
			Error::ValidationError(format!("unknown boolean value '{}'", env_value))
		}),
		Some(Value::Number(n)) if n.is_f64() => env_value
			.trim()
			.parse::<f64>()
			.ok()
			.and_then(Number::from_f64)
			.map(Value::Number)
			.ok_or_else(|| Error::ValidationError(format!("invalid float '{}'", env_value))),
		Some(Value::Number(_)) => env_value
			.trim()
			.parse::<i64>()
			.map(Value::from)
			.map_err(|err| Error::ValidationError(format!("invalid integer '{}': {}", env_value, err))),
	}
}

fn value_type(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "bool",
		Value::Number(n) if n.is_f64() => "float",
		Value::Number(_) => "int",
		Value::String(_) => "str",
		Value::Array(_) => "list",
		Value::Object(_) => "dict",
	}
}


// vim: ts=4
