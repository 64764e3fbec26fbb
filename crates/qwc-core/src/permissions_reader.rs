//! Reader for `{CONFIG_PATH}/{tenant}/permissions.json`

use serde_json::{Map, Value};
use std::path::PathBuf;

use qwc_types::permissions::ServicesPermissions;

use crate::config::{ConfigPaths, CoreConfig};
use crate::prelude::*;

#[derive(Debug, Clone)]
pub struct PermissionsReader {
	paths: ConfigPaths,
}

impl PermissionsReader {
	pub fn new(config: &CoreConfig) -> Self {
		Self { paths: config.paths.clone() }
	}

	pub fn permissions_file_path(&self, tenant: &str) -> Option<PathBuf> {
		self.paths.permissions_file_path(tenant)
	}

	/// Raw permissions document, an empty object if it cannot be read
	pub fn read_permissions(&self, tenant: &str) -> Value {
		match self.load(tenant) {
			Ok(permissions) => permissions,
			Err(err) => {
				error!("Could not load permissions for tenant {}: {}", tenant, err);
				Value::Object(Map::new())
			}
		}
	}

	/// Permissions document parsed into [`ServicesPermissions`]
	pub fn read_services_permissions(&self, tenant: &str) -> QwcResult<ServicesPermissions> {
		let permissions = self.load(tenant)?;
		Ok(serde_json::from_value(permissions)?)
	}

	fn load(&self, tenant: &str) -> QwcResult<Value> {
		let path = self
			.permissions_file_path(tenant)
			.ok_or_else(|| Error::ConfigError(format!("invalid tenant name '{}'", tenant)))?;
		info!("Reading permissions '{}'", path.display());
		let data = std::fs::read_to_string(&path)?;
		Ok(serde_json::from_str(&data)?)
	}
}


// vim: ts=4
