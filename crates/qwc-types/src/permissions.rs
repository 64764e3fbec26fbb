//! Permission document models.
//!
//! [`ServicesPermissions`] is the top level model of a tenant's
//! `permissions.json`. [`UnifiedServicesPermissions`] is the simplified
//! variant used when resource permissions are identical in all services.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;

use crate::prelude::*;

pub const SCHEMA_ID: &str = "https://github.com/qwc-services/qwc-services-core/raw/master/schemas/qwc-services-permissions.json";
pub const UNIFIED_SCHEMA_ID: &str = "https://github.com/qwc-services/qwc-services-core/raw/master/schemas/qwc-services-unified-permissions.json";

fn default_true() -> bool {
	true
}

// Common //
//********//
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct User {
	pub name: Box<str>,
	pub groups: Vec<Box<str>>,
	#[serde(default)]
	pub roles: Vec<Box<str>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Group {
	pub name: Box<str>,
	pub roles: Vec<Box<str>>,
}

// ServicesPermissions //
//*********************//
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WmsLayer {
	pub name: Box<str>,
	#[serde(default)]
	pub attributes: Vec<Box<str>>,
	#[serde(default)]
	pub info_template: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WmsService {
	pub name: Box<str>,
	/// Flat list of permitted layers and group layers
	pub layers: Vec<WmsLayer>,
	#[serde(default)]
	pub print_templates: Vec<Box<str>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WfsLayer {
	pub name: Box<str>,
	#[serde(default)]
	pub attributes: Vec<Box<str>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WfsService {
	pub name: Box<str>,
	pub layers: Vec<WfsLayer>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Dataset {
	pub name: Box<str>,
	pub attributes: Vec<Box<str>>,
	#[serde(default)]
	pub writable: bool,
	#[serde(default)]
	pub creatable: bool,
	#[serde(default = "default_true")]
	pub readable: bool,
	#[serde(default)]
	pub updatable: bool,
	#[serde(default)]
	pub deletable: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PluginData {
	pub name: Box<str>,
	pub resources: Vec<Box<str>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Permissions {
	pub wms_services: Vec<WmsService>,
	pub wfs_services: Vec<WfsService>,
	pub background_layers: Vec<Box<str>>,
	pub data_datasets: Vec<Dataset>,
	#[serde(default)]
	pub viewer_tasks: Vec<Box<str>>,
	#[serde(default)]
	pub theme_info_links: Vec<Box<str>>,
	#[serde(default)]
	pub plugin_data: Vec<PluginData>,
	#[serde(default)]
	pub dataproducts: Vec<Box<str>>,
	#[serde(default)]
	pub document_templates: Vec<Box<str>>,
	#[serde(default)]
	pub search_providers: Vec<Box<str>>,
	#[serde(default)]
	pub solr_facets: Vec<Box<str>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Role {
	pub role: Box<str>,
	pub permissions: Permissions,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServicesPermissions {
	#[serde(rename = "$schema")]
	pub schema: Option<Box<str>>,
	pub users: Vec<User>,
	pub groups: Vec<Group>,
	pub roles: Vec<Role>,
}

impl ServicesPermissions {
	pub fn role(&self, name: &str) -> Option<&Role> {
		self.roles.iter().find(|r| &*r.role == name)
	}

	/// Role names of a user, including the roles of its groups
	pub fn user_roles(&self, username: &str) -> Vec<&str> {
		let mut roles: Vec<&str> = Vec::new();
		if let Some(user) = self.users.iter().find(|u| &*u.name == username) {
			roles.extend(user.roles.iter().map(AsRef::as_ref));
			for group_name in &user.groups {
				if let Some(group) = self.groups.iter().find(|g| g.name == *group_name) {
					roles.extend(group.roles.iter().map(AsRef::as_ref));
				}
			}
		}
		roles.sort_unstable();
		roles.dedup();
		roles
	}
}

// UnifiedServicesPermissions //
//****************************//
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UnifiedUser {
	pub name: Box<str>,
	pub groups: Option<Vec<Box<str>>>,
	#[serde(default)]
	pub roles: Option<Vec<Box<str>>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UnifiedGroup {
	pub name: Box<str>,
	pub roles: Option<Vec<Box<str>>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UnifiedPermissions {
	/// Permitted resources for all services, keyed by resource name
	pub all_services: BTreeMap<Box<str>, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UnifiedRole {
	pub role: Box<str>,
	pub permissions: UnifiedPermissions,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Layer {
	pub name: Box<str>,
	/// Attributes, excluding 'geometry'
	pub attributes: Vec<Box<str>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GroupLayer {
	pub name: Box<str>,
	pub sublayers: Vec<Box<str>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Dataproduct {
	Layer(Layer),
	GroupLayer(GroupLayer),
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UnifiedServicesPermissions {
	#[serde(rename = "$schema")]
	pub schema: Option<Box<str>>,
	pub users: Vec<UnifiedUser>,
	pub groups: Vec<UnifiedGroup>,
	pub roles: Vec<UnifiedRole>,
	/// Name of WMS service and its root layer
	pub wms_name: Box<str>,
	pub wfs_name: Box<str>,
	pub dataproducts: Vec<Dataproduct>,
	/// Resource names with no restrictions (internal print layers, background layers, ...)
	pub common_resources: Vec<Box<str>>,
}

impl UnifiedServicesPermissions {
	/// Parse and validate a unified permissions document
	pub fn from_value(value: serde_json::Value) -> QwcResult<Self> {
		let permissions: Self = serde_json::from_value(value)?;
		permissions.validate()?;
		Ok(permissions)
	}

	/// `writable` is a resource permission flag, not a resource name
	pub fn validate(&self) -> QwcResult<()> {
		for role in &self.roles {
			if let Some(value) = role.permissions.all_services.get("writable") {
				return Err(Error::ValidationError(format!(
					"role '{}': invalid resource name 'writable' in all_services ({})",
					role.role, value
				)));
			}
		}
		Ok(())
	}
}


// vim: ts=4
