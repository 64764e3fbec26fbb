//! Common types used throughout the QWC service crates.

use serde::{Deserialize, Serialize};

/// Tenant used when no tenant could be determined (single-tenant mode)
pub const DEFAULT_TENANT: &str = "default";

/// User name used for cache entries of unauthenticated callers
pub const PUBLIC_USER: &str = "_public_";

// Tenant //
//********//
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tenant(pub Box<str>);

impl Tenant {
	pub fn new(name: &str) -> Tenant {
		Tenant(Box::from(name))
	}

	pub fn default_tenant() -> Tenant {
		Tenant::new(DEFAULT_TENANT)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn is_default(&self) -> bool {
		&*self.0 == DEFAULT_TENANT
	}
}

impl Default for Tenant {
	fn default() -> Self {
		Tenant::default_tenant()
	}
}

impl std::fmt::Display for Tenant {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl AsRef<str> for Tenant {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl From<&str> for Tenant {
	fn from(name: &str) -> Self {
		Tenant::new(name)
	}
}

// Identity //
//**********//
/// Authenticated caller
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Identity {
	#[default]
	Anonymous,
	Named(Box<str>),
	NamedWithGroup {
		username: Box<str>,
		group: Box<str>,
	},
}

impl Identity {
	pub fn named(username: &str) -> Identity {
		Identity::Named(Box::from(username))
	}

	pub fn with_group(username: &str, group: &str) -> Identity {
		Identity::NamedWithGroup { username: Box::from(username), group: Box::from(group) }
	}

	pub fn username(&self) -> Option<&str> {
		match self {
			Identity::Anonymous => None,
			Identity::Named(username) | Identity::NamedWithGroup { username, .. } => {
				Some(username)
			}
		}
	}

	pub fn group(&self) -> Option<&str> {
		match self {
			Identity::NamedWithGroup { group, .. } => Some(group),
			_ => None,
		}
	}

	pub fn is_anonymous(&self) -> bool {
		matches!(self, Identity::Anonymous)
	}
}

impl From<&str> for Identity {
	fn from(username: &str) -> Self {
		Identity::named(username)
	}
}

impl From<Option<&str>> for Identity {
	fn from(username: Option<&str>) -> Self {
		username.map_or(Identity::Anonymous, Identity::named)
	}
}


// vim: ts=4
