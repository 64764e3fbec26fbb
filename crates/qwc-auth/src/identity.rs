//! Caller identities carried in access tokens
//!
//! The `identity` claim is either a bare username or a record with the
//! username and its groups:
//!
//! ```json
//! "alice"
//! {"username": "alice", "group": "eng", "groups": ["gis", "admins"]}
//! ```

use axum::http::{HeaderMap, header};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::config::AuthConfig;
use crate::prelude::*;

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct IdentityRecord {
	pub username: Option<Box<str>>,
	pub group: Option<Box<str>>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub groups: Vec<Box<str>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AuthIdentity {
	Username(Box<str>),
	Record(IdentityRecord),
}

impl AuthIdentity {
	pub fn username(&self) -> Option<&str> {
		let username = match self {
			AuthIdentity::Username(username) => Some(&**username),
			AuthIdentity::Record(record) => record.username.as_deref(),
		};
		username.filter(|username| !username.is_empty())
	}

	/// Group list plus the single group, if any
	pub fn groups(&self) -> Vec<&str> {
		match self {
			AuthIdentity::Username(_) => Vec::new(),
			AuthIdentity::Record(record) => record
				.groups
				.iter()
				.map(|group| &**group)
				.chain(record.group.as_deref().filter(|g| !g.is_empty()))
				.collect(),
		}
	}

	/// Identity used as cache scope
	pub fn to_identity(&self) -> Identity {
		let Some(username) = self.username() else {
			return Identity::Anonymous;
		};
		match self {
			AuthIdentity::Record(IdentityRecord { group: Some(group), .. }) if !group.is_empty() => {
				Identity::with_group(username, group)
			}
			_ => Identity::named(username),
		}
	}
}

impl From<&str> for AuthIdentity {
	fn from(username: &str) -> Self {
		AuthIdentity::Username(Box::from(username))
	}
}

impl From<&AuthIdentity> for Identity {
	fn from(identity: &AuthIdentity) -> Self {
		identity.to_identity()
	}
}

pub fn get_username(identity: Option<&AuthIdentity>) -> Option<&str> {
	identity?.username()
}

pub fn get_groups(identity: Option<&AuthIdentity>) -> Vec<&str> {
	identity.map(AuthIdentity::groups).unwrap_or_default()
}

/// Token identity, or the user of a pre-authenticated Basic auth header if allowed
pub fn auth_user(
	identity: Option<AuthIdentity>,
	headers: &HeaderMap,
	config: &AuthConfig,
) -> Option<AuthIdentity> {
	if identity.is_some() || !config.allow_basic_auth_user {
		return identity;
	}
	basic_auth_username(headers).map(|username| AuthIdentity::Username(username.into()))
}

/// Username of a Basic auth header. The password is not checked.
fn basic_auth_username(headers: &HeaderMap) -> Option<String> {
	let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
	let (scheme, encoded) = value.split_once(' ')?;
	if !scheme.eq_ignore_ascii_case("basic") {
		return None;
	}
	let decoded = STANDARD.decode(encoded.trim()).ok()?;
	let credentials = String::from_utf8(decoded).ok()?;
	let (username, _password) = credentials.split_once(':')?;
	Some(username.to_string())
}


// vim: ts=4
