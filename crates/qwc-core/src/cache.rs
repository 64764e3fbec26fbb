//! Time-aware caches
//!
//! [`ExpiringDict`] is a flat map whose entries expire after a per-entry
//! duration. Expired entries are removed lazily, when they are looked up.
//!
//! [`Cache`] nests expiring dicts under a path built from the service name,
//! the caller identity and caller supplied keys:
//!
//! ```text
//! service
//! └── group (None for identities without group)
//!     └── user ("_public_" for anonymous callers)
//!         └── key
//!             └── ...
//!                 └── key: ExpiringDict  ──  last key: ExpiringEntry
//! ```

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, expiry_after, system_clock};
use crate::prelude::*;

/// Cache duration used when the caller does not pass one
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(300);

// ExpiringDict //
//**************//
/// Cached value with its expiry time
#[derive(Debug, Clone)]
pub struct ExpiringEntry<T> {
	pub value: T,
	pub expires: DateTime<Utc>,
}

impl<T> ExpiringEntry<T> {
	pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
		now >= self.expires
	}
}

/// Map of values where each key expires after some time.
///
/// Values are moved in on [`ExpiringDict::set`] and cloned out on
/// [`ExpiringDict::lookup`], so callers never share cached state.
pub struct ExpiringDict<T> {
	entries: Mutex<HashMap<Box<str>, ExpiringEntry<T>>>,
	clock: Arc<dyn Clock>,
}

impl<T: Clone> ExpiringDict<T> {
	pub fn new() -> Self {
		Self::with_clock(system_clock())
	}

	pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
		Self { entries: Mutex::new(HashMap::new()), clock }
	}

	/// Store value under key for [`DEFAULT_CACHE_DURATION`]
	pub fn set(&self, key: &str, value: T) {
		self.set_with_duration(key, value, DEFAULT_CACHE_DURATION);
	}

	/// Store value under key until `duration` has elapsed, replacing any previous entry
	pub fn set_with_duration(&self, key: &str, value: T, duration: Duration) {
		let expires = expiry_after(self.clock.now(), duration);
		self.entries.lock().insert(Box::from(key), ExpiringEntry { value, expires });
	}

	/// Return a copy of the value, or `None` if not present or expired.
	///
	/// An expired entry is removed from the map.
	pub fn lookup(&self, key: &str) -> Option<T> {
		let now = self.clock.now();
		let mut entries = self.entries.lock();

		match entries.get(key) {
			Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
			Some(_) => {
				entries.remove(key);
				None
			}
			None => None,
		}
	}

	/// Number of stored entries, including expired ones not yet looked up
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}

impl<T: Clone> Default for ExpiringDict<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> std::fmt::Debug for ExpiringDict<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ExpiringDict").field("len", &self.entries.lock().len()).finish()
	}
}

// Cache //
//*******//
/// Path segment inside the cache tree. Only the group level can be `None`.
type Segment = Option<Box<str>>;

enum Node<T> {
	Branch(HashMap<Segment, Node<T>>),
	Leaf(Arc<ExpiringDict<T>>),
}

impl<T> Node<T> {
	fn branch() -> Self {
		Node::Branch(HashMap::new())
	}
}

/// Nested cache for values scoped by service, identity and keys
pub struct Cache<T> {
	root: Mutex<Node<T>>,
	clock: Arc<dyn Clock>,
}

impl<T: Clone> Cache<T> {
	pub fn new() -> Self {
		Self::with_clock(system_clock())
	}

	pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
		Self { root: Mutex::new(Node::branch()), clock }
	}

	/// (Re-)initialize the cache, dropping all entries
	pub fn init(&self) {
		*self.root.lock() = Node::branch();
	}

	/// Group and user cache keys of an identity
	pub fn identity_keys(identity: &Identity) -> (Option<&str>, &str) {
		match identity {
			Identity::Anonymous => (None, PUBLIC_USER),
			Identity::Named(username) => (None, username),
			Identity::NamedWithGroup { username, group } => (Some(group), username),
		}
	}

	/// Locate the expiring dict and the key inside it for service, identity and keys.
	///
	/// Levels are created on demand. `keys` must not be empty, and a prefix
	/// must always be used with the same number of keys.
	pub fn cache_entry(
		&self,
		service: &str,
		identity: &Identity,
		keys: &[&str],
	) -> QwcResult<(Arc<ExpiringDict<T>>, Box<str>)> {
		let Some((last_key, keys)) = keys.split_last() else {
			return Err(Error::InvalidCacheKey(format!("no keys for service '{}'", service)));
		};
		let (group, user) = Self::identity_keys(identity);

		let mut path: Vec<Option<&str>> = Vec::with_capacity(keys.len() + 3);
		path.push(Some(service));
		path.push(group);
		path.push(Some(user));
		path.extend(keys.iter().map(|k| Some(*k)));

		// The last path segment holds the ExpiringDict, the ones before are branches
		let Some((dict_key, branch_keys)) = path.split_last() else {
			return Err(Error::InvalidCacheKey(format!("empty path for service '{}'", service)));
		};

		let mut root = self.root.lock();
		let mut node = &mut *root;
		for segment in branch_keys {
			node = match node {
				Node::Branch(children) => {
					children.entry(segment.map(Box::from)).or_insert_with(Node::branch)
				}
				Node::Leaf(_) => {
					return Err(Error::InvalidCacheKey(format!(
						"'{}' is below a cache leaf",
						segment.unwrap_or_default()
					)));
				}
			};
		}

		let Node::Branch(children) = node else {
			return Err(Error::InvalidCacheKey(format!(
				"'{}' is a cache leaf, not a level",
				dict_key.unwrap_or_default()
			)));
		};
		let leaf = children
			.entry(dict_key.map(Box::from))
			.or_insert_with(|| Node::Leaf(Arc::new(ExpiringDict::with_clock(self.clock.clone()))));

		match leaf {
			Node::Leaf(dict) => Ok((dict.clone(), Box::from(*last_key))),
			Node::Branch(_) => Err(Error::InvalidCacheKey(format!(
				"'{}' is a cache level, not a leaf",
				dict_key.unwrap_or_default()
			))),
		}
	}

	/// Read value from cache. Returns `None` if not present or expired.
	pub fn read(&self, service: &str, identity: &Identity, keys: &[&str]) -> QwcResult<Option<T>> {
		let (dict, key) = self.cache_entry(service, identity, keys)?;
		let value = dict.lookup(&key);
		if value.is_some() {
			debug!("Reading {} data from cache with key '{}'", service, key);
		}
		Ok(value)
	}

	/// Write value into cache for [`DEFAULT_CACHE_DURATION`]
	pub fn write(&self, service: &str, identity: &Identity, keys: &[&str], data: T) -> QwcResult<()> {
		self.write_with_duration(service, identity, keys, data, DEFAULT_CACHE_DURATION)
	}

	pub fn write_with_duration(
		&self,
		service: &str,
		identity: &Identity,
		keys: &[&str],
		data: T,
		duration: Duration,
	) -> QwcResult<()> {
		let (dict, key) = self.cache_entry(service, identity, keys)?;
		debug!("Writing {} data into cache with key '{}' for {:?}", service, key, duration);
		dict.set_with_duration(&key, data, duration);
		Ok(())
	}
}

impl<T: Clone> Default for Cache<T> {
	fn default() -> Self {
		Self::new()
	}
}


// vim: ts=4
