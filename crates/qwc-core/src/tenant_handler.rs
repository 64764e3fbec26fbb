//! Registry of tenant specific service handlers
//!
//! Services keep expensive per-tenant objects (parsed configs, permission
//! lookups, ...) in a [`TenantHandler`]. A registered handler is returned
//! until the tenant's config or permissions file is modified after the
//! handler was registered.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::clock::{Clock, system_clock};
use crate::config::{ConfigPaths, CoreConfig};
use crate::prelude::*;
use crate::tenant::{TenantResolver, TenantSource};

struct HandlerRecord {
	handler: Arc<dyn Any + Send + Sync>,
	last_update: DateTime<Utc>,
}

pub struct TenantHandler {
	resolver: TenantResolver,
	paths: ConfigPaths,
	clock: Arc<dyn Clock>,
	/// handler name -> tenant -> record
	handlers: Mutex<HashMap<Box<str>, HashMap<Box<str>, HandlerRecord>>>,
}

impl TenantHandler {
	pub fn new(config: &CoreConfig) -> Self {
		Self::with_clock(config, system_clock())
	}

	pub fn with_clock(config: &CoreConfig, clock: Arc<dyn Clock>) -> Self {
		Self {
			resolver: TenantResolver::new(config),
			paths: config.paths.clone(),
			clock,
			handlers: Mutex::new(HashMap::new()),
		}
	}

	pub fn resolver(&self) -> &TenantResolver {
		&self.resolver
	}

	pub fn is_multi(&self) -> bool {
		self.resolver.is_multi()
	}

	/// Tenant of a request, see [`TenantResolver::tenant`]
	pub fn tenant<S: TenantSource + ?Sized>(&self, source: &S) -> Tenant {
		self.resolver.tenant(source)
	}

	/// Registered handler for tenant, if it is still up to date.
	///
	/// An outdated handler is removed. A handler registered with another
	/// type than `H` is reported as missing.
	pub fn handler<H: Send + Sync + 'static>(
		&self,
		service_name: &str,
		handler_name: &str,
		tenant: &str,
	) -> QwcResult<Option<Arc<H>>> {
		let mut handlers = self.handlers.lock();
		let Some(tenants) = handlers.get_mut(handler_name) else {
			return Ok(None);
		};
		let Some(record) = tenants.get(tenant) else {
			return Ok(None);
		};

		let last_config_update = self.last_config_update(service_name, tenant)?;
		match last_config_update {
			Some(updated) if updated < record.last_update => {
				Ok(Arc::clone(&record.handler).downcast::<H>().ok())
			}
			_ => {
				debug!(
					"Config of {} for tenant {} changed since {}, dropping handler",
					handler_name, tenant, record.last_update
				);
				tenants.remove(tenant);
				Ok(None)
			}
		}
	}

	/// Store handler for tenant, replacing any previous one
	pub fn register_handler<H: Send + Sync + 'static>(
		&self,
		handler_name: &str,
		tenant: &str,
		handler: Arc<H>,
	) -> Arc<H> {
		let record = HandlerRecord { handler: handler.clone(), last_update: self.clock.now() };
		debug!("Registering {} handler for tenant {}", handler_name, tenant);
		self.handlers
			.lock()
			.entry(Box::from(handler_name))
			.or_default()
			.insert(Box::from(tenant), record);
		handler
	}

	/// Up to date handler for tenant, built and registered if missing
	pub fn handler_or_register<H, F>(
		&self,
		service_name: &str,
		handler_name: &str,
		tenant: &str,
		build: F,
	) -> QwcResult<Arc<H>>
	where
		H: Send + Sync + 'static,
		F: FnOnce() -> QwcResult<H>,
	{
		if let Some(handler) = self.handler::<H>(service_name, handler_name, tenant)? {
			return Ok(handler);
		}
		let handler = Arc::new(build()?);
		Ok(self.register_handler(handler_name, tenant, handler))
	}

	/// Latest modification time of the tenant's service config and permissions files
	pub fn last_config_update(
		&self,
		service_name: &str,
		tenant: &str,
	) -> QwcResult<Option<DateTime<Utc>>> {
		let files = [
			self.paths.config_file_path(service_name, tenant),
			self.paths.permissions_file_path(tenant),
		];

		let mut latest = None;
		for path in files.iter().flatten() {
			if let Some(modified) = modified_time(path)? {
				latest = latest.max(Some(modified));
			}
		}
		Ok(latest)
	}
}

/// Modification time of a regular file, `None` if it does not exist
fn modified_time(path: &Path) -> QwcResult<Option<DateTime<Utc>>> {
	let meta = match std::fs::metadata(path) {
		Ok(meta) => meta,
		Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
		Err(err) => return Err(err.into()),
	};
	if !meta.is_file() {
		return Ok(None);
	}
	Ok(Some(DateTime::<Utc>::from(meta.modified()?)))
}

impl std::fmt::Debug for TenantHandler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TenantHandler")
			.field("resolver", &self.resolver)
			.field("paths", &self.paths)
			.finish_non_exhaustive()
	}
}


// vim: ts=4
