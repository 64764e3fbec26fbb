//! Common test utilities and helpers
//!
//! Shared fixtures for the integration tests: a temporary config directory
//! with per-tenant service configs and permission files.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use qwc_services_core::env::EnvVars;

pub fn timestamp(secs: i64) -> DateTime<Utc> {
	DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
}

/// Temporary `CONFIG_PATH` directory
pub struct ConfigDir {
	dir: tempfile::TempDir,
}

impl ConfigDir {
	pub fn new() -> Self {
		Self { dir: tempfile::tempdir().unwrap() }
	}

	pub fn path(&self) -> &Path {
		self.dir.path()
	}

	/// Environment with `CONFIG_PATH` pointing here, plus `extra`
	pub fn env(&self, extra: &[(&str, &str)]) -> EnvVars {
		let mut env = EnvVars::from_pairs(extra.iter().copied());
		env.set("CONFIG_PATH", self.path().to_str().unwrap());
		env
	}

	pub fn write_service_config(&self, tenant: &str, service: &str, config: &Value) -> PathBuf {
		self.write(tenant, &format!("{}Config.json", service), config)
	}

	pub fn write_permissions(&self, tenant: &str, permissions: &Value) -> PathBuf {
		self.write(tenant, "permissions.json", permissions)
	}

	fn write(&self, tenant: &str, filename: &str, content: &Value) -> PathBuf {
		let dir = self.path().join(tenant);
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join(filename);
		std::fs::write(&path, serde_json::to_string_pretty(content).unwrap()).unwrap();
		path
	}
}

pub fn set_modified(path: &Path, secs: i64) {
	let file = File::options().write(true).open(path).unwrap();
	file.set_modified(SystemTime::from(timestamp(secs))).unwrap();
}

pub async fn body_text(res: Response<Body>) -> String {
	let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
	String::from_utf8(bytes.to_vec()).unwrap()
}

// vim: ts=4
