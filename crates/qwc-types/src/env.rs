//! Environment snapshot
//!
//! Services read their environment once at startup into an [`EnvVars`]
//! value which is then passed to the config constructors. Nothing else in
//! the QWC crates reads the process environment.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct EnvVars {
	vars: HashMap<Box<str>, Box<str>>,
}

impl EnvVars {
	/// Snapshot of the current process environment (non UTF-8 entries are skipped)
	pub fn from_process() -> Self {
		Self::from_pairs(std::env::vars_os().filter_map(|(k, v)| {
			Some((k.into_string().ok()?, v.into_string().ok()?))
		}))
	}

	pub fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<Box<str>>,
		V: Into<Box<str>>,
	{
		Self { vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.vars.get(name).map(AsRef::as_ref)
	}

	/// Like [`EnvVars::get`], but an empty value counts as unset
	pub fn get_nonempty(&self, name: &str) -> Option<&str> {
		self.get(name).filter(|v| !v.is_empty())
	}

	pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
		self.get(name).unwrap_or(default)
	}

	pub fn set(&mut self, name: impl Into<Box<str>>, value: impl Into<Box<str>>) {
		self.vars.insert(name.into(), value.into());
	}

	pub fn len(&self) -> usize {
		self.vars.len()
	}

	pub fn is_empty(&self) -> bool {
		self.vars.is_empty()
	}
}


// vim: ts=4
