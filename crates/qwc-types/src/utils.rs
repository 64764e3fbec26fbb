//! Utility functions

use std::path::{Component, Path, PathBuf};

/// Join untrusted path segments onto a base directory.
///
/// Returns `None` if any segment would escape `base`: absolute paths,
/// `..` components, backslashes or NUL bytes.
///
/// # Examples
/// - `safe_join("config", &["org1", "searchConfig.json"])` → `config/org1/searchConfig.json`
/// - `safe_join("config", &["../etc", "passwd"])` → `None`
pub fn safe_join(base: impl AsRef<Path>, segments: &[&str]) -> Option<PathBuf> {
	let mut path = base.as_ref().to_path_buf();
	for segment in segments {
		if segment.is_empty() || segment.contains(['\\', '\0']) {
			return None;
		}
		let segment_path = Path::new(segment);
		for component in segment_path.components() {
			match component {
				Component::Normal(_) | Component::CurDir => {}
				_ => return None,
			}
		}
		path.push(segment_path);
	}
	Some(path)
}

/// Parse a boolean flag the way QWC services always have.
///
/// Accepts `true`/`t`/`1`/`on`/`yes`/`y` and `false`/`f`/`0`/`off`/`no`/`n`
/// (case-insensitive). The empty string is `false` for legacy env configs.
pub fn str_to_bool(value: &str) -> Option<bool> {
	match value.to_ascii_lowercase().as_str() {
		"true" | "t" | "1" | "on" | "yes" | "y" => Some(true),
		"false" | "f" | "0" | "off" | "no" | "n" | "" => Some(false),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_safe_join() {
		assert_eq!(
			safe_join("config", &["bar", "fooConfig.json"]),
			Some(PathBuf::from("config/bar/fooConfig.json"))
		);
		assert_eq!(safe_join("baz", &["a/b", "x.json"]), Some(PathBuf::from("baz/a/b/x.json")));
		assert_eq!(safe_join("config", &["..", "x.json"]), None);
		assert_eq!(safe_join("config", &["a/../../b", "x.json"]), None);
		assert_eq!(safe_join("config", &["/etc", "passwd"]), None);
		assert_eq!(safe_join("config", &["a\\b", "x.json"]), None);
		assert_eq!(safe_join("config", &["", "x.json"]), None);
	}

	#[test]
	fn test_str_to_bool() {
		assert_eq!(str_to_bool("TRUE"), Some(true));
		assert_eq!(str_to_bool("y"), Some(true));
		assert_eq!(str_to_bool("off"), Some(false));
		assert_eq!(str_to_bool(""), Some(false));
		assert_eq!(str_to_bool("maybe"), None);
	}
}

// vim: ts=4
