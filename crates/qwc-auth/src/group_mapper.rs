//! Group name mapping with regular expressions
//!
//! Maps group names from an identity provider (LDAP, OIDC claims, ...) to
//! the names used in the permissions. Mappings are `regex~replacement`
//! pairs separated by `#`, e.g. `ship_crew~crew#gis.role.(.*)~\1`:
//!
//! - `ship_crew` → `crew`
//! - `gis.role.admin` → `admin`
//! - `gis.none` → `gis.none`

use regex::Regex;

use crate::config::AuthConfig;
use crate::prelude::*;

#[derive(Debug, Clone, Default)]
pub struct GroupNameMapper {
	mappings: Vec<(Regex, Box<str>)>,
}

impl GroupNameMapper {
	pub fn new(mappings: &str) -> QwcResult<Self> {
		if mappings.is_empty() {
			return Ok(Self::default());
		}

		let mappings = mappings
			.split('#')
			.map(|mapping| {
				let (pattern, replacement) = mapping.split_once('~').unwrap_or((mapping, ""));
				let regex = Regex::new(pattern).map_err(|err| {
					Error::ConfigError(format!("invalid group mapping '{}': {}", pattern, err))
				})?;
				Ok((regex, convert_replacement(replacement).into_boxed_str()))
			})
			.collect::<QwcResult<Vec<_>>>()?;
		Ok(Self { mappings })
	}

	pub fn from_config(config: &AuthConfig) -> QwcResult<Self> {
		Self::new(&config.group_mappings)
	}

	/// Map a group name. The first mapping matching at the start replaces all its matches.
	pub fn mapped_group(&self, group: &str) -> String {
		for (regex, replacement) in &self.mappings {
			if regex.find(group).is_some_and(|m| m.start() == 0) {
				return regex.replace_all(group, &**replacement).into_owned();
			}
		}
		group.to_string()
	}

	/// Map a multi valued group (as returned by some LDAP servers), joined with spaces
	pub fn mapped_groups(&self, groups: &[&str]) -> String {
		self.mapped_group(&groups.join(" "))
	}
}

/// Convert `\1` and `\g<name>` group references to `${1}` and `${name}`
fn convert_replacement(replacement: &str) -> String {
	let mut result = String::with_capacity(replacement.len());
	let mut chars = replacement.chars().peekable();
	while let Some(c) = chars.next() {
		match c {
			'$' => result.push_str("$$"),
			'\\' => match chars.peek().copied() {
				Some(d) if d.is_ascii_digit() => {
					let mut group = String::new();
					while let Some(d) = chars.next_if(char::is_ascii_digit) {
						group.push(d);
					}
					result.push_str(&format!("${{{}}}", group));
				}
				Some('g') => {
					chars.next();
					if chars.next_if_eq(&'<').is_some() {
						let name: String = chars.by_ref().take_while(|&c| c != '>').collect();
						result.push_str(&format!("${{{}}}", name));
					} else {
						result.push_str("\\g");
					}
				}
				Some('\\') => {
					chars.next();
					result.push('\\');
				}
				_ => result.push('\\'),
			},
			c => result.push(c),
		}
	}
	result
}


// vim: ts=4
