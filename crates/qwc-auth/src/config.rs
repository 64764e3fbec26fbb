//! Authentication settings, read once at startup

use rand::RngExt;
use std::time::Duration;

use qwc_types::env::EnvVars;

use crate::prelude::*;

pub const ENV_JWT_SECRET_KEY: &str = "JWT_SECRET_KEY";
pub const ENV_JWT_ACCESS_TOKEN_EXPIRES: &str = "JWT_ACCESS_TOKEN_EXPIRES";
pub const ENV_JWT_ACCESS_COOKIE_NAME: &str = "JWT_ACCESS_COOKIE_NAME";
pub const ENV_ALLOW_BASIC_AUTH_USER: &str = "ALLOW_BASIC_AUTH_USER";
pub const ENV_GROUP_MAPPINGS: &str = "GROUP_MAPPINGS";

pub const DEFAULT_ACCESS_TOKEN_EXPIRES: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_ACCESS_COOKIE_NAME: &str = "access_token_cookie";
const RANDOM_SECRET_LENGTH: usize = 24;

#[derive(Clone)]
pub struct AuthConfig {
	/// HS256 signing secret
	pub secret: Box<[u8]>,
	pub access_token_expires: Duration,
	pub access_cookie_name: Box<str>,
	/// Accept the user name of a Basic auth header without a token.
	/// The password must have been checked upstream.
	pub allow_basic_auth_user: bool,
	/// `regex~replacement` pairs separated by `#`
	pub group_mappings: Box<str>,
}

impl AuthConfig {
	pub fn from_env(env: &EnvVars) -> QwcResult<Self> {
		let secret = if let Some(secret) = env.get_nonempty(ENV_JWT_SECRET_KEY) {
			Box::from(secret.as_bytes())
		} else {
			warn!(
				"{} not set, using a random secret. Tokens will not be valid across restarts or instances.",
				ENV_JWT_SECRET_KEY
			);
			random_secret()
		};

		let access_token_expires = match env.get_nonempty(ENV_JWT_ACCESS_TOKEN_EXPIRES) {
			Some(secs) => Duration::from_secs(secs.trim().parse().map_err(|_| {
				Error::ConfigError(format!("invalid {} '{}'", ENV_JWT_ACCESS_TOKEN_EXPIRES, secs))
			})?),
			None => DEFAULT_ACCESS_TOKEN_EXPIRES,
		};

		let allow_basic_auth_user = matches!(
			env.get_or(ENV_ALLOW_BASIC_AUTH_USER, "False").to_ascii_lowercase().as_str(),
			"t" | "true"
		);

		Ok(Self {
			secret,
			access_token_expires,
			access_cookie_name: Box::from(
				env.get_nonempty(ENV_JWT_ACCESS_COOKIE_NAME).unwrap_or(DEFAULT_ACCESS_COOKIE_NAME),
			),
			allow_basic_auth_user,
			group_mappings: Box::from(env.get_or(ENV_GROUP_MAPPINGS, "")),
		})
	}

	/// Config with a fixed secret and defaults for everything else
	pub fn with_secret(secret: &str) -> Self {
		Self {
			secret: Box::from(secret.as_bytes()),
			access_token_expires: DEFAULT_ACCESS_TOKEN_EXPIRES,
			access_cookie_name: Box::from(DEFAULT_ACCESS_COOKIE_NAME),
			allow_basic_auth_user: false,
			group_mappings: Box::from(""),
		}
	}
}

impl std::fmt::Debug for AuthConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AuthConfig")
			.field("secret", &"***")
			.field("access_token_expires", &self.access_token_expires)
			.field("access_cookie_name", &self.access_cookie_name)
			.field("allow_basic_auth_user", &self.allow_basic_auth_user)
			.field("group_mappings", &self.group_mappings)
			.finish()
	}
}

fn random_secret() -> Box<[u8]> {
	let mut rng = rand::rng();
	(0..RANDOM_SECRET_LENGTH).map(|_| rng.random_range(0..=u8::MAX)).collect()
}


// vim: ts=4
