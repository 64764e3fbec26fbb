//! JWT access tokens
//!
//! Tokens are HS256 signed and looked up in the `Authorization: Bearer`
//! header first, then in the access cookie.

use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngExt;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::identity::AuthIdentity;
use crate::prelude::*;

pub const TOKEN_TYPE_ACCESS: &str = "access";

const JTI_LENGTH: usize = 24;
const JTI_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Access token claims.
///
/// `sub` holds the username, since JWT validation reads it as a string.
/// The complete identity (group, groups) travels in `identity`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccessClaims {
	pub sub: Box<str>,
	pub identity: AuthIdentity,
	pub iat: i64,
	pub nbf: i64,
	pub exp: i64,
	pub jti: Box<str>,
	#[serde(rename = "type")]
	pub token_type: Box<str>,
	#[serde(default)]
	pub fresh: bool,
}

pub struct JwtManager {
	config: AuthConfig,
	encoding_key: EncodingKey,
	decoding_key: DecodingKey,
	validation: Validation,
}

impl JwtManager {
	pub fn new(config: AuthConfig) -> Self {
		let encoding_key = EncodingKey::from_secret(&config.secret);
		let decoding_key = DecodingKey::from_secret(&config.secret);
		let mut validation = Validation::new(Algorithm::HS256);
		validation.validate_nbf = true;
		Self { config, encoding_key, decoding_key, validation }
	}

	pub fn config(&self) -> &AuthConfig {
		&self.config
	}

	pub fn create_access_token(&self, identity: &AuthIdentity) -> QwcResult<String> {
		self.create_access_token_at(identity, Utc::now())
	}

	/// Create an access token as if issued at `issued_at`
	pub fn create_access_token_at(
		&self,
		identity: &AuthIdentity,
		issued_at: DateTime<Utc>,
	) -> QwcResult<String> {
		let iat = issued_at.timestamp();
		let expires = i64::try_from(self.config.access_token_expires.as_secs()).unwrap_or(i64::MAX);
		let claims = AccessClaims {
			sub: identity.username().unwrap_or_default().into(),
			identity: identity.clone(),
			iat,
			nbf: iat,
			exp: iat.saturating_add(expires),
			jti: random_jti().into(),
			token_type: TOKEN_TYPE_ACCESS.into(),
			fresh: false,
		};

		jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(
			|err| {
				warn!("JWT encode error: {:?}", err);
				Error::Internal("JWT encode error".into())
			},
		)
	}

	/// Verify signature and expiry of an access token
	pub fn decode_token(&self, token: &str) -> QwcResult<AccessClaims> {
		let token_data =
			jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
				.map_err(|err| {
					debug!("JWT decode error: {:?}", err);
					Error::Unauthorized
				})?;

		if &*token_data.claims.token_type != TOKEN_TYPE_ACCESS {
			debug!("Rejecting {} token", token_data.claims.token_type);
			return Err(Error::Unauthorized);
		}
		Ok(token_data.claims)
	}

	/// Access token from the Bearer header or the access cookie
	pub fn token_from_headers<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
		bearer_token(headers).or_else(|| cookie_value(headers, &self.config.access_cookie_name))
	}

	/// Identity of the request.
	///
	/// `None` without a token, `Error::Unauthorized` for an invalid one.
	pub fn identity(&self, headers: &HeaderMap) -> QwcResult<Option<AuthIdentity>> {
		match self.token_from_headers(headers) {
			Some(token) => Ok(Some(self.decode_token(token)?.identity)),
			None => Ok(None),
		}
	}

	/// `Set-Cookie` value storing the token for `path`
	pub fn access_cookie(&self, token: &str, path: &str) -> String {
		format!("{}={}; Path={}; HttpOnly; SameSite=Lax", self.config.access_cookie_name, token, path)
	}

	/// `Set-Cookie` value removing the access cookie for `path`
	pub fn unset_access_cookie(&self, path: &str) -> String {
		format!(
			"{}=; Path={}; HttpOnly; SameSite=Lax; Max-Age=0",
			self.config.access_cookie_name, path
		)
	}
}

impl std::fmt::Debug for JwtManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("JwtManager").field("config", &self.config).finish_non_exhaustive()
	}
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
	let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
	let (scheme, token) = value.split_once(' ')?;
	scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers
		.get_all(header::COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(key, _)| *key == name)
		.map(|(_, value)| value)
}

fn random_jti() -> String {
	let mut rng = rand::rng();
	(0..JTI_LENGTH).map(|_| char::from(JTI_CHARS[rng.random_range(0..JTI_CHARS.len())])).collect()
}


// vim: ts=4
