//! Error type shared by all QWC service crates.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub type QwcResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	NotFound,
	PermissionDenied,
	Unauthorized,
	Parse,
	DbError,
	/// Malformed cache key path (empty key list or inconsistent key depth)
	InvalidCacheKey(String),
	ValidationError(String),
	ConfigError(String),
	Internal(String),

	// externals
	IoError(std::io::Error),
	JsonError(serde_json::Error),
}

impl Error {
	fn code(&self) -> &'static str {
		match self {
			Error::NotFound => "E-NOT-FOUND",
			Error::PermissionDenied => "E-PERMISSION-DENIED",
			Error::Unauthorized => "E-UNAUTHORIZED",
			Error::Parse | Error::JsonError(_) => "E-PARSE",
			Error::ValidationError(_) => "E-VALIDATION",
			Error::DbError => "E-DB",
			Error::InvalidCacheKey(_)
			| Error::ConfigError(_)
			| Error::Internal(_)
			| Error::IoError(_) => "E-INTERNAL",
		}
	}

	fn status(&self) -> StatusCode {
		match self {
			Error::NotFound => StatusCode::NOT_FOUND,
			Error::PermissionDenied => StatusCode::FORBIDDEN,
			Error::Unauthorized => StatusCode::UNAUTHORIZED,
			Error::Parse | Error::JsonError(_) | Error::ValidationError(_) => {
				StatusCode::BAD_REQUEST
			}
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::Unauthorized => write!(f, "unauthorized"),
			Error::Parse => write!(f, "parse error"),
			Error::DbError => write!(f, "database error"),
			Error::InvalidCacheKey(msg) => write!(f, "invalid cache key: {}", msg),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::IoError(err) => write!(f, "io error: {}", err),
			Error::JsonError(err) => write!(f, "json error: {}", err),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Error::IoError(err) => Some(err),
			Error::JsonError(err) => Some(err),
			_ => None,
		}
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::IoError(err)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::JsonError(err)
	}
}

impl From<regex::Error> for Error {
	fn from(err: regex::Error) -> Self {
		Self::ConfigError(err.to_string())
	}
}

#[cfg(feature = "server")]
impl From<jsonwebtoken::errors::Error> for Error {
	fn from(err: jsonwebtoken::errors::Error) -> Self {
		tracing::debug!("JWT error: {}", err);
		Self::Unauthorized
	}
}

#[cfg(feature = "server")]
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		tracing::warn!("DB: {:#?}", err);
		match err {
			sqlx::Error::RowNotFound => Self::NotFound,
			_ => Self::DbError,
		}
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = self.status();
		if status == StatusCode::INTERNAL_SERVER_ERROR {
			tracing::error!("{}", self);
		}
		// Internal details stay in the log
		let message = match &self {
			Error::ValidationError(msg) => msg.clone(),
			_ if status == StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
			_ => self.to_string(),
		};
		let body = serde_json::json!({
			"error": {
				"code": self.code(),
				"message": message,
			}
		});
		(status, Json(body)).into_response()
	}
}


// vim: ts=4
