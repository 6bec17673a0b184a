//! Crate-level error types shared across the store, login, and authenticator layers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; the session may be retried later.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Login endpoint rejected the stored credentials.
	#[error("Login endpoint rejected the stored credentials with HTTP {status}.")]
	SessionRejected {
		/// HTTP status returned by the login endpoint.
		status: u16,
	},
	/// Login succeeded at the transport level but returned no usable token.
	#[error("Login response did not contain a bearer token.")]
	MissingToken,
	/// Backend explicitly asked the client to drop the session.
	#[error("Backend requires a fresh interactive login: {reason}.")]
	RequiresLogout {
		/// Backend- or broker-supplied reason string.
		reason: String,
	},
	/// Stored credentials are missing or blank.
	#[error("Stored login credentials are incomplete.")]
	InvalidCredentials,
}
impl Error {
	/// Returns `true` when the failure ends the session and stored credentials must be wiped.
	///
	/// Network and transient endpoint failures leave the session intact so a later attempt can
	/// still succeed.
	pub fn requires_logout(&self) -> bool {
		match self {
			Self::SessionRejected { .. } | Self::MissingToken | Self::RequiresLogout { .. } => true,
			// `ReqwestLoginClient` reports 401/403 as `SessionRejected`; custom `LoginClient`s may
			// still surface them as endpoint errors.
			Self::Transient(TransientError::LoginEndpoint { status: Some(status), .. }) =>
				matches!(status, 401 | 403),
			_ => false,
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
	/// Refresh policy violates one of its invariants.
	#[error("Refresh policy is invalid: {reason}.")]
	InvalidPolicy {
		/// Which invariant was violated.
		reason: &'static str,
	},
	/// Bearer token contains bytes that cannot appear in an HTTP header.
	#[error("Bearer token cannot be encoded as an Authorization header.")]
	InvalidHeaderValue(#[from] ::http::header::InvalidHeaderValue),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Login endpoint returned an unexpected but non-fatal response.
	#[error("Login endpoint returned an unexpected response: {message}.")]
	LoginEndpoint {
		/// Broker-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Login endpoint responded with malformed JSON that could not be parsed.
	#[error("Login endpoint returned malformed JSON.")]
	LoginResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the login endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the login endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn session_ending_failures_require_logout() {
		assert!(Error::SessionRejected { status: 401 }.requires_logout());
		assert!(Error::SessionRejected { status: 403 }.requires_logout());
		assert!(Error::MissingToken.requires_logout());
		assert!(Error::RequiresLogout { reason: "password changed".into() }.requires_logout());
	}

	#[test]
	fn endpoint_errors_carrying_auth_statuses_require_logout() {
		for status in [401, 403] {
			let error = Error::from(TransientError::LoginEndpoint {
				message: format!("HTTP {status}"),
				status: Some(status),
				retry_after: None,
			});

			assert!(error.requires_logout());
		}
	}

	#[test]
	fn recoverable_failures_keep_the_session() {
		let unavailable = Error::from(TransientError::LoginEndpoint {
			message: "maintenance".into(),
			status: Some(503),
			retry_after: Some(Duration::seconds(30)),
		});
		let network = Error::from(TransportError::Io(std::io::Error::other("connection reset")));

		assert!(!unavailable.requires_logout());
		assert!(!network.requires_logout());
		assert!(!Error::InvalidCredentials.requires_logout());
	}

	#[test]
	fn store_error_converts_with_source() {
		let store_error =
			crate::store::StoreError::Backend { message: "keystore locked".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("keystore locked"));

		let source = StdError::source(&error)
			.expect("Crate error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
