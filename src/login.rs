//! Re-authentication transport.
//!
//! The backend exposes no refresh grant, so refreshing a session means replaying the stored
//! credentials against the login endpoint. [`LoginClient`] is the seam the authenticator calls
//! through; [`ReqwestLoginClient`] is the bundled implementation.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	auth::{LoginCredentials, Secret},
};
#[cfg(feature = "reqwest")]
use crate::error::{ConfigError, TransientError, TransportError};

/// Boxed future returned by [`LoginClient::login`].
pub type LoginFuture<'a> = Pin<Box<dyn Future<Output = Result<LoginResponse>> + 'a + Send>>;

/// Transport capable of exchanging login credentials for a bearer token.
///
/// Implementations classify failures into the crate's [`Error`] so the authenticator can decide
/// whether the session survives: HTTP 401/403 must surface as [`Error::SessionRejected`],
/// connectivity problems as [`Error::Transport`], and other upstream trouble as
/// [`Error::Transient`].
pub trait LoginClient
where
	Self: Send + Sync,
{
	/// Submits `credentials` to the login endpoint.
	fn login<'a>(&'a self, credentials: &'a LoginCredentials) -> LoginFuture<'a>;
}

/// Successful login payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
	/// Bearer token issued for the session.
	#[serde(default, alias = "accessToken", alias = "access_token")]
	pub token: Option<Secret>,
	/// Backend demand to drop the session even though the call succeeded.
	#[serde(default)]
	pub requires_logout: bool,
	/// Optional human-readable status message.
	#[serde(default)]
	pub message: Option<String>,
}
impl LoginResponse {
	/// Builds a payload carrying `token`.
	pub fn with_token(token: impl Into<Secret>) -> Self {
		Self { token: Some(token.into()), ..Default::default() }
	}

	/// Extracts a usable token, classifying logout demands and empty payloads as errors.
	pub fn into_token(self) -> Result<Secret> {
		if self.requires_logout {
			return Err(Error::RequiresLogout {
				reason: self.message.unwrap_or_else(|| "login response requested logout".into()),
			});
		}

		self.token.filter(|token| !token.is_blank()).ok_or(Error::MissingToken)
	}
}

/// Thin wrapper around [`ReqwestClient`] bound to the login endpoint.
///
/// The request body is the JSON form of [`LoginCredentials`]
/// (`{"companyId", "username", "password"}`).
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestLoginClient {
	client: ReqwestClient,
	endpoint: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestLoginClient {
	/// Creates a client with a default reqwest stack.
	pub fn new(endpoint: Url) -> Self {
		Self::with_client(ReqwestClient::default(), endpoint)
	}

	/// Creates a client whose login calls give up after `timeout`.
	pub fn with_timeout(endpoint: Url, timeout: std::time::Duration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(timeout).build()?;

		Ok(Self::with_client(client, endpoint))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient, endpoint: Url) -> Self {
		Self { client, endpoint }
	}

	/// Login endpoint the client posts to.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	async fn login_now(&self, credentials: &LoginCredentials) -> Result<LoginResponse> {
		let response = self
			.client
			.post(self.endpoint.clone())
			.json(credentials)
			.send()
			.await
			.map_err(TransportError::from)?;
		let status = response.status();

		if matches!(status.as_u16(), 401 | 403) {
			return Err(Error::SessionRejected { status: status.as_u16() });
		}
		if !status.is_success() {
			let retry_after = parse_retry_after(response.headers());

			return Err(TransientError::LoginEndpoint {
				message: format!("HTTP {status}"),
				status: Some(status.as_u16()),
				retry_after,
			}
			.into());
		}

		let bytes = response.bytes().await.map_err(TransportError::from)?;
		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
			TransientError::LoginResponseParse { source, status: Some(status.as_u16()) }.into()
		})
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestLoginClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl LoginClient for ReqwestLoginClient {
	fn login<'a>(&'a self, credentials: &'a LoginCredentials) -> LoginFuture<'a> {
		Box::pin(self.login_now(credentials))
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<i64>() {
		return (secs > 0).then_some(Duration::seconds(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
