//! HTTP exchange model consumed by the authenticator, plus a reqwest client that drives it.
//!
//! [`FailedResponse`] mirrors what an HTTP stack knows when a request comes back 401/403: the
//! status, the request that produced it, and the failed response of the previous attempt in the
//! same retry chain. The authenticator only ever reads these values; the sole mutation it asks
//! for is a cloned request with a replaced `Authorization` header ([`with_bearer`]).

// crates.io
use ::http::{
	HeaderValue, Request, StatusCode,
	header::{AUTHORIZATION, HeaderMap},
};
// self
use crate::{_prelude::*, auth::Secret, error::ConfigError};
#[cfg(feature = "reqwest")]
use crate::{authenticator::Authenticator, error::TransportError};

/// Request body type used by [`AuthorizedClient`].
pub type Body = Vec<u8>;

/// Returns `true` for the statuses that trigger the authenticator (401 and 403).
pub fn is_auth_challenge(status: StatusCode) -> bool {
	matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// A response that failed authentication, linked to the failure it retried.
#[derive(Debug)]
pub struct FailedResponse<B = Body> {
	/// Status returned for `request`.
	pub status: StatusCode,
	/// Request that produced this response.
	pub request: Request<B>,
	/// Failed response of the previous attempt of the same logical request.
	pub prior: Option<Box<FailedResponse<B>>>,
}
impl<B> FailedResponse<B> {
	/// Creates the first link of a chain.
	pub fn new(status: StatusCode, request: Request<B>) -> Self {
		Self { status, request, prior: None }
	}

	/// Links this response to the failure that preceded it.
	pub fn with_prior(mut self, prior: FailedResponse<B>) -> Self {
		self.prior = Some(Box::new(prior));

		self
	}

	/// Number of earlier attempts in this chain, i.e. how often the request was already retried.
	pub fn chain_depth(&self) -> usize {
		let mut depth = 0;
		let mut cursor = self.prior.as_deref();

		while let Some(prior) = cursor {
			depth += 1;
			cursor = prior.prior.as_deref();
		}

		depth
	}

	/// Returns `true` when the status is 401 or 403.
	pub fn is_auth_challenge(&self) -> bool {
		is_auth_challenge(self.status)
	}

	/// Bearer token the failed request carried, if any.
	pub fn bearer_token(&self) -> Option<&str> {
		bearer_token(self.request.headers())
	}
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
	let (scheme, token) = raw.split_once(' ')?;

	scheme.eq_ignore_ascii_case("bearer").then_some(token.trim()).filter(|token| !token.is_empty())
}

/// Builds a sensitive `Authorization` header value for `token`.
pub fn bearer_header(token: &Secret) -> Result<HeaderValue, ConfigError> {
	let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))?;

	value.set_sensitive(true);

	Ok(value)
}

/// Copies method, URI, version, headers, and body into a new request.
///
/// Extensions are not carried over; they are local to the original exchange.
pub fn clone_request<B>(request: &Request<B>) -> Result<Request<B>, ConfigError>
where
	B: Clone,
{
	let mut builder = Request::builder()
		.method(request.method().clone())
		.uri(request.uri().clone())
		.version(request.version());

	if let Some(headers) = builder.headers_mut() {
		*headers = request.headers().clone();
	}

	Ok(builder.body(request.body().clone())?)
}

/// Clones `request` with its `Authorization` header replaced by `Bearer <token>`.
pub fn with_bearer<B>(request: &Request<B>, token: &Secret) -> Result<Request<B>, ConfigError>
where
	B: Clone,
{
	let mut cloned = clone_request(request)?;

	cloned.headers_mut().insert(AUTHORIZATION, bearer_header(token)?);

	Ok(cloned)
}

/// Reqwest-backed client that authorizes requests and retries them through the authenticator.
///
/// Each call attaches the current bearer token when the request has none (renewing it first when
/// the session is inside the proactive threshold), executes it, and on a 401/403 hands the
/// failure chain to [`Authenticator::authenticate`]. A returned request is sent in place of the
/// original; `None` ends the loop and the challenge response is returned to the caller unchanged
/// so the application can route the user back to the login screen.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct AuthorizedClient {
	client: ReqwestClient,
	authenticator: Arc<Authenticator>,
}
#[cfg(feature = "reqwest")]
impl AuthorizedClient {
	/// Wraps a reqwest client and a shared authenticator.
	pub fn new(client: ReqwestClient, authenticator: Arc<Authenticator>) -> Self {
		Self { client, authenticator }
	}

	/// Authenticator consulted on auth challenges.
	pub fn authenticator(&self) -> &Arc<Authenticator> {
		&self.authenticator
	}

	/// Executes `request`, transparently re-authenticating on 401/403.
	pub async fn execute(&self, request: Request<Body>) -> Result<::http::Response<Body>> {
		let mut request = self.authenticator.authorize(request).await?;
		let mut chain: Option<FailedResponse<Body>> = None;

		loop {
			let response = self.send(clone_request(&request)?).await?;

			if !is_auth_challenge(response.status()) {
				return Ok(response);
			}

			let mut failed = FailedResponse::new(response.status(), request);

			failed.prior = chain.take().map(Box::new);

			match self.authenticator.authenticate(&failed).await {
				Some(next) => {
					request = next;
					chain = Some(failed);
				},
				None => return Ok(response),
			}
		}
	}

	async fn send(&self, request: Request<Body>) -> Result<::http::Response<Body>> {
		let request = reqwest::Request::try_from(request).map_err(TransportError::from)?;
		let response = self.client.execute(request).await.map_err(TransportError::from)?;
		let status = response.status();
		let version = response.version();
		let headers = response.headers().to_owned();
		let body = response.bytes().await.map_err(TransportError::from)?.to_vec();
		let mut converted = ::http::Response::new(body);

		*converted.status_mut() = status;
		*converted.version_mut() = version;
		*converted.headers_mut() = headers;

		Ok(converted)
	}
}
