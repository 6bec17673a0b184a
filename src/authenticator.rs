//! Auth-challenge handling with singleflight re-login.
//!
//! [`Authenticator::authenticate`] is invoked by the HTTP layer for every 401/403. It filters
//! ineligible responses, enforces the retry-depth cap, the attempt budget, and credential
//! presence, then refreshes under an instance-wide async lock. Callers that queued behind an
//! in-flight refresh reuse its outcome instead of issuing their own login, so N concurrent
//! challenges cost one login call. Every failure resolves to `None`; session-ending failures
//! also wipe the stored session.

// crates.io
use ::http::{Request, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	auth::{LoginCredentials, Secret},
	http::{self, FailedResponse},
	login::LoginClient,
	obs::{self, Decision, RefreshSpan},
	provider::TokenProvider,
};

/// Outcome of the most recent serialized refresh, shared with callers that waited on it.
#[derive(Clone, Debug)]
enum RefreshOutcome {
	Refreshed(Secret),
	Failed,
}
impl RefreshOutcome {
	fn token(self) -> Option<Secret> {
		match self {
			Self::Refreshed(token) => Some(token),
			Self::Failed => None,
		}
	}
}

/// Decides whether a failed request can be retried with a fresh bearer token.
pub struct Authenticator {
	provider: Arc<TokenProvider>,
	login: Arc<dyn LoginClient>,
	refresh_lock: AsyncMutex<()>,
	generation: AtomicU64,
	last_outcome: Mutex<Option<RefreshOutcome>>,
}
impl Authenticator {
	/// Creates an authenticator over a shared provider and login transport.
	pub fn new(provider: Arc<TokenProvider>, login: Arc<dyn LoginClient>) -> Self {
		Self {
			provider,
			login,
			refresh_lock: AsyncMutex::new(()),
			generation: AtomicU64::new(0),
			last_outcome: Mutex::new(None),
		}
	}

	/// Provider consulted for guards and bookkeeping.
	pub fn provider(&self) -> &Arc<TokenProvider> {
		&self.provider
	}

	/// Number of login calls this instance has completed (successfully or not).
	pub fn refresh_generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}

	/// Handles an auth challenge.
	///
	/// Returns the original request with `Authorization: Bearer <token>` when a usable token
	/// is available, or `None` when the caller should surface the failure.
	pub async fn authenticate<B>(&self, failed: &FailedResponse<B>) -> Option<Request<B>>
	where
		B: Clone + Send + Sync,
	{
		if !failed.is_auth_challenge() {
			obs::record_decision(Decision::Ineligible);

			return None;
		}

		obs::record_decision(Decision::ChallengeReceived);

		let depth = failed.chain_depth();

		if depth >= self.provider.policy().max_retry_depth {
			obs::record_decision(Decision::RetryDepthExceeded);

			return None;
		}
		if !self.provider.can_attempt_refresh() {
			obs::record_decision(Decision::RateLimited);

			return None;
		}
		if !self.provider.has_credentials_for_refresh().await {
			obs::record_decision(Decision::MissingCredentials);

			return None;
		}

		let observed = self.generation.load(Ordering::Acquire);
		let span = RefreshSpan::new(failed.status.as_u16(), depth);
		let token = span
			.instrument(self.refresh_serialized(failed.bearer_token(), observed, true))
			.await?;

		match http::with_bearer(&failed.request, &token) {
			Ok(request) => Some(request),
			Err(e) => {
				obs::record_decision_error(Decision::RefreshFailed, &e);

				None
			},
		}
	}

	/// Refreshes ahead of expiry when the stored session is inside the proactive threshold.
	///
	/// Returns the token to use for the next request, or `None` when no usable token exists and
	/// a refresh is not possible right now.
	pub async fn refresh_if_needed(&self) -> Option<Secret> {
		if !self.provider.needs_refresh().await {
			return self.provider.access_token().await.ok().flatten();
		}
		if !self.provider.can_attempt_refresh() {
			obs::record_decision(Decision::RateLimited);

			return self.valid_token().await;
		}
		if !self.provider.has_credentials_for_refresh().await {
			obs::record_decision(Decision::MissingCredentials);

			return self.valid_token().await;
		}

		let observed = self.generation.load(Ordering::Acquire);
		let refreshed = RefreshSpan::new(0, 0)
			.instrument(self.refresh_serialized(None, observed, false))
			.await;

		match refreshed {
			Some(token) => Some(token),
			None => self.valid_token().await,
		}
	}

	/// Attaches the current bearer token to a request that carries no `Authorization` header.
	///
	/// Goes through [`Self::refresh_if_needed`], so a session inside the proactive threshold is
	/// renewed before the request is sent.
	pub async fn authorize<B>(&self, mut request: Request<B>) -> Result<Request<B>> {
		if request.headers().contains_key(AUTHORIZATION) {
			return Ok(request);
		}
		if let Some(token) = self.refresh_if_needed().await {
			request.headers_mut().insert(AUTHORIZATION, http::bearer_header(&token)?);
		}

		Ok(request)
	}

	async fn refresh_serialized(
		&self,
		presented: Option<&str>,
		observed: u64,
		reuse_stored: bool,
	) -> Option<Secret> {
		let _singleflight = self.refresh_lock.lock().await;

		if self.generation.load(Ordering::Acquire) != observed {
			let shared = self.last_outcome.lock().clone();

			if let Some(outcome) = shared {
				obs::record_decision(Decision::RefreshShared);

				return outcome.token();
			}
		}
		if reuse_stored {
			if let Some(token) = self.newer_stored_token(presented).await {
				obs::record_decision(Decision::StaleTokenReused);

				return Some(token);
			}
		}

		let outcome = match self.refresh_locked().await {
			Ok(token) => RefreshOutcome::Refreshed(token),
			Err(e) => {
				self.handle_failure(e).await;

				RefreshOutcome::Failed
			},
		};

		*self.last_outcome.lock() = Some(outcome.clone());
		self.generation.fetch_add(1, Ordering::AcqRel);

		outcome.token()
	}

	async fn refresh_locked(&self) -> Result<Secret> {
		self.provider.record_refresh_attempt();
		obs::record_decision(Decision::RefreshAttempted);

		let credentials = self
			.provider
			.login_credentials()
			.await?
			.filter(LoginCredentials::is_complete)
			.ok_or(Error::InvalidCredentials)?;
		let token = self.login.login(&credentials).await?.into_token()?;

		self.provider.save_token(token.clone()).await?;
		obs::record_decision(Decision::RefreshSucceeded);

		Ok(token)
	}

	async fn handle_failure(&self, error: Error) {
		obs::record_decision_error(Decision::RefreshFailed, &error);

		if !error.requires_logout() {
			return;
		}
		if let Err(e) = self.provider.clear_all_tokens().await {
			obs::record_decision_error(Decision::StoreDegraded, &e);
		}
	}

	/// Stored token when it is still valid and differs from the one the failed request used.
	async fn newer_stored_token(&self, presented: Option<&str>) -> Option<Secret> {
		let session = self.provider.session().await.ok().flatten()?;

		if !session.is_valid_at(self.provider.now(), self.provider.policy().session_ttl) {
			return None;
		}
		if presented == Some(session.token.expose()) {
			return None;
		}

		Some(session.token)
	}

	async fn valid_token(&self) -> Option<Secret> {
		if self.provider.is_token_valid().await {
			self.provider.access_token().await.ok().flatten()
		} else {
			None
		}
	}
}
impl Debug for Authenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authenticator")
			.field("provider", &self.provider)
			.field("refresh_generation", &self.refresh_generation())
			.finish()
	}
}
