//! Token provider bridging the credential store, the refresh limiter, and the policy clock.
//!
//! The provider answers the authenticator's questions ("may we refresh?", "can we refresh?")
//! and performs the bookkeeping around a refresh (attempt accounting, token persistence, and
//! session teardown). Boolean queries never fail: a store error is logged and the most
//! conservative answer is returned.

// self
use crate::{
	_prelude::*,
	auth::{LoginCredentials, Secret, SessionRecord, SessionStatus},
	clock::{self, Clock},
	config::RefreshPolicy,
	limiter::RefreshLimiter,
	obs::{self, Decision},
	store::{CredentialStore, StoreError},
};

/// Composes a [`CredentialStore`] with a [`RefreshLimiter`] under one [`RefreshPolicy`].
pub struct TokenProvider {
	store: Arc<dyn CredentialStore>,
	policy: RefreshPolicy,
	clock: Arc<dyn Clock>,
	limiter: RefreshLimiter,
}
impl TokenProvider {
	/// Creates a provider driven by the system clock.
	pub fn new(store: Arc<dyn CredentialStore>, policy: RefreshPolicy) -> Self {
		Self::with_clock(store, policy, clock::system_clock())
	}

	/// Creates a provider driven by a caller-supplied clock.
	pub fn with_clock(
		store: Arc<dyn CredentialStore>,
		policy: RefreshPolicy,
		clock: Arc<dyn Clock>,
	) -> Self {
		let limiter = RefreshLimiter::new(policy.max_attempts, policy.cooldown);

		Self { store, policy, clock, limiter }
	}

	/// Policy this provider enforces.
	pub fn policy(&self) -> &RefreshPolicy {
		&self.policy
	}

	/// Underlying credential store.
	pub fn store(&self) -> &Arc<dyn CredentialStore> {
		&self.store
	}

	/// Current instant according to the provider's clock.
	pub fn now(&self) -> OffsetDateTime {
		self.clock.now()
	}

	/// Returns the stored bearer token, if any.
	pub async fn access_token(&self) -> Result<Option<Secret>> {
		Ok(self.store.auth_token().await?)
	}

	/// Returns the stored session, if a token and its login instant are both present.
	pub async fn session(&self) -> Result<Option<SessionRecord>> {
		Ok(self.store.session().await?)
	}

	/// Returns `false` when no token is stored or the session outlived its TTL.
	pub async fn is_token_valid(&self) -> bool {
		match self.store.is_session_valid(self.policy.session_ttl, self.now()).await {
			Ok(valid) => valid,
			Err(e) => degrade(e, false),
		}
	}

	/// Returns `true` when the token is invalid, has no login instant, or is inside the
	/// proactive refresh threshold.
	pub async fn needs_refresh(&self) -> bool {
		match self.store.session().await {
			Ok(Some(session)) => !matches!(
				session.status_at(
					self.now(),
					self.policy.session_ttl,
					self.policy.refresh_threshold
				),
				SessionStatus::Active
			),
			Ok(None) => true,
			Err(e) => degrade(e, true),
		}
	}

	/// Time left before the stored session expires; negative once expired.
	pub async fn remaining_lifetime(&self) -> Result<Option<Duration>> {
		let session = self.session().await?;

		Ok(session.map(|session| session.remaining_at(self.now(), self.policy.session_ttl)))
	}

	/// Returns the stored credential triple, if present.
	pub async fn login_credentials(&self) -> Result<Option<LoginCredentials>> {
		Ok(self.store.login_credentials().await?)
	}

	/// Returns `true` only when company id, username, and password are all stored and non-blank.
	pub async fn has_credentials_for_refresh(&self) -> bool {
		match self.store.login_credentials().await {
			Ok(credentials) => credentials.is_some_and(|c| c.is_complete()),
			Err(e) => degrade(e, false),
		}
	}

	/// Returns `true` while the attempt budget for the current cooldown window is not spent.
	pub fn can_attempt_refresh(&self) -> bool {
		self.limiter.can_attempt(self.now())
	}

	/// Counts one refresh attempt; call it before the login request goes out.
	pub fn record_refresh_attempt(&self) -> u32 {
		self.limiter.record_attempt(self.now())
	}

	/// Attempts counting against the current window.
	pub fn attempts(&self) -> u32 {
		self.limiter.attempts_at(self.now())
	}

	/// Persists a freshly obtained token stamped with the current instant and forgives prior
	/// failed attempts.
	pub async fn save_token(&self, token: Secret) -> Result<()> {
		self.store.save_auth_token(token, self.now()).await?;
		self.limiter.reset();

		Ok(())
	}

	/// Records the outcome of an interactive login: credentials for later silent refreshes plus
	/// the token they produced.
	pub async fn save_login(&self, credentials: LoginCredentials, token: Secret) -> Result<()> {
		self.store.save_login_credentials(credentials).await?;
		self.save_token(token).await
	}

	/// Wipes the token, user data, and credentials, and resets the attempt counter.
	pub async fn clear_all_tokens(&self) -> Result<()> {
		self.limiter.reset();
		self.store.clear_all_data().await?;
		self.store.clear_login_credentials().await?;

		obs::record_decision(Decision::SessionCleared);

		Ok(())
	}
}
impl Debug for TokenProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenProvider")
			.field("policy", &self.policy)
			.field("limiter", &self.limiter)
			.finish()
	}
}

fn degrade<T>(error: StoreError, fallback: T) -> T {
	obs::record_decision_error(Decision::StoreDegraded, &error);

	fallback
}
