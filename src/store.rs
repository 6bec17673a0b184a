//! Credential storage contract and built-in key-value store implementations.
//!
//! Stores persist five string entries under fixed key names (see [`keys`]). Encryption at rest
//! belongs to the backend: wrap a platform keystore behind [`CredentialStore`] to get it; the
//! bundled [`MemoryStore`] and [`FileStore`] keep plaintext values and are meant for tests,
//! demos, and hosts that encrypt the whole volume.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{LoginCredentials, Secret, SessionRecord, UserData},
};

/// Fixed key names used by the persisted layout.
pub mod keys {
	/// Bearer token.
	pub const AUTH_TOKEN: &str = "auth_token";
	/// Login instant as unix milliseconds.
	pub const LOGIN_TIMESTAMP: &str = "login_timestamp";
	/// Merchant company identifier.
	pub const COMPANY_ID: &str = "company_id";
	/// Username.
	pub const USERNAME: &str = "username";
	/// Password.
	pub const PASSWORD: &str = "password";
}

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for the session's credentials and bearer token.
///
/// Implementations must be shareable across tasks; every operation may be invoked concurrently
/// from whichever task is handling an auth challenge.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Returns the stored bearer token, if any.
	fn auth_token(&self) -> StoreFuture<'_, Option<Secret>>;

	/// Stores a bearer token together with the instant of the login that produced it.
	fn save_auth_token(&self, token: Secret, login_at: OffsetDateTime) -> StoreFuture<'_, ()>;

	/// Returns the instant of the last successful login, if any.
	fn login_timestamp(&self) -> StoreFuture<'_, Option<OffsetDateTime>>;

	/// Returns the stored company/username pair, if both are present.
	fn user_data(&self) -> StoreFuture<'_, Option<UserData>>;

	/// Returns the stored password, if any.
	fn password(&self) -> StoreFuture<'_, Option<Secret>>;

	/// Stores the credential triple used for silent re-authentication.
	fn save_login_credentials(&self, credentials: LoginCredentials) -> StoreFuture<'_, ()>;

	/// Removes every stored entry: token, timestamp, user data, and password.
	fn clear_all_data(&self) -> StoreFuture<'_, ()>;

	/// Removes the credential triple while leaving the current token in place.
	fn clear_login_credentials(&self) -> StoreFuture<'_, ()>;

	/// Returns the token and its login instant when both are stored.
	fn session(&self) -> StoreFuture<'_, Option<SessionRecord>> {
		Box::pin(async move {
			let token = self.auth_token().await?;
			let login_at = self.login_timestamp().await?;

			Ok(token.zip(login_at).map(|(token, login_at)| SessionRecord { token, login_at }))
		})
	}

	/// Returns `true` when a token exists and `now - login_at < ttl`.
	fn is_session_valid(&self, ttl: Duration, now: OffsetDateTime) -> StoreFuture<'_, bool> {
		Box::pin(async move {
			Ok(self.session().await?.is_some_and(|session| session.is_valid_at(now, ttl)))
		})
	}

	/// Returns the full credential triple when user data and password are both stored.
	fn login_credentials(&self) -> StoreFuture<'_, Option<LoginCredentials>> {
		Box::pin(async move {
			let user = self.user_data().await?;
			let password = self.password().await?;

			Ok(user.zip(password).map(|(user, password)| LoginCredentials::from_parts(user, password)))
		})
	}
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Flat key-value view shared by the bundled stores.
pub(crate) type Entries = BTreeMap<String, String>;

pub(crate) fn read_secret(entries: &Entries, key: &str) -> Option<Secret> {
	entries.get(key).map(|value| Secret::new(value.as_str()))
}

pub(crate) fn read_timestamp(entries: &Entries) -> Result<Option<OffsetDateTime>, StoreError> {
	let Some(raw) = entries.get(keys::LOGIN_TIMESTAMP) else {
		return Ok(None);
	};
	let millis = raw.parse::<i64>().map_err(|e| StoreError::Serialization {
		message: format!("Stored login timestamp `{raw}` is not an integer: {e}"),
	})?;
	let instant = OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
		.map_err(|e| StoreError::Serialization {
			message: format!("Stored login timestamp `{raw}` is out of range: {e}"),
		})?;

	Ok(Some(instant))
}

pub(crate) fn read_user_data(entries: &Entries) -> Option<UserData> {
	let company_id = entries.get(keys::COMPANY_ID)?;
	let username = entries.get(keys::USERNAME)?;

	Some(UserData::new(company_id.as_str(), username.as_str()))
}

pub(crate) fn write_token(entries: &mut Entries, token: Secret, login_at: OffsetDateTime) {
	let millis = login_at.unix_timestamp_nanos() / 1_000_000;

	entries.insert(keys::AUTH_TOKEN.into(), token.expose().to_owned());
	entries.insert(keys::LOGIN_TIMESTAMP.into(), millis.to_string());
}

pub(crate) fn write_credentials(entries: &mut Entries, credentials: LoginCredentials) {
	entries.insert(keys::COMPANY_ID.into(), credentials.company_id);
	entries.insert(keys::USERNAME.into(), credentials.username);
	entries.insert(keys::PASSWORD.into(), credentials.password.expose().to_owned());
}

pub(crate) fn remove_credentials(entries: &mut Entries) {
	entries.remove(keys::COMPANY_ID);
	entries.remove(keys::USERNAME);
	entries.remove(keys::PASSWORD);
}
