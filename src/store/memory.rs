//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{LoginCredentials, Secret, UserData},
	store::{self, CredentialStore, Entries, StoreError, StoreFuture, keys},
};

type StoreMap = Arc<RwLock<Entries>>;

/// Thread-safe storage backend that keeps entries in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns a copy of the raw key-value entries.
	pub fn snapshot(&self) -> BTreeMap<String, String> {
		self.0.read().clone()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn read_now<T>(map: &StoreMap, f: impl FnOnce(&Entries) -> T) -> T {
		f(&map.read())
	}

	fn write_now(map: &StoreMap, f: impl FnOnce(&mut Entries)) -> Result<(), StoreError> {
		f(&mut map.write());

		Ok(())
	}
}
impl CredentialStore for MemoryStore {
	fn auth_token(&self) -> StoreFuture<'_, Option<Secret>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::read_now(&map, |e| store::read_secret(e, keys::AUTH_TOKEN))) })
	}

	fn save_auth_token(&self, token: Secret, login_at: OffsetDateTime) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::write_now(&map, |e| store::write_token(e, token, login_at)) })
	}

	fn login_timestamp(&self) -> StoreFuture<'_, Option<OffsetDateTime>> {
		let map = self.0.clone();

		Box::pin(async move { Self::read_now(&map, store::read_timestamp) })
	}

	fn user_data(&self) -> StoreFuture<'_, Option<UserData>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::read_now(&map, store::read_user_data)) })
	}

	fn password(&self) -> StoreFuture<'_, Option<Secret>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::read_now(&map, |e| store::read_secret(e, keys::PASSWORD))) })
	}

	fn save_login_credentials(&self, credentials: LoginCredentials) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::write_now(&map, |e| store::write_credentials(e, credentials)) })
	}

	fn clear_all_data(&self) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::write_now(&map, Entries::clear) })
	}

	fn clear_login_credentials(&self) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::write_now(&map, store::remove_credentials) })
	}
}
