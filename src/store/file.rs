//! Simple file-backed [`CredentialStore`] for lightweight deployments and bots.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{LoginCredentials, Secret, UserData},
	store::{self, CredentialStore, Entries, StoreError, StoreFuture, keys},
};

/// Persists the key-value entries to a JSON object after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Entries>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Entries, StoreError> {
		if !path.exists() {
			return Ok(Entries::new());
		}

		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(Entries::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &Entries) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	/// Applies `f` to a copy, persists it, and only then publishes it to readers.
	fn mutate(&self, f: impl FnOnce(&mut Entries)) -> Result<(), StoreError> {
		let mut guard = self.inner.write();
		let mut next = guard.clone();

		f(&mut next);
		self.persist_locked(&next)?;
		*guard = next;

		Ok(())
	}
}
impl CredentialStore for FileStore {
	fn auth_token(&self) -> StoreFuture<'_, Option<Secret>> {
		Box::pin(async move { Ok(store::read_secret(&self.inner.read(), keys::AUTH_TOKEN)) })
	}

	fn save_auth_token(&self, token: Secret, login_at: OffsetDateTime) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.mutate(|e| store::write_token(e, token, login_at)) })
	}

	fn login_timestamp(&self) -> StoreFuture<'_, Option<OffsetDateTime>> {
		Box::pin(async move { store::read_timestamp(&self.inner.read()) })
	}

	fn user_data(&self) -> StoreFuture<'_, Option<UserData>> {
		Box::pin(async move { Ok(store::read_user_data(&self.inner.read())) })
	}

	fn password(&self) -> StoreFuture<'_, Option<Secret>> {
		Box::pin(async move { Ok(store::read_secret(&self.inner.read(), keys::PASSWORD)) })
	}

	fn save_login_credentials(&self, credentials: LoginCredentials) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.mutate(|e| store::write_credentials(e, credentials)) })
	}

	fn clear_all_data(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.mutate(Entries::clear) })
	}

	fn clear_login_credentials(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.mutate(store::remove_credentials) })
	}
}
