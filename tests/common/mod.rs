//! Shared fixtures for the integration suite.

#![allow(dead_code)]

// std
use std::sync::{
	Arc,
	atomic::{AtomicBool, AtomicUsize, Ordering},
};
// crates.io
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime};
// self
use session_broker::{
	auth::{LoginCredentials, Secret, UserData},
	authenticator::Authenticator,
	clock::{Clock, ManualClock},
	config::RefreshPolicy,
	error::{Error, TransientError, TransportError},
	http::FailedResponse,
	http_types::{Request, StatusCode, header::AUTHORIZATION},
	login::{LoginClient, LoginFuture, LoginResponse},
	provider::TokenProvider,
	store::{CredentialStore, MemoryStore, StoreError, StoreFuture},
};

/// Scripted reply produced by [`ScriptedLoginClient`].
#[derive(Clone, Debug)]
pub enum ScriptedLogin {
	Token(&'static str),
	EmptyPayload,
	Status(u16),
	NetworkDown,
}

/// In-process login endpoint that replays a fixed reply and instruments call overlap.
#[derive(Debug)]
pub struct ScriptedLoginClient {
	reply: Mutex<ScriptedLogin>,
	latency: std::time::Duration,
	calls: AtomicUsize,
	in_flight: AtomicUsize,
	max_in_flight: AtomicUsize,
	events: Mutex<Vec<String>>,
	seen: Mutex<Vec<LoginCredentials>>,
}
impl ScriptedLoginClient {
	pub fn new(reply: ScriptedLogin) -> Self {
		Self {
			reply: Mutex::new(reply),
			latency: std::time::Duration::from_millis(50),
			calls: AtomicUsize::new(0),
			in_flight: AtomicUsize::new(0),
			max_in_flight: AtomicUsize::new(0),
			events: Mutex::new(Vec::new()),
			seen: Mutex::new(Vec::new()),
		}
	}

	pub fn set_reply(&self, reply: ScriptedLogin) {
		*self.reply.lock() = reply;
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn max_in_flight(&self) -> usize {
		self.max_in_flight.load(Ordering::SeqCst)
	}

	/// `start:N` / `end:N` markers in the order they happened.
	pub fn events(&self) -> Vec<String> {
		self.events.lock().clone()
	}

	pub fn seen(&self) -> Vec<LoginCredentials> {
		self.seen.lock().clone()
	}
}
impl LoginClient for ScriptedLoginClient {
	fn login<'a>(&'a self, credentials: &'a LoginCredentials) -> LoginFuture<'a> {
		Box::pin(async move {
			let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
			let overlapping = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;

			self.max_in_flight.fetch_max(overlapping, Ordering::SeqCst);
			self.events.lock().push(format!("start:{call}"));
			self.seen.lock().push(credentials.clone());

			let reply = self.reply.lock().clone();

			tokio::time::sleep(self.latency).await;
			self.in_flight.fetch_sub(1, Ordering::SeqCst);
			self.events.lock().push(format!("end:{call}"));

			match reply {
				ScriptedLogin::Token(token) => Ok(LoginResponse::with_token(token)),
				ScriptedLogin::EmptyPayload => Ok(LoginResponse::default()),
				ScriptedLogin::Status(status) if status == 401 || status == 403 =>
					Err(Error::SessionRejected { status }),
				ScriptedLogin::Status(status) => Err(TransientError::LoginEndpoint {
					message: "scripted failure".into(),
					status: Some(status),
					retry_after: None,
				}
				.into()),
				ScriptedLogin::NetworkDown => Err(TransportError::Io(std::io::Error::other(
					"connection refused",
				))
				.into()),
			}
		})
	}
}

/// Store wrapper whose reads or writes can be switched to fail.
#[derive(Debug)]
pub struct FlakyStore {
	inner: Arc<MemoryStore>,
	fail_reads: AtomicBool,
	fail_writes: AtomicBool,
}
impl FlakyStore {
	pub fn new(inner: Arc<MemoryStore>) -> Self {
		Self { inner, fail_reads: AtomicBool::new(false), fail_writes: AtomicBool::new(false) }
	}

	pub fn fail_reads(&self, fail: bool) {
		self.fail_reads.store(fail, Ordering::SeqCst);
	}

	pub fn fail_writes(&self, fail: bool) {
		self.fail_writes.store(fail, Ordering::SeqCst);
	}

	fn check(flag: &AtomicBool, op: &str) -> Result<(), StoreError> {
		if flag.load(Ordering::SeqCst) {
			return Err(StoreError::Backend { message: format!("{op} unavailable") });
		}

		Ok(())
	}

	fn read<'a, T>(&'a self, f: StoreFuture<'a, T>) -> StoreFuture<'a, T>
	where
		T: 'a,
	{
		Box::pin(async move {
			Self::check(&self.fail_reads, "read")?;

			f.await
		})
	}

	fn write<'a>(&'a self, f: StoreFuture<'a, ()>) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			Self::check(&self.fail_writes, "write")?;

			f.await
		})
	}
}
impl CredentialStore for FlakyStore {
	fn auth_token(&self) -> StoreFuture<'_, Option<Secret>> {
		self.read(self.inner.auth_token())
	}

	fn save_auth_token(&self, token: Secret, login_at: OffsetDateTime) -> StoreFuture<'_, ()> {
		self.write(self.inner.save_auth_token(token, login_at))
	}

	fn login_timestamp(&self) -> StoreFuture<'_, Option<OffsetDateTime>> {
		self.read(self.inner.login_timestamp())
	}

	fn user_data(&self) -> StoreFuture<'_, Option<UserData>> {
		self.read(self.inner.user_data())
	}

	fn password(&self) -> StoreFuture<'_, Option<Secret>> {
		self.read(self.inner.password())
	}

	fn save_login_credentials(&self, credentials: LoginCredentials) -> StoreFuture<'_, ()> {
		self.write(self.inner.save_login_credentials(credentials))
	}

	fn clear_all_data(&self) -> StoreFuture<'_, ()> {
		self.write(self.inner.clear_all_data())
	}

	fn clear_login_credentials(&self) -> StoreFuture<'_, ()> {
		self.write(self.inner.clear_login_credentials())
	}
}

/// Fully wired authenticator fixture.
pub struct Harness {
	pub store: Arc<MemoryStore>,
	pub clock: Arc<ManualClock>,
	pub provider: Arc<TokenProvider>,
	pub login: Arc<ScriptedLoginClient>,
	pub authenticator: Arc<Authenticator>,
}

pub fn build_harness(reply: ScriptedLogin) -> Harness {
	build_harness_with_policy(reply, RefreshPolicy::testing())
}

pub fn build_harness_with_policy(reply: ScriptedLogin, policy: RefreshPolicy) -> Harness {
	let store = Arc::new(MemoryStore::default());
	let store_dyn: Arc<dyn CredentialStore> = store.clone();

	build_harness_over(reply, policy, store, store_dyn)
}

/// Harness whose provider talks to a [`FlakyStore`] over the inspected memory store.
pub fn build_flaky_harness(reply: ScriptedLogin) -> (Harness, Arc<FlakyStore>) {
	let store = Arc::new(MemoryStore::default());
	let flaky = Arc::new(FlakyStore::new(store.clone()));
	let store_dyn: Arc<dyn CredentialStore> = flaky.clone();

	(build_harness_over(reply, RefreshPolicy::testing(), store, store_dyn), flaky)
}

fn build_harness_over(
	reply: ScriptedLogin,
	policy: RefreshPolicy,
	store: Arc<MemoryStore>,
	store_dyn: Arc<dyn CredentialStore>,
) -> Harness {
	// Stores keep millisecond precision; start on a whole second so timestamps compare exactly.
	let start = OffsetDateTime::from_unix_timestamp(OffsetDateTime::now_utc().unix_timestamp())
		.expect("Current time should be representable.");
	let clock = Arc::new(ManualClock::new(start));
	let clock_dyn: Arc<dyn Clock> = clock.clone();
	let provider = Arc::new(TokenProvider::with_clock(store_dyn, policy, clock_dyn));
	let login = Arc::new(ScriptedLoginClient::new(reply));
	let login_dyn: Arc<dyn LoginClient> = login.clone();
	let authenticator = Arc::new(Authenticator::new(provider.clone(), login_dyn));

	Harness { store, clock, provider, login, authenticator }
}

pub fn acme_credentials() -> LoginCredentials {
	LoginCredentials::new("ACME", "bob", "secret")
}

/// Stores the ACME credentials and a token issued `age` ago on the harness clock.
pub async fn seed_session(harness: &Harness, token: &str, age: Duration) {
	harness
		.store
		.save_login_credentials(acme_credentials())
		.await
		.expect("Failed to seed login credentials.");
	harness
		.store
		.save_auth_token(Secret::new(token), harness.clock.now() - age)
		.await
		.expect("Failed to seed auth token.");
}

/// Authenticated API request carrying `token`.
pub fn api_request(token: &str) -> Request<Vec<u8>> {
	Request::builder()
		.method("POST")
		.uri("https://api.example.com/v1/balance?merchant=42")
		.header(AUTHORIZATION, format!("Bearer {token}"))
		.header("x-request-id", "req-7")
		.body(b"{\"from\":\"2025-01-01\"}".to_vec())
		.expect("Fixture request should build.")
}

pub fn challenge(status: u16, token: &str) -> FailedResponse<Vec<u8>> {
	FailedResponse::new(
		StatusCode::from_u16(status).expect("Fixture status should be valid."),
		api_request(token),
	)
}

pub fn authorization(request: &Request<Vec<u8>>) -> Option<&str> {
	request.headers().get(AUTHORIZATION).and_then(|value| value.to_str().ok())
}
