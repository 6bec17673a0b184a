#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use time::OffsetDateTime;
// self
use session_broker::{
	auth::{LoginCredentials, Secret},
	authenticator::Authenticator,
	config::RefreshPolicy,
	http::AuthorizedClient,
	http_types::{Request, StatusCode},
	login::{LoginClient, ReqwestLoginClient},
	provider::TokenProvider,
	reqwest::Client,
	store::{CredentialStore, MemoryStore},
	url::Url,
};

struct Fixture {
	store: Arc<MemoryStore>,
	client: AuthorizedClient,
}

async fn build_fixture(server: &MockServer) -> Fixture {
	let store = Arc::new(MemoryStore::default());

	store
		.save_login_credentials(LoginCredentials::new("ACME", "bob", "secret"))
		.await
		.expect("Failed to seed login credentials.");
	store
		.save_auth_token(Secret::new("tok-old"), OffsetDateTime::now_utc())
		.await
		.expect("Failed to seed auth token.");

	let store_dyn: Arc<dyn CredentialStore> = store.clone();
	let provider = Arc::new(TokenProvider::new(store_dyn, RefreshPolicy::testing()));
	let login: Arc<dyn LoginClient> = Arc::new(ReqwestLoginClient::new(
		Url::parse(&server.url("/login")).expect("Mock login endpoint should parse successfully."),
	));
	let authenticator = Arc::new(Authenticator::new(provider, login));

	Fixture { store, client: AuthorizedClient::new(Client::new(), authenticator) }
}

fn balance_request(server: &MockServer) -> Request<Vec<u8>> {
	Request::builder()
		.method("GET")
		.uri(server.url("/v1/balance"))
		.header("x-request-id", "req-9")
		.body(Vec::new())
		.expect("Fixture request should build.")
}

#[tokio::test]
async fn rejected_request_is_replayed_with_a_fresh_token() {
	let server = MockServer::start_async().await;
	let fixture = build_fixture(&server).await;
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/balance").header("authorization", "Bearer tok-old");
			then.status(401);
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/balance")
				.header("authorization", "Bearer tok-new")
				.header("x-request-id", "req-9");
			then.status(200).body("{\"balance\":10}");
		})
		.await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/login");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token\":\"tok-new\"}");
		})
		.await;
	let response = fixture
		.client
		.execute(balance_request(&server))
		.await
		.expect("Authorized request should complete.");

	stale.assert_calls_async(1).await;
	login.assert_calls_async(1).await;
	fresh.assert_calls_async(1).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(response.body().as_slice(), b"{\"balance\":10}");
	assert_eq!(
		fixture
			.store
			.auth_token()
			.await
			.expect("Reading the token should succeed.")
			.map(|token| token.expose().to_owned()),
		Some("tok-new".into())
	);
}

#[tokio::test]
async fn rejected_login_surfaces_the_original_challenge() {
	let server = MockServer::start_async().await;
	let fixture = build_fixture(&server).await;
	let api = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/balance");
			then.status(401).body("session expired");
		})
		.await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/login");
			then.status(401);
		})
		.await;
	let response = fixture
		.client
		.execute(balance_request(&server))
		.await
		.expect("Challenge response should be returned, not raised.");

	api.assert_calls_async(1).await;
	login.assert_calls_async(1).await;

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(response.body().as_slice(), b"session expired");
	assert!(fixture.store.is_empty());
}

#[tokio::test]
async fn refreshed_token_rejected_again_is_not_retried_twice() {
	let server = MockServer::start_async().await;
	let fixture = build_fixture(&server).await;
	let api = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/balance");
			then.status(403);
		})
		.await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/login");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token\":\"tok-new\"}");
		})
		.await;
	let response = fixture
		.client
		.execute(balance_request(&server))
		.await
		.expect("Challenge response should be returned, not raised.");

	api.assert_calls_async(2).await;
	login.assert_calls_async(1).await;

	assert_eq!(response.status(), StatusCode::FORBIDDEN);
	assert!(!fixture.store.is_empty());
}
