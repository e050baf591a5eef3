//! Mock-provider fixtures shared by the integration suites.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::MockServer;
// self
use oauth_relay::{
	auth::{ClientCredentials, ProviderId},
	flows::{OAuth10Client, OAuth20Client},
	http::ReqwestHttpClient,
	provider::{ProtocolVersion, ProviderDescriptor},
	reqwest::Client as ReqwestClient,
	store::{MemoryStore, SessionStore},
	url::Url,
};

/// OAuth 1.0a client type used by the reqwest-backed suites.
pub type ReqwestTest10Client = OAuth10Client<ReqwestHttpClient>;
/// OAuth 2.0 client type used by the reqwest-backed suites.
pub type ReqwestTest20Client = OAuth20Client<ReqwestHttpClient>;

/// Callback URL shared by every suite.
pub const TEST_CALLBACK_URL: &str = "https://app.example.com/auth/callback";

/// Builds a reqwest transport that accepts the self-signed certificates `httpmock` serves.
pub fn test_reqwest_http_client() -> ReqwestHttpClient {
	let client = ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

/// Parses the shared callback URL.
pub fn test_callback_url() -> Url {
	Url::parse(TEST_CALLBACK_URL).expect("Test callback URL should parse successfully.")
}

/// Parses a URL served by the mock provider.
pub fn mock_url(server: &MockServer, path: &str) -> Url {
	Url::parse(&server.url(path)).expect("Mock provider URL should parse successfully.")
}

/// OAuth 1.0a descriptor pointing at the mock provider (`/oauth/*` plus an `/api` base).
pub fn oauth10_descriptor(server: &MockServer) -> ProviderDescriptor {
	ProviderDescriptor::builder(
		ProviderId::new("mock-oauth10").expect("Provider identifier should be valid."),
		ProtocolVersion::OAuth10a,
	)
	.request_token_endpoint(mock_url(server, "/oauth/request_token"))
	.authorization_endpoint(mock_url(server, "/oauth/authorize"))
	.access_token_endpoint(mock_url(server, "/oauth/access_token"))
	.api_base(mock_url(server, "/api"))
	.build()
	.expect("OAuth 1.0a descriptor should build successfully.")
}

/// OAuth 2.0 descriptor pointing at the mock provider (`/authorize`, `/token`, `/api`).
pub fn oauth20_descriptor(server: &MockServer) -> ProviderDescriptor {
	ProviderDescriptor::builder(
		ProviderId::new("mock-oauth20").expect("Provider identifier should be valid."),
		ProtocolVersion::OAuth20,
	)
	.authorization_endpoint(mock_url(server, "/authorize"))
	.access_token_endpoint(mock_url(server, "/token"))
	.api_base(mock_url(server, "/api"))
	.build()
	.expect("OAuth 2.0 descriptor should build successfully.")
}

/// OAuth 1.0a client over `store` with the shared callback URL.
pub fn oauth10_client_with_store(
	descriptor: ProviderDescriptor,
	store: Arc<dyn SessionStore>,
) -> ReqwestTest10Client {
	ReqwestTest10Client::with_transport(
		descriptor,
		ClientCredentials::new("consumer-key", "consumer-secret"),
		store,
		test_reqwest_http_client(),
	)
	.expect("OAuth 1.0 test descriptor should match the driver.")
	.with_callback_url(test_callback_url())
}

/// OAuth 2.0 client over `store` with the shared callback URL.
pub fn oauth20_client_with_store(
	descriptor: ProviderDescriptor,
	store: Arc<dyn SessionStore>,
) -> ReqwestTest20Client {
	ReqwestTest20Client::with_transport(
		descriptor,
		ClientCredentials::new("client-it", "secret-it"),
		store,
		test_reqwest_http_client(),
	)
	.expect("OAuth 2.0 test descriptor should match the driver.")
	.with_callback_url(test_callback_url())
}

/// OAuth 1.0a client backed by a fresh in-memory store.
pub fn build_reqwest_test_oauth10(
	descriptor: ProviderDescriptor,
) -> (ReqwestTest10Client, Arc<MemoryStore>) {
	let store = Arc::new(MemoryStore::default());

	(oauth10_client_with_store(descriptor, store.clone()), store)
}

/// OAuth 2.0 client backed by a fresh in-memory store.
pub fn build_reqwest_test_oauth20(
	descriptor: ProviderDescriptor,
) -> (ReqwestTest20Client, Arc<MemoryStore>) {
	let store = Arc::new(MemoryStore::default());

	(oauth20_client_with_store(descriptor, store.clone()), store)
}
