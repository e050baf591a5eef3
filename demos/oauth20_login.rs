//! Drives an OAuth 2.0 login service against a local mock provider: redirect, callback,
//! profile normalization, and the derived user identity.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use oauth_relay::{
	auth::{ClientCredentials, ProviderId, ScopeSet, ServiceId},
	flows::OAuth20Client,
	http::ReqwestHttpClient,
	protocol::{self, Params},
	provider::{AppSecretProofStrategy, ProtocolVersion, ProviderDescriptor},
	reqwest::Client,
	service::{
		AttributeMap, AuthStep, ExternalAuthService, OAuthService, ProfileRequest, ServiceConfig,
	},
	store::{MemoryStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":5183999}",
			);
		})
		.await;
	let profile_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/graph/me").query_param_exists("appsecret_proof");
			then.status(200).header("content-type", "application/json").body(
				"{\"id\":\"10001\",\"first_name\":\"Ada\",\"last_name\":\"Lovelace\",\"email\":\"ada@example.com\"}",
			);
		})
		.await;
	let descriptor =
		ProviderDescriptor::builder(ProviderId::new("demo-graph")?, ProtocolVersion::OAuth20)
			.authorization_endpoint(Url::parse(&server.url("/dialog/oauth"))?)
			.access_token_endpoint(Url::parse(&server.url("/oauth/access_token"))?)
			.api_base(Url::parse(&server.url("/graph"))?)
			.scope(ScopeSet::new(["email", "public_profile"])?)
			.build()?;
	let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::default());
	let transport = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let client = <OAuth20Client<ReqwestHttpClient>>::with_transport(
		descriptor,
		ClientCredentials::new("demo-app", "demo-app-secret"),
		store,
		transport,
	)?
	.with_callback_url(Url::parse("https://app.example.com/login/graph")?)
	.with_strategy(Arc::new(AppSecretProofStrategy));
	let config = ServiceConfig::new(
		ServiceId::new("graph")?,
		"Demo Graph",
		Url::parse("https://app.example.com/welcome")?,
		Url::parse("https://app.example.com/login")?,
		ProfileRequest::get("me").with_param("fields", "id,first_name,last_name,email"),
	)
	.with_attribute_map(
		[("id", "id"), ("first_name", "first_name"), ("last_name", "last_name"), ("email", "email")]
			.into_iter()
			.collect::<AttributeMap>(),
	);
	let service = <OAuthService<OAuth20Client<ReqwestHttpClient>>>::new(config, client);
	let AuthStep::Redirect(url) = service.resume(&Params::new()).await? else {
		return Ok(());
	};

	println!("Send your user to {url}.");

	// Simulate the provider redirecting back with a code and the issued state.
	let state = protocol::parse_query_string(url.query().unwrap_or_default())
		.get("state")
		.map(str::to_owned)
		.unwrap_or_default();
	let callback = Params::new().with("code", "demo-code").with("state", state);

	if service.authenticate(&callback).await? {
		let identity = service.create_user_identity().await?;

		println!("Signed in {} ({}) via {}.", identity.name, identity.id, service.title());
		println!("Continue at {}.", service.redirect_success());
	} else {
		println!("Attempt ended in state {}.", service.status().await?);
	}

	token_mock.assert_async().await;
	profile_mock.assert_async().await;

	Ok(())
}
