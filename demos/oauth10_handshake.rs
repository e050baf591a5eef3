//! Runs the OAuth 1.0a three-legged handshake against a local mock provider, parking the
//! request token in a file-backed store the way separate callback workers would share it.

// std
use std::{env, fs, process, sync::Arc};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use oauth_relay::{
	auth::{ClientCredentials, ProviderId},
	client::OAuthClient,
	flows::{HmacSha256, OAuth10Client},
	http::{HttpMethod, ReqwestHttpClient},
	protocol::Params,
	provider::{ProtocolVersion, ProviderDescriptor},
	reqwest::Client,
	store::{FileStore, SessionStore},
};

fn client(
	descriptor: ProviderDescriptor,
	store: Arc<dyn SessionStore>,
) -> Result<OAuth10Client<ReqwestHttpClient>> {
	let transport = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let client = <OAuth10Client<ReqwestHttpClient>>::with_transport(
		descriptor,
		ClientCredentials::new("demo-consumer", "demo-consumer-secret"),
		store,
		transport,
	)?
	.with_callback_url(Url::parse("https://app.example.com/login/legacy")?)
	.with_signature_method(Arc::new(HmacSha256))?;

	Ok(client)
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let request_token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/request_token").header_exists("authorization");
			then.status(200)
				.header("content-type", "application/x-www-form-urlencoded")
				.body(
					"oauth_token=demo-request&oauth_token_secret=demo-request-secret\
					 &oauth_callback_confirmed=true",
				);
		})
		.await;
	let access_token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token").header_exists("authorization");
			then.status(200)
				.header("content-type", "application/x-www-form-urlencoded")
				.body(
					"oauth_token=demo-access&oauth_token_secret=demo-access-secret&screen_name=ada",
				);
		})
		.await;
	let api_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/1.1/account/verify_credentials.json")
				.query_param("oauth_token", "demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":42,\"screen_name\":\"ada\"}");
		})
		.await;
	let descriptor =
		ProviderDescriptor::builder(ProviderId::new("demo-legacy")?, ProtocolVersion::OAuth10a)
			.request_token_endpoint(Url::parse(&server.url("/oauth/request_token"))?)
			.authorization_endpoint(Url::parse(&server.url("/oauth/authorize"))?)
			.access_token_endpoint(Url::parse(&server.url("/oauth/access_token"))?)
			.api_base(Url::parse(&server.url("/1.1"))?)
			.build()?;
	let path = env::temp_dir().join(format!("oauth_relay_demo_{}.json", process::id()));
	// Login request: park the request token and redirect.
	let login = client(descriptor.clone(), Arc::new(FileStore::open(&path)?))?;
	let request_token = login.fetch_request_token(Params::new()).await?;

	println!("Send your user to {}.", login.auth_url_for(&request_token, Params::new()));

	drop(login);

	// Callback request: a fresh client over the same file picks the flow up.
	let callback = client(descriptor, Arc::new(FileStore::open(&path)?))?;
	let params = Params::new()
		.with("oauth_token", request_token.token().expose())
		.with("oauth_verifier", "demo-verifier");
	let access_token = callback.fetch_access_token(&params, Params::new()).await?;

	println!(
		"Access token for {:?}: {}.",
		access_token.param("screen_name"),
		access_token.token().expose()
	);

	let profile =
		callback.api("account/verify_credentials.json", HttpMethod::Get, Params::new()).await?;

	println!("Verified profile: {profile}.");

	request_token_mock.assert_async().await;
	access_token_mock.assert_async().await;
	api_mock.assert_async().await;

	fs::remove_file(&path)?;

	Ok(())
}
