#![cfg(feature = "reqwest")]

mod common;

// std
use std::{env, fs, path::PathBuf, process, sync::Arc};
// crates.io
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime, macros};
// self
use common::*;
use oauth_relay::{
	auth::{OAuthToken, ServiceId},
	protocol::{self, Params},
	service::{AttemptState, FlowRecord},
	store::{FileStore, SessionStore, StoreError, StoreKey, StoreSlot},
};

fn temp_path(label: &str) -> PathBuf {
	env::temp_dir().join(format!(
		"oauth_relay_{label}_{}_{}.json",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	))
}

fn open(path: &PathBuf) -> Arc<dyn SessionStore> {
	Arc::new(FileStore::open(path).expect("File store should open."))
}

#[tokio::test]
async fn typed_values_survive_reopening_the_file() {
	let path = temp_path("typed");
	let key = StoreKey::for_service(
		&ServiceId::new("github").expect("Service identifier should be valid."),
		StoreSlot::Attempt,
	);
	let record = FlowRecord::new(
		AttemptState::Redirected,
		Duration::minutes(15),
		macros::datetime!(2025-11-10 12:00 UTC),
	);

	open(&path).save(&key, &record).await.expect("Record should save.");

	let reopened = open(&path);
	let loaded = reopened
		.load::<FlowRecord>(&key)
		.await
		.expect("Record should load.")
		.expect("Record should survive reopening.");

	assert_eq!(loaded, record);
	assert!(matches!(
		reopened.load::<OAuthToken>(&key).await,
		Err(StoreError::Serialization { .. })
	));
	assert_eq!(
		reopened.take::<FlowRecord>(&key).await.expect("Take should succeed."),
		Some(record)
	);
	assert!(open(&path).load::<FlowRecord>(&key).await.expect("Load should succeed.").is_none());

	fs::remove_file(&path).expect("Temporary store file should be removable.");
}

#[tokio::test]
async fn callbacks_served_by_a_fresh_client_resume_the_flow() {
	let server = MockServer::start_async().await;
	let descriptor = oauth20_descriptor(&server);
	let path = temp_path("handoff");
	let first = oauth20_client_with_store(descriptor.clone(), open(&path));
	let url = first.build_auth_url(Params::new()).await.expect("Authorize URL should build.");
	let state = protocol::parse_query_string(url.query().unwrap_or_default())
		.get("state")
		.expect("Authorize URL should carry a state.")
		.to_owned();

	drop(first);

	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").form_urlencoded_tuple("code", "handoff-code");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-handoff\"}");
		})
		.await;
	let second = oauth20_client_with_store(descriptor, open(&path));
	let token = second
		.fetch_access_token("handoff-code", Some(&state), Params::new())
		.await
		.expect("A fresh client should complete the exchange.");

	token_mock.assert_async().await;

	assert_eq!(token.token().expose(), "access-handoff");
	assert_eq!(token.expires_at(), None);

	fs::remove_file(&path).expect("Temporary store file should be removable.");
}

#[test]
fn corrupt_snapshots_are_reported() {
	let path = temp_path("corrupt");

	fs::write(&path, b"not json").expect("Corrupt fixture should be written.");

	assert!(matches!(FileStore::open(&path), Err(StoreError::Serialization { .. })));

	fs::remove_file(&path).expect("Temporary store file should be removable.");
}
