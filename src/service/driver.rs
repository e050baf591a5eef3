//! Protocol adapters that let one login service drive either OAuth revision.

// self
use crate::{
	_prelude::*,
	auth::OAuthToken,
	client::{ClientFuture, OAuthClient},
	error::ProtocolError,
	flows::{OAuth10Client, OAuth20Client},
	http::HttpTransport,
	protocol::Params,
	store::{SessionStore, StoreSlot},
};

/// What the provider's redirect carried back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackKind {
	/// No provider parameters: the attempt has to start (or restart) with a redirect.
	Absent,
	/// The user refused.
	Canceled {
		/// Cancellation reason reported by the provider.
		reason: String,
	},
	/// A grant (`oauth_token`/`oauth_verifier` or `code`) ready for exchange.
	Grant,
	/// The provider reported a failure other than a refusal.
	Error {
		/// Provider error code.
		error: String,
		/// Provider description.
		description: Option<String>,
	},
}

/// Redirect-driven handshake over an [`OAuthClient`].
pub trait AuthDriver
where
	Self: OAuthClient,
{
	/// Store holding the driver's tokens and transient state.
	fn session_store(&self) -> &Arc<dyn SessionStore>;

	/// Classifies the inbound request parameters.
	fn classify_callback(&self, params: &Params) -> CallbackKind;

	/// Prepares transient state and returns the provider URL to redirect the user to.
	fn begin(&self, extra: Params) -> ClientFuture<'_, Url>;

	/// Exchanges the grant carried by `params` and persists the access token.
	fn complete<'a>(&'a self, params: &'a Params) -> ClientFuture<'a, OAuthToken>;

	/// Drops transient state of an abandoned handshake.
	fn abandon(&self) -> ClientFuture<'_, ()>;
}

impl<C> AuthDriver for OAuth10Client<C>
where
	C: ?Sized + HttpTransport,
{
	fn session_store(&self) -> &Arc<dyn SessionStore> {
		&self.core().store
	}

	fn classify_callback(&self, params: &Params) -> CallbackKind {
		let core = self.core();

		if let Some(reason) = core.strategy.cancellation(core.descriptor.protocol, params) {
			return CallbackKind::Canceled { reason };
		}
		// Problem-reporting extension used by several OAuth 1.0 providers.
		if let Some(problem) = params.get("oauth_problem") {
			return CallbackKind::Error {
				error: problem.to_owned(),
				description: params.get("oauth_problem_advice").map(str::to_owned),
			};
		}

		if params.contains_key("oauth_token") { CallbackKind::Grant } else { CallbackKind::Absent }
	}

	fn begin(&self, extra: Params) -> ClientFuture<'_, Url> {
		Box::pin(async move {
			let token = self.fetch_request_token(Params::new()).await?;

			Ok(self.auth_url_for(&token, extra))
		})
	}

	fn complete<'a>(&'a self, params: &'a Params) -> ClientFuture<'a, OAuthToken> {
		Box::pin(self.fetch_access_token(params, Params::new()))
	}

	fn abandon(&self) -> ClientFuture<'_, ()> {
		Box::pin(async move {
			let core = self.core();

			core.store.remove(&core.key(StoreSlot::RequestToken)).await?;

			Ok(())
		})
	}
}

impl<C> AuthDriver for OAuth20Client<C>
where
	C: ?Sized + HttpTransport,
{
	fn session_store(&self) -> &Arc<dyn SessionStore> {
		&self.core().store
	}

	fn classify_callback(&self, params: &Params) -> CallbackKind {
		let core = self.core();

		if let Some(reason) = core.strategy.cancellation(core.descriptor.protocol, params) {
			return CallbackKind::Canceled { reason };
		}
		if let Some(error) = params.get("error") {
			return CallbackKind::Error {
				error: error.to_owned(),
				description: params.get("error_description").map(str::to_owned),
			};
		}

		if params.contains_key("code") { CallbackKind::Grant } else { CallbackKind::Absent }
	}

	fn begin(&self, extra: Params) -> ClientFuture<'_, Url> {
		Box::pin(self.build_auth_url(extra))
	}

	fn complete<'a>(&'a self, params: &'a Params) -> ClientFuture<'a, OAuthToken> {
		Box::pin(async move {
			let code = params.get("code").ok_or(ProtocolError::MissingField { field: "code" })?;

			self.fetch_access_token(code, params.get("state"), Params::new()).await
		})
	}

	fn abandon(&self) -> ClientFuture<'_, ()> {
		Box::pin(async move {
			let core = self.core();

			core.store.remove(&core.key(StoreSlot::AuthState)).await?;

			Ok(())
		})
	}
}
