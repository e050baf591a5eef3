//! Persisted login attempt records and their lifecycle states.

// self
use crate::_prelude::*;

/// Where a login attempt stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
	/// No attempt in progress (or the previous one expired).
	NotStarted,
	/// The user was sent to the provider.
	Redirected,
	/// The provider redirected back and the grant is being exchanged.
	CallbackReceived,
	/// A durable access token was obtained.
	Authenticated,
	/// The user refused the authorization.
	Canceled,
	/// The exchange failed.
	Failed,
}
impl AttemptState {
	/// Stable label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::NotStarted => "not_started",
			Self::Redirected => "redirected",
			Self::CallbackReceived => "callback_received",
			Self::Authenticated => "authenticated",
			Self::Canceled => "canceled",
			Self::Failed => "failed",
		}
	}

	/// Returns `true` once no further step changes the outcome.
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Authenticated | Self::Canceled | Self::Failed)
	}
}
impl Display for AttemptState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Persisted `{state, payload, expiry}` record of one login attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
	/// Current state.
	pub state: AttemptState,
	/// Data carried between steps (cached attributes, failure details).
	#[serde(default)]
	pub payload: BTreeMap<String, Value>,
	/// Instant after which the record is treated as [`AttemptState::NotStarted`].
	pub expires_at: OffsetDateTime,
}
impl FlowRecord {
	/// Fresh record in `state` living for `ttl` from `now`.
	pub fn new(state: AttemptState, ttl: Duration, now: OffsetDateTime) -> Self {
		Self { state, payload: BTreeMap::new(), expires_at: now + ttl }
	}

	/// Returns `true` if the record lapsed at `now`.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at <= now
	}

	/// State as seen at `now`; lapsed records read as not started.
	pub fn effective_state(&self, now: OffsetDateTime) -> AttemptState {
		if self.is_expired_at(now) { AttemptState::NotStarted } else { self.state }
	}

	/// Moves to `state`, extending the lifetime by `ttl` from `now`.
	pub fn advance(&mut self, state: AttemptState, ttl: Duration, now: OffsetDateTime) {
		self.state = state;
		self.expires_at = now + ttl;
	}
}
