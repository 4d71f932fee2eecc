//! The session gate: mute check, sliding-window rate accounting, then the
//! authentication gate, in that order.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use super::credentials::CredentialSet;
use super::store::{AuthState, MemorySessionStore, SessionRecord, SessionStore, UserId};
use crate::routing::{Language, detect_language};

/// Default trailing window for rate accounting.
pub const DEFAULT_RATE_WINDOW_MS: u64 = 30_000;

/// Longest accepted window. Larger values fall back to the default.
pub const MAX_RATE_WINDOW_MS: u64 = 86_400_000;

/// Default number of messages allowed inside one window.
pub const DEFAULT_RATE_LIMIT: usize = 5;

/// Rate limiting parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateSettings {
    /// Length of the trailing window. Also the mute duration.
    pub window: TimeDelta,
    /// Messages allowed per window before muting.
    pub limit: usize,
}

impl Default for GateSettings {
    #[allow(clippy::cast_possible_wrap)]
    fn default() -> Self {
        Self {
            window: TimeDelta::milliseconds(DEFAULT_RATE_WINDOW_MS as i64),
            limit: DEFAULT_RATE_LIMIT,
        }
    }
}

impl GateSettings {
    /// Builds settings from a window in milliseconds.
    ///
    /// Windows longer than [`MAX_RATE_WINDOW_MS`] fall back to the default.
    #[must_use]
    pub fn from_millis(window_ms: u64, limit: usize) -> Self {
        let window = Some(window_ms)
            .filter(|ms| *ms <= MAX_RATE_WINDOW_MS)
            .and_then(|ms| i64::try_from(ms).ok())
            .and_then(TimeDelta::try_milliseconds)
            .unwrap_or_else(|| Self::default().window);

        Self { window, limit }
    }
}

/// Outcome of evaluating one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The user is muted; nothing was recorded.
    Muted {
        /// When the mute expires.
        until: DateTime<Utc>,
    },
    /// This message pushed the user over the limit and started a mute.
    RateLimited {
        /// When the mute expires.
        until: DateTime<Utc>,
    },
    /// The user is not authenticated and the text is not a valid credential.
    AuthFailed,
    /// The text was a valid credential; the user is now authenticated.
    AuthSucceeded {
        /// Normalized credential.
        credential_id: String,
        /// Name to greet the user by.
        display_name: String,
    },
    /// Authenticated and within limits.
    Proceed,
}

impl Decision {
    /// Short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Muted { .. } => "muted",
            Self::RateLimited { .. } => "rate_limited",
            Self::AuthFailed => "auth_failed",
            Self::AuthSucceeded { .. } => "auth_succeeded",
            Self::Proceed => "proceed",
        }
    }
}

/// Identity of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Normalized credential.
    pub credential_id: String,
    /// Resolved display name.
    pub display_name: String,
}

/// Per-user gate in front of all message routing.
///
/// `evaluate` performs no I/O and never fails. A `now` earlier than the
/// user's newest recorded timestamp is treated as that timestamp.
#[derive(Debug)]
pub struct SessionGate<S = MemorySessionStore> {
    store: S,
    credentials: CredentialSet,
    settings: GateSettings,
}

impl SessionGate<MemorySessionStore> {
    /// Creates a gate backed by an in-memory store.
    #[must_use]
    pub fn in_memory(credentials: CredentialSet, settings: GateSettings) -> Self {
        Self::new(MemorySessionStore::new(), credentials, settings)
    }
}

impl<S: SessionStore> SessionGate<S> {
    /// Creates a gate over the given store.
    #[must_use]
    pub const fn new(store: S, credentials: CredentialSet, settings: GateSettings) -> Self {
        Self {
            store,
            credentials,
            settings,
        }
    }

    /// Decides what to do with one inbound message.
    pub fn evaluate(&self, user: UserId, text: &str, now: DateTime<Utc>) -> Decision {
        let decision = self
            .store
            .update(user, |record| self.apply(record, text, now));

        match &decision {
            Decision::RateLimited { until } => {
                warn!(user, %until, "User exceeded rate limit, muting");
            }
            Decision::AuthSucceeded { display_name, .. } => {
                info!(user, display_name = %display_name, "User authenticated");
            }
            other => debug!(user, decision = other.label(), "Gate decision"),
        }

        decision
    }

    /// Applies the gate rules to a record. First matching rule wins.
    fn apply(&self, record: &mut SessionRecord, text: &str, now: DateTime<Utc>) -> Decision {
        // Wall clocks can step backwards; the window must stay ordered.
        let now = record.window.back().map_or(now, |last| now.max(*last));

        if let Some(until) = record.muted_until {
            if now < until {
                return Decision::Muted { until };
            }
            record.muted_until = None;
            record.window.clear();
        }

        let horizon = now
            .checked_sub_signed(self.settings.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        while record.window.front().is_some_and(|ts| *ts < horizon) {
            record.window.pop_front();
        }
        record.window.push_back(now);

        if record.window.len() > self.settings.limit {
            let until = now
                .checked_add_signed(self.settings.window)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            record.muted_until = Some(until);
            return Decision::RateLimited { until };
        }

        if record.auth.is_authenticated() {
            return Decision::Proceed;
        }

        match self.credentials.resolve(text) {
            Some(resolved) => {
                record.auth = AuthState::Authenticated {
                    credential_id: resolved.credential_id.clone(),
                    display_name: resolved.display_name.clone(),
                };
                Decision::AuthSucceeded {
                    credential_id: resolved.credential_id,
                    display_name: resolved.display_name,
                }
            }
            None => Decision::AuthFailed,
        }
    }

    /// Returns the user's language, detecting it from `text` the first time.
    pub fn language_for(&self, user: UserId, text: &str) -> Language {
        self.store
            .update(user, |record| *record.language.get_or_insert_with(|| detect_language(text)))
    }

    /// Explicitly changes the user's language.
    pub fn set_language(&self, user: UserId, language: Language) {
        self.store
            .update(user, |record| record.language = Some(language));
        debug!(user, language = %language, "Language changed");
    }

    /// Returns the stored language without detecting one.
    #[must_use]
    pub fn language_of(&self, user: UserId) -> Option<Language> {
        self.store.get(user).and_then(|record| record.language)
    }

    /// Returns who the user authenticated as, if they have.
    #[must_use]
    pub fn identity(&self, user: UserId) -> Option<Identity> {
        let record = self.store.get(user)?;
        match record.auth {
            AuthState::Authenticated {
                credential_id,
                display_name,
            } => Some(Identity {
                credential_id,
                display_name,
            }),
            AuthState::Unauthenticated => None,
        }
    }

    /// Returns a snapshot of the user's record.
    #[cfg(test)]
    pub(crate) fn session(&self, user: UserId) -> Option<SessionRecord> {
        self.store.get(user)
    }

    /// Gate settings in effect.
    #[must_use]
    pub const fn settings(&self) -> GateSettings {
        self.settings
    }

    /// Credential set in effect.
    #[must_use]
    pub const fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }

    /// Number of users seen so far.
    #[must_use]
    pub fn known_users(&self) -> usize {
        self.store.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: UserId = 1001;
    const OTHER: UserId = 2002;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000 + ms).unwrap()
    }

    fn gate() -> SessionGate {
        let credentials = CredentialSet::student_ids([("A1".to_owned(), "Marie".to_owned())]);
        SessionGate::in_memory(credentials, GateSettings::default())
    }

    fn authenticated_gate() -> SessionGate {
        let gate = gate();
        assert!(matches!(
            gate.evaluate(USER, "A1", at(-100_000)),
            Decision::AuthSucceeded { .. }
        ));
        gate
    }

    #[test]
    fn test_auth_succeeds_case_insensitive() {
        let gate = gate();
        assert_eq!(
            gate.evaluate(USER, "  a1 ", at(0)),
            Decision::AuthSucceeded {
                credential_id: "A1".to_owned(),
                display_name: "Marie".to_owned(),
            }
        );
        assert_eq!(
            gate.identity(USER),
            Some(Identity {
                credential_id: "A1".to_owned(),
                display_name: "Marie".to_owned(),
            })
        );
    }

    #[test]
    fn test_auth_failure_keeps_user_unauthenticated() {
        let gate = gate();
        assert_eq!(gate.evaluate(USER, "A2", at(0)), Decision::AuthFailed);
        assert!(gate.identity(USER).is_none());
        assert_eq!(gate.evaluate(USER, "A2", at(10)), Decision::AuthFailed);
    }

    #[test]
    fn test_authenticated_user_is_not_revalidated() {
        let gate = authenticated_gate();
        assert_eq!(gate.evaluate(USER, "A1", at(0)), Decision::Proceed);
        assert_eq!(gate.evaluate(USER, "anything else", at(1)), Decision::Proceed);
        assert!(gate.identity(USER).is_some());
    }

    #[test]
    fn test_sixth_message_in_window_is_rate_limited() {
        let gate = authenticated_gate();
        for _ in 0..5 {
            assert_eq!(gate.evaluate(USER, "hi", at(0)), Decision::Proceed);
        }

        let until = at(100) + TimeDelta::milliseconds(30_000);
        assert_eq!(
            gate.evaluate(USER, "hi", at(100)),
            Decision::RateLimited { until }
        );
        assert_eq!(gate.evaluate(USER, "hi", at(100)), Decision::Muted { until });
        assert_eq!(gate.evaluate(USER, "hi", at(29_999)), Decision::Muted { until });
        assert_eq!(gate.evaluate(USER, "hi", at(30_099)), Decision::Muted { until });
    }

    #[test]
    fn test_mute_expiry_clears_window() {
        let gate = authenticated_gate();
        for _ in 0..6 {
            gate.evaluate(USER, "hi", at(0));
        }
        let until = at(30_000);
        assert_eq!(gate.session(USER).unwrap().muted_until, Some(until));

        assert_eq!(gate.evaluate(USER, "hi", until), Decision::Proceed);
        let record = gate.session(USER).unwrap();
        assert!(record.muted_until.is_none());
        assert_eq!(record.window.len(), 1);
    }

    #[test]
    fn test_muted_calls_do_not_touch_window() {
        let gate = authenticated_gate();
        for _ in 0..6 {
            gate.evaluate(USER, "hi", at(0));
        }
        let before = gate.session(USER).unwrap().window.len();
        for ms in [10, 500, 20_000] {
            gate.evaluate(USER, "hi", at(ms));
        }
        assert_eq!(gate.session(USER).unwrap().window.len(), before);
    }

    #[test]
    fn test_window_only_holds_recent_timestamps() {
        let gate = authenticated_gate();
        for ms in [0, 10_000, 20_000, 30_000, 40_000, 50_000] {
            assert_eq!(gate.evaluate(USER, "hi", at(ms)), Decision::Proceed);
        }

        let window = gate.session(USER).unwrap().window;
        let horizon = at(50_000) - TimeDelta::milliseconds(30_000);
        assert!(window.iter().all(|ts| *ts >= horizon && *ts <= at(50_000)));
        assert_eq!(window.len(), 4);
    }

    #[test]
    fn test_rate_limit_applies_before_authentication() {
        let gate = gate();
        for _ in 0..5 {
            assert_eq!(gate.evaluate(USER, "wrong", at(0)), Decision::AuthFailed);
        }
        assert!(matches!(
            gate.evaluate(USER, "A1", at(1)),
            Decision::RateLimited { .. }
        ));
        assert!(gate.identity(USER).is_none());
    }

    #[test]
    fn test_users_do_not_share_state() {
        let gate = authenticated_gate();
        for _ in 0..6 {
            gate.evaluate(USER, "hi", at(0));
        }
        assert!(matches!(gate.evaluate(USER, "hi", at(1)), Decision::Muted { .. }));

        assert_eq!(gate.evaluate(OTHER, "A1", at(1)), Decision::AuthSucceeded {
            credential_id: "A1".to_owned(),
            display_name: "Marie".to_owned(),
        });
        assert_eq!(gate.evaluate(OTHER, "hi", at(2)), Decision::Proceed);
    }

    #[test]
    fn test_custom_settings() {
        let credentials = CredentialSet::passcode("open");
        let gate = SessionGate::in_memory(credentials, GateSettings::from_millis(1_000, 2));

        assert_eq!(gate.evaluate(USER, "nope", at(0)), Decision::AuthFailed);
        assert!(matches!(gate.evaluate(USER, "OPEN", at(1)), Decision::AuthSucceeded { .. }));
        assert!(matches!(gate.evaluate(USER, "x", at(2)), Decision::RateLimited { .. }));
        assert_eq!(gate.evaluate(USER, "x", at(1_002)), Decision::Proceed);
    }

    #[test]
    fn test_language_is_detected_once() {
        let gate = gate();
        assert_eq!(gate.language_for(USER, "merci"), Language::Fr);
        assert_eq!(gate.language_for(USER, "hello"), Language::Fr);

        gate.set_language(USER, Language::En);
        assert_eq!(gate.language_for(USER, "mèsi"), Language::En);
        assert_eq!(gate.language_of(OTHER), None);
    }

    #[test]
    fn test_settings_from_millis() {
        let settings = GateSettings::from_millis(45_000, 3);
        assert_eq!(settings.window, TimeDelta::milliseconds(45_000));
        assert_eq!(settings.limit, 3);

        let fallback = GateSettings::from_millis(u64::MAX, 3);
        assert_eq!(fallback.window, GateSettings::default().window);

        let too_long = GateSettings::from_millis(9_000_000_000_000_000, 3);
        assert_eq!(too_long.window, GateSettings::default().window);

        let one_day = GateSettings::from_millis(MAX_RATE_WINDOW_MS, 3);
        assert_eq!(one_day.window, TimeDelta::days(1));
    }

    #[test]
    fn test_default_window_matches_constant() {
        assert_eq!(
            GateSettings::default().window.num_milliseconds(),
            i64::try_from(DEFAULT_RATE_WINDOW_MS).unwrap()
        );
    }

    #[test]
    fn test_huge_window_saturates_instead_of_overflowing() {
        let settings = GateSettings {
            window: TimeDelta::MAX,
            limit: 1,
        };
        let gate = SessionGate::in_memory(CredentialSet::passcode("open"), settings);

        assert!(matches!(gate.evaluate(USER, "open", at(0)), Decision::AuthSucceeded { .. }));
        assert_eq!(
            gate.evaluate(USER, "hi", at(1)),
            Decision::RateLimited {
                until: DateTime::<Utc>::MAX_UTC
            }
        );
        assert!(matches!(gate.evaluate(USER, "hi", at(2)), Decision::Muted { .. }));
    }

    #[test]
    fn test_clock_stepping_back_keeps_window_ordered() {
        let gate = authenticated_gate();
        assert_eq!(gate.evaluate(USER, "hi", at(10_000)), Decision::Proceed);
        assert_eq!(gate.evaluate(USER, "hi", at(0)), Decision::Proceed);
        assert_eq!(gate.evaluate(USER, "hi", at(35_000)), Decision::Proceed);

        let window = gate.session(USER).unwrap().window;
        let horizon = at(35_000) - TimeDelta::milliseconds(30_000);
        assert!(window.iter().all(|ts| *ts >= horizon));
        assert!(window.iter().zip(window.iter().skip(1)).all(|(a, b)| a <= b));
        assert_eq!(window.len(), 3);
    }
}
