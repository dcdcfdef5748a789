//! Account lockout state.
//!
//! An account is active when its lockout end is absent or already in the
//! past. Administrators lock an account by pushing the end to a far-future
//! sentinel and unlock it by clearing the value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unix timestamp of 9999-12-31T23:59:59Z.
const FOREVER_SECS: i64 = 253_402_300_799;

/// Optional lockout end timestamp for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lockout(Option<DateTime<Utc>>);

impl Lockout {
    /// An unlocked account.
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    /// A lockout that never expires.
    #[must_use]
    pub fn forever() -> Self {
        Self(Some(
            DateTime::from_timestamp(FOREVER_SECS, 0).unwrap_or(DateTime::<Utc>::MAX_UTC),
        ))
    }

    /// Wrap a stored lockout end.
    #[must_use]
    pub const fn from_end(end: Option<DateTime<Utc>>) -> Self {
        Self(end)
    }

    /// The stored lockout end, if any.
    #[must_use]
    pub const fn end(self) -> Option<DateTime<Utc>> {
        self.0
    }

    /// Whether the account may sign in at `now`.
    #[must_use]
    pub fn is_active_at(self, now: DateTime<Utc>) -> bool {
        self.0.is_none_or(|end| end < now)
    }

    /// Whether the account may sign in right now.
    #[must_use]
    pub fn is_active(self) -> bool {
        self.is_active_at(Utc::now())
    }

    /// The opposite state: locks an active account forever, unlocks a locked one.
    #[must_use]
    pub fn toggled_at(self, now: DateTime<Utc>) -> Self {
        if self.is_active_at(now) {
            Self::forever()
        } else {
            Self::none()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn test_forever_sentinel() {
        let end = Lockout::forever().end().unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_active_states() {
        let now = Utc::now();
        assert!(Lockout::none().is_active_at(now));
        assert!(Lockout::from_end(Some(now - Duration::minutes(5))).is_active_at(now));
        assert!(!Lockout::from_end(Some(now + Duration::minutes(5))).is_active_at(now));
        assert!(!Lockout::forever().is_active_at(now));
    }

    #[test]
    fn test_toggle_twice_restores_active_state() {
        let now = Utc::now();
        let start = Lockout::none();
        let locked = start.toggled_at(now);
        assert!(!locked.is_active_at(now));
        let unlocked = locked.toggled_at(now);
        assert!(unlocked.is_active_at(now));
        assert_eq!(unlocked, start);
    }

    #[test]
    fn test_toggle_expired_lockout_locks() {
        let now = Utc::now();
        let expired = Lockout::from_end(Some(now - Duration::days(1)));
        assert_eq!(expired.toggled_at(now), Lockout::forever());
    }
}
