//! Session and refresh-token records kept in the shared session cache.
//!
//! A session is the family of refresh tokens produced by one login. Only the
//! refresh token carrying the session's current `generation` is accepted;
//! older generations have been consumed by rotation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Fresh from login, generation 0.
    Issued,
    /// Refreshed at least once.
    Rotated(u64),
    /// Logged out or killed after reuse. Terminal.
    Revoked,
}

/// Session family record, keyed by session id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub generation: u64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl SessionRecord {
    /// Open a new session at generation 0.
    pub fn open(user_id: Uuid, now: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            generation: 0,
            created_at: now,
            expires_at: now + lifetime,
            revoked: false,
        }
    }

    pub fn state(&self) -> SessionState {
        match (self.revoked, self.generation) {
            (true, _) => SessionState::Revoked,
            (false, 0) => SessionState::Issued,
            (false, n) => SessionState::Rotated(n),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Next generation after a successful refresh. The session lives as long
    /// as its newest refresh token.
    pub fn rotated(&self, now: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            generation: self.generation + 1,
            expires_at: now + lifetime,
            ..self.clone()
        }
    }

    /// Revoked copy of this record. Revocation never resets the generation.
    pub fn revoked(&self) -> Self {
        Self {
            revoked: true,
            ..self.clone()
        }
    }

    /// Seconds until expiry, floored at one so the entry can still be stored.
    pub fn remaining_ttl_seconds(&self, now: DateTime<Utc>) -> u64 {
        remaining_seconds(self.expires_at, now)
    }
}

/// Refresh token record, keyed by the digest of the opaque token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRecord {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub generation: u64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl RefreshRecord {
    /// Record for the token that belongs to the session's current generation.
    pub fn for_session(session: &SessionRecord, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session.session_id,
            user_id: session.user_id,
            generation: session.generation,
            issued_at: now,
            expires_at: session.expires_at,
            revoked: false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn revoked(&self) -> Self {
        Self {
            revoked: true,
            ..self.clone()
        }
    }

    pub fn remaining_ttl_seconds(&self, now: DateTime<Utc>) -> u64 {
        remaining_seconds(self.expires_at, now)
    }
}

fn remaining_seconds(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let remaining = (expires_at - now).num_seconds();
    if remaining > 0 {
        remaining as u64
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_machine() {
        let now = Utc::now();
        let session = SessionRecord::open(Uuid::new_v4(), now, Duration::days(7));
        assert_eq!(session.state(), SessionState::Issued);

        let rotated = session.rotated(now, Duration::days(7));
        assert_eq!(rotated.state(), SessionState::Rotated(1));
        assert_eq!(rotated.session_id, session.session_id);

        let revoked = rotated.revoked();
        assert_eq!(revoked.state(), SessionState::Revoked);
        assert_eq!(revoked.generation, 1);
    }

    #[test]
    fn test_refresh_record_tracks_generation() {
        let now = Utc::now();
        let session = SessionRecord::open(Uuid::new_v4(), now, Duration::days(7));
        let first = RefreshRecord::for_session(&session, now);
        assert_eq!(first.generation, 0);

        let next = session.rotated(now, Duration::days(7));
        assert_eq!(next.state(), SessionState::Rotated(1));
        assert_eq!(RefreshRecord::for_session(&next, now).generation, 1);
        assert_eq!(first.expires_at, session.expires_at);
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let session = SessionRecord::open(Uuid::new_v4(), now, Duration::seconds(30));
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::seconds(30)));
    }

    #[test]
    fn test_remaining_ttl_never_zero() {
        let now = Utc::now();
        let session = SessionRecord::open(Uuid::new_v4(), now, Duration::seconds(90));
        assert_eq!(session.remaining_ttl_seconds(now), 90);
        assert_eq!(session.remaining_ttl_seconds(now + Duration::hours(1)), 1);
    }
}
