//! Authentication service - registration, login and session lifecycle.
//!
//! A login opens a session at generation 0 and hands out one access token
//! plus one opaque refresh token. Each refresh consumes the presented token
//! and advances the session generation with a compare-and-swap, so of two
//! racing refreshes with the same token exactly one wins. Presenting a token
//! from an older generation means it leaked: the session is revoked.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use common::{AccessVerifier, AppError, AppResult, Identity, TokenCodec, TokenConfig, TokenType};
use domain::{
    normalize_email, Password, RefreshRecord, SessionRecord, SessionState, User, UserRole,
    TOKEN_TYPE_BEARER,
};

use crate::repository::{NewUser, UserRepository};
use crate::session::{RefreshToken, SessionStore, Snapshot};

/// Token pair returned after login or refresh
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived JWT for the `Authorization` header
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Opaque single-use token for `/auth/refresh`
    pub refresh_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Access token lifetime in seconds
    #[schema(example = 900)]
    pub expires_in: i64,
}

/// Which session a logout targets.
#[derive(Debug, Clone)]
pub enum SessionRef {
    Session(Uuid),
    RefreshToken(String),
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account. The email is normalised before storage.
    async fn register(&self, email: String, password: String, role: UserRole) -> AppResult<User>;

    /// Check credentials and open a session.
    async fn login(&self, email: String, password: String) -> AppResult<TokenPair>;

    /// Exchange a refresh token for a new pair.
    async fn refresh(&self, refresh_token: String) -> AppResult<TokenPair>;

    /// Revoke a session owned by `user_id`. Idempotent.
    async fn logout(&self, user_id: Uuid, session: SessionRef) -> AppResult<()>;

    /// Verify an access token without touching shared state.
    fn verify_access(&self, token: &str) -> AppResult<Identity>;
}

/// Concrete implementation of AuthService.
pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    sessions: SessionStore,
    codec: TokenCodec,
    config: TokenConfig,
}

impl Authenticator {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: SessionStore,
        codec: TokenCodec,
        config: TokenConfig,
    ) -> Self {
        Self {
            users,
            sessions,
            codec,
            config,
        }
    }

    /// Mint the access token for `session` and wrap it with `refresh_token`.
    fn issue_pair(
        &self,
        user: &User,
        session: &SessionRecord,
        refresh_token: RefreshToken,
        now: DateTime<Utc>,
    ) -> AppResult<TokenPair> {
        let identity = Identity {
            user_id: user.id,
            role: user.role,
            session_id: session.session_id,
        };
        let lifetime = self.config.access_ttl();
        let access_token = self
            .codec
            .issue_at(identity, TokenType::Access, lifetime, now)?;

        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.into_string(),
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: lifetime.num_seconds(),
        })
    }

    /// Store a fresh refresh token for the session's current generation.
    async fn attach_refresh_token(
        &self,
        session: &SessionRecord,
        now: DateTime<Utc>,
    ) -> AppResult<RefreshToken> {
        let token = RefreshToken::generate();
        let record = RefreshRecord::for_session(session, now);
        self.sessions.insert_refresh(&token, &record, now).await?;
        Ok(token)
    }

    /// A consumed refresh token came back. Whoever holds it, the session can
    /// no longer be trusted.
    async fn reject_reuse(&self, record: &RefreshRecord, now: DateTime<Utc>) -> AppError {
        warn!(
            target: "security",
            user_id = %record.user_id,
            session_id = %record.session_id,
            generation = record.generation,
            "Refresh token reuse detected"
        );

        if self.config.revoke_session_on_reuse {
            if let Err(e) = self.sessions.revoke_session(record.session_id, now).await {
                return e;
            }
            info!(
                target: "security",
                session_id = %record.session_id,
                "Session revoked after refresh token reuse"
            );
        }

        AppError::TokenReuseDetected
    }
}

/// Create an account with a normalised email and an argon2 hash.
pub async fn register_user(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
    role: UserRole,
) -> AppResult<User> {
    let email = normalize_email(email);
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("Invalid email format"));
    }

    // Checked up front for a clean error; the unique index covers races
    if users.find_by_email(&email).await?.is_some() {
        return Err(AppError::conflict("User"));
    }

    let password_hash = Password::new(password)?.into_string();
    let user = users
        .create(NewUser {
            email,
            password_hash,
            role,
        })
        .await?;

    info!(user_id = %user.id, role = %user.role, "User registered");
    Ok(user)
}

#[async_trait]
impl AuthService for Authenticator {
    async fn register(&self, email: String, password: String, role: UserRole) -> AppResult<User> {
        register_user(self.users.as_ref(), &email, &password, role).await
    }

    async fn login(&self, email: String, password: String) -> AppResult<TokenPair> {
        let email = normalize_email(&email);
        let user = self.users.find_by_email(&email).await?;

        // Unknown emails still pay for one hash verification
        let password_valid = match &user {
            Some(user) => Password::from_hash(user.password_hash.as_str()).verify(&password),
            None => {
                Password::dummy().verify(&password);
                false
            }
        };

        let user = match user {
            Some(user) if password_valid && user.is_active() => user,
            Some(user) if password_valid => {
                info!(user_id = %user.id, "Login refused for suspended account");
                return Err(AppError::InvalidCredentials);
            }
            _ => return Err(AppError::InvalidCredentials),
        };

        let now = Utc::now();
        let session = SessionRecord::open(user.id, now, self.config.refresh_ttl());
        self.sessions.create_session(&session, now).await?;
        let refresh_token = self.attach_refresh_token(&session, now).await?;

        info!(user_id = %user.id, session_id = %session.session_id, "Session opened");
        self.issue_pair(&user, &session, refresh_token, now)
    }

    async fn refresh(&self, refresh_token: String) -> AppResult<TokenPair> {
        let now = Utc::now();

        let record = self
            .sessions
            .load_refresh(&refresh_token)
            .await?
            .filter(|r| !r.is_expired(now))
            .ok_or(AppError::InvalidToken)?;

        let snapshot: Snapshot<SessionRecord> = self
            .sessions
            .load_session(record.session_id)
            .await?
            .filter(|s| !s.record.is_expired(now))
            .ok_or(AppError::InvalidToken)?;
        let session = &snapshot.record;

        if session.user_id != record.user_id {
            return Err(AppError::InvalidToken);
        }

        let current = match session.state() {
            SessionState::Revoked => {
                debug!(session_id = %session.session_id, "Refresh on revoked session");
                return Err(AppError::Revoked);
            }
            SessionState::Issued => 0,
            SessionState::Rotated(generation) => generation,
        };
        if record.revoked {
            debug!(session_id = %session.session_id, "Refresh with revoked token");
            return Err(AppError::Revoked);
        }
        // Only the current generation may rotate; older ones were consumed
        match record.generation.cmp(&current) {
            Ordering::Less => return Err(self.reject_reuse(&record, now).await),
            Ordering::Greater => return Err(AppError::InvalidToken),
            Ordering::Equal => {}
        }

        // Role or status may have changed since login
        let user = match self.users.find_by_id(record.user_id).await? {
            Some(user) if user.is_active() => user,
            _ => {
                self.sessions.revoke_session(session.session_id, now).await?;
                return Err(AppError::InvalidToken);
            }
        };

        let next = session.rotated(now, self.config.refresh_ttl());
        if !self.sessions.swap_session(&snapshot, &next, now).await? {
            // Someone else advanced the generation with this same token
            return Err(self.reject_reuse(&record, now).await);
        }

        let refresh_token = self.attach_refresh_token(&next, now).await?;

        debug!(
            user_id = %user.id,
            session_id = %next.session_id,
            generation = next.generation,
            "Session rotated"
        );
        self.issue_pair(&user, &next, refresh_token, now)
    }

    async fn logout(&self, user_id: Uuid, session: SessionRef) -> AppResult<()> {
        let now = Utc::now();

        let session_id = match session {
            SessionRef::Session(session_id) => {
                match self.sessions.load_session(session_id).await? {
                    Some(current) if current.record.user_id == user_id => session_id,
                    Some(_) => {
                        debug!(user_id = %user_id, "Logout ignored for foreign session");
                        return Ok(());
                    }
                    None => return Ok(()),
                }
            }
            SessionRef::RefreshToken(token) => match self.sessions.load_refresh(&token).await? {
                Some(record) if record.user_id == user_id => {
                    if !record.revoked {
                        self.sessions.revoke_refresh(&token, &record, now).await?;
                    }
                    record.session_id
                }
                Some(_) => {
                    debug!(user_id = %user_id, "Logout ignored for foreign refresh token");
                    return Ok(());
                }
                None => return Ok(()),
            },
        };

        self.sessions.revoke_session(session_id, now).await?;
        info!(user_id = %user_id, session_id = %session_id, "Session revoked");
        Ok(())
    }

    fn verify_access(&self, token: &str) -> AppResult<Identity> {
        let claims = self.codec.verify_access(token)?;
        Ok(Identity {
            user_id: claims.sub,
            role: claims.role,
            session_id: claims.sid,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use common::{MemorySessionCache, SessionCache};
    use domain::UserStatus;
    use mockall::predicate::eq;

    use super::*;
    use crate::repository::MockUserRepository;

    const SECRET: &str = "auth-service-unit-test-secret-long-enough";
    const PASSWORD: &str = "correct horse battery";

    fn config() -> TokenConfig {
        TokenConfig::new(SECRET).unwrap()
    }

    fn user(status: UserStatus) -> User {
        let hash = Password::new(PASSWORD).unwrap().into_string();
        let mut user = User::new(
            Uuid::new_v4(),
            "ada@example.com".to_string(),
            hash,
            UserRole::Applicant,
        );
        user.set_status(status);
        user
    }

    fn authenticator(repo: MockUserRepository) -> (Arc<MemorySessionCache>, Authenticator) {
        let cache = Arc::new(MemorySessionCache::new());
        let config = config();
        let auth = Authenticator::new(
            Arc::new(repo),
            SessionStore::new(cache.clone()),
            TokenCodec::from_config(&config),
            config,
        );
        (cache, auth)
    }

    #[tokio::test]
    async fn test_register_normalises_email_and_hashes_password() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .with(eq("ada@example.com"))
            .returning(|_| Ok(None));
        repo.expect_create().returning(|new_user| {
            assert_eq!(new_user.email, "ada@example.com");
            assert_ne!(new_user.password_hash, PASSWORD);
            assert!(new_user.password_hash.starts_with("$argon2"));
            Ok(User::new(
                Uuid::new_v4(),
                new_user.email,
                new_user.password_hash,
                new_user.role,
            ))
        });

        let (_, auth) = authenticator(repo);
        let user = auth
            .register("  Ada@Example.COM ".into(), PASSWORD.into(), UserRole::Employer)
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::Employer);
    }

    #[tokio::test]
    async fn test_register_duplicate_is_conflict() {
        let existing = user(UserStatus::Active);
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_create().never();

        let (_, auth) = authenticator(repo);
        let err = auth
            .register("ada@example.com".into(), PASSWORD.into(), UserRole::Applicant)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_short_password_is_validation_error() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));
        repo.expect_create().never();

        let (_, auth) = authenticator(repo);
        let err = auth
            .register("ada@example.com".into(), "short".into(), UserRole::Applicant)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let active = user(UserStatus::Active);
        let suspended = user(UserStatus::Suspended);

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(move |email| match email {
            "ada@example.com" => Ok(Some(active.clone())),
            "suspended@example.com" => Ok(Some(suspended.clone())),
            _ => Ok(None),
        });

        let (cache, auth) = authenticator(repo);

        for (email, password) in [
            ("ada@example.com", "wrong password"),
            ("nobody@example.com", PASSWORD),
            ("suspended@example.com", PASSWORD),
        ] {
            let err = auth.login(email.into(), password.into()).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidCredentials), "{}", email);
        }
        assert_eq!(cache.count_prefix("session:"), 0);
    }

    #[tokio::test]
    async fn test_login_opens_session_and_issues_pair() {
        let active = user(UserStatus::Active);
        let user_id = active.id;
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(move |_| Ok(Some(active.clone())));

        let (cache, auth) = authenticator(repo);
        let pair = auth
            .login("ADA@example.com".into(), PASSWORD.into())
            .await
            .unwrap();

        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 15 * 60);
        assert_eq!(cache.count_prefix("session:"), 1);
        assert_eq!(cache.count_prefix("refresh:"), 1);

        let identity = auth.verify_access(&pair.access_token).unwrap();
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.role, UserRole::Applicant);
    }

    #[tokio::test]
    async fn test_login_fails_closed_when_cache_is_down() {
        let active = user(UserStatus::Active);
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(move |_| Ok(Some(active.clone())));

        let (cache, auth) = authenticator(repo);
        cache.set_offline(true);

        let err = auth
            .login("ada@example.com".into(), PASSWORD.into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_refresh_reloads_role_and_status() {
        let active = user(UserStatus::Active);
        let user_id = active.id;
        let login_user = active.clone();

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(move |_| Ok(Some(login_user.clone())));
        let mut promoted = active.clone();
        promoted.role = UserRole::Employer;
        repo.expect_find_by_id()
            .with(eq(user_id))
            .returning(move |_| Ok(Some(promoted.clone())));

        let (_, auth) = authenticator(repo);
        let pair = auth
            .login("ada@example.com".into(), PASSWORD.into())
            .await
            .unwrap();
        let next = auth.refresh(pair.refresh_token).await.unwrap();

        let identity = auth.verify_access(&next.access_token).unwrap();
        assert_eq!(identity.role, UserRole::Employer);
    }

    #[tokio::test]
    async fn test_refresh_for_suspended_user_revokes_session() {
        let active = user(UserStatus::Active);
        let mut suspended = active.clone();
        suspended.set_status(UserStatus::Suspended);

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(move |_| Ok(Some(active.clone())));
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(suspended.clone())));

        let (_, auth) = authenticator(repo);
        let pair = auth
            .login("ada@example.com".into(), PASSWORD.into())
            .await
            .unwrap();

        let err = auth.refresh(pair.refresh_token.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
        // Session is gone for good
        let err = auth.refresh(pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::Revoked));
    }

    #[tokio::test]
    async fn test_expired_refresh_record_is_invalid() {
        let repo = MockUserRepository::new();
        let (cache, auth) = authenticator(repo);

        let now = Utc::now();
        let session = SessionRecord::open(Uuid::new_v4(), now - Duration::days(8), Duration::days(7));
        let record = RefreshRecord::for_session(&session, now - Duration::days(8));
        let token = RefreshToken::generate();
        // Store outlives the record's own expiry
        cache
            .put(
                &SessionStore::refresh_key(token.as_str()),
                &serde_json::to_string(&record).unwrap(),
                std::time::Duration::from_secs(60),
            )
            .await
            .unwrap();

        let err = auth.refresh(token.into_string()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn test_refresh_from_future_generation_is_invalid_not_reuse() {
        let (cache, auth) = authenticator(MockUserRepository::new());

        let now = Utc::now();
        let session = SessionRecord::open(Uuid::new_v4(), now, Duration::days(7));
        let ahead = RefreshRecord::for_session(&session.rotated(now, Duration::days(7)), now);
        let token = RefreshToken::generate();
        let ttl = std::time::Duration::from_secs(60);
        cache
            .put(
                &SessionStore::session_key(session.session_id),
                &serde_json::to_string(&session).unwrap(),
                ttl,
            )
            .await
            .unwrap();
        cache
            .put(
                &SessionStore::refresh_key(token.as_str()),
                &serde_json::to_string(&ahead).unwrap(),
                ttl,
            )
            .await
            .unwrap();

        let err = auth.refresh(token.into_string()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));

        // Session left untouched
        let stored = cache
            .get(&SessionStore::session_key(session.session_id))
            .await
            .unwrap()
            .unwrap();
        let stored: SessionRecord = serde_json::from_str(&stored).unwrap();
        assert_eq!(stored.state(), SessionState::Issued);
    }

    #[tokio::test]
    async fn test_unknown_refresh_token_is_invalid() {
        let (_, auth) = authenticator(MockUserRepository::new());
        let err = auth.refresh("f".repeat(64)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn test_logout_ignores_foreign_session() {
        let active = user(UserStatus::Active);
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(move |_| Ok(Some(active.clone())));

        let (_, auth) = authenticator(repo);
        let pair = auth
            .login("ada@example.com".into(), PASSWORD.into())
            .await
            .unwrap();
        let identity = auth.verify_access(&pair.access_token).unwrap();

        auth.logout(Uuid::new_v4(), SessionRef::Session(identity.session_id))
            .await
            .unwrap();
        auth.logout(Uuid::new_v4(), SessionRef::RefreshToken(pair.refresh_token.clone()))
            .await
            .unwrap();

        // Still usable by its owner
        let snapshot = auth
            .sessions
            .load_session(identity.session_id)
            .await
            .unwrap()
            .unwrap();
        assert!(!snapshot.record.revoked);
    }
}
