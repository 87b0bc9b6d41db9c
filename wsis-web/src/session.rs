//! Identity and session management
//!
//! The session manager establishes one authenticated identity for the
//! process: a persisted session is reused as-is, otherwise the configured
//! bootstrap token signs in, otherwise an anonymous identity is created.
//! Identity changes are published on a watch channel so subscriptions can
//! tear down when the user changes.
//!
//! Auth failures are classified: rate-limited failures park the manager in
//! a recoverable state that only a manual retry leaves; any other failure
//! is surfaced as an alert while the manager still reaches the ready state
//! so the UI can render a fallback instead of hanging.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;
use wsis_common::{Error, Result};

/// Settings key holding the persisted session user
const SESSION_KEY: &str = "session_user";

/// Identity provider seam: anonymous sign-in, token sign-in, sign-out,
/// and the persisted current user.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Previously persisted session, if any
    async fn current_user(&self) -> Result<Option<Uuid>>;
    /// Create and persist a fresh anonymous identity
    async fn sign_in_anonymously(&self) -> Result<Uuid>;
    /// Sign in with a bootstrap token (deterministic identity per token)
    async fn sign_in_with_token(&self, token: &str) -> Result<Uuid>;
    /// Clear the persisted session
    async fn sign_out(&self) -> Result<()>;
}

/// Sliding-window sign-in limiter; exceeding it yields the rate-limited
/// error class
struct SignInLimiter {
    attempts: VecDeque<Instant>,
    max_attempts: usize,
    window: Duration,
}

impl SignInLimiter {
    fn record_attempt(&mut self) -> Result<()> {
        let now = Instant::now();
        while let Some(front) = self.attempts.front() {
            if now.duration_since(*front) > self.window {
                self.attempts.pop_front();
            } else {
                break;
            }
        }
        if self.attempts.len() >= self.max_attempts {
            return Err(Error::RateLimited(format!(
                "too many sign-in attempts ({} within {:?})",
                self.attempts.len(),
                self.window
            )));
        }
        self.attempts.push_back(now);
        Ok(())
    }
}

/// SQLite-backed identity provider
///
/// Users live in the `users` table; the active session is persisted in
/// the `settings` table so a restart reuses it without re-authenticating.
pub struct SqliteIdentityProvider {
    pool: SqlitePool,
    limiter: Mutex<SignInLimiter>,
}

impl SqliteIdentityProvider {
    pub fn new(pool: SqlitePool) -> Self {
        // 5 sign-ins per minute covers every legitimate flow; anything
        // beyond that is a retry storm
        Self::with_limits(pool, 5, Duration::from_secs(60))
    }

    pub fn with_limits(pool: SqlitePool, max_attempts: usize, window: Duration) -> Self {
        Self {
            pool,
            limiter: Mutex::new(SignInLimiter {
                attempts: VecDeque::new(),
                max_attempts,
                window,
            }),
        }
    }

    async fn persist_session(&self, user_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(SESSION_KEY)
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for SqliteIdentityProvider {
    async fn current_user(&self) -> Result<Option<Uuid>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
                .bind(SESSION_KEY)
                .fetch_optional(&self.pool)
                .await?
                .flatten();

        match value {
            Some(raw) => match raw.parse::<Uuid>() {
                Ok(id) => Ok(Some(id)),
                Err(_) => {
                    warn!("Persisted session value is not a UUID; ignoring");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn sign_in_anonymously(&self) -> Result<Uuid> {
        self.limiter.lock().await.record_attempt()?;

        let user_id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (guid, kind) VALUES (?, 'anonymous')")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        self.persist_session(user_id).await?;

        info!("Anonymous sign-in: {}", user_id);
        Ok(user_id)
    }

    async fn sign_in_with_token(&self, token: &str) -> Result<Uuid> {
        self.limiter.lock().await.record_attempt()?;

        if token.trim().is_empty() {
            return Err(Error::InvalidInput("empty bootstrap token".to_string()));
        }

        // Deterministic identity per token: restarting with the same
        // token resumes the same namespace
        let digest = Sha256::digest(token.as_bytes());
        let user_id = Uuid::from_slice(&digest[..16])
            .map_err(|e| Error::Internal(format!("token digest: {}", e)))?;

        sqlx::query("INSERT OR IGNORE INTO users (guid, kind) VALUES (?, 'token')")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        self.persist_session(user_id).await?;

        info!("Token sign-in: {}", user_id);
        Ok(user_id)
    }

    async fn sign_out(&self) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(SESSION_KEY)
            .execute(&self.pool)
            .await?;
        info!("Signed out");
        Ok(())
    }
}

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Bootstrap has not completed yet
    Initializing,
    /// Normal operation (possibly with a signed-out identity)
    Ready,
    /// Auth backend refused for rate limiting; manual retry required
    RateLimited,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Initializing => "initializing",
            SessionPhase::Ready => "ready",
            SessionPhase::RateLimited => "rate-limited",
        }
    }
}

/// Owns the process identity and its lifecycle
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    identity_tx: watch::Sender<Option<Uuid>>,
    phase: RwLock<SessionPhase>,
    auth_alert: RwLock<Option<String>>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (identity_tx, _) = watch::channel(None);
        Self {
            provider,
            identity_tx,
            phase: RwLock::new(SessionPhase::Initializing),
            auth_alert: RwLock::new(None),
        }
    }

    /// Subscribe to identity changes: `Some(userId)` or `None` (signed out)
    pub fn subscribe(&self) -> watch::Receiver<Option<Uuid>> {
        self.identity_tx.subscribe()
    }

    /// Current user identity, if authenticated
    pub fn current(&self) -> Option<Uuid> {
        *self.identity_tx.borrow()
    }

    pub async fn phase(&self) -> SessionPhase {
        *self.phase.read().await
    }

    /// Pending auth alert, cleared on read
    pub async fn take_auth_alert(&self) -> Option<String> {
        self.auth_alert.write().await.take()
    }

    /// Establish the startup identity.
    ///
    /// Order: reuse a persisted session without re-authenticating; else
    /// sign in with the bootstrap token when present; else anonymously.
    pub async fn bootstrap(&self, bootstrap_token: Option<&str>) {
        match self.provider.current_user().await {
            Ok(Some(user_id)) => {
                info!("Reusing existing session: {}", user_id);
                self.identity_tx.send_replace(Some(user_id));
                self.set_phase(SessionPhase::Ready).await;
                return;
            }
            Ok(None) => {}
            Err(e) => warn!("Session lookup failed, signing in fresh: {}", e),
        }

        let result = match bootstrap_token {
            Some(token) => self.provider.sign_in_with_token(token).await,
            None => self.provider.sign_in_anonymously().await,
        };
        self.finish_sign_in(result).await;
    }

    /// Manual retry: sign out, then re-attempt anonymous sign-in
    pub async fn retry(&self) {
        if let Err(e) = self.provider.sign_out().await {
            warn!("Sign-out during retry failed: {}", e);
        }
        self.identity_tx.send_replace(None);

        let result = self.provider.sign_in_anonymously().await;
        self.finish_sign_in(result).await;
    }

    async fn finish_sign_in(&self, result: Result<Uuid>) {
        match result {
            Ok(user_id) => {
                self.identity_tx.send_replace(Some(user_id));
                self.set_phase(SessionPhase::Ready).await;
            }
            Err(Error::RateLimited(msg)) => {
                warn!("Sign-in rate limited: {}", msg);
                self.set_phase(SessionPhase::RateLimited).await;
            }
            Err(e) => {
                warn!("Sign-in failed: {}", e);
                *self.auth_alert.write().await = Some(format!("Sign-in failed: {}", e));
                // Still reach ready so the UI renders a fallback instead
                // of hanging on a spinner
                self.set_phase(SessionPhase::Ready).await;
            }
        }
    }

    async fn set_phase(&self, phase: SessionPhase) {
        *self.phase.write().await = phase;
    }
}
