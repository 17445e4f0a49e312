use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::client::Credentials;
use crate::context::AnalyticsContext;
use crate::error::{AppError, HtmlError};
use crate::state::AppState;

/// Cookie holding the raw session id.
pub const SESSION_COOKIE: &str = "admisiones_session";

/// Absolute lifetime of a session, whatever its activity.
pub const SESSION_MAX_AGE_HOURS: i64 = 12;

/// Inactivity after which a session is dropped, unless configured otherwise.
pub const DEFAULT_IDLE_MINUTES: i64 = 120;

/// Hash a raw session id for storage/lookup.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a new random session id.
pub fn generate_token() -> String {
    use rand::Rng;
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}

pub fn session_cookie(session_id: &str) -> String {
    let max_age = SESSION_MAX_AGE_HOURS * 3600;
    format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Raw session id from the request's Cookie headers.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .filter(|id| !id.is_empty())
        .map(String::from)
}

struct Session {
    username: String,
    token: String,
    context: AnalyticsContext,
    created_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

impl Session {
    fn is_expired(&self, now: DateTime<Utc>, idle: Duration) -> bool {
        now - self.created_at > Duration::hours(SESSION_MAX_AGE_HOURS)
            || now - self.last_seen > idle
    }
}

/// Logged-in browser sessions, keyed by the hash of their cookie value.
/// Entries expire after `idle` without requests, or after
/// `SESSION_MAX_AGE_HOURS` in any case.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Session>>>,
    idle: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(Duration::minutes(DEFAULT_IDLE_MINUTES))
    }
}

/// Identity of the session behind the current request.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub key: String,
    pub username: String,
}

impl SessionStore {
    pub fn with_idle_timeout(idle: Duration) -> Self {
        SessionStore {
            inner: Arc::new(RwLock::new(HashMap::new())),
            idle,
        }
    }

    /// Store a backend token and return the raw id to put in the cookie.
    /// Expired sessions are pruned on the way.
    pub async fn create(&self, username: &str, token: String) -> String {
        let session_id = generate_token();
        let now = Utc::now();
        let session = Session {
            username: username.to_string(),
            token,
            context: AnalyticsContext::default(),
            created_at: now,
            last_seen: now,
        };

        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now, self.idle));
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::debug!("Pruned {pruned} expired sessions");
        }
        sessions.insert(hash_token(&session_id), session);
        session_id
    }

    /// Live session for a raw id. Touches `last_seen`; an expired entry is
    /// removed and reported as missing.
    pub async fn lookup(&self, session_id: &str) -> Option<CurrentSession> {
        let key = hash_token(session_id);
        let now = Utc::now();
        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(&key)?;
        if session.is_expired(now, self.idle) {
            tracing::info!("Session for '{}' expired", session.username);
            sessions.remove(&key);
            return None;
        }
        session.last_seen = now;
        Some(CurrentSession {
            username: session.username.clone(),
            key,
        })
    }


    pub async fn remove(&self, key: &str) {
        self.inner.write().await.remove(key);
    }

    pub async fn context(&self, key: &str) -> AnalyticsContext {
        self.inner
            .read()
            .await
            .get(key)
            .map(|s| s.context.clone())
            .unwrap_or_default()
    }

    pub async fn update_context(&self, key: &str, update: impl FnOnce(&mut AnalyticsContext)) {
        if let Some(session) = self.inner.write().await.get_mut(key) {
            update(&mut session.context);
        }
    }

    pub fn credentials(&self, key: &str) -> SessionCredentials {
        SessionCredentials {
            store: self.clone(),
            key: key.to_string(),
        }
    }
}

/// Bearer token of one session. Clearing it ends the session.
pub struct SessionCredentials {
    store: SessionStore,
    key: String,
}

#[async_trait]
impl Credentials for SessionCredentials {
    async fn token(&self) -> Option<String> {
        self.store
            .inner
            .read()
            .await
            .get(&self.key)
            .map(|s| s.token.clone())
    }

    async fn clear(&self) {
        self.store.remove(&self.key).await;
    }
}

async fn current_session(state: &AppState, headers: &HeaderMap) -> Option<CurrentSession> {
    let session_id = session_id_from_headers(headers)?;
    state.sessions.lookup(&session_id).await
}

/// Middleware for JSON routes: 401 without a live session.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = current_session(&state, request.headers())
        .await
        .ok_or(AppError::Unauthorized)?;
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Middleware for HTML routes: redirect to the login page without a live
/// session.
pub async fn require_session_page(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, HtmlError> {
    let session = current_session(&state, request.headers())
        .await
        .ok_or(HtmlError(AppError::Unauthorized))?;
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
