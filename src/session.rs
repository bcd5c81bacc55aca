use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use crate::state::Dashboard;

/// Cookie carrying the dashboard session ID
pub const SESSION_COOKIE: &str = "dashboard_session";

const SESSION_DURATION: u64 = 24 * 60 * 60; // 24 hours in seconds

/// Dashboard view of one browser
#[derive(Debug)]
struct Session {
    dashboard: Arc<Dashboard>,
    expires_at: SystemTime,
}

/// Per-browser dashboard state keyed by session cookie
///
/// Each browser gets its own [`Dashboard`], so division selection and the
/// request generation counter are never shared between clients. Sessions
/// expire after a period without requests.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    duration: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_duration(Duration::from_secs(SESSION_DURATION))
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose sessions expire `duration` after their last request
    pub fn with_duration(duration: Duration) -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            duration,
        }
    }

    /// Find the dashboard for the session in `jar`
    ///
    /// A missing, unknown or expired session starts a new one and the
    /// returned jar carries its cookie.
    ///
    /// # Arguments
    /// * `jar` - Cookies of the incoming request
    ///
    /// # Returns
    /// * `(CookieJar, Arc<Dashboard>)` - Jar to send back and the session's dashboard
    pub fn resolve(&self, jar: CookieJar) -> (CookieJar, Arc<Dashboard>) {
        let now = SystemTime::now();
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(session_id) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
            if let Some(session) = sessions.get_mut(&session_id) {
                if session.expires_at > now {
                    session.expires_at = now + self.duration;
                    return (jar, Arc::clone(&session.dashboard));
                }
            }
        }

        sessions.retain(|_, session| session.expires_at > now);

        let session_id = Uuid::new_v4().to_string();
        let dashboard = Arc::new(Dashboard::new());
        sessions.insert(
            session_id.clone(),
            Session {
                dashboard: Arc::clone(&dashboard),
                expires_at: now + self.duration,
            },
        );
        log::debug!("Started dashboard session {}", session_id);

        let cookie = Cookie::build((SESSION_COOKIE, session_id))
            .path("/")
            .http_only(true);
        (jar.add(cookie), dashboard)
    }

    /// Number of stored sessions, expired ones included until the next prune
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
