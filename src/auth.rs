use crate::config::AppConfig;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Name of the session cookie set after the OAuth callback
pub const SESSION_COOKIE: &str = "docassist_session";

/// How long a session stays valid
const SESSION_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// An authenticated user session
///
/// Authentication itself is delegated to the OAuth provider; this only
/// records that a callback completed and who it was for.
#[derive(Debug, Clone)]
pub struct Session {
    /// Identifier handed back by the provider (or the auth code, in dev)
    pub user_id: String,

    /// Time when the session expires
    pub expires_at: SystemTime,
}

lazy_static! {
    static ref SESSIONS: RwLock<HashMap<String, Session>> = RwLock::new(HashMap::new());
}

/// Build the provider authorize URL the sign-in form redirects to
///
/// Standard authorization-code request; the provider handles everything from
/// here until the callback.
///
/// # Arguments
/// * `config` - Runtime configuration holding the provider details
///
/// # Returns
/// * `String` - Fully encoded authorize URL
pub fn authorize_url(config: &AppConfig) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}",
        config.oauth_authorize_url,
        urlencoding::encode(&config.oauth_client_id),
        urlencoding::encode(&config.oauth_redirect_url),
        urlencoding::encode("openid email profile"),
    )
}

/// Create a session for a signed-in user
///
/// # Arguments
/// * `user_id` - The identity the provider confirmed
///
/// # Returns
/// * `String` - Session id to store in the cookie
pub fn create_session(user_id: &str) -> String {
    let session_id = Uuid::new_v4().to_string();
    let session = Session {
        user_id: user_id.to_string(),
        expires_at: SystemTime::now() + SESSION_DURATION,
    };

    SESSIONS
        .write()
        .unwrap()
        .insert(session_id.clone(), session);
    session_id
}

/// Look up a session, dropping it if expired
///
/// # Arguments
/// * `session_id` - Value from the session cookie
///
/// # Returns
/// * `Option<String>` - The user id for a live session
pub fn validate_session(session_id: &str) -> Option<String> {
    let expired = {
        let sessions = SESSIONS.read().unwrap();
        match sessions.get(session_id) {
            Some(session) if session.expires_at > SystemTime::now() => {
                return Some(session.user_id.clone());
            }
            Some(_) => true,
            None => false,
        }
    };

    if expired {
        SESSIONS.write().unwrap().remove(session_id);
    }
    None
}

/// Remove a session on sign-out
pub fn destroy_session(session_id: &str) {
    SESSIONS.write().unwrap().remove(session_id);
}
