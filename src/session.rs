//! Cookie-backed session state.
//!
//! The whole session lives client-side in one signed cookie: the logged-in
//! user's identity, pending flash messages and the anti-forgery token. The
//! signature makes the cookie tamper-evident; a cookie that fails
//! verification is simply ignored.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use tower_cookies::{Cookie, Cookies, Key};
use tracing::{debug, trace};

use crate::error::AppError;
use crate::schemas::AppState;

pub const SESSION_COOKIE: &str = "constellate_session";

/// Lifetime of a "remember me" session cookie.
const REMEMBER_DAYS: i64 = 365;

/// Derive the 64-byte cookie signing key from the configured secret.
pub fn derive_cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

impl FlashLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Error => "error",
        }
    }
}

/// One-shot message shown on the next rendered page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// Decoded session cookie payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Raw identity as written at login. Decoded by [`crate::auth`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub remember: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flashes: Vec<Flash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

impl SessionData {
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.flashes.is_empty() && self.csrf_token.is_none()
    }

    pub fn encode(&self) -> String {
        // Serializing plain strings and bools cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(value: &str) -> Option<Self> {
        let json = URL_SAFE_NO_PAD.decode(value).ok()?;
        serde_json::from_slice(&json).ok()
    }
}

/// Request-scoped handle on the session cookie.
///
/// Every mutation is written back to the response cookie immediately.
pub struct Session {
    cookies: Cookies,
    key: Key,
    data: SessionData,
}

impl Session {
    pub fn load(cookies: Cookies, key: Key) -> Self {
        let data = match cookies.signed(&key).get(SESSION_COOKIE) {
            Some(cookie) => SessionData::decode(cookie.value()).unwrap_or_else(|| {
                debug!("Session cookie payload could not be decoded, starting fresh");
                SessionData::default()
            }),
            None => {
                if cookies.get(SESSION_COOKIE).is_some() {
                    debug!("Session cookie failed signature verification, ignoring it");
                }
                SessionData::default()
            }
        };

        Self { cookies, key, data }
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub fn user_id(&self) -> Option<&str> {
        self.data.user_id.as_deref()
    }

    /// Attach `identity` to the session, optionally as a long-lived cookie.
    pub fn login(&mut self, identity: String, remember: bool) {
        self.data.user_id = Some(identity);
        self.data.remember = remember;
        self.persist();
    }

    pub fn logout(&mut self) {
        self.data.user_id = None;
        self.data.remember = false;
        self.persist();
    }

    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.data.flashes.push(Flash {
            level,
            message: message.into(),
        });
        self.persist();
    }

    pub fn take_flashes(&mut self) -> Vec<Flash> {
        if self.data.flashes.is_empty() {
            return Vec::new();
        }
        let flashes = std::mem::take(&mut self.data.flashes);
        self.persist();
        flashes
    }

    /// The session's anti-forgery token, issued on first use.
    pub fn csrf_token(&mut self) -> String {
        if let Some(token) = &self.data.csrf_token {
            return token.clone();
        }

        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);
        self.data.csrf_token = Some(token.clone());
        self.persist();
        token
    }

    fn persist(&self) {
        let signed = self.cookies.signed(&self.key);

        if self.data.is_empty() {
            trace!("Session is empty, removing cookie");
            let mut removal = Cookie::new(SESSION_COOKIE, "");
            removal.set_path("/");
            signed.remove(removal);
            return;
        }

        let mut cookie = Cookie::new(SESSION_COOKIE, self.data.encode());
        cookie.set_http_only(true);
        cookie.set_path("/");
        if self.data.remember {
            cookie.set_max_age(time::Duration::days(REMEMBER_DAYS));
        }
        signed.add(cookie);
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|(_, message)| AppError::Cookies(message))?;

        Ok(Session::load(cookies, state.cookie_key.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_survives_encoding() {
        let data = SessionData {
            user_id: Some("42".to_string()),
            remember: true,
            flashes: vec![Flash {
                level: FlashLevel::Success,
                message: "Login successful!".to_string(),
            }],
            csrf_token: Some("token".to_string()),
        };

        let encoded = data.encode();
        assert!(!encoded.contains(' '));
        assert!(!encoded.contains(';'));
        assert_eq!(SessionData::decode(&encoded), Some(data));
    }

    #[test]
    fn test_garbage_payload_is_rejected() {
        assert_eq!(SessionData::decode("not base64 at all!"), None);
        assert_eq!(SessionData::decode(&URL_SAFE_NO_PAD.encode("[1, 2]")), None);
    }

    #[test]
    fn test_missing_fields_default() {
        let decoded = SessionData::decode(&URL_SAFE_NO_PAD.encode("{}")).unwrap();
        assert!(decoded.is_empty());
        assert!(!decoded.remember);
    }

    #[test]
    fn test_short_secret_still_yields_key() {
        // Key::from panics on short input; the digest always has 64 bytes.
        let _ = derive_cookie_key("");
        let _ = derive_cookie_key("x");
    }
}
