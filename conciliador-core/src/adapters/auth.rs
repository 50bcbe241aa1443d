//! Authentication helpers: bearer-token store and the authenticated HTTP client
//!
//! The token lives in `session.json` inside the data directory together with
//! its expiry. Tokens past their expiry read as absent. The client injects
//! `Authorization: Bearer <token>` on every request and intercepts 401
//! answers: the stored token is removed and `Error::Unauthorized` returned,
//! so callers only have to tell the user to log in again.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use crate::domain::result::{Error, Result};

/// Default lifetime of a stored token, in minutes
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// Fallback text when the server gives no usable error message
pub const GENERIC_REQUEST_ERROR: &str = "Request failed";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// File-backed bearer token store
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Store kept in `<data_dir>/session.json`
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("session.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<StoredToken>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        // A corrupt file is treated like a missing one
        Ok(serde_json::from_str(&content).ok())
    }

    /// Current token, or `None` when absent or expired
    pub fn get(&self) -> Result<Option<String>> {
        Ok(self
            .read()?
            .filter(|stored| stored.expires_at > Utc::now())
            .map(|stored| stored.token))
    }

    /// Expiry of the stored token, even if already past
    pub fn expires_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.read()?.map(|stored| stored.expires_at))
    }

    /// Save `token`, valid for `ttl_minutes` from now
    pub fn set(&self, token: &str, ttl_minutes: i64) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::validation("Token cannot be empty"));
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredToken {
            token: token.to_string(),
            expires_at: Utc::now() + ChronoDuration::minutes(ttl_minutes),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }

    /// Forget the token. Removing a missing token is not an error.
    pub fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.get(), Ok(Some(_)))
    }
}

/// Short SHA-256 fingerprint of a token, safe to print
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..8])
}

/// `exp` claim of a JWT, when the token is one and the claim is present.
///
/// The signature is not checked; this is only for display.
pub fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: JsonValue = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    Utc.timestamp_opt(exp, 0).single()
}

/// HTTP client that attaches the bearer token and intercepts 401
#[derive(Debug)]
pub struct AuthenticatedClient {
    client: Client,
    base_url: String,
    tokens: TokenStore,
    /// Token given explicitly (e.g. from the environment), bypassing the store
    token_override: Option<String>,
}

impl AuthenticatedClient {
    pub fn new(base_url: &str, timeout_seconds: u64, tokens: TokenStore) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| Error::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            token_override: None,
        })
    }

    /// Use `token` instead of the stored one
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token_override = if token.trim().is_empty() {
            None
        } else {
            Some(token.trim().to_string())
        };
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn current_token(&self) -> Option<String> {
        self.token_override
            .clone()
            .or_else(|| self.tokens.get().ok().flatten())
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let builder = match self.current_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().map_err(|e| self.map_request_error(e))?;

        if response.status().as_u16() == 401 {
            // Same as a browser session expiring: drop the token, caller re-authenticates
            let _ = self.tokens.remove();
            return Err(Error::Unauthorized);
        }

        Ok(response)
    }

    fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&JsonValue>,
    ) -> Result<T> {
        let mut builder = self.client.request(method, self.url(path));
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = self.send(builder)?;
        let status = response.status();
        let text = response.text().map_err(|e| self.map_request_error(e))?;

        if !status.is_success() {
            let code = status.as_u16();
            return Err(Error::Api {
                status: code,
                message: extract_error_message(&text)
                    .unwrap_or_else(|| format!("{} (HTTP {})", GENERIC_REQUEST_ERROR, code)),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// Authenticated GET, JSON response
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, None)
    }

    /// Authenticated POST with a JSON body, JSON response
    pub fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, path, Some(&body))
    }

    /// Authenticated DELETE, JSON response
    pub fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::DELETE, path, None)
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::transport("Connection to the reconciliation server timed out")
        } else if error.is_connect() {
            Error::transport(format!("Unable to connect to {}", self.base_url))
        } else {
            Error::transport(format!("Request failed: {}", error))
        }
    }
}

/// Pull a human message out of an error body.
///
/// FastAPI answers `{"detail": "..."}` (or a list of validation problems),
/// hand-written endpoints answer `{"error": "..."}`.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;

    let text = |v: &JsonValue| -> Option<String> {
        match v {
            JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            JsonValue::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(|item| match item {
                        JsonValue::String(s) => Some(s.clone()),
                        JsonValue::Object(_) => item
                            .get("msg")
                            .and_then(|m| m.as_str())
                            .map(str::to_string),
                        _ => None,
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("; "))
                }
            }
            _ => None,
        }
    };

    ["detail", "error", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(text))
}
