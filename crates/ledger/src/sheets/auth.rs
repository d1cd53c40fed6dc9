//! Service account authorization (OAuth 2.0 JWT bearer grant).
use std::{
    fmt,
    path::Path,
    sync::Arc,
    time::{Duration, Instant},
};

use base64::Engine;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::api::Scope;
use crate::{Error, ResultLedger};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Credentials of a Google service account, as downloaded from the console.
#[derive(Clone, Deserialize)]
pub struct ServiceAccount {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

impl ServiceAccount {
    pub fn from_json(raw: &str) -> ResultLedger<Self> {
        serde_json::from_str(raw).map_err(|err| {
            Error::Configuration(format!("invalid service account credentials: {err}"))
        })
    }

    pub fn from_file(path: &Path) -> ResultLedger<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            Error::Configuration(format!(
                "cannot read credentials file {}: {err}",
                path.display()
            ))
        })?;
        Self::from_json(&raw)
    }

    /// Credentials passed as the base64 encoding of the JSON file.
    pub fn from_base64(encoded: &str) -> ResultLedger<Self> {
        let raw = base64::prelude::BASE64_STANDARD
            .decode(encoded.trim())
            .map_err(|err| Error::Configuration(format!("invalid base64 credentials: {err}")))?;
        let raw = String::from_utf8(raw)
            .map_err(|err| Error::Configuration(format!("invalid credentials encoding: {err}")))?;
        Self::from_json(&raw)
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Signed JWT asking for `scope`, issued at `now` (unix seconds).
    fn assertion(&self, scope: Scope, now: i64) -> ResultLedger<String> {
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|err| Error::Configuration(format!("invalid service account key: {err}")))?;
        let claims = Claims {
            iss: &self.client_email,
            scope: scope.url(),
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|err| Error::Configuration(format!("cannot sign token request: {err}")))
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Access token for one scope, fetched on first use and cached until it is
/// about to expire.
pub(crate) struct ScopedToken {
    client: Client,
    account: Arc<ServiceAccount>,
    scope: Scope,
    cached: Mutex<Option<CachedToken>>,
}

impl ScopedToken {
    pub(crate) fn new(client: Client, account: Arc<ServiceAccount>, scope: Scope) -> Self {
        Self {
            client,
            account,
            scope,
            cached: Mutex::new(None),
        }
    }

    pub(crate) async fn bearer(&self) -> ResultLedger<String> {
        let mut guard = self.cached.lock().await;
        if let Some(token) = guard.as_ref()
            && token.expires_at > Instant::now()
        {
            return Ok(token.value.clone());
        }

        let token = self.fetch().await?;
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }

    fn token_request(&self, assertion: &str) -> RequestBuilder {
        self.client
            .post(&self.account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion)])
    }

    async fn fetch(&self) -> ResultLedger<CachedToken> {
        tracing::debug!(
            "Requesting access token for {} with scope {}",
            self.account.client_email,
            self.scope
        );
        let assertion = self.account.assertion(self.scope, chrono::Utc::now().timestamp())?;

        let resp = self.token_request(&assertion).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .text()
                .await
                .unwrap_or_else(|_| "token request failed".to_string());
            return Err(Error::Api { status, message });
        }

        let token = resp.json::<TokenResponse>().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        Ok(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}
