//! Rate-limited, token-authenticated PBX client.
//!
//! Credentials and the cached token live in the settings row, so several
//! client instances (and restarts) share one token. Every outbound request,
//! token requests included, first waits on the shared [`RequestSpacer`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use parking_lot::RwLock;
use pbxpresence_common::{Clock, RequestSpacer, SystemClock};
use pbxpresence_core::{PbxGateway, SecretCipher, SettingsRepository};
use pbxpresence_domain::constants::{
    DEFAULT_REQUEST_TIMEOUT_SECS, PBX_API_PREFIX, PBX_USER_AGENT,
};
use pbxpresence_domain::{PbxConfig, PresenceError, PresenceStatus, RemoteExtension, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::errors::PbxApiError;
use super::token::TokenState;
use super::types::{
    error_message, ApiAck, ExtensionSearchResponse, TokenRequest, TokenResponse,
    UpdatePresenceRequest,
};
use crate::http::HttpClient;

/// Transport settings for [`PbxClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbxClientConfig {
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
}

impl Default for PbxClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            accept_invalid_certs: true,
        }
    }
}

impl From<&PbxConfig> for PbxClientConfig {
    fn from(config: &PbxConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.request_timeout_secs),
            accept_invalid_certs: config.accept_invalid_certs,
        }
    }
}

/// Decrypted credentials for one call.
struct Credentials {
    base_url: String,
    client_id: String,
    client_secret: String,
}

/// PBX OpenAPI client implementing [`PbxGateway`].
pub struct PbxClient {
    http: HttpClient,
    settings: Arc<dyn SettingsRepository>,
    cipher: Arc<dyn SecretCipher>,
    spacer: Arc<RequestSpacer>,
    clock: Arc<dyn Clock>,
    token_state: RwLock<TokenState>,
    /// Serializes token refreshes so concurrent callers authenticate once.
    auth_lock: Mutex<()>,
}

impl PbxClient {
    pub fn new(
        config: PbxClientConfig,
        settings: Arc<dyn SettingsRepository>,
        cipher: Arc<dyn SecretCipher>,
        spacer: Arc<RequestSpacer>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder()
            .timeout(config.timeout)
            .user_agent(PBX_USER_AGENT)
            .default_headers(headers)
            .accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            http,
            settings,
            cipher,
            spacer,
            clock: Arc::new(SystemClock),
            token_state: RwLock::new(TokenState::NoToken),
            auth_lock: Mutex::new(()),
        })
    }

    /// Replace the clock used for token expiry decisions.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// State observed by the last token check or authentication.
    pub fn token_state(&self) -> TokenState {
        *self.token_state.read()
    }

    /// Request a fresh token and persist it with its expiry.
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> Result<()> {
        let credentials = self.credentials()?;
        let _guard = self.auth_lock.lock().await;
        self.request_token(&credentials).await.map(|_| ())
    }

    fn credentials(&self) -> Result<Credentials> {
        let settings = self.settings.load_settings()?;
        if !settings.has_credentials() {
            return Err(PresenceError::ConfigurationMissing(
                settings.missing_credentials().join(", "),
            ));
        }

        let (Some(base_url), Some(client_id), Some(secret)) =
            (settings.pbx_url, settings.client_id, settings.client_secret_encrypted)
        else {
            return Err(PresenceError::ConfigurationMissing(
                "pbx_url, client_id, client_secret".into(),
            ));
        };

        Ok(Credentials {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            client_id,
            client_secret: self.cipher.decrypt(&secret)?,
        })
    }

    fn endpoint(
        base_url: &str,
        path: &str,
        access_token: Option<&str>,
    ) -> std::result::Result<Url, PbxApiError> {
        let mut url = Url::parse(&format!("{base_url}/{PBX_API_PREFIX}/{path}"))
            .map_err(|err| PbxApiError::InvalidUrl(format!("{base_url}: {err}")))?;
        if let Some(token) = access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }
        Ok(url)
    }

    /// Return a usable token, authenticating first unless the cached one is
    /// valid for more than the refresh window.
    async fn ensure_token(&self, credentials: &Credentials) -> Result<String> {
        let _guard = self.auth_lock.lock().await;

        let settings = self.settings.load_settings()?;
        let now = self.clock.now();
        let state = match self.token_state() {
            TokenState::Invalid => TokenState::Invalid,
            _ => TokenState::evaluate(
                settings.access_token.as_deref(),
                settings.token_expires_at,
                now,
            ),
        };

        match (state, settings.access_token) {
            (TokenState::Valid, Some(token)) => {
                *self.token_state.write() = TokenState::Valid;
                Ok(token)
            }
            (state, _) => {
                debug!(?state, "PBX token needs refresh");
                self.request_token(credentials).await
            }
        }
    }

    async fn request_token(&self, credentials: &Credentials) -> Result<String> {
        match self.fetch_token(credentials).await {
            Ok(token) => Ok(token),
            Err(err) => {
                self.invalidate_token();
                warn!(error = %err, "PBX authentication failed");
                Err(err)
            }
        }
    }

    async fn fetch_token(&self, credentials: &Credentials) -> Result<String> {
        self.spacer.acquire().await;

        let url = Self::endpoint(&credentials.base_url, "get_token", None)?;
        let request = self.http.request(Method::POST, url).json(&TokenRequest {
            username: &credentials.client_id,
            password: &credentials.client_secret,
        });

        let response = self.http.send(request).await.map_err(|err| {
            PresenceError::Authentication(format!("connection error: {err}"))
        })?;
        let body: TokenResponse = read_json(response, "get_token")
            .await
            .map_err(|err| PresenceError::Authentication(err.to_string()))?;

        if body.errcode != 0 {
            return Err(PbxApiError::Auth(error_message(body.errmsg)).into());
        }

        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PbxApiError::Auth("response carried no access_token".into()))?;
        let lifetime = body.access_token_expire_time.unwrap_or(0).max(0);
        let expires_at = self.clock.now() + ChronoDuration::seconds(lifetime);

        self.settings.save_token(Some(&token), Some(expires_at))?;
        *self.token_state.write() = TokenState::Valid;

        info!(%expires_at, "PBX access token obtained");
        Ok(token)
    }

    fn invalidate_token(&self) {
        *self.token_state.write() = TokenState::Invalid;
        if let Err(err) = self.settings.save_token(None, None) {
            warn!(error = %err, "failed to clear cached PBX token");
        }
    }

    /// Token, spacing, request. 401/403 invalidate the cached token.
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &'static str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let credentials = self.credentials()?;
        let token = self.ensure_token(&credentials).await?;

        self.spacer.acquire().await;

        let url = Self::endpoint(&credentials.base_url, path, Some(&token))?;
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = self.http.send(request).await?;
        match read_json(response, path).await {
            Ok(parsed) => Ok(parsed),
            Err(err @ PbxApiError::Http { status: 401 | 403, .. }) => {
                self.invalidate_token();
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }
}

async fn read_json<T: DeserializeOwned>(
    response: Response,
    endpoint: &str,
) -> std::result::Result<T, PbxApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(PbxApiError::Http { status: status.as_u16(), endpoint: endpoint.to_string() });
    }
    response.json::<T>().await.map_err(|err| PbxApiError::InvalidResponse(err.to_string()))
}

#[async_trait]
impl PbxGateway for PbxClient {
    #[instrument(skip(self))]
    async fn list_extensions(&self) -> Result<Vec<RemoteExtension>> {
        let body: ExtensionSearchResponse =
            self.call(Method::GET, "extension/search", None).await?;

        if body.errcode != 0 {
            return Err(
                PbxApiError::Api { code: body.errcode, message: error_message(body.errmsg) }.into()
            );
        }

        debug!(count = body.data.len(), "PBX extensions listed");
        Ok(body.data.into_iter().map(RemoteExtension::from).collect())
    }

    #[instrument(skip(self, status), fields(status = %status))]
    async fn set_presence(&self, remote_id: i64, status: &PresenceStatus) -> Result<()> {
        let payload = serde_json::to_value(UpdatePresenceRequest {
            id: remote_id,
            presence_status: status.as_str(),
        })
        .map_err(|err| PresenceError::Internal(format!("failed to encode request: {err}")))?;

        let ack: ApiAck = self.call(Method::POST, "extension/update", Some(payload)).await?;
        if ack.errcode != 0 {
            return Err(
                PbxApiError::Api { code: ack.errcode, message: error_message(ack.errmsg) }.into()
            );
        }

        debug!(remote_id, "PBX presence updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_prefix_and_token() {
        let url =
            PbxClient::endpoint("https://pbx.example:8088", "extension/search", Some("a b"))
                .unwrap();
        assert_eq!(url.path(), "/openapi/v1.0/extension/search");
        assert_eq!(url.query(), Some("access_token=a+b"));
    }

    #[test]
    fn endpoint_rejects_garbage_base() {
        let err = PbxClient::endpoint("not a url", "get_token", None).unwrap_err();
        assert!(matches!(err, PbxApiError::InvalidUrl(_)));
    }

    #[test]
    fn config_follows_pbx_section() {
        let pbx = PbxConfig {
            request_timeout_secs: 3,
            accept_invalid_certs: false,
            ..Default::default()
        };
        let config = PbxClientConfig::from(&pbx);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert!(!config.accept_invalid_certs);
    }
}
