//! Low-level HTTP client: base URL, bearer token, envelope decoding.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use notarium_core::{ApiEnvelope, Error, Result};

use crate::config::ClientConfig;

/// HTTP client for the backend's `/api` surface.
///
/// Cheap to clone; all clones share the bearer token, so a login through one
/// sub-client authenticates the rest. A 401 from any endpoint clears the
/// token and surfaces [`Error::AuthExpired`]; the session must re-login,
/// the request is never retried.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// Build a client from validated configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Install a bearer token (after login/registration).
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().expect("token lock poisoned") = Some(token.into());
    }

    /// Drop the bearer token (logout, auth expiry).
    pub fn clear_token(&self) {
        *self.token.write().expect("token lock poisoned") = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET returning the envelope's data.
    pub async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.request_data(Method::GET, path, query, None::<&()>)
            .await
    }

    /// POST with a JSON body, returning the envelope's data.
    pub async fn post_data<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        self.request_data(Method::POST, path, &[], Some(body)).await
    }

    /// PUT with a JSON body, returning the envelope's data.
    pub async fn put_data<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        self.request_data(Method::PUT, path, &[], Some(body)).await
    }

    /// POST whose envelope carries no data of interest.
    pub async fn post_unit(&self, path: &str) -> Result<()> {
        self.request_unit(Method::POST, path).await
    }

    /// DELETE whose envelope carries no data of interest.
    pub async fn delete_unit(&self, path: &str) -> Result<()> {
        self.request_unit(Method::DELETE, path).await
    }

    async fn request_data<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&impl Serialize>,
    ) -> Result<T> {
        let envelope: ApiEnvelope<T> = self.send(method, path, query, body).await?;
        envelope
            .data
            .ok_or_else(|| Error::Serialization(format!("envelope for {} carried no data", path)))
    }

    async fn request_unit(&self, method: Method, path: &str) -> Result<()> {
        let _: ApiEnvelope<serde_json::Value> = self.send(method, path, &[], None::<&()>).await?;
        Ok(())
    }

    #[instrument(skip(self, body), fields(component = "api_client"))]
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&impl Serialize>,
    ) -> Result<ApiEnvelope<T>> {
        let start = Instant::now();
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = self.token.read().expect("token lock poisoned").as_deref() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Request(format!("{} {} failed: {}", method, path, e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(path, "Backend rejected credentials, clearing token");
            self.clear_token();
            return Err(Error::AuthExpired);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                code: status.as_u16() as i32,
                message,
            });
        }

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("failed to parse {} response: {}", path, e)))?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(path, duration_ms = elapsed, code = envelope.code, "Request complete");
        if elapsed > 10_000 {
            warn!(path, duration_ms = elapsed, slow = true, "Slow backend request");
        }

        if !envelope.is_success() {
            // The backend also signals auth expiry inside the envelope.
            return Err(match envelope.code {
                401 => {
                    self.clear_token();
                    Error::AuthExpired
                }
                404 => Error::NotFound(envelope.message),
                code => Error::Api {
                    code,
                    message: envelope.message,
                },
            });
        }

        Ok(envelope)
    }
}
