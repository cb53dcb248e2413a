//! Authentication endpoints: login, registration, logout, current user.

use serde::Serialize;
use tracing::{info, instrument};

use notarium_core::{LoginResponse, Result, User};

use crate::client::ApiClient;

#[derive(Serialize)]
struct CredentialsPayload<'a> {
    username: &'a str,
    password: &'a str,
}

/// Client for `/api/auth`.
#[derive(Clone)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Log in and install the session token on the shared client.
    #[instrument(skip(self, password), fields(component = "auth"))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let response: LoginResponse = self
            .api
            .post_data("/auth/login", &CredentialsPayload { username, password })
            .await?;
        self.api.set_token(&response.token);
        info!(username, "Logged in");
        Ok(response)
    }

    /// Register a new account; the backend logs the account in immediately.
    #[instrument(skip(self, password), fields(component = "auth"))]
    pub async fn register(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let response: LoginResponse = self
            .api
            .post_data("/auth/register", &CredentialsPayload { username, password })
            .await?;
        self.api.set_token(&response.token);
        Ok(response)
    }

    /// Log out. The token is dropped locally even when the request fails,
    /// since the backend session is stateless.
    pub async fn logout(&self) -> Result<()> {
        let result = self.api.post_unit("/auth/logout").await;
        self.api.clear_token();
        result
    }

    /// Fetch the authenticated principal.
    pub async fn current_user(&self) -> Result<User> {
        self.api.get_data("/auth/current", &[]).await
    }
}
