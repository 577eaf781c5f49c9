// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider: who is signed in.
//!
//! `FirebaseAuth` talks to the Identity Toolkit REST API for email/password
//! accounts and keeps the current identity in a watch channel, so every
//! subscriber sees the current value first and then each change.

use crate::error::{AppError, Result};
use crate::models::Identity;
use crate::validation::Credentials;
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::watch;

/// One notification from the identity stream: the current identity, or a
/// failure of the provider itself.
pub type IdentityUpdate = Result<Option<Identity>>;

/// Long-lived identity subscription; dropping it unsubscribes.
pub type IdentityStream = BoxStream<'static, IdentityUpdate>;

/// Source of authentication state.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Subscribe to identity changes. Emits at least once, with the current state.
    fn subscribe(&self) -> IdentityStream;

    /// End the current session. Subscribers observe `None`.
    async fn sign_out(&self) -> Result<()>;
}

/// Firebase email/password authentication over the Identity Toolkit API.
#[derive(Clone)]
pub struct FirebaseAuth {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    current: Arc<watch::Sender<Option<Identity>>>,
}

impl FirebaseAuth {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            current: Arc::new(current),
        }
    }

    /// Currently signed-in identity, if any.
    pub fn current_identity(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    /// Sign in with an existing email/password account.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Identity> {
        let identity = self
            .password_request("accounts:signInWithPassword", credentials)
            .await?;
        tracing::info!(uid = %identity.uid, "Signed in");
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    /// Create a new email/password account. The new account is signed in.
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<Identity> {
        let identity = self.password_request("accounts:signUp", credentials).await?;
        tracing::info!(uid = %identity.uid, "Account created");
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn password_request(&self, method: &str, credentials: &Credentials) -> Result<Identity> {
        let url = format!("{}/{}", self.base_url, method);

        let body = serde_json::json!({
            "email": credentials.email,
            "password": credentials.password,
            "returnSecureToken": true,
        });

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = parse_error_message(&body).unwrap_or(body);
            tracing::warn!(%status, error = %message, method, "Identity provider rejected request");
            return Err(AppError::IdentityProvider(message));
        }

        let account: AccountResponse = response
            .json()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("Invalid response: {}", e)))?;

        Ok(Identity {
            uid: account.local_id,
            email: account.email.or_else(|| Some(credentials.email.clone())),
            display_name: account.display_name.filter(|name| !name.is_empty()),
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    fn subscribe(&self) -> IdentityStream {
        watch_stream(self.current.subscribe()).map(Ok).boxed()
    }

    async fn sign_out(&self) -> Result<()> {
        if let Some(identity) = self.current.send_replace(None) {
            tracing::info!(uid = %identity.uid, "Signed out");
        }
        Ok(())
    }
}

/// Stream the current value of a watch channel, then every change.
fn watch_stream<T>(rx: watch::Receiver<T>) -> BoxStream<'static, T>
where
    T: Clone + Send + Sync + 'static,
{
    stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let value = rx.borrow_and_update().clone();
        Some((value, (rx, false)))
    })
    .boxed()
}

/// Account fields returned by `signInWithPassword` and `signUp`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Extract the provider's error code (e.g. `EMAIL_EXISTS`) from an error body.
fn parse_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
}
