// src/auth/identity.rs
//
// Microsoft identity platform sign-in through yup-oauth2's installed-app
// flow. Both paths share one on-disk token cache, so a token obtained
// interactively is picked up by the next silent attempt.

use super::{AuthError, TokenProvider};
use crate::config::IdentityConfig;
use async_trait::async_trait;
use log::{debug, info};
use secrecy::SecretString;
use std::future::Future;
use std::pin::Pin;
use yup_oauth2::authenticator_delegate::InstalledFlowDelegate;
use yup_oauth2::{ApplicationSecret, InstalledFlowAuthenticator, InstalledFlowReturnMethod};

type DelegateFuture<'a> = Pin<Box<dyn Future<Output = Result<String, String>> + Send + 'a>>;

/// Refuses every prompt, so the flow only succeeds from cache or refresh.
struct NoInteraction;

impl InstalledFlowDelegate for NoInteraction {
    fn present_user_url<'a>(&'a self, _url: &'a str, _need_code: bool) -> DelegateFuture<'a> {
        Box::pin(async { Err("interaction not allowed during silent acquisition".to_string()) })
    }
}

// Needed for the identity platform to hand out refresh tokens
const OFFLINE_ACCESS: &str = "offline_access";

/// Opens the consent page in the system browser; the redirect listener
/// picks up the authorization code.
struct BrowserConsent;

impl InstalledFlowDelegate for BrowserConsent {
    fn present_user_url<'a>(&'a self, url: &'a str, _need_code: bool) -> DelegateFuture<'a> {
        Box::pin(async move {
            info!("Opening browser for Microsoft sign-in");
            open_off_runtime(url, |url| webbrowser::open(url)).await?;
            Ok(String::new())
        })
    }
}

/// Launching the browser can block, so it runs on the blocking pool.
async fn open_off_runtime<F>(url: &str, open: F) -> Result<(), String>
where
    F: FnOnce(&str) -> std::io::Result<()> + Send + 'static,
{
    let url = url.to_string();
    tokio::task::spawn_blocking(move || open(&url))
        .await
        .map_err(|e| format!("Browser launch task failed: {}", e))?
        .map_err(|e| format!("Failed to open browser: {}", e))
}

fn with_offline_access(scopes: &[String]) -> Vec<String> {
    let mut scopes = scopes.to_vec();
    if !scopes.iter().any(|s| s == OFFLINE_ACCESS) {
        scopes.push(OFFLINE_ACCESS.to_string());
    }
    scopes
}

pub struct MicrosoftIdentity {
    config: IdentityConfig,
}

impl MicrosoftIdentity {
    pub fn new(config: IdentityConfig) -> Self {
        Self { config }
    }

    fn application_secret(&self) -> ApplicationSecret {
        ApplicationSecret {
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret().to_string(),
            auth_uri: self.config.auth_uri(),
            token_uri: self.config.token_uri(),
            redirect_uris: vec![format!("http://localhost:{}", self.config.redirect_port)],
            ..Default::default()
        }
    }

    async fn token_via(
        &self,
        scopes: &[String],
        method: InstalledFlowReturnMethod,
        delegate: Box<dyn InstalledFlowDelegate>,
    ) -> Result<SecretString, AuthError> {
        let cache = self.config.token_cache_path();
        if let Some(dir) = cache.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        debug!("Using token cache at {:?}", cache);

        let auth = InstalledFlowAuthenticator::builder(self.application_secret(), method)
            .persist_tokens_to_disk(cache)
            .flow_delegate(delegate)
            .build()
            .await?;

        let scopes = with_offline_access(scopes);
        let token = auth.token(&scopes[..]).await?;
        token
            .token()
            .map(|t| SecretString::new(t.into()))
            .ok_or(AuthError::MissingAccessToken)
    }
}

#[async_trait]
impl TokenProvider for MicrosoftIdentity {
    async fn acquire_silent(&self, scopes: &[String]) -> Result<SecretString, AuthError> {
        // No listener is needed: the delegate fails before any code is read
        self.token_via(
            scopes,
            InstalledFlowReturnMethod::Interactive,
            Box::new(NoInteraction),
        )
        .await
    }

    async fn acquire_interactive(&self, scopes: &[String]) -> Result<SecretString, AuthError> {
        self.token_via(
            scopes,
            InstalledFlowReturnMethod::HTTPPortRedirect(self.config.redirect_port),
            Box::new(BrowserConsent),
        )
        .await
    }
}
