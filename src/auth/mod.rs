// src/auth/mod.rs
pub mod identity;

use async_trait::async_trait;
use log::{error, warn};
use secrecy::SecretString;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("OAuth error: {0}")]
    OAuth(#[from] yup_oauth2::Error),

    #[error("Failed to set up token cache: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token response carried no access token")]
    MissingAccessToken,

    #[error("Sign-in required")]
    InteractionRequired,

    #[error("Token request rejected: {0}")]
    Rejected(String),
}

/// Source of delegated access tokens for the signed-in user.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a cached or refreshed token without involving the user.
    async fn acquire_silent(&self, scopes: &[String]) -> Result<SecretString, AuthError>;

    /// Walks the user through sign-in and consent.
    async fn acquire_interactive(&self, scopes: &[String]) -> Result<SecretString, AuthError>;
}

/// Silent first, interactive second. If both fail, the interactive error
/// is the one returned.
pub async fn acquire_token<P>(provider: &P, scopes: &[String]) -> Result<SecretString, AuthError>
where
    P: TokenProvider + ?Sized,
{
    match provider.acquire_silent(scopes).await {
        Ok(token) => Ok(token),
        Err(silent_err) => {
            warn!(
                "Silent token acquisition failed, acquiring interactively: {}",
                silent_err
            );
            provider.acquire_interactive(scopes).await.map_err(|e| {
                error!("Interactive token acquisition failed: {}", e);
                e
            })
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted provider: `None` on a path means that path fails.
    #[derive(Default)]
    pub struct ScriptedProvider {
        pub silent: Option<&'static str>,
        pub interactive: Option<&'static str>,
        pub silent_calls: AtomicUsize,
        pub interactive_calls: AtomicUsize,
    }

    impl ScriptedProvider {
        pub fn new(silent: Option<&'static str>, interactive: Option<&'static str>) -> Self {
            Self {
                silent,
                interactive,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl TokenProvider for ScriptedProvider {
        async fn acquire_silent(&self, _scopes: &[String]) -> Result<SecretString, AuthError> {
            self.silent_calls.fetch_add(1, Ordering::SeqCst);
            self.silent
                .map(|t| SecretString::new(t.into()))
                .ok_or(AuthError::InteractionRequired)
        }

        async fn acquire_interactive(&self, _scopes: &[String]) -> Result<SecretString, AuthError> {
            self.interactive_calls.fetch_add(1, Ordering::SeqCst);
            self.interactive
                .map(|t| SecretString::new(t.into()))
                .ok_or_else(|| AuthError::Rejected("popup closed".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedProvider;
    use super::*;
    use secrecy::ExposeSecret;
    use std::sync::atomic::Ordering;

    fn scopes() -> Vec<String> {
        vec!["Calendars.ReadWrite".to_string()]
    }

    #[tokio::test]
    async fn silent_token_skips_interaction() {
        let provider = ScriptedProvider::new(Some("cached"), Some("fresh"));
        let token = acquire_token(&provider, &scopes()).await.unwrap();
        assert_eq!(token.expose_secret(), "cached");
        assert_eq!(provider.interactive_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn falls_back_to_interactive() {
        let provider = ScriptedProvider::new(None, Some("fresh"));
        let token = acquire_token(&provider, &scopes()).await.unwrap();
        assert_eq!(token.expose_secret(), "fresh");
        assert_eq!(provider.silent_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.interactive_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn interactive_error_is_surfaced() {
        let provider = ScriptedProvider::new(None, None);
        let err = acquire_token(&provider, &scopes()).await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected(ref msg) if msg == "popup closed"));
    }
}
