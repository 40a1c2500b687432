// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer credential acquisition and caching.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use murmur_config::model::AuthConfig;
use murmur_core::{Credential, CredentialSource, MurmurError};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::debug;

/// Issues the token from the `[auth]` config section.
///
/// Each acquisition is stamped with `token_ttl_secs` of validity so the
/// manager re-reads it periodically, as it would with a real session issuer.
pub struct ConfigCredentialSource {
    token: Option<SecretString>,
    ttl: Duration,
}

impl ConfigCredentialSource {
    pub fn new(auth: &AuthConfig) -> Self {
        Self {
            token: auth.token.clone().map(SecretString::from),
            ttl: seconds(auth.token_ttl_secs),
        }
    }
}

#[async_trait]
impl CredentialSource for ConfigCredentialSource {
    async fn acquire(&self) -> Result<Option<Credential>, MurmurError> {
        Ok(self.token.as_ref().map(|token| {
            Credential::new(
                token.expose_secret().to_string(),
                Utc::now().checked_add_signed(self.ttl),
            )
        }))
    }
}

/// Owns the session credential.
///
/// The credential is fetched lazily before a call and re-acquired once it is
/// within `refresh_skew` of expiring. It lives only in memory.
pub struct CredentialManager {
    source: Arc<dyn CredentialSource>,
    cached: Mutex<Option<Credential>>,
    refresh_skew: Duration,
}

impl CredentialManager {
    pub fn new(source: Arc<dyn CredentialSource>, refresh_skew: Duration) -> Self {
        Self {
            source,
            cached: Mutex::new(None),
            refresh_skew,
        }
    }

    /// Builds a manager over the `[auth]` config section.
    pub fn from_config(auth: &AuthConfig) -> Self {
        Self::new(
            Arc::new(ConfigCredentialSource::new(auth)),
            seconds(auth.refresh_skew_secs),
        )
    }

    /// Returns a credential valid for at least the refresh skew.
    ///
    /// Fails with [`MurmurError::NotAuthenticated`] when the source has none.
    pub async fn bearer(&self) -> Result<Credential, MurmurError> {
        let mut cached = self.cached.lock().await;
        if let Some(credential) = cached.as_ref()
            && !credential.expires_within(Utc::now(), self.refresh_skew)
        {
            return Ok(credential.clone());
        }

        debug!("acquiring bearer credential");
        let credential = self
            .source
            .acquire()
            .await?
            .ok_or_else(|| MurmurError::NotAuthenticated("no session token available".into()))?;
        *cached = Some(credential.clone());
        Ok(credential)
    }

    /// Drops the cached credential; the next call re-acquires.
    pub async fn invalidate(&self) {
        if self.cached.lock().await.take().is_some() {
            debug!("bearer credential discarded");
        }
    }
}

fn seconds(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_test_utils::StaticCredentials;

    #[tokio::test]
    async fn credential_is_cached_until_close_to_expiry() {
        let source = Arc::new(StaticCredentials::expiring("t1", Utc::now() + Duration::hours(1)));
        let manager = CredentialManager::new(source.clone(), Duration::seconds(30));

        manager.bearer().await.unwrap();
        manager.bearer().await.unwrap();
        assert_eq!(source.acquisitions(), 1);
    }

    #[tokio::test]
    async fn expiring_credential_is_reacquired() {
        let source = Arc::new(StaticCredentials::expiring("t1", Utc::now() + Duration::seconds(10)));
        let manager = CredentialManager::new(source.clone(), Duration::seconds(30));

        manager.bearer().await.unwrap();
        manager.bearer().await.unwrap();
        assert_eq!(source.acquisitions(), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_reacquisition() {
        let source = Arc::new(StaticCredentials::token("t1"));
        let manager = CredentialManager::new(source.clone(), Duration::seconds(30));

        manager.bearer().await.unwrap();
        manager.invalidate().await;
        assert_eq!(manager.bearer().await.unwrap().expose(), "t1");
        assert_eq!(source.acquisitions(), 2);
    }

    #[tokio::test]
    async fn missing_credential_is_not_authenticated() {
        let manager = CredentialManager::new(Arc::new(StaticCredentials::none()), Duration::zero());
        let err = manager.bearer().await.unwrap_err();
        assert!(matches!(err, MurmurError::NotAuthenticated(_)));
    }

    #[tokio::test]
    async fn config_source_stamps_ttl() {
        let auth = AuthConfig {
            token: Some("from-config".into()),
            token_ttl_secs: 600,
            refresh_skew_secs: 30,
        };
        let credential = ConfigCredentialSource::new(&auth)
            .acquire()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(credential.expose(), "from-config");
        let expires_at = credential.expires_at().unwrap();
        assert!(expires_at > Utc::now() + Duration::seconds(590));

        let logged_out = ConfigCredentialSource::new(&AuthConfig::default());
        assert!(logged_out.acquire().await.unwrap().is_none());
    }
}
