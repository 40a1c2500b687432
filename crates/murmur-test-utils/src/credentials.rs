// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed credential source for tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use murmur_core::{Credential, CredentialSource, MurmurError};

/// Returns the same token on every acquisition and counts how often it was asked.
pub struct StaticCredentials {
    token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    acquisitions: AtomicUsize,
}

impl StaticCredentials {
    pub fn token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            expires_at: None,
            acquisitions: AtomicUsize::new(0),
        }
    }

    /// A token that expires at `expires_at`.
    pub fn expiring(token: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            expires_at: Some(expires_at),
            ..Self::token(token)
        }
    }

    /// A logged-out user.
    pub fn none() -> Self {
        Self {
            token: None,
            expires_at: None,
            acquisitions: AtomicUsize::new(0),
        }
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn acquire(&self) -> Result<Option<Credential>, MurmurError> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .token
            .as_ref()
            .map(|t| Credential::new(t.clone(), self.expires_at)))
    }
}
