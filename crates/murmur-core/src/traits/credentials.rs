// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential acquisition trait.

use async_trait::async_trait;

use crate::error::MurmurError;
use crate::types::Credential;

/// Issues bearer credentials for the current session.
///
/// Session issuance itself lives outside this client; implementations wrap
/// whatever the host application uses (a static token, a login service, ...).
#[async_trait]
pub trait CredentialSource: Send + Sync + 'static {
    /// Returns a fresh credential, or `None` if the user is not logged in.
    async fn acquire(&self) -> Result<Option<Credential>, MurmurError>;
}
