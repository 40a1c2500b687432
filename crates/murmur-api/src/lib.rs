// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport for the Murmur client.
//!
//! Implements [`Backend`](murmur_core::Backend) over the Murmur REST API
//! with bearer authentication, status mapping and transient retry.

pub mod client;
pub mod credentials;
mod endpoints;

pub use client::HttpBackend;
pub use credentials::{ConfigCredentialSource, CredentialManager};
