// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Murmur integration tests.
//!
//! Provides a scripted backend and credential source so the client can be
//! exercised deterministically without a server.
//!
//! # Components
//!
//! - [`MockBackend`] - backend with per-endpoint scripted results, call recording and gates
//! - [`StaticCredentials`] - credential source returning a fixed token (or none)
//! - [`frames`] - builders for reply-stream bodies

pub mod credentials;
pub mod frames;
pub mod mock_backend;

pub use credentials::StaticCredentials;
pub use mock_backend::{Call, Endpoint, MockBackend, StreamScript, offline};
