// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seams between the client and its external collaborators.
//!
//! Both traits use `#[async_trait]` so implementations can be held as
//! `Arc<dyn Trait>` by the client context.

pub mod backend;
pub mod credentials;

pub use backend::{Backend, ByteStream};
pub use credentials::CredentialSource;
