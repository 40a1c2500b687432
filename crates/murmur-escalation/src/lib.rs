// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Escalation workflows for agent owners.
//!
//! An escalation is a question the agent could not answer, offered to its
//! human owner. The owner either answers it, which also teaches the agent
//! the answer, or declines it.

pub mod controller;
pub mod draft;

pub use controller::{AnswerOutcome, DeclineOutcome, EscalationController};
pub use draft::AnswerDraft;
