// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context store for the Gatehouse admission engine: the bounded,
//! most-recent slice of each user's dialog history supplied to downstream
//! AI calls.

pub mod store;

pub use store::ContextStore;
