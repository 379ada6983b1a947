// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admission control for the Gatehouse engine.
//!
//! The [`AdmissionController`] is the single decision point every inbound
//! event passes through before any expensive downstream work: kill-switch,
//! tier resolution, feature flags, then atomic quota consumption, with one
//! audit record per decision.

pub mod audit;
pub mod controller;

pub use audit::TracingAuditSink;
pub use controller::{AdmissionController, UserStats};
