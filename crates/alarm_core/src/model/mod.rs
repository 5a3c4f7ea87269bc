//! Alarm domain model.
//!
//! # Responsibility
//! - Define the canonical alarm record and its create/update inputs.
//! - Own every field-level validation rule.
//!
//! # Invariants
//! - Every persisted alarm is identified by a stable integer `AlarmId`.
//! - Deletion is permanent; there are no tombstones.

pub mod alarm;
