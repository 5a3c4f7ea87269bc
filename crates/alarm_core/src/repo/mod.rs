//! Alarm persistence contract and implementations.
//!
//! # Responsibility
//! - Define the `AlarmStore` contract the service layer depends on.
//! - Isolate SQLite query details from validation and merge logic.
//! - Provide an in-memory reference store.
//!
//! # Invariants
//! - Store writes call `AlarmDraft::validate()` before persisting.
//! - Absent ids are reported as `None`/`false`, never as errors.

pub mod alarm_repo;
pub mod memory_store;
