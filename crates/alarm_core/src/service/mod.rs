//! Core use-case services.
//!
//! # Responsibility
//! - Enforce alarm business rules in front of the store.
//! - Keep transport layers decoupled from storage details.

pub mod alarm_service;
