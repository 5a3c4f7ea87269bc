//! Core domain logic for the alarm backend.
//! This crate is the single source of truth for alarm invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

use serde::Serialize;

pub use config::{ConfigError, CoreConfig, DatabaseLocation};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::alarm::{
    Alarm, AlarmChanges, AlarmCreateInput, AlarmDraft, AlarmId, AlarmUpdateInput,
    AlarmValidationError, Patch,
};
pub use repo::alarm_repo::{
    AlarmListQuery, AlarmStore, RepoError, RepoResult, SqliteAlarmStore, DEFAULT_LIST_LIMIT,
};
pub use repo::memory_store::InMemoryAlarmStore;
pub use service::alarm_service::{AlarmService, ServiceError, ServiceResult};

/// Liveness payload for a transport health route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
}

/// Reports that the core is linked and usable.
pub fn health() -> HealthStatus {
    HealthStatus {
        status: "ok",
        message: "Alarm API is running",
        version: core_version(),
    }
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, health};

    #[test]
    fn health_reports_ok() {
        let status = health();
        assert_eq!(status.status, "ok");
        assert_eq!(status.version, core_version());
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
