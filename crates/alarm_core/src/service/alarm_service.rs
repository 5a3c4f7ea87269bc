//! Alarm use-case service.
//!
//! # Responsibility
//! - Validate every input before any store call.
//! - Merge partial updates onto the stored record and write the full result.
//! - Turn absent store results into `NotFound`.
//!
//! # Invariants
//! - A validation failure never reaches the store (no partial writes).
//! - `update`/`toggle` perform exactly one read followed by one write.
//! - Service layer stays storage-agnostic.

use crate::model::alarm::{
    Alarm, AlarmCreateInput, AlarmId, AlarmUpdateInput, AlarmValidationError,
};
use crate::repo::alarm_repo::{AlarmListQuery, AlarmStore, RepoError};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for alarm use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Input failed a field constraint.
    Validation(AlarmValidationError),
    /// No alarm with this id.
    NotFound(AlarmId),
    /// Persistence-layer failure. Not retried.
    Storage(RepoError),
}

impl ServiceError {
    /// HTTP status a transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 422,
            Self::NotFound(_) => 404,
            Self::Storage(_) => 500,
        }
    }

    /// Stable machine-readable code for logs and error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::NotFound(_) => "alarm_not_found",
            Self::Storage(_) => "storage_failed",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid alarm: {err}"),
            Self::NotFound(id) => write!(f, "alarm not found: {id}"),
            Self::Storage(err) => write!(f, "alarm storage failed: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<AlarmValidationError> for ServiceError {
    fn from(value: AlarmValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Storage(other),
        }
    }
}

/// Alarm service facade over an `AlarmStore`.
pub struct AlarmService<S: AlarmStore> {
    store: S,
}

impl<S: AlarmStore> AlarmService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrows the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates `input`, applies defaults and persists a new alarm.
    ///
    /// # Errors
    /// - `Validation` when `time` is missing or malformed, `snooze_duration`
    ///   is outside `[1, 60]`, or a repeat day is outside `[0, 6]`.
    pub fn create_alarm(&self, input: AlarmCreateInput) -> ServiceResult<Alarm> {
        let started_at = Instant::now();
        let result = input
            .into_draft()
            .map_err(ServiceError::from)
            .and_then(|draft| self.store.create(&draft).map_err(ServiceError::from));

        log_outcome("alarm_create", None, started_at, &result);
        result
    }

    /// Lists alarms in creation order. Negative `skip`/`limit` clamp to zero.
    pub fn list_alarms(&self, skip: i64, limit: i64) -> ServiceResult<Vec<Alarm>> {
        let query = AlarmListQuery {
            skip: clamp_window(skip),
            limit: clamp_window(limit),
        };
        let alarms = self.store.list(&query)?;
        debug!(
            "event=alarm_list module=service status=ok skip={} limit={} count={}",
            query.skip,
            query.limit,
            alarms.len()
        );
        Ok(alarms)
    }

    /// Gets one alarm by id.
    pub fn get_alarm(&self, id: AlarmId) -> ServiceResult<Alarm> {
        self.store.get(id)?.ok_or(ServiceError::NotFound(id))
    }

    /// Applies only the supplied fields of `input` to an existing alarm.
    ///
    /// Input is validated before the store is touched, so a bad field aborts
    /// the whole update.
    pub fn update_alarm(&self, id: AlarmId, input: AlarmUpdateInput) -> ServiceResult<Alarm> {
        let started_at = Instant::now();
        let result = self.merge_and_write(id, input);

        log_outcome("alarm_update", Some(id), started_at, &result);
        result
    }

    /// Flips `enabled` and persists the result.
    pub fn toggle_alarm(&self, id: AlarmId) -> ServiceResult<Alarm> {
        let started_at = Instant::now();
        let result = self.get_alarm(id).and_then(|current| {
            let mut draft = current.to_draft();
            draft.enabled = !draft.enabled;
            self.store
                .update(id, &draft)?
                .ok_or(ServiceError::NotFound(id))
        });

        log_outcome("alarm_toggle", Some(id), started_at, &result);
        result
    }

    /// Permanently removes an alarm.
    pub fn delete_alarm(&self, id: AlarmId) -> ServiceResult<()> {
        let started_at = Instant::now();
        let result = match self.store.delete(id) {
            Ok(true) => Ok(()),
            Ok(false) => Err(ServiceError::NotFound(id)),
            Err(err) => Err(err.into()),
        };

        log_outcome("alarm_delete", Some(id), started_at, &result);
        result
    }

    fn merge_and_write(&self, id: AlarmId, input: AlarmUpdateInput) -> ServiceResult<Alarm> {
        let changes = input.validate()?;
        let current = self.get_alarm(id)?;

        let mut draft = current.to_draft();
        changes.apply_to(&mut draft);

        self.store
            .update(id, &draft)?
            .ok_or(ServiceError::NotFound(id))
    }
}

fn clamp_window(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn log_outcome<T>(
    event: &str,
    id: Option<AlarmId>,
    started_at: Instant,
    result: &ServiceResult<T>,
) where
    T: AlarmRef,
{
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(value) => {
            let alarm_id = value.alarm_id().or(id).unwrap_or_default();
            info!(
                "event={event} module=service status=ok alarm_id={alarm_id} duration_ms={duration_ms}"
            );
        }
        Err(ServiceError::Storage(err)) => {
            error!(
                "event={event} module=service status=error alarm_id={} duration_ms={duration_ms} error_code=storage_failed error={err}",
                id_label(id)
            );
        }
        Err(err) => {
            let field = match err {
                ServiceError::Validation(validation) => validation.field(),
                _ => "id",
            };
            warn!(
                "event={event} module=service status=rejected alarm_id={} duration_ms={duration_ms} error_code={} field={field}",
                id_label(id),
                err.code()
            );
        }
    }
}

fn id_label(id: Option<AlarmId>) -> String {
    id.map_or_else(|| "none".to_string(), |id| id.to_string())
}

/// Success payloads that may carry an alarm id for logging.
trait AlarmRef {
    fn alarm_id(&self) -> Option<AlarmId>;
}

impl AlarmRef for Alarm {
    fn alarm_id(&self) -> Option<AlarmId> {
        Some(self.id)
    }
}

impl AlarmRef for () {
    fn alarm_id(&self) -> Option<AlarmId> {
        None
    }
}
