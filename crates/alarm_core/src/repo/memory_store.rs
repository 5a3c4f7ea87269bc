//! In-memory alarm store.
//!
//! Reference implementation of `AlarmStore` used by tests and by callers
//! that do not need durability.
//!
//! # Invariants
//! - Ids start at 1 and increase monotonically; deleted ids are never reused.
//! - `BTreeMap` keyed by id keeps listing in creation order.

use crate::model::alarm::{Alarm, AlarmDraft, AlarmId};
use crate::repo::alarm_repo::{AlarmListQuery, AlarmStore, RepoError, RepoResult};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    last_id: AlarmId,
    alarms: BTreeMap<AlarmId, AlarmDraft>,
}

/// `Mutex`-guarded map store.
#[derive(Debug, Default)]
pub struct InMemoryAlarmStore {
    state: Mutex<MemoryState>,
}

impl InMemoryAlarmStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored alarms.
    pub fn len(&self) -> RepoResult<usize> {
        Ok(self.lock()?.alarms.len())
    }

    pub fn is_empty(&self) -> RepoResult<bool> {
        Ok(self.lock()?.alarms.is_empty())
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| RepoError::LockPoisoned)
    }
}

impl AlarmStore for InMemoryAlarmStore {
    fn create(&self, draft: &AlarmDraft) -> RepoResult<Alarm> {
        draft.validate()?;

        let mut state = self.lock()?;
        state.last_id += 1;
        let id = state.last_id;
        state.alarms.insert(id, draft.clone());
        Ok(Alarm::from_draft(id, draft.clone()))
    }

    fn list(&self, query: &AlarmListQuery) -> RepoResult<Vec<Alarm>> {
        let state = self.lock()?;
        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);

        Ok(state
            .alarms
            .iter()
            .skip(skip)
            .take(limit)
            .map(|(&id, draft)| Alarm::from_draft(id, draft.clone()))
            .collect())
    }

    fn get(&self, id: AlarmId) -> RepoResult<Option<Alarm>> {
        let state = self.lock()?;
        Ok(state
            .alarms
            .get(&id)
            .map(|draft| Alarm::from_draft(id, draft.clone())))
    }

    fn update(&self, id: AlarmId, draft: &AlarmDraft) -> RepoResult<Option<Alarm>> {
        draft.validate()?;

        let mut state = self.lock()?;
        match state.alarms.get_mut(&id) {
            Some(stored) => {
                *stored = draft.clone();
                Ok(Some(Alarm::from_draft(id, draft.clone())))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, id: AlarmId) -> RepoResult<bool> {
        Ok(self.lock()?.alarms.remove(&id).is_some())
    }
}
