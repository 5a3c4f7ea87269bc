//! Alarm store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/list/get/update/delete over the `alarms` table.
//! - Keep SQL and column encoding inside the persistence boundary.
//!
//! # Invariants
//! - Ids come from `INTEGER PRIMARY KEY AUTOINCREMENT` and are never reused.
//! - Listing is ordered by ascending id (creation order).
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::alarm::{
    validate_repeat_days, Alarm, AlarmDraft, AlarmId, AlarmValidationError,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default page size when a caller does not pass `limit`.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

const ALARMS_TABLE: &str = "alarms";
const ALARM_COLUMNS: &[&str] = &[
    "id",
    "title",
    "time",
    "enabled",
    "repeat_days",
    "sound",
    "snooze_enabled",
    "snooze_duration",
    "vibrate",
];

const ALARM_SELECT_SQL: &str = "SELECT
    id,
    title,
    time,
    enabled,
    repeat_days,
    sound,
    snooze_enabled,
    snooze_duration,
    vibrate
FROM alarms";

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage failure. Opaque to service callers apart from `Validation`.
#[derive(Debug)]
pub enum RepoError {
    Validation(AlarmValidationError),
    Db(DbError),
    InvalidData(String),
    LockPoisoned,
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted alarm data: {message}"),
            Self::LockPoisoned => write!(f, "alarm store lock poisoned"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is older than required {expected_version}; open it with open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AlarmValidationError> for RepoError {
    fn from(value: AlarmValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Offset/limit window for listing alarms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmListQuery {
    pub skip: u32,
    pub limit: u32,
}

impl Default for AlarmListQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

/// Keyed persistence for alarms.
///
/// Implementations own the authoritative copy of each record and hand out
/// clones. Merging partial updates is the caller's job; `update` always
/// receives a full draft.
pub trait AlarmStore {
    /// Stores `draft` under a fresh id and returns the full record.
    fn create(&self, draft: &AlarmDraft) -> RepoResult<Alarm>;
    /// Returns at most `query.limit` alarms after skipping `query.skip`, in
    /// creation order.
    fn list(&self, query: &AlarmListQuery) -> RepoResult<Vec<Alarm>>;
    fn get(&self, id: AlarmId) -> RepoResult<Option<Alarm>>;
    /// Replaces the stored record; `None` when `id` is unknown.
    fn update(&self, id: AlarmId, draft: &AlarmDraft) -> RepoResult<Option<Alarm>>;
    /// Returns `true` when a record was removed.
    fn delete(&self, id: AlarmId) -> RepoResult<bool>;
}

impl<S: AlarmStore + ?Sized> AlarmStore for &S {
    fn create(&self, draft: &AlarmDraft) -> RepoResult<Alarm> {
        (**self).create(draft)
    }

    fn list(&self, query: &AlarmListQuery) -> RepoResult<Vec<Alarm>> {
        (**self).list(query)
    }

    fn get(&self, id: AlarmId) -> RepoResult<Option<Alarm>> {
        (**self).get(id)
    }

    fn update(&self, id: AlarmId, draft: &AlarmDraft) -> RepoResult<Option<Alarm>> {
        (**self).update(id, draft)
    }

    fn delete(&self, id: AlarmId) -> RepoResult<bool> {
        (**self).delete(id)
    }
}

/// SQLite-backed alarm store over a migrated connection.
pub struct SqliteAlarmStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAlarmStore<'conn> {
    /// Wraps a connection opened through `open_db`/`open_db_in_memory`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the schema does
    ///   not carry the `alarms` shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl AlarmStore for SqliteAlarmStore<'_> {
    fn create(&self, draft: &AlarmDraft) -> RepoResult<Alarm> {
        draft.validate()?;

        self.conn.execute(
            "INSERT INTO alarms (
                title,
                time,
                enabled,
                repeat_days,
                sound,
                snooze_enabled,
                snooze_duration,
                vibrate
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                draft.title.as_str(),
                draft.time.as_str(),
                bool_to_int(draft.enabled),
                encode_repeat_days(&draft.repeat_days)?,
                draft.sound.as_str(),
                bool_to_int(draft.snooze_enabled),
                draft.snooze_duration,
                bool_to_int(draft.vibrate),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        Ok(Alarm::from_draft(id, draft.clone()))
    }

    fn list(&self, query: &AlarmListQuery) -> RepoResult<Vec<Alarm>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ALARM_SELECT_SQL}
             ORDER BY id ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;

        let mut rows = stmt.query(params![i64::from(query.limit), i64::from(query.skip)])?;
        let mut alarms = Vec::new();
        while let Some(row) = rows.next()? {
            alarms.push(parse_alarm_row(row)?);
        }

        Ok(alarms)
    }

    fn get(&self, id: AlarmId) -> RepoResult<Option<Alarm>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ALARM_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_alarm_row(row)?));
        }

        Ok(None)
    }

    fn update(&self, id: AlarmId, draft: &AlarmDraft) -> RepoResult<Option<Alarm>> {
        draft.validate()?;

        let changed = self.conn.execute(
            "UPDATE alarms
             SET
                title = ?1,
                time = ?2,
                enabled = ?3,
                repeat_days = ?4,
                sound = ?5,
                snooze_enabled = ?6,
                snooze_duration = ?7,
                vibrate = ?8
             WHERE id = ?9;",
            params![
                draft.title.as_str(),
                draft.time.as_str(),
                bool_to_int(draft.enabled),
                encode_repeat_days(&draft.repeat_days)?,
                draft.sound.as_str(),
                bool_to_int(draft.snooze_enabled),
                draft.snooze_duration,
                bool_to_int(draft.vibrate),
                id,
            ],
        )?;

        if changed == 0 {
            return Ok(None);
        }

        Ok(Some(Alarm::from_draft(id, draft.clone())))
    }

    fn delete(&self, id: AlarmId) -> RepoResult<bool> {
        let changed = self.conn.execute("DELETE FROM alarms WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [ALARMS_TABLE],
            |row| row.get(0),
        )
        .optional()?;
    if table.is_none() {
        return Err(RepoError::MissingRequiredTable(ALARMS_TABLE));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let present = stmt
        .query_map([ALARMS_TABLE], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(&column) = ALARM_COLUMNS
        .iter()
        .find(|&&column| !present.iter().any(|name| name.as_str() == column))
    {
        return Err(RepoError::MissingRequiredColumn {
            table: ALARMS_TABLE,
            column,
        });
    }

    Ok(())
}

fn parse_alarm_row(row: &Row<'_>) -> RepoResult<Alarm> {
    let id: AlarmId = row.get("id")?;

    let repeat_days_text: String = row.get("repeat_days")?;
    let raw_days: Vec<i64> = serde_json::from_str(&repeat_days_text).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid repeat_days `{repeat_days_text}` for alarm {id}: {err}"
        ))
    })?;
    let repeat_days = validate_repeat_days(&raw_days)
        .map_err(|err| RepoError::InvalidData(format!("alarm {id}: {err}")))?;

    let snooze_duration: i64 = row.get("snooze_duration")?;
    let snooze_duration = u32::try_from(snooze_duration).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid snooze_duration `{snooze_duration}` for alarm {id}"
        ))
    })?;

    let draft = AlarmDraft {
        title: row.get("title")?,
        time: row.get("time")?,
        enabled: parse_flag(row, "enabled", id)?,
        repeat_days,
        sound: row.get("sound")?,
        snooze_enabled: parse_flag(row, "snooze_enabled", id)?,
        snooze_duration,
        vibrate: parse_flag(row, "vibrate", id)?,
    };
    draft
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("alarm {id}: {err}")))?;

    Ok(Alarm::from_draft(id, draft))
}

fn parse_flag(row: &Row<'_>, column: &str, id: AlarmId) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid {column} value `{other}` for alarm {id}"
        ))),
    }
}

fn encode_repeat_days(days: &[u8]) -> RepoResult<String> {
    serde_json::to_string(days)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode repeat_days: {err}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
