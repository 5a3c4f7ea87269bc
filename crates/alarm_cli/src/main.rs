//! CLI smoke runner for `alarm_core`.
//!
//! # Responsibility
//! - Wire config, logging, database, store and service the way a transport
//!   layer would.
//! - Walk the full alarm lifecycle and fail loudly on any contract breach.
//!
//! Reads `ALARM_DB_PATH`, `ALARM_LOG_LEVEL`, `ALARM_LOG_DIR` and
//! `ALARM_LIST_LIMIT`; defaults to an in-memory database.

use alarm_core::{
    health, Alarm, AlarmCreateInput, AlarmService, AlarmStore, AlarmUpdateInput, CoreConfig,
    ServiceError, SqliteAlarmStore,
};
use log::info;
use std::error::Error;
use std::process::ExitCode;

type SmokeResult<T> = Result<T, Box<dyn Error>>;

fn main() -> ExitCode {
    match run() {
        Ok(()) => {
            println!("smoke status=ok");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("smoke status=failed error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> SmokeResult<()> {
    let config = CoreConfig::from_env()?;
    let file_logging = config.init_logging()?;
    info!("event=smoke_start module=cli status=start file_logging={file_logging}");

    let status = health();
    println!(
        "health status={} message=\"{}\" version={}",
        status.status, status.message, status.version
    );

    let conn = config.open_connection()?;
    let service = AlarmService::new(SqliteAlarmStore::try_new(&conn)?);
    let limit = i64::from(config.list_limit);

    let ids = create_samples(&service)?;
    print_alarms("listed", &service.list_alarms(0, limit)?);

    let first = ids[0];
    let updated = service.update_alarm(
        first,
        AlarmUpdateInput {
            title: "Updated Wake Up".to_string().into(),
            time: "07:00".to_string().into(),
            snooze_duration: 5_i64.into(),
            ..AlarmUpdateInput::default()
        },
    )?;
    ensure(
        updated.title == "Updated Wake Up" && updated.time == "07:00",
        "update did not apply supplied fields",
    )?;
    print_alarm("updated", &updated);

    let toggled = service.toggle_alarm(first)?;
    let restored = service.toggle_alarm(first)?;
    ensure(
        toggled.enabled != restored.enabled && restored == updated,
        "toggle pair did not restore the original record",
    )?;
    println!("toggled id={first} first={} second={}", toggled.enabled, restored.enabled);

    let second = ids[1];
    service.delete_alarm(second)?;
    ensure(
        matches!(service.get_alarm(second), Err(ServiceError::NotFound(_))),
        "deleted alarm is still readable",
    )?;
    println!("deleted id={second}");

    check_rejections(&service)?;

    let remaining = service.list_alarms(0, limit)?;
    print_alarms("remaining", &remaining);
    info!(
        "event=smoke_finish module=cli status=ok remaining={}",
        remaining.len()
    );
    Ok(())
}

fn create_samples<S: AlarmStore>(service: &AlarmService<S>) -> SmokeResult<Vec<i64>> {
    let samples = [
        AlarmCreateInput {
            title: Some("Wake Up".to_string()),
            repeat_days: Some(vec![1, 2, 3, 4, 5]),
            snooze_duration: Some(10),
            ..AlarmCreateInput::at("06:30")
        },
        AlarmCreateInput {
            title: Some("Lunch Break".to_string()),
            repeat_days: Some(vec![1, 2, 3, 4, 5]),
            snooze_enabled: Some(false),
            vibrate: Some(false),
            ..AlarmCreateInput::at("12:00")
        },
        AlarmCreateInput {
            title: Some("Weekend Sleep-in".to_string()),
            repeat_days: Some(vec![0, 6]),
            snooze_duration: Some(15),
            ..AlarmCreateInput::at("09:30")
        },
    ];

    let mut ids = Vec::with_capacity(samples.len());
    for input in samples {
        let alarm = service.create_alarm(input)?;
        print_alarm("created", &alarm);
        ids.push(alarm.id);
    }
    Ok(ids)
}

fn check_rejections<S: AlarmStore>(service: &AlarmService<S>) -> SmokeResult<()> {
    let cases = [
        ("missing alarm", service.get_alarm(99999), 404),
        (
            "invalid time",
            service.create_alarm(AlarmCreateInput::at("25:99")),
            422,
        ),
        (
            "invalid snooze",
            service.create_alarm(AlarmCreateInput {
                snooze_duration: Some(100),
                ..AlarmCreateInput::at("08:00")
            }),
            422,
        ),
    ];

    for (label, result, expected) in cases {
        match result {
            Err(err) if err.status_code() == expected => {
                println!("rejected case=\"{label}\" status={expected} error=\"{err}\"");
            }
            Err(err) => return Err(format!("{label}: unexpected error {err}").into()),
            Ok(alarm) => return Err(format!("{label}: accepted as id {}", alarm.id).into()),
        }
    }
    Ok(())
}

fn ensure(condition: bool, message: &str) -> SmokeResult<()> {
    if condition {
        Ok(())
    } else {
        Err(message.into())
    }
}

fn print_alarms(label: &str, alarms: &[Alarm]) {
    println!("{label} count={}", alarms.len());
    for alarm in alarms {
        print_alarm(label, alarm);
    }
}

fn print_alarm(label: &str, alarm: &Alarm) {
    let state = if alarm.enabled { "on" } else { "off" };
    let repeat = if alarm.is_one_time() {
        "once".to_string()
    } else {
        format!("{:?}", alarm.repeat_days)
    };
    println!(
        "{label} id={} state={state} time={} repeat={repeat} title=\"{}\"",
        alarm.id, alarm.time, alarm.title
    );
}
