use alarm_core::db::open_db_in_memory;
use alarm_core::{
    Alarm, AlarmCreateInput, AlarmService, AlarmStore, AlarmUpdateInput, AlarmValidationError,
    InMemoryAlarmStore, Patch, ServiceError, SqliteAlarmStore,
};

fn wake_up_input() -> AlarmCreateInput {
    AlarmCreateInput {
        title: Some("Wake Up".to_string()),
        repeat_days: Some(vec![1, 2, 3, 4, 5]),
        snooze_duration: Some(10),
        ..AlarmCreateInput::at("06:30")
    }
}

fn with_each_store(check: impl Fn(&AlarmService<&dyn AlarmStore>)) {
    let memory = InMemoryAlarmStore::new();
    check(&AlarmService::new(&memory as &dyn AlarmStore));

    let conn = open_db_in_memory().unwrap();
    let sqlite = SqliteAlarmStore::try_new(&conn).unwrap();
    check(&AlarmService::new(&sqlite as &dyn AlarmStore));
}

fn assert_validation(result: Result<Alarm, ServiceError>) -> AlarmValidationError {
    match result {
        Err(ServiceError::Validation(err)) => err,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn create_applies_defaults_and_assigns_id() {
    with_each_store(|service| {
        let alarm = service.create_alarm(wake_up_input()).unwrap();

        assert!(alarm.id > 0);
        assert_eq!(alarm.title, "Wake Up");
        assert_eq!(alarm.time, "06:30");
        assert_eq!(alarm.repeat_days, vec![1, 2, 3, 4, 5]);
        assert_eq!(alarm.snooze_duration, 10);
        assert!(alarm.enabled);
        assert_eq!(alarm.sound, "default");
        assert!(alarm.snooze_enabled);
        assert!(alarm.vibrate);
    });
}

#[test]
fn create_rejects_invalid_fields_without_writing() {
    with_each_store(|service| {
        let err = assert_validation(service.create_alarm(AlarmCreateInput::at("25:99")));
        assert_eq!(err, AlarmValidationError::InvalidTime("25:99".to_string()));

        let err = assert_validation(service.create_alarm(AlarmCreateInput {
            snooze_duration: Some(100),
            ..AlarmCreateInput::at("08:00")
        }));
        assert_eq!(err, AlarmValidationError::SnoozeDurationOutOfRange(100));

        let err = assert_validation(service.create_alarm(AlarmCreateInput {
            repeat_days: Some(vec![1, 8]),
            ..AlarmCreateInput::at("08:00")
        }));
        assert_eq!(err, AlarmValidationError::RepeatDayOutOfRange(8));

        let err = assert_validation(service.create_alarm(AlarmCreateInput::default()));
        assert_eq!(err, AlarmValidationError::MissingTime);

        assert!(service.list_alarms(0, 100).unwrap().is_empty());
    });
}

#[test]
fn every_valid_time_is_accepted_and_stored_verbatim() {
    let service = AlarmService::new(InMemoryAlarmStore::new());
    for hour in 0..24 {
        for minute in [0, 1, 30, 59] {
            let time = format!("{hour:02}:{minute:02}");
            let alarm = service.create_alarm(AlarmCreateInput::at(time.clone())).unwrap();
            assert_eq!(alarm.time, time);
        }
    }

    for time in ["24:00", "23:60", "6:30", "06:3", "06-30", "06:30:00", " 06:30"] {
        assert_validation(service.create_alarm(AlarmCreateInput::at(time)));
    }
}

#[test]
fn create_then_get_roundtrips_every_field() {
    with_each_store(|service| {
        let created = service
            .create_alarm(AlarmCreateInput {
                title: Some("Persistence Test".to_string()),
                enabled: Some(true),
                repeat_days: Some(vec![2, 4]),
                sound: Some("chimes.mp3".to_string()),
                snooze_enabled: Some(true),
                snooze_duration: Some(7),
                vibrate: Some(false),
                ..AlarmCreateInput::at("15:30")
            })
            .unwrap();

        let fetched = service.get_alarm(created.id).unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.sound, "chimes.mp3");
        assert_eq!(fetched.repeat_days, vec![2, 4]);
    });
}

#[test]
fn update_changes_only_supplied_fields() {
    with_each_store(|service| {
        let original = service.create_alarm(wake_up_input()).unwrap();

        let updated = service
            .update_alarm(
                original.id,
                AlarmUpdateInput {
                    title: "Updated Wake Up".to_string().into(),
                    time: "07:00".to_string().into(),
                    ..AlarmUpdateInput::default()
                },
            )
            .unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.title, "Updated Wake Up");
        assert_eq!(updated.time, "07:00");
        assert_eq!(updated.snooze_duration, 10);
        assert_eq!(updated.repeat_days, original.repeat_days);
        assert_eq!(service.get_alarm(original.id).unwrap(), updated);
    });
}

#[test]
fn title_only_update_leaves_other_fields_untouched() {
    with_each_store(|service| {
        let original = service.create_alarm(wake_up_input()).unwrap();

        let updated = service
            .update_alarm(
                original.id,
                AlarmUpdateInput {
                    title: "Renamed".to_string().into(),
                    ..AlarmUpdateInput::default()
                },
            )
            .unwrap();

        let mut expected = original.clone();
        expected.title = "Renamed".to_string();
        assert_eq!(updated, expected);
    });
}

#[test]
fn update_applies_explicit_falsy_values() {
    with_each_store(|service| {
        let original = service.create_alarm(wake_up_input()).unwrap();

        let updated = service
            .update_alarm(
                original.id,
                AlarmUpdateInput {
                    enabled: false.into(),
                    repeat_days: Patch::Value(vec![]),
                    vibrate: false.into(),
                    ..AlarmUpdateInput::default()
                },
            )
            .unwrap();

        assert!(!updated.enabled);
        assert!(updated.is_one_time());
        assert!(!updated.vibrate);
        assert!(updated.snooze_enabled);
    });
}

#[test]
fn empty_update_returns_current_record() {
    with_each_store(|service| {
        let original = service.create_alarm(wake_up_input()).unwrap();
        let updated = service
            .update_alarm(original.id, AlarmUpdateInput::default())
            .unwrap();
        assert_eq!(updated, original);
    });
}

#[test]
fn invalid_update_aborts_without_partial_write() {
    with_each_store(|service| {
        let original = service.create_alarm(wake_up_input()).unwrap();

        for minutes in [0, 61] {
            let err = assert_validation(service.update_alarm(
                original.id,
                AlarmUpdateInput {
                    title: "Should Not Stick".to_string().into(),
                    snooze_duration: minutes.into(),
                    ..AlarmUpdateInput::default()
                },
            ));
            assert_eq!(err, AlarmValidationError::SnoozeDurationOutOfRange(minutes));
        }

        let err = assert_validation(service.update_alarm(
            original.id,
            AlarmUpdateInput {
                time: Patch::Null,
                ..AlarmUpdateInput::default()
            },
        ));
        assert_eq!(err, AlarmValidationError::NullField("time"));

        assert_eq!(service.get_alarm(original.id).unwrap(), original);
    });
}

#[test]
fn snooze_update_inside_range_is_stored_exactly() {
    with_each_store(|service| {
        let original = service.create_alarm(wake_up_input()).unwrap();
        for minutes in [1_i64, 42, 60] {
            let updated = service
                .update_alarm(
                    original.id,
                    AlarmUpdateInput {
                        snooze_duration: minutes.into(),
                        ..AlarmUpdateInput::default()
                    },
                )
                .unwrap();
            assert_eq!(i64::from(updated.snooze_duration), minutes);
        }
    });
}

#[test]
fn toggle_twice_restores_enabled() {
    with_each_store(|service| {
        let original = service.create_alarm(wake_up_input()).unwrap();

        let first = service.toggle_alarm(original.id).unwrap();
        assert_eq!(first.enabled, !original.enabled);
        assert_eq!(service.get_alarm(original.id).unwrap(), first);

        let second = service.toggle_alarm(original.id).unwrap();
        assert_eq!(second, original);
    });
}

#[test]
fn delete_then_get_is_not_found() {
    with_each_store(|service| {
        let alarm = service.create_alarm(wake_up_input()).unwrap();

        service.delete_alarm(alarm.id).unwrap();

        assert!(matches!(
            service.get_alarm(alarm.id),
            Err(ServiceError::NotFound(id)) if id == alarm.id
        ));
        assert!(matches!(
            service.delete_alarm(alarm.id),
            Err(ServiceError::NotFound(_))
        ));
    });
}

#[test]
fn unknown_ids_are_not_found() {
    with_each_store(|service| {
        service.create_alarm(wake_up_input()).unwrap();

        let err = service.get_alarm(99999).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(99999)));
        assert_eq!(err.status_code(), 404);

        assert!(matches!(
            service.update_alarm(
                99999,
                AlarmUpdateInput {
                    title: "ghost".to_string().into(),
                    ..AlarmUpdateInput::default()
                }
            ),
            Err(ServiceError::NotFound(99999))
        ));
        assert!(matches!(
            service.toggle_alarm(99999),
            Err(ServiceError::NotFound(99999))
        ));
        assert!(matches!(
            service.delete_alarm(99999),
            Err(ServiceError::NotFound(99999))
        ));
    });
}

#[test]
fn list_pages_in_creation_order_and_clamps_negatives() {
    with_each_store(|service| {
        let ids: Vec<_> = ["06:30", "12:00", "09:30"]
            .into_iter()
            .map(|time| service.create_alarm(AlarmCreateInput::at(time)).unwrap().id)
            .collect();

        let all: Vec<_> = service
            .list_alarms(0, 100)
            .unwrap()
            .into_iter()
            .map(|alarm| alarm.id)
            .collect();
        assert_eq!(all, ids);

        let page = service.list_alarms(1, 1).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, ids[1]);

        assert_eq!(service.list_alarms(-10, 100).unwrap().len(), 3);
        assert!(service.list_alarms(0, -1).unwrap().is_empty());
    });
}
