use chrono::NaiveDate;
use std::io::Write;
use tempfile::NamedTempFile;
use timetabler::{
    Event, PersistenceError, Performance, load_event_from_csv, load_event_from_json,
    save_event_to_csv, save_event_to_json,
};

fn build_sample_event() -> Event {
    let start = NaiveDate::from_ymd_opt(2025, 4, 12)
        .unwrap()
        .and_hms_opt(22, 30, 0)
        .unwrap();
    let mut headliner = Performance::new(2, 3, "Headline", "Marea")
        .with_rank(2)
        .with_duration(5400);
    headliner.description = Some("Live hardware set, two decks".into());
    Event::new(3, "TFW #3").with_scheduling(true).with_performances(vec![
        Performance::new(1, 3, "Support", "Kelp")
            .with_rank(1)
            .with_duration(3600)
            .with_start(start),
        headliner,
        Performance::new(4, 3, "Surprise guest", "TBA"),
    ])
}

#[test]
fn json_round_trip_preserves_event() {
    let event = build_sample_event();
    let file = NamedTempFile::new().unwrap();

    save_event_to_json(&event, file.path()).unwrap();
    let loaded = load_event_from_json(file.path()).unwrap();

    assert_eq!(loaded, event);
}

#[test]
fn csv_round_trip_preserves_event() {
    let event = build_sample_event();
    let file = NamedTempFile::new().unwrap();

    save_event_to_csv(&event, file.path()).unwrap();
    let loaded = load_event_from_csv(file.path()).unwrap();

    assert_eq!(loaded, event);
}

#[test]
fn csv_with_two_events_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "event_id,event_label,scheduling_enabled,performance_id,title,artist_name,description,rank,duration_seconds,explicit_start"
    )
    .unwrap();
    writeln!(file, "1,TFW #1,true,1,A,a,,1,60,").unwrap();
    writeln!(file, "2,TFW #2,true,2,B,b,,1,60,").unwrap();
    file.flush().unwrap();

    match load_event_from_csv(file.path()) {
        Err(PersistenceError::InvalidData(message)) => assert!(message.contains("mixes events")),
        other => panic!("expected invalid data, got {other:?}"),
    }
}

#[test]
fn json_with_duplicate_ids_is_rejected() {
    let mut event = build_sample_event();
    event.performances[2].id = event.performances[0].id;
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), serde_json::to_string(&event).unwrap()).unwrap();

    assert!(matches!(
        load_event_from_json(file.path()),
        Err(PersistenceError::InvalidData(_))
    ));
}
