#![cfg(feature = "sqlite")]

use chrono::{NaiveDate, NaiveDateTime};
use std::thread;
use tempfile::NamedTempFile;
use timetabler::{
    Event, EventId, LineupError, LineupStore, PersistenceError, Performance, PerformanceId,
    SqliteLineupStore, StoreConfig, TimetableCache, close_gaps, reorder_siblings,
};

fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 11, 8)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn sample_event() -> Event {
    let mut opener = Performance::new(1, 7, "Opening set", "Low Tide")
        .with_rank(1)
        .with_duration(2700)
        .with_start(at(21, 0));
    opener.description = Some("Ambient warmup".into());
    Event::new(7, "TFW #7").with_scheduling(true).with_performances(vec![
        opener,
        Performance::new(2, 7, "Peak time", "Riptide").with_rank(2).with_duration(3600),
        Performance::new(3, 7, "Closing", "Undertow").with_rank(3).with_duration(1800),
    ])
}

#[test]
fn sqlite_store_round_trip_event() {
    let file = NamedTempFile::new().unwrap();
    let store = SqliteLineupStore::new(file.path()).unwrap();
    store.save_event(&sample_event()).unwrap();

    let loaded = store.load_event(EventId(7)).unwrap().expect("event exists");
    assert_eq!(loaded, sample_event());
    assert!(store.load_event(EventId(8)).unwrap().is_none());
}

#[test]
fn sqlite_store_keeps_fractional_start_times() {
    let store = SqliteLineupStore::in_memory().unwrap();
    let start = NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_milli_opt(10, 0, 0, 500)
        .unwrap();
    let mut event = sample_event();
    event.performances[0].explicit_start = Some(start);
    store.save_event(&event).unwrap();

    let loaded = store.load_event(EventId(7)).unwrap().unwrap();
    assert_eq!(loaded.performances[0].explicit_start, Some(start));
    assert_eq!(loaded, event);
}

#[test]
fn performance_ids_stay_with_their_event() {
    let store = SqliteLineupStore::in_memory().unwrap();
    store.save_event(&sample_event()).unwrap();
    store.save_event(&Event::new(8, "TFW #8")).unwrap();

    let moved = Performance::new(2, 8, "Peak time", "Riptide");
    assert!(matches!(
        store.upsert_performance(&moved),
        Err(PersistenceError::PerformanceOwnedElsewhere {
            performance_id: PerformanceId(2),
            owner: EventId(7),
        })
    ));
    let clash = Event::new(8, "TFW #8").with_performances(vec![Performance::new(3, 8, "x", "y")]);
    assert!(matches!(
        store.save_event(&clash),
        Err(PersistenceError::PerformanceOwnedElsewhere { .. })
    ));

    assert_eq!(store.load_event(EventId(7)).unwrap().unwrap(), sample_event());
    assert!(store.load_event(EventId(8)).unwrap().unwrap().performances.is_empty());
}

#[test]
fn concurrent_moves_across_connections_never_collide() {
    let file = NamedTempFile::new().unwrap();
    let config = StoreConfig {
        sqlite_path: file.path().to_path_buf(),
        busy_timeout_ms: 10_000,
    };
    let event = Event::new(9, "TFW #9").with_scheduling(true).with_performances(
        (1..=8u64).map(|id| Performance::new(id, 9, format!("set {id}"), "artist").with_rank(id as u32)),
    );
    let stores = [
        SqliteLineupStore::with_config(&config).unwrap(),
        SqliteLineupStore::with_config(&config).unwrap(),
    ];
    stores[0].save_event(&event).unwrap();

    thread::scope(|scope| {
        for id in 1..=8u64 {
            let store = &stores[(id % 2) as usize];
            let performance = event.performance(PerformanceId(id)).unwrap().clone();
            scope.spawn(move || {
                let target = ((id * 5) % 8 + 1) as u32;
                reorder_siblings(store, &performance, Some(target)).unwrap();
            });
        }
    });

    let mut ranks: Vec<u32> = stores[1]
        .load_event(EventId(9))
        .unwrap()
        .unwrap()
        .performances
        .iter()
        .map(|p| p.rank.unwrap())
        .collect();
    ranks.sort_unstable();
    assert_eq!(ranks, (1..=8).collect::<Vec<u32>>());
}

#[test]
fn reorder_through_sqlite_is_persisted() {
    let file = NamedTempFile::new().unwrap();
    let config = StoreConfig {
        sqlite_path: file.path().to_path_buf(),
        busy_timeout_ms: 100,
    };
    let store = SqliteLineupStore::with_config(&config).unwrap();
    store.save_event(&sample_event()).unwrap();

    let closing = store
        .load_event(EventId(7))
        .unwrap()
        .unwrap()
        .performance(PerformanceId(3))
        .unwrap()
        .clone();
    let outcome = reorder_siblings(&store, &closing, Some(1)).unwrap();
    assert_eq!(outcome.final_rank, Some(1));
    assert_eq!(outcome.writes.len(), 3);

    // A fresh connection sees the committed lineup.
    let reopened = SqliteLineupStore::new(file.path()).unwrap();
    let event = reopened.load_event(EventId(7)).unwrap().unwrap();
    let rank = |id: u64| event.performance(PerformanceId(id)).unwrap().rank;
    assert_eq!((rank(3), rank(1), rank(2)), (Some(1), Some(2), Some(3)));

    let mut cache = TimetableCache::new();
    assert_eq!(
        cache.timeslot_for(&event, PerformanceId(1)).unwrap().label(),
        "21:30 - 22:15"
    );
}

#[test]
fn failed_transaction_rolls_back_every_write() {
    let store = SqliteLineupStore::in_memory().unwrap();
    store.save_event(&sample_event()).unwrap();

    let result: Result<(), LineupError> = store.transaction(EventId(7), |tx| {
        tx.update_rank(PerformanceId(1), Some(3))?;
        tx.update_rank(PerformanceId(2), Some(1))?;
        tx.update_rank(PerformanceId(404), Some(2))?;
        Ok(())
    });
    assert!(matches!(
        result,
        Err(LineupError::Persistence(PersistenceError::PerformanceNotFound(PerformanceId(404))))
    ));

    let event = store.load_event(EventId(7)).unwrap().unwrap();
    assert_eq!(event, sample_event());
}

#[test]
fn removal_then_close_gaps() {
    let store = SqliteLineupStore::in_memory().unwrap();
    store.save_event(&sample_event()).unwrap();

    assert!(store.remove_performance(PerformanceId(1)).unwrap());
    let writes = close_gaps(&store, EventId(7)).unwrap();
    assert_eq!(writes.len(), 2);

    let event = store.load_event(EventId(7)).unwrap().unwrap();
    let ranks: Vec<Option<u32>> = event.performances.iter().map(|p| p.rank).collect();
    assert_eq!(ranks, vec![Some(1), Some(2)]);
}

#[test]
fn performances_need_an_existing_event() {
    let store = SqliteLineupStore::in_memory().unwrap();
    let orphan = Performance::new(1, 99, "Lost", "Nobody");
    assert!(matches!(
        store.upsert_performance(&orphan),
        Err(PersistenceError::EventNotFound(EventId(99)))
    ));
}

#[test]
fn unknown_event_transaction_fails_cleanly() {
    let store = SqliteLineupStore::in_memory().unwrap();
    let result: Result<(), PersistenceError> = store.transaction(EventId(1), |_| Ok(()));
    assert!(matches!(result, Err(PersistenceError::EventNotFound(EventId(1)))));
}
