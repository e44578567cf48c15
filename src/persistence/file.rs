use super::{PersistenceError, PersistenceResult};
use crate::event::{Event, EventId};
use crate::performance::{Performance, PerformanceId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

pub fn save_event_to_json<P: AsRef<Path>>(event: &Event, path: P) -> PersistenceResult<()> {
    super::validate_event(event)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, event)?;
    Ok(())
}

pub fn load_event_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Event> {
    let file = File::open(path)?;
    let event: Event = serde_json::from_reader(file)?;
    super::validate_event(&event)?;
    Ok(event)
}

/// One row per performance; the event columns repeat on every row.
#[derive(Debug, Serialize, Deserialize)]
struct PerformanceCsvRecord {
    event_id: u64,
    event_label: String,
    scheduling_enabled: bool,
    performance_id: u64,
    title: String,
    artist_name: String,
    description: Option<String>,
    rank: Option<u32>,
    duration_seconds: Option<u32>,
    explicit_start: Option<NaiveDateTime>,
}

impl PerformanceCsvRecord {
    fn new(event: &Event, performance: &Performance) -> Self {
        Self {
            event_id: event.id.0,
            event_label: event.label.clone(),
            scheduling_enabled: event.scheduling_enabled,
            performance_id: performance.id.0,
            title: performance.title.clone(),
            artist_name: performance.artist_name.clone(),
            description: performance.description.clone(),
            rank: performance.rank,
            duration_seconds: performance.duration_seconds,
            explicit_start: performance.explicit_start,
        }
    }

    fn into_performance(self) -> Performance {
        Performance {
            id: PerformanceId(self.performance_id),
            event_id: EventId(self.event_id),
            title: self.title,
            artist_name: self.artist_name,
            description: self.description.filter(|d| !d.is_empty()),
            rank: self.rank,
            duration_seconds: self.duration_seconds,
            explicit_start: self.explicit_start,
        }
    }
}

pub fn save_event_to_csv<P: AsRef<Path>>(event: &Event, path: P) -> PersistenceResult<()> {
    super::validate_event(event)?;
    if event.performances.is_empty() {
        return Err(PersistenceError::InvalidData(format!(
            "event {} has no performances to export",
            event.id
        )));
    }
    let mut writer = csv::Writer::from_path(path)?;
    for performance in &event.performances {
        writer.serialize(PerformanceCsvRecord::new(event, performance))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_event_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Event> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut event: Option<Event> = None;
    for record in reader.deserialize::<PerformanceCsvRecord>() {
        let record = record?;
        let current = event.get_or_insert_with(|| {
            Event::new(record.event_id, record.event_label.clone())
                .with_scheduling(record.scheduling_enabled)
        });
        if current.id.0 != record.event_id {
            return Err(PersistenceError::InvalidData(format!(
                "csv mixes events {} and {}",
                current.id, record.event_id
            )));
        }
        current.performances.push(record.into_performance());
    }

    let event =
        event.ok_or_else(|| PersistenceError::InvalidData("csv contains no performances".into()))?;
    super::validate_event(&event)?;
    Ok(event)
}
