use crate::event::{Event, EventId};
use crate::performance::{Performance, PerformanceId};
use crate::validation::{self, ValidationError};
use serde_json::Error as SerdeJsonError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("event {0} not found")]
    EventNotFound(EventId),
    #[error("performance {0} not found")]
    PerformanceNotFound(PerformanceId),
    #[error("performance {performance_id} already belongs to event {owner}")]
    PerformanceOwnedElsewhere {
        performance_id: PerformanceId,
        owner: EventId,
    },
}

impl From<ValidationError> for PersistenceError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Exclusive, atomic view of one event's lineup. Writes become visible to
/// other readers only when the owning store commits.
pub trait LineupTransaction {
    /// The event as seen inside the transaction, including its own writes.
    fn event(&self) -> &Event;

    fn update_rank(&mut self, performance_id: PerformanceId, rank: Option<u32>)
    -> PersistenceResult<()>;

    fn performance(&self, performance_id: PerformanceId) -> Option<&Performance> {
        self.event().performance(performance_id)
    }

    /// Every ranked performance of the event as `(id, rank)` pairs.
    fn ranked(&self) -> Vec<(PerformanceId, u32)> {
        self.event()
            .performances
            .iter()
            .filter_map(|p| p.rank.map(|rank| (p.id, rank)))
            .collect()
    }

    /// Ranked performances other than `exclude`.
    fn ranked_siblings(&self, exclude: PerformanceId) -> Vec<(PerformanceId, u32)> {
        self.ranked()
            .into_iter()
            .filter(|&(id, _)| id != exclude)
            .collect()
    }
}

pub trait LineupStore {
    /// Loads an event together with all of its performances.
    fn load_event(&self, event_id: EventId) -> PersistenceResult<Option<Event>>;

    /// Runs `work` atomically against one event. Concurrent transactions on
    /// the same event are serialised; an `Err` from `work` rolls back.
    fn transaction<T, E, F>(&self, event_id: EventId, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn LineupTransaction) -> Result<T, E>,
        E: From<PersistenceError>;

    /// Inserts or replaces the event and every performance it carries.
    fn save_event(&self, event: &Event) -> PersistenceResult<()>;

    fn upsert_performance(&self, performance: &Performance) -> PersistenceResult<()>;

    fn remove_performance(&self, performance_id: PerformanceId) -> PersistenceResult<bool>;
}

pub fn validate_event(event: &Event) -> PersistenceResult<()> {
    validation::validate_event(event).map_err(PersistenceError::from)
}

pub fn validate_performance(performance: &Performance) -> PersistenceResult<()> {
    validation::validate_performance(performance).map_err(PersistenceError::from)
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{load_event_from_csv, load_event_from_json, save_event_to_csv, save_event_to_json};
pub use memory::MemoryLineupStore;
