pub mod cache;
pub mod calculations;
pub mod config;
pub mod event;
pub mod lineup;
pub mod performance;
pub mod persistence;
pub mod timeslot;
pub mod timetable;
pub mod validation;

pub use cache::{TimetableCache, TimetableOutcome};
pub use calculations::lineup_order::{OrderCompactor, RankChange, ReorderPlan};
pub use calculations::timetable_pass::TimetableBuilder;
pub use config::StoreConfig;
pub use event::{Event, EventId};
pub use lineup::{
    LineupEntry, LineupError, LineupReport, ReorderOutcome, TimeslotStatus, close_gaps,
    reorder_siblings, render_lineup,
};
pub use performance::{Performance, PerformanceId};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteLineupStore;
pub use persistence::{
    LineupStore, LineupTransaction, MemoryLineupStore, PersistenceError, PersistenceResult,
    load_event_from_csv, load_event_from_json, save_event_to_csv, save_event_to_json,
};
pub use timeslot::Timeslot;
pub use timetable::{ScheduledSlot, TimeslotLookupError, Timetable, TimetableError};
pub use validation::ValidationError;

/// Builds (or replays) the timetable for `event` within `cache`'s scope.
pub fn build_or_retrieve_timetable<'c>(
    cache: &'c mut TimetableCache,
    event: &Event,
) -> Result<&'c Timetable, TimetableError> {
    cache.get(event)
}
