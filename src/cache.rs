use crate::calculations::timetable_pass::TimetableBuilder;
use crate::event::{Event, EventId};
use crate::performance::PerformanceId;
use crate::timeslot::Timeslot;
use crate::timetable::{TimeslotLookupError, Timetable, TimetableError};
use std::collections::HashMap;

pub type TimetableOutcome = Result<Timetable, TimetableError>;

/// Per-scope memo of timetable outcomes, failures included.
///
/// Create one per unit of work (a request, a render) and drop it afterwards.
/// Writes made while a scope is open are not observed: the first outcome
/// recorded for an event is replayed until the cache is dropped or
/// [`TimetableCache::forget`] is called for that event.
#[derive(Debug, Default)]
pub struct TimetableCache {
    outcomes: HashMap<EventId, TimetableOutcome>,
    builds: usize,
}

impl TimetableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, event: &Event) -> Result<&Timetable, TimetableError> {
        let builds = &mut self.builds;
        let outcome = self.outcomes.entry(event.id).or_insert_with(|| {
            *builds += 1;
            let outcome = TimetableBuilder::new(event).build();
            match &outcome {
                Ok(timetable) => tracing::debug!(
                    event_id = %event.id,
                    slots = timetable.len(),
                    "built timetable"
                ),
                Err(err) => tracing::warn!(event_id = %event.id, error = %err, "timetable unavailable"),
            }
            outcome
        });
        outcome.as_ref().map_err(Clone::clone)
    }

    pub fn timeslot_for(
        &mut self,
        event: &Event,
        performance_id: PerformanceId,
    ) -> Result<Timeslot, TimeslotLookupError> {
        let timetable = self.get(event)?;
        timetable.timeslot_for(performance_id)
    }

    /// Drops the recorded outcome so the next `get` rebuilds. For callers that
    /// change an event and read it back inside the same scope.
    pub fn forget(&mut self, event_id: EventId) -> bool {
        self.outcomes.remove(&event_id).is_some()
    }

    pub fn contains(&self, event_id: EventId) -> bool {
        self.outcomes.contains_key(&event_id)
    }

    /// Number of times the builder actually ran in this scope.
    pub fn builds(&self) -> usize {
        self.builds
    }
}
