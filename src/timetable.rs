use crate::event::EventId;
use crate::performance::PerformanceId;
use crate::timeslot::Timeslot;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Reasons a timetable cannot be produced for an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimetableError {
    #[error("scheduling is not enabled for this event")]
    SchedulingDisabled,
    #[error("configure at least one performance to have a start time")]
    NoStartTimeConfigured,
    #[error("configure all performances to have a duration and lineup rank")]
    IncompleteDurationOrRank,
    #[error("timeslot for performance {performance_id} ends outside the supported time range")]
    TimeOutOfRange { performance_id: PerformanceId },
}

impl TimetableError {
    /// Configuration and missing-data failures are expected states an
    /// organiser can fix; the caller shows "no schedule" instead of failing.
    pub fn is_expected(&self) -> bool {
        !matches!(self, TimetableError::TimeOutOfRange { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeslotLookupError {
    #[error(transparent)]
    Timetable(#[from] TimetableError),
    #[error("performance {performance_id} is missing from the timetable of event {event_id}")]
    MissingPerformance {
        event_id: EventId,
        performance_id: PerformanceId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduledSlot {
    pub performance_id: PerformanceId,
    pub timeslot: Timeslot,
}

/// Timeslots keyed by performance, iterated in lineup order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timetable {
    event_id: EventId,
    slots: Vec<ScheduledSlot>,
    #[serde(skip)]
    index: HashMap<PerformanceId, usize>,
}

impl Timetable {
    pub(crate) fn from_slots(event_id: EventId, slots: Vec<ScheduledSlot>) -> Self {
        let index = slots
            .iter()
            .enumerate()
            .map(|(idx, slot)| (slot.performance_id, idx))
            .collect();
        Self {
            event_id,
            slots,
            index,
        }
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn get(&self, performance_id: PerformanceId) -> Option<&Timeslot> {
        self.index
            .get(&performance_id)
            .map(|&idx| &self.slots[idx].timeslot)
    }

    pub fn timeslot_for(&self, performance_id: PerformanceId) -> Result<Timeslot, TimeslotLookupError> {
        self.get(performance_id)
            .copied()
            .ok_or(TimeslotLookupError::MissingPerformance {
                event_id: self.event_id,
                performance_id,
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledSlot> {
        self.slots.iter()
    }

    pub fn performance_ids(&self) -> impl Iterator<Item = PerformanceId> + '_ {
        self.slots.iter().map(|slot| slot.performance_id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        self.slots.first().map(|slot| slot.timeslot.start())
    }

    pub fn ends_at(&self) -> Option<NaiveDateTime> {
        self.slots.last().map(|slot| slot.timeslot.end())
    }

    pub fn total_duration(&self) -> Duration {
        self.slots
            .iter()
            .fold(Duration::zero(), |acc, slot| acc + slot.timeslot.duration())
    }
}

impl<'a> IntoIterator for &'a Timetable {
    type Item = &'a ScheduledSlot;
    type IntoIter = std::slice::Iter<'a, ScheduledSlot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}
