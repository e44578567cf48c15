use crate::event::Event;
use crate::performance::Performance;
use crate::timeslot::Timeslot;
use crate::timetable::{ScheduledSlot, Timetable, TimetableError};
use chrono::{Duration, NaiveDateTime};

/// Lays every performance of an event end to end, starting at the earliest
/// explicit start time and walking the lineup in rank order.
pub struct TimetableBuilder<'a> {
    event: &'a Event,
}

impl<'a> TimetableBuilder<'a> {
    pub fn new(event: &'a Event) -> Self {
        Self { event }
    }

    pub fn build(&self) -> Result<Timetable, TimetableError> {
        if !self.event.scheduling_enabled {
            return Err(TimetableError::SchedulingDisabled);
        }

        let anchor = self.anchor().ok_or(TimetableError::NoStartTimeConfigured)?;

        let mut lineup = self.complete_lineup()?;
        lineup.sort_by_key(|(performance, rank, _)| (*rank, performance.id));

        let mut slots = Vec::with_capacity(lineup.len());
        let mut cursor = anchor;
        for (performance, _, duration_seconds) in lineup {
            let end = cursor
                .checked_add_signed(Duration::seconds(i64::from(duration_seconds)))
                .ok_or(TimetableError::TimeOutOfRange {
                    performance_id: performance.id,
                })?;
            slots.push(ScheduledSlot {
                performance_id: performance.id,
                timeslot: Timeslot::new(cursor, end),
            });
            cursor = end;
        }

        Ok(Timetable::from_slots(self.event.id, slots))
    }

    fn anchor(&self) -> Option<NaiveDateTime> {
        self.event
            .performances
            .iter()
            .filter_map(|p| p.explicit_start)
            .min()
    }

    fn complete_lineup(&self) -> Result<Vec<(&'a Performance, u32, u32)>, TimetableError> {
        self.event
            .performances
            .iter()
            .map(|p| match (p.rank, p.duration_seconds) {
                (Some(rank), Some(duration)) => Ok((p, rank, duration)),
                _ => Err(TimetableError::IncompleteDurationOrRank),
            })
            .collect()
    }
}
