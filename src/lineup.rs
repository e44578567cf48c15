use crate::cache::TimetableCache;
use crate::calculations::lineup_order::{OrderCompactor, RankChange};
use crate::event::{Event, EventId};
use crate::performance::{Performance, PerformanceId};
use crate::persistence::{LineupStore, LineupTransaction, PersistenceError};
use crate::timeslot::Timeslot;
use crate::timetable::TimeslotLookupError;
use crate::validation::{self, ValidationError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LineupError {
    #[error("invalid rank: {0}")]
    InvalidRank(#[from] ValidationError),
    #[error("performance {performance_id} does not belong to event {event_id}")]
    PerformanceNotFound {
        event_id: EventId,
        performance_id: PerformanceId,
    },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReorderOutcome {
    pub event_id: EventId,
    pub performance_id: PerformanceId,
    pub final_rank: Option<u32>,
    /// Rank writes that were persisted, siblings first.
    pub writes: Vec<RankChange>,
}

impl ReorderOutcome {
    pub fn is_noop(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Moves `performance` to `desired` and renumbers its siblings so the
/// event's ranks read `1..=N` again, all in one store transaction.
///
/// Events without scheduling keep whatever rank the caller asked for and
/// siblings are left alone.
pub fn reorder_siblings<S: LineupStore>(
    store: &S,
    performance: &Performance,
    desired: Option<u32>,
) -> Result<ReorderOutcome, LineupError> {
    validation::validate_rank(desired)?;
    let event_id = performance.event_id;
    let performance_id = performance.id;

    store.transaction(event_id, |tx| {
        let current = tx
            .performance(performance_id)
            .ok_or(LineupError::PerformanceNotFound {
                event_id,
                performance_id,
            })?
            .rank;

        let writes = if tx.event().scheduling_enabled {
            let plan = OrderCompactor::new(tx.ranked_siblings(performance_id)).plan(
                performance_id,
                current,
                desired,
            );
            plan.changes().copied().collect()
        } else if current != desired {
            vec![RankChange {
                performance_id,
                from: current,
                to: desired,
            }]
        } else {
            Vec::new()
        };

        apply(tx, &writes)?;
        tracing::debug!(
            event_id = %event_id,
            performance_id = %performance_id,
            ?desired,
            writes = writes.len(),
            "reordered lineup"
        );

        Ok(ReorderOutcome {
            event_id,
            performance_id,
            final_rank: tx.performance(performance_id).and_then(|p| p.rank),
            writes,
        })
    })
}

/// Renumbers the ranked performances of a scheduled event to `1..=N`,
/// keeping their order. Run after a performance leaves the lineup.
pub fn close_gaps<S: LineupStore>(
    store: &S,
    event_id: EventId,
) -> Result<Vec<RankChange>, LineupError> {
    store.transaction(event_id, |tx| {
        if !tx.event().scheduling_enabled {
            return Ok(Vec::new());
        }
        let writes = OrderCompactor::new(tx.ranked()).close_gaps();
        apply(tx, &writes)?;
        tracing::debug!(event_id = %event_id, writes = writes.len(), "closed lineup gaps");
        Ok(writes)
    })
}

fn apply(tx: &mut dyn LineupTransaction, writes: &[RankChange]) -> Result<(), PersistenceError> {
    for change in writes {
        tx.update_rank(change.performance_id, change.to)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "timeslot", rename_all = "snake_case")]
pub enum TimeslotStatus {
    /// The event does not use scheduling.
    NotScheduled,
    /// Scheduling is on but the timetable could not be built.
    Unavailable,
    Scheduled(Timeslot),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineupEntry {
    pub event_id: EventId,
    pub performance_id: PerformanceId,
    pub title: String,
    pub artist_name: String,
    pub rank: Option<u32>,
    pub timeslot: TimeslotStatus,
}

impl LineupEntry {
    pub fn timeslot_label(&self) -> Option<String> {
        match &self.timeslot {
            TimeslotStatus::Scheduled(slot) => Some(slot.label()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineupReport {
    pub entries: Vec<LineupEntry>,
    /// One message per event whose timetable failed.
    pub timetable_issues: Vec<String>,
}

/// Lists every performance of `events` in lineup order with its timeslot.
/// Timetables come from `cache`, so each event is built at most once.
///
/// Expected build failures become an issue message and `Unavailable` slots.
/// A timetable that runs out of range, or one missing a performance, fails
/// the whole render.
pub fn render_lineup(
    cache: &mut TimetableCache,
    events: &[Event],
) -> Result<LineupReport, TimeslotLookupError> {
    let mut report = LineupReport::default();
    for event in events {
        let mut performances: Vec<&Performance> = event.performances.iter().collect();
        performances.sort_by_key(|p| (!p.is_ranked(), p.rank, p.id));

        let mut failed = false;
        for performance in performances {
            let timeslot = if !event.scheduling_enabled {
                TimeslotStatus::NotScheduled
            } else {
                match cache.timeslot_for(event, performance.id) {
                    Ok(slot) => TimeslotStatus::Scheduled(slot),
                    Err(TimeslotLookupError::Timetable(err)) if err.is_expected() => {
                        if !failed {
                            report.timetable_issues.push(format!(
                                "Unable to generate timetable for {}: {err}",
                                event.label
                            ));
                            failed = true;
                        }
                        TimeslotStatus::Unavailable
                    }
                    Err(err) => return Err(err),
                }
            };
            report.entries.push(LineupEntry {
                event_id: event.id,
                performance_id: performance.id,
                title: performance.title.clone(),
                artist_name: performance.artist_name.clone(),
                rank: performance.rank,
                timeslot,
            });
        }
    }
    Ok(report)
}
