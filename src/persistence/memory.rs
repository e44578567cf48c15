use super::{LineupStore, LineupTransaction, PersistenceError, PersistenceResult};
use crate::event::{Event, EventId};
use crate::performance::{Performance, PerformanceId};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// In-process store. Each event sits behind its own lock so reorders on
/// different events never contend.
#[derive(Default)]
pub struct MemoryLineupStore {
    events: RwLock<EventSlots>,
}

struct StagedTransaction {
    event: Event,
}

impl LineupTransaction for StagedTransaction {
    fn event(&self) -> &Event {
        &self.event
    }

    fn update_rank(
        &mut self,
        performance_id: PerformanceId,
        rank: Option<u32>,
    ) -> PersistenceResult<()> {
        let performance = self
            .event
            .performance_mut(performance_id)
            .ok_or(PersistenceError::PerformanceNotFound(performance_id))?;
        performance.rank = rank;
        Ok(())
    }
}

impl MemoryLineupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events<I>(events: I) -> PersistenceResult<Self>
    where
        I: IntoIterator<Item = Event>,
    {
        let store = Self::new();
        for event in events {
            store.save_event(&event)?;
        }
        Ok(store)
    }

    fn slot(&self, event_id: EventId) -> Option<Arc<Mutex<Event>>> {
        self.events.read().get(&event_id).cloned()
    }
}

type EventSlots = HashMap<EventId, Arc<Mutex<Event>>>;

fn ensure_unclaimed(
    events: &EventSlots,
    event_id: EventId,
    ids: &[PerformanceId],
) -> PersistenceResult<()> {
    for (&owner, slot) in events.iter().filter(|(id, _)| **id != event_id) {
        let other = slot.lock();
        if let Some(&performance_id) = ids.iter().find(|id| other.performance(**id).is_some()) {
            return Err(PersistenceError::PerformanceOwnedElsewhere {
                performance_id,
                owner,
            });
        }
    }
    Ok(())
}

impl LineupStore for MemoryLineupStore {
    fn load_event(&self, event_id: EventId) -> PersistenceResult<Option<Event>> {
        Ok(self.slot(event_id).map(|slot| slot.lock().clone()))
    }

    fn transaction<T, E, F>(&self, event_id: EventId, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn LineupTransaction) -> Result<T, E>,
        E: From<PersistenceError>,
    {
        let slot = self
            .slot(event_id)
            .ok_or(PersistenceError::EventNotFound(event_id))?;
        let mut committed = slot.lock();
        let mut staged = StagedTransaction {
            event: committed.clone(),
        };
        let output = work(&mut staged)?;
        *committed = staged.event;
        Ok(output)
    }

    fn save_event(&self, event: &Event) -> PersistenceResult<()> {
        super::validate_event(event)?;
        let mut events = self.events.write();
        let ids: Vec<PerformanceId> = event.performances.iter().map(|p| p.id).collect();
        ensure_unclaimed(&events, event.id, &ids)?;
        events
            .entry(event.id)
            .and_modify(|slot| *slot.lock() = event.clone())
            .or_insert_with(|| Arc::new(Mutex::new(event.clone())));
        Ok(())
    }

    fn upsert_performance(&self, performance: &Performance) -> PersistenceResult<()> {
        super::validate_performance(performance)?;
        let events = self.events.write();
        let slot = events
            .get(&performance.event_id)
            .ok_or(PersistenceError::EventNotFound(performance.event_id))?;
        ensure_unclaimed(&events, performance.event_id, &[performance.id])?;
        let mut event = slot.lock();
        match event.performance_mut(performance.id) {
            Some(existing) => *existing = performance.clone(),
            None => event.performances.push(performance.clone()),
        }
        Ok(())
    }

    fn remove_performance(&self, performance_id: PerformanceId) -> PersistenceResult<bool> {
        let slots: Vec<Arc<Mutex<Event>>> = self.events.read().values().cloned().collect();
        for slot in slots {
            let mut event = slot.lock();
            let before = event.performances.len();
            event.performances.retain(|p| p.id != performance_id);
            if event.performances.len() != before {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
