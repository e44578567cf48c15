use crate::performance::{Performance, PerformanceId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One show date together with every performance booked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub label: String,
    #[serde(default)]
    pub scheduling_enabled: bool,
    #[serde(default)]
    pub performances: Vec<Performance>,
}

impl Event {
    pub fn new(id: u64, label: impl Into<String>) -> Self {
        Self {
            id: EventId(id),
            label: label.into(),
            scheduling_enabled: false,
            performances: Vec::new(),
        }
    }

    pub fn with_scheduling(mut self, enabled: bool) -> Self {
        self.scheduling_enabled = enabled;
        self
    }

    pub fn with_performances<I>(mut self, performances: I) -> Self
    where
        I: IntoIterator<Item = Performance>,
    {
        self.performances.extend(performances);
        self
    }

    pub fn performance(&self, id: PerformanceId) -> Option<&Performance> {
        self.performances.iter().find(|p| p.id == id)
    }

    pub fn performance_mut(&mut self, id: PerformanceId) -> Option<&mut Performance> {
        self.performances.iter_mut().find(|p| p.id == id)
    }
}
