use crate::event::EventId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerformanceId(pub u64);

impl fmt::Display for PerformanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single act in an event's lineup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performance {
    pub id: PerformanceId,
    pub event_id: EventId,
    pub title: String,
    pub artist_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 1-based lineup position. Unique and contiguous among ranked siblings
    /// once a reorder has settled.
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    /// Wall-clock start, only needed on the performance that opens the night.
    #[serde(default)]
    pub explicit_start: Option<NaiveDateTime>,
}

impl Performance {
    pub fn new(
        id: u64,
        event_id: u64,
        title: impl Into<String>,
        artist_name: impl Into<String>,
    ) -> Self {
        Self {
            id: PerformanceId(id),
            event_id: EventId(event_id),
            title: title.into(),
            artist_name: artist_name.into(),
            description: None,
            rank: None,
            duration_seconds: None,
            explicit_start: None,
        }
    }

    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn with_start(mut self, start: NaiveDateTime) -> Self {
        self.explicit_start = Some(start);
        self
    }

    pub fn is_ranked(&self) -> bool {
        self.rank.is_some()
    }
}
