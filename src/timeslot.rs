use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

const LABEL_FORMAT: &str = "%H:%M";

/// Computed start/end interval for one performance. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeslot {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Timeslot {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// 24-hour, zero-padded `HH:MM - HH:MM`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Timeslot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format(LABEL_FORMAT),
            self.end.format(LABEL_FORMAT)
        )
    }
}
