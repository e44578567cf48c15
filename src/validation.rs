use crate::event::Event;
use crate::performance::Performance;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn validate_rank(rank: Option<u32>) -> Result<(), ValidationError> {
    match rank {
        Some(0) => Err(ValidationError::new("lineup rank must be 1 or greater")),
        _ => Ok(()),
    }
}

pub fn validate_performance(performance: &Performance) -> Result<(), ValidationError> {
    if performance.title.trim().is_empty() {
        return Err(ValidationError::new(format!(
            "performance {} requires a title",
            performance.id
        )));
    }
    if performance.artist_name.trim().is_empty() {
        return Err(ValidationError::new(format!(
            "performance {} requires an artist name",
            performance.id
        )));
    }
    validate_rank(performance.rank).map_err(|err| {
        ValidationError::new(format!("performance {}: {err}", performance.id))
    })?;
    Ok(())
}

/// Checks performances belong to the event and ids are unique. Rank
/// contiguity is not required here; it is restored by the reorder pass.
pub fn validate_event(event: &Event) -> Result<(), ValidationError> {
    if event.label.trim().is_empty() {
        return Err(ValidationError::new(format!("event {} requires a label", event.id)));
    }
    let mut seen_ids = HashSet::with_capacity(event.performances.len());
    for performance in &event.performances {
        if performance.event_id != event.id {
            return Err(ValidationError::new(format!(
                "performance {} belongs to event {}, not {}",
                performance.id, performance.event_id, event.id
            )));
        }
        if !seen_ids.insert(performance.id) {
            return Err(ValidationError::new(format!(
                "duplicate performance id {}",
                performance.id
            )));
        }
        validate_performance(performance)?;
    }
    Ok(())
}
