//! Grow: one crop cycle, from start to (eventually) end.

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, VerdantError};
use crate::id::GrowId;
use crate::time::{Timestamp, now};

/// A crop cycle. Only one grow may be in progress at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grow {
    pub id: GrowId,
    pub start: Timestamp,
    pub end: Option<Timestamp>,
}

impl Grow {
    /// A grow starting now.
    #[must_use]
    pub fn start_now() -> Self {
        Self::started_at(now())
    }

    #[must_use]
    pub fn started_at(start: Timestamp) -> Self {
        Self {
            id: GrowId::new(),
            start,
            end: None,
        }
    }

    /// A grow is active until it has an end.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.end.is_none()
    }

    /// Close the grow at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidGrowEnd`] if `at` precedes the start.
    pub fn finish(&mut self, at: Timestamp) -> Result<(), VerdantError> {
        if at < self.start {
            return Err(ValidationError::InvalidGrowEnd.into());
        }
        self.end = Some(at);
        Ok(())
    }
}
