//! Metric: a named quantity being measured, and the logs recorded for it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, VerdantError};
use crate::id::{MetricId, MetricLogId};
use crate::time::{Timestamp, now};

/// Metric kind whose values are stored in degrees Celsius.
pub const TEMPERATURE: &str = "temperature";
/// Metric kind whose values are a ratio from 0 to 1.
pub const HUMIDITY: &str = "humidity";

/// Unit temperatures are reported in before being stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "c", alias = "celsius")]
    Celsius,
    #[serde(rename = "f", alias = "fahrenheit")]
    Fahrenheit,
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Celsius => write!(f, "c"),
            Self::Fahrenheit => write!(f, "f"),
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" | "celsius" => Ok(Self::Celsius),
            "f" | "fahrenheit" => Ok(Self::Fahrenheit),
            _ => Err(ValidationError::UnknownTemperatureUnit(s.to_string())),
        }
    }
}

/// A measured quantity, e.g. the air temperature of a tent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub id: MetricId,
    pub name: String,
    /// Where the measurement is taken (`air`, `water`, `soil`, …).
    pub topic: String,
    /// What is measured (`temperature`, `humidity`, …). Export filters match on it.
    #[serde(rename = "type")]
    pub kind: String,
    /// Values are entered by hand rather than read by a sensor.
    pub manual: bool,
    pub disabled: bool,
}

impl Metric {
    /// Create a builder for constructing a [`Metric`].
    #[must_use]
    pub fn builder() -> MetricBuilder {
        MetricBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`VerdantError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), VerdantError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    /// Convert a raw `value` of this metric to the unit it is stored in.
    ///
    /// Only temperatures reported in Fahrenheit change.
    #[must_use]
    pub fn standardize(&self, value: f64, unit: TemperatureUnit) -> f64 {
        match (self.kind.as_str(), unit) {
            (TEMPERATURE, TemperatureUnit::Fahrenheit) => (value - 32.0) * 5.0 / 9.0,
            _ => value,
        }
    }

    /// Check that a standardized `value` can be stored for this metric.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ValueOutOfRange`] for a value that is not
    /// finite, or a humidity outside `0..=1`.
    pub fn check_value(&self, value: f64) -> Result<(), VerdantError> {
        let expected = if !value.is_finite() {
            "a finite number"
        } else if self.kind == HUMIDITY && !(0.0..=1.0).contains(&value) {
            "a ratio between 0 and 1"
        } else {
            return Ok(());
        };
        Err(ValidationError::ValueOutOfRange {
            metric: self.name.clone(),
            value: value.to_string(),
            expected,
        }
        .into())
    }
}

/// Step-by-step builder for [`Metric`].
#[derive(Debug, Default)]
pub struct MetricBuilder {
    id: Option<MetricId>,
    name: Option<String>,
    topic: Option<String>,
    kind: Option<String>,
    manual: bool,
    disabled: bool,
}

impl MetricBuilder {
    #[must_use]
    pub fn id(mut self, id: MetricId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn manual(mut self, manual: bool) -> Self {
        self.manual = manual;
        self
    }

    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Consume the builder, validate, and return a [`Metric`].
    ///
    /// # Errors
    ///
    /// Returns [`VerdantError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Metric, VerdantError> {
        let metric = Metric {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            topic: self.topic.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            manual: self.manual,
            disabled: self.disabled,
        };
        metric.validate()?;
        Ok(metric)
    }
}

/// A single recorded value of a metric. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricLog {
    pub id: MetricLogId,
    pub metric_id: MetricId,
    pub value: f64,
    pub recorded_at: Timestamp,
}

impl MetricLog {
    /// A log for `metric_id` recorded now.
    #[must_use]
    pub fn new(metric_id: MetricId, value: f64) -> Self {
        Self::at(metric_id, value, now())
    }

    /// A log for `metric_id` recorded at `recorded_at`.
    #[must_use]
    pub fn at(metric_id: MetricId, value: f64, recorded_at: Timestamp) -> Self {
        Self {
            id: MetricLogId::new(),
            metric_id,
            value,
            recorded_at,
        }
    }
}
