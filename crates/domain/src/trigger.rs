//! Trigger: switch a power device when a metric leaves its recipe range.
//!
//! A trigger watches one side of a metric's range: the ceiling
//! (`upper_bound = true`) or the floor (`upper_bound = false`). When the
//! latest value is past that side, the trigger's power action is taken;
//! once the value is back, the opposite action is taken.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{DeviceId, MetricId, TriggerId};

/// What a power device is told to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerAction {
    On,
    Off,
}

impl PowerAction {
    /// `true` maps to [`On`](Self::On), `false` to [`Off`](Self::Off).
    #[must_use]
    pub fn from_flag(power_on: bool) -> Self {
        if power_on { Self::On } else { Self::Off }
    }

    /// The opposite action.
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// A bound rule linking a metric to a power device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: TriggerId,
    pub metric_id: MetricId,
    /// Watch the ceiling (`true`) or the floor (`false`) of the range.
    pub upper_bound: bool,
    pub power_device_id: DeviceId,
    /// Action taken when the bound is crossed.
    pub power_on: bool,
    pub disabled: bool,
}

impl Trigger {
    /// A new enabled trigger.
    #[must_use]
    pub fn new(
        metric_id: MetricId,
        upper_bound: bool,
        power_device_id: DeviceId,
        power_on: bool,
    ) -> Self {
        Self {
            id: TriggerId::new(),
            metric_id,
            upper_bound,
            power_device_id,
            power_on,
            disabled: false,
        }
    }

    /// Action taken when the bound is crossed.
    #[must_use]
    pub fn action(&self) -> PowerAction {
        PowerAction::from_flag(self.power_on)
    }

    /// Whether `value` lies past `bound` on the side this trigger watches.
    ///
    /// Equality is never past the bound.
    #[must_use]
    pub fn is_past(&self, bound: f64, value: f64) -> bool {
        if self.upper_bound {
            value > bound
        } else {
            value < bound
        }
    }

    /// `"high"` for ceiling triggers, `"low"` for floor triggers.
    #[must_use]
    pub fn direction(&self) -> &'static str {
        if self.upper_bound { "high" } else { "low" }
    }
}
