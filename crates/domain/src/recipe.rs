//! Recipe: the target ranges of every metric over the life of a grow.
//!
//! A recipe is an ordered list of stages. Each stage lasts a number of days
//! (the last one may be open-ended) and lists the `min`/`max` range of the
//! metrics it cares about. The stage in effect is found from the time
//! elapsed since the grow started.

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// The min/max pair of a metric at a given point of the grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricBound {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl MetricBound {
    /// The ceiling when `upper_bound` is set, the floor otherwise.
    #[must_use]
    pub fn side(&self, upper_bound: bool) -> Option<f64> {
        if upper_bound { self.max } else { self.min }
    }
}

/// Target range of one metric inside a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRange {
    pub topic: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// A phase of the grow (germination, vegetative, flowering, …).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    /// Length of the stage. `None` means the stage never ends.
    #[serde(default)]
    pub days: Option<u32>,
    #[serde(default, rename = "metric")]
    pub metrics: Vec<MetricRange>,
}

/// Ordered stages of a grow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default, rename = "stage")]
    pub stages: Vec<Stage>,
}

impl Recipe {
    /// The stage in effect at `at` for a grow started at `start`.
    ///
    /// Returns `None` before the start and after the last bounded stage.
    #[must_use]
    pub fn stage_at(&self, start: Timestamp, at: Timestamp) -> Option<&Stage> {
        if at < start {
            return None;
        }
        let elapsed = at - start;
        let mut stage_end = chrono::Duration::zero();
        for stage in &self.stages {
            let Some(days) = stage.days else {
                return Some(stage);
            };
            stage_end += chrono::Duration::days(i64::from(days));
            if elapsed < stage_end {
                return Some(stage);
            }
        }
        None
    }

    /// Bound of the `(topic, kind)` metric at `at` for a grow started at `start`.
    #[must_use]
    pub fn bound_at(
        &self,
        topic: &str,
        kind: &str,
        start: Timestamp,
        at: Timestamp,
    ) -> Option<MetricBound> {
        let stage = self.stage_at(start, at)?;
        stage
            .metrics
            .iter()
            .find(|range| range.topic == topic && range.kind == kind)
            .map(|range| MetricBound {
                min: range.min,
                max: range.max,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn range(topic: &str, kind: &str, min: Option<f64>, max: Option<f64>) -> MetricRange {
        MetricRange {
            topic: topic.to_string(),
            kind: kind.to_string(),
            min,
            max,
        }
    }

    fn recipe() -> Recipe {
        Recipe {
            stages: vec![
                Stage {
                    name: "seedling".to_string(),
                    days: Some(14),
                    metrics: vec![range("air", "temperature", Some(20.0), Some(26.0))],
                },
                Stage {
                    name: "vegetative".to_string(),
                    days: Some(30),
                    metrics: vec![
                        range("air", "temperature", Some(22.0), Some(28.0)),
                        range("air", "humidity", None, Some(0.7)),
                    ],
                },
            ],
        }
    }

    fn start() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn should_find_first_stage_at_start() {
        let recipe = recipe();
        let stage = recipe.stage_at(start(), start()).unwrap();
        assert_eq!(stage.name, "seedling");
    }

    #[test]
    fn should_move_to_next_stage_when_days_elapse() {
        let recipe = recipe();
        let stage = recipe
            .stage_at(start(), start() + Duration::days(14))
            .unwrap();
        assert_eq!(stage.name, "vegetative");
    }

    #[test]
    fn should_return_none_after_last_bounded_stage() {
        assert!(recipe().stage_at(start(), start() + Duration::days(44)).is_none());
    }

    #[test]
    fn should_return_none_before_start() {
        assert!(recipe().stage_at(start(), start() - Duration::hours(1)).is_none());
    }

    #[test]
    fn should_keep_open_ended_stage_forever() {
        let mut recipe = recipe();
        recipe.stages[1].days = None;
        let stage = recipe
            .stage_at(start(), start() + Duration::days(400))
            .unwrap();
        assert_eq!(stage.name, "vegetative");
    }

    #[test]
    fn should_resolve_bound_for_topic_and_kind() {
        let bound = recipe()
            .bound_at("air", "humidity", start(), start() + Duration::days(20))
            .unwrap();
        assert_eq!(bound.side(false), None);
        assert_eq!(bound.side(true), Some(0.7));
    }

    #[test]
    fn should_return_none_when_stage_lacks_metric() {
        assert!(recipe().bound_at("air", "humidity", start(), start()).is_none());
    }
}
