//! Recipe port: where the bound controller gets its thresholds from.

use std::future::Future;
use std::sync::Arc;

use verdant_domain::error::VerdantError;
use verdant_domain::recipe::MetricBound;
use verdant_domain::time::Timestamp;

/// Looks up the target range of a metric for the current point of a grow.
pub trait RecipeSource {
    /// The `(min, max)` pair of the `(topic, kind)` metric for a grow started
    /// at `grow_start`, or `None` when the recipe says nothing about it.
    fn metric_bound(
        &self,
        topic: &str,
        kind: &str,
        grow_start: Timestamp,
    ) -> impl Future<Output = Result<Option<MetricBound>, VerdantError>> + Send;
}

impl<T: RecipeSource + Send + Sync> RecipeSource for Arc<T> {
    fn metric_bound(
        &self,
        topic: &str,
        kind: &str,
        grow_start: Timestamp,
    ) -> impl Future<Output = Result<Option<MetricBound>, VerdantError>> + Send {
        (**self).metric_bound(topic, kind, grow_start)
    }
}
