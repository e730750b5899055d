//! Virtual exporter: writes every log it receives to the diagnostic log.

use async_trait::async_trait;
use serde::Deserialize;
use verdant_app::ports::ExporterDriver;
use verdant_domain::export::{ExportFilter, ExportOutcome};
use verdant_domain::metric::MetricLog;

/// Device config overlay for [`LogExporter`].
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    /// Metric kinds to export. Takes precedence over `blacklist`.
    #[serde(default)]
    pub whitelist: Option<Vec<String>>,
    /// Metric kinds to skip.
    #[serde(default)]
    pub blacklist: Option<Vec<String>>,
}

/// An exporter that ships logs to `tracing` and always succeeds.
pub struct LogExporter {
    name: String,
    filter: ExportFilter,
}

impl LogExporter {
    #[must_use]
    pub fn new(name: impl Into<String>, config: ExporterConfig) -> Self {
        Self {
            name: name.into(),
            filter: ExportFilter::from_lists(config.whitelist, config.blacklist),
        }
    }
}

#[async_trait]
impl ExporterDriver for LogExporter {
    fn filter(&self) -> ExportFilter {
        self.filter.clone()
    }

    async fn export(&self, logs: &[MetricLog]) -> ExportOutcome {
        for log in logs {
            tracing::info!(
                exporter = %self.name,
                metric_id = %log.metric_id,
                value = log.value,
                recorded_at = %log.recorded_at,
                "metric exported"
            );
        }
        ExportOutcome::Complete
    }
}
