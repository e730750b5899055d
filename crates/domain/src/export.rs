//! Export: shipping metric logs to an exporter and remembering what went out.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::DeviceError;
use crate::id::{DeviceId, MetricLogId};
use crate::metric::MetricLog;
use crate::time::{Timestamp, now};

/// Which metric kinds an exporter accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "kinds", rename_all = "lowercase")]
pub enum ExportFilter {
    /// Every unexported log.
    #[default]
    All,
    /// Only logs whose metric kind is listed.
    Whitelist(Vec<String>),
    /// Every log whose metric kind is not listed.
    Blacklist(Vec<String>),
}

impl ExportFilter {
    /// Build a filter from optional lists. The whitelist wins when both are
    /// non-empty; empty lists count as absent.
    #[must_use]
    pub fn from_lists(whitelist: Option<Vec<String>>, blacklist: Option<Vec<String>>) -> Self {
        match (whitelist, blacklist) {
            (Some(kinds), _) if !kinds.is_empty() => Self::Whitelist(kinds),
            (_, Some(kinds)) if !kinds.is_empty() => Self::Blacklist(kinds),
            _ => Self::All,
        }
    }

    /// The same filter with empty lists counted as absent.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::Whitelist(kinds) | Self::Blacklist(kinds) if kinds.is_empty() => Self::All,
            other => other,
        }
    }

    /// Whether a log of metric kind `kind` passes this filter.
    ///
    /// An empty whitelist accepts everything, like [`ExportFilter::All`].
    #[must_use]
    pub fn accepts(&self, kind: &str) -> bool {
        match self {
            Self::All => true,
            Self::Whitelist(kinds) => kinds.is_empty() || kinds.iter().any(|k| k == kind),
            Self::Blacklist(kinds) => !kinds.iter().any(|k| k == kind),
        }
    }
}

/// Result of handing a batch of logs to an exporter.
#[derive(Debug)]
pub enum ExportOutcome {
    /// Every log in the batch was delivered.
    Complete,
    /// Nothing is known to have been delivered.
    Failed(DeviceError),
    /// Delivery failed for the listed logs only.
    Partial {
        failed: Vec<MetricLogId>,
        error: DeviceError,
    },
}

impl ExportOutcome {
    /// Ids of the logs in `batch` that count as delivered.
    ///
    /// A partial failure that does not name any failed log gives no
    /// information about what went out, so it is treated as a total failure.
    #[must_use]
    pub fn delivered(&self, batch: &[MetricLog]) -> Vec<MetricLogId> {
        match self {
            Self::Complete => batch.iter().map(|log| log.id).collect(),
            Self::Failed(_) => Vec::new(),
            Self::Partial { failed, .. } if failed.is_empty() => Vec::new(),
            Self::Partial { failed, .. } => {
                let failed: HashSet<MetricLogId> = failed.iter().copied().collect();
                batch
                    .iter()
                    .map(|log| log.id)
                    .filter(|id| !failed.contains(id))
                    .collect()
            }
        }
    }

    /// The error carried by a failed or partial outcome.
    #[must_use]
    pub fn error(&self) -> Option<&DeviceError> {
        match self {
            Self::Complete => None,
            Self::Failed(error) | Self::Partial { error, .. } => Some(error),
        }
    }
}

/// Record that a metric log was delivered by an exporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportLog {
    pub metric_log_id: MetricLogId,
    pub exporter_id: DeviceId,
    pub exported_at: Timestamp,
}

impl ExportLog {
    #[must_use]
    pub fn new(metric_log_id: MetricLogId, exporter_id: DeviceId) -> Self {
        Self {
            metric_log_id,
            exporter_id,
            exported_at: now(),
        }
    }
}
