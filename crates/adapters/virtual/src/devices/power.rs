//! Virtual relay: remembers whether it is on.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use verdant_app::ports::PowerDriver;
use verdant_domain::error::DeviceError;

/// Device config overlay for [`VirtualPower`].
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PowerConfig {
    /// Simulate a relay that never answers.
    #[serde(default)]
    pub unreachable: bool,
}

/// A simulated relay.
pub struct VirtualPower {
    name: String,
    unreachable: bool,
    on: AtomicBool,
}

impl VirtualPower {
    #[must_use]
    pub fn new(name: impl Into<String>, config: PowerConfig) -> Self {
        Self {
            name: name.into(),
            unreachable: config.unreachable,
            on: AtomicBool::new(false),
        }
    }

    /// Whether the relay is currently switched on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    fn switch(&self, on: bool) -> Result<(), DeviceError> {
        if self.unreachable {
            return Err(DeviceError::Unreachable);
        }
        let was = self.on.swap(on, Ordering::SeqCst);
        tracing::info!(device = %self.name, on, changed = was != on, "virtual relay switched");
        Ok(())
    }
}

#[async_trait]
impl PowerDriver for VirtualPower {
    async fn on(&self) -> Result<(), DeviceError> {
        self.switch(true)
    }

    async fn off(&self) -> Result<(), DeviceError> {
        self.switch(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_start_off_and_follow_commands() {
        let relay = VirtualPower::new("fan", PowerConfig::default());
        assert!(!relay.is_on());

        relay.on().await.unwrap();
        assert!(relay.is_on());

        relay.off().await.unwrap();
        assert!(!relay.is_on());
    }

    #[tokio::test]
    async fn should_fail_when_configured_unreachable() {
        let relay = VirtualPower::new("fan", PowerConfig { unreachable: true });

        let result = relay.on().await;

        assert!(matches!(result, Err(DeviceError::Unreachable)));
        assert!(!relay.is_on());
    }
}
