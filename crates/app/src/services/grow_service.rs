//! Grow service: starting and ending crop cycles.

use verdant_domain::error::{ValidationError, VerdantError};
use verdant_domain::grow::Grow;
use verdant_domain::time::now;

use crate::ports::GrowRepository;

/// Application service for the grow lifecycle.
pub struct GrowService<R> {
    repo: R,
}

impl<R: GrowRepository + Sync> GrowService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Start a new grow now.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::GrowAlreadyActive`] when a grow is already
    /// in progress, or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) -> Result<Grow, VerdantError> {
        if self.repo.get_active().await?.is_some() {
            return Err(ValidationError::GrowAlreadyActive.into());
        }
        let grow = self.repo.create(Grow::start_now()).await?;
        tracing::info!(grow = %grow.id, start = %grow.start, "grow started");
        Ok(grow)
    }

    /// End the grow in progress.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoActiveGrow`] when nothing is in progress,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn end(&self) -> Result<Grow, VerdantError> {
        let mut grow = self
            .repo
            .get_active()
            .await?
            .ok_or(ValidationError::NoActiveGrow)?;
        grow.finish(now())?;
        let grow = self.repo.update(grow).await?;
        tracing::info!(grow = %grow.id, "grow ended");
        Ok(grow)
    }

    /// The grow in progress, if any.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository.
    pub async fn active(&self) -> Result<Option<Grow>, VerdantError> {
        self.repo.get_active().await
    }

    /// The grow the bound controller follows: the active one, provided a
    /// recipe is configured to give its bounds.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository.
    pub async fn tracked(&self, recipe_configured: bool) -> Result<Option<Grow>, VerdantError> {
        if !recipe_configured {
            return Ok(None);
        }
        self.active().await
    }
}
