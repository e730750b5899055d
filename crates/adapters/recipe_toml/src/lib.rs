//! # verdant-adapter-recipe-toml
//!
//! Loads a grow [`Recipe`] from a TOML document and serves it through the
//! [`RecipeSource`] port.
//!
//! ```toml
//! [[stage]]
//! name = "seedling"
//! days = 14
//!
//! [[stage.metric]]
//! topic = "air"
//! type = "temperature"
//! min = 20.0
//! max = 26.0
//! ```
//!
//! A stage without `days` lasts until the grow ends.

use std::future::Future;
use std::path::Path;

use verdant_app::ports::RecipeSource;
use verdant_domain::error::VerdantError;
use verdant_domain::recipe::{MetricBound, Recipe};
use verdant_domain::time::{Timestamp, now};

/// Errors raised while loading a recipe.
#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error("failed to read recipe file")]
    Io(#[from] std::io::Error),

    #[error("invalid recipe document")]
    Toml(#[from] toml::de::Error),
}

impl From<RecipeError> for VerdantError {
    fn from(err: RecipeError) -> Self {
        VerdantError::Storage(Box::new(err))
    }
}

/// A recipe parsed from TOML, looked up against the current time.
#[derive(Debug, Clone)]
pub struct TomlRecipe {
    recipe: Recipe,
}

impl TomlRecipe {
    /// Parse a recipe from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::Toml`] when the document does not describe a recipe.
    pub fn parse(document: &str) -> Result<Self, RecipeError> {
        let recipe: Recipe = toml::from_str(document)?;
        Ok(Self { recipe })
    }

    /// Read and parse the recipe at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError`] when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecipeError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path)?;
        let recipe = Self::parse(&document)?;
        tracing::info!(
            path = %path.display(),
            stages = recipe.recipe.stages.len(),
            "recipe loaded"
        );
        Ok(recipe)
    }

    #[must_use]
    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    /// Bound of `(topic, kind)` at `at` for a grow started at `grow_start`.
    #[must_use]
    pub fn bound_at(
        &self,
        topic: &str,
        kind: &str,
        grow_start: Timestamp,
        at: Timestamp,
    ) -> Option<MetricBound> {
        self.recipe.bound_at(topic, kind, grow_start, at)
    }
}

impl RecipeSource for TomlRecipe {
    fn metric_bound(
        &self,
        topic: &str,
        kind: &str,
        grow_start: Timestamp,
    ) -> impl Future<Output = Result<Option<MetricBound>, VerdantError>> + Send {
        let bound = self.bound_at(topic, kind, grow_start, now());
        async move { Ok(bound) }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    const DOCUMENT: &str = r#"
        [[stage]]
        name = "seedling"
        days = 14

        [[stage.metric]]
        topic = "air"
        type = "temperature"
        min = 20.0
        max = 26.0

        [[stage]]
        name = "flowering"

        [[stage.metric]]
        topic = "air"
        type = "humidity"
        max = 0.5
    "#;

    #[test]
    fn should_parse_stages_and_metrics() {
        let recipe = TomlRecipe::parse(DOCUMENT).unwrap();

        let stages = &recipe.recipe().stages;
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].days, Some(14));
        assert_eq!(stages[1].days, None);
        assert_eq!(stages[1].metrics[0].min, None);
    }

    #[test]
    fn should_reject_malformed_document() {
        let result = TomlRecipe::parse("[[stage]]\ndays = \"soon\"");
        assert!(matches!(result, Err(RecipeError::Toml(_))));
    }

    #[test]
    fn should_fail_to_load_missing_file() {
        let result = TomlRecipe::load("/nonexistent/recipe.toml");
        assert!(matches!(result, Err(RecipeError::Io(_))));
    }

    #[tokio::test]
    async fn should_serve_bound_of_current_stage() {
        let recipe = TomlRecipe::parse(DOCUMENT).unwrap();

        let fresh = recipe
            .metric_bound("air", "temperature", now())
            .await
            .unwrap();
        let late = recipe
            .metric_bound("air", "humidity", now() - Duration::days(30))
            .await
            .unwrap();

        assert_eq!(
            fresh,
            Some(MetricBound {
                min: Some(20.0),
                max: Some(26.0),
            })
        );
        assert_eq!(
            late,
            Some(MetricBound {
                min: None,
                max: Some(0.5),
            })
        );
    }

    #[tokio::test]
    async fn should_return_none_for_metric_absent_from_stage() {
        let recipe = TomlRecipe::parse(DOCUMENT).unwrap();

        let bound = recipe
            .metric_bound("water", "temperature", now())
            .await
            .unwrap();

        assert!(bound.is_none());
    }
}
