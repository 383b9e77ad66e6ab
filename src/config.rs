// ⚙️ Configuration - Rules as data
// Keyword sets, filename hints and model constants, loadable from a JSON file.
// Every field is optional; anything left out keeps the built-in default.

use crate::classifier::{DatasetClassifier, FilenameHints, KeywordSets};
use crate::error::AnalyticsResult;
use crate::inventory::{ModelConstants, DEFAULT_REORDER_THRESHOLD};
use crate::labor::{BucketGranularity, DEFAULT_TARGET_PRIME_COST_PCT};
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaborSettings {
    pub granularity: BucketGranularity,
    pub target_prime_cost_pct: f64,
}

impl Default for LaborSettings {
    fn default() -> Self {
        LaborSettings {
            granularity: BucketGranularity::default(),
            target_prime_cost_pct: DEFAULT_TARGET_PRIME_COST_PCT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub keywords: KeywordSets,
    pub filename_hints: FilenameHints,
    pub model: ModelConstants,
    pub labor: LaborSettings,
    pub reorder_threshold: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        AnalyticsConfig {
            keywords: KeywordSets::default(),
            filename_hints: FilenameHints::default(),
            model: ModelConstants::default(),
            labor: LaborSettings::default(),
            reorder_threshold: DEFAULT_REORDER_THRESHOLD,
        }
    }
}

impl AnalyticsConfig {
    pub fn from_json(json: &str) -> AnalyticsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Classifier wired with this config's keyword sets and hints
    pub fn classifier(&self) -> DatasetClassifier {
        DatasetClassifier::new(self.keywords.clone(), self.filename_hints.clone())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::DatasetCategory;
    use crate::dataset::TabularDataset;

    #[test]
    fn test_empty_config_is_default() {
        let config = AnalyticsConfig::from_json("{}").unwrap();

        assert_eq!(config.model, ModelConstants::default());
        assert_eq!(config.labor.granularity, BucketGranularity::HourOfDay);
        assert_eq!(config.labor.target_prime_cost_pct, 55.0);
        assert_eq!(config.reorder_threshold, 10.0);
        assert_eq!(config.keywords.labor.len(), 12);
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "model": {"carrying_cost_rate": 0.3},
            "labor": {"granularity": "DateHour"},
            "keywords": {"sales": ["gross", "net"]}
        }"#;
        let config = AnalyticsConfig::from_json(json).unwrap();

        assert_eq!(config.model.carrying_cost_rate, 0.3);
        assert_eq!(config.model.service_level_z, 1.65);
        assert_eq!(config.labor.granularity, BucketGranularity::DateHour);
        assert_eq!(config.labor.target_prime_cost_pct, 55.0);
        // untouched sets keep their defaults
        assert_eq!(config.keywords.inventory.len(), 8);

        let ds = TabularDataset::from_header(&["Gross", "Net", "SKU"]).unwrap();
        assert_eq!(config.classifier().classify(&ds, None), DatasetCategory::Sales);
        assert_eq!(
            AnalyticsConfig::default().classifier().classify(&ds, None),
            DatasetCategory::Inventory
        );
    }

    #[test]
    fn test_invalid_json() {
        let err = AnalyticsConfig::from_json("{\"reorder_threshold\": \"ten\"}").unwrap_err();
        assert!(err.to_string().starts_with("Invalid configuration"));
    }

    #[test]
    fn test_missing_file() {
        let err = AnalyticsConfig::from_file("/nonexistent/stockpilot.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
