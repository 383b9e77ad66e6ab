// StockPilot Analytics Core - Library
// Pure transforms the dashboard composes: classify uploads, allocate labor cost
// by hour, diagnose inventory. No I/O beyond optional config loading.

pub mod error;
pub mod dataset;
pub mod classifier;
pub mod labor;
pub mod inventory;
pub mod config;

// Re-export commonly used types
pub use error::{AnalyticsError, AnalyticsResult};
pub use dataset::{parse_timestamp, Row, TabularDataset, Value};
pub use classifier::{
    classify, CategoryScores, ClassificationResult, DatasetCategory, DatasetClassifier,
    FilenameHints, KeywordSets, MatchedBy,
};
pub use labor::{
    aggregate_hourly_sales, allocate_dataset_wages, allocate_hourly_wages, allocate_shifts,
    overlay_labor_and_sales, BucketGranularity, HourKey, HourlyCostBucket, HourlyOverlay,
    ShiftRecord, ShiftSegment,
};
pub use inventory::{
    compute_inventory_diagnostics, safe_div, threshold_reorder_alerts, DiagnosticResult,
    InventoryDiagnosticInput, ModelConstants, ReorderAlert, StockLevel, StockStatus,
};
pub use config::{AnalyticsConfig, LaborSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// TESTS
// ============================================================================
