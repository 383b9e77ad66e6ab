// 🧭 Dataset Classifier - Which kind of business table was uploaded?
// Keyword scoring over the header, with an optional filename fast-path
//
// Keyword sets are data, not code: defaults live here, overrides come from config.

use crate::dataset::TabularDataset;
use log::debug;
use serde::{Deserialize, Serialize};

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetCategory {
    Labor,
    Sales,
    Inventory,
}

impl DatasetCategory {
    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            DatasetCategory::Labor => "Labor",
            DatasetCategory::Sales => "Sales",
            DatasetCategory::Inventory => "Inventory",
        }
    }
}

// ============================================================================
// KEYWORD SETS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordSets {
    pub labor: Vec<String>,
    pub inventory: Vec<String>,
    pub sales: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Default for KeywordSets {
    fn default() -> Self {
        KeywordSets {
            labor: words(&[
                "wage", "pay", "employee", "staff", "clock", "start", "end", "shift", "labor",
                "payroll", "hour", "rate",
            ]),
            inventory: words(&[
                "stock", "qty", "product", "item", "inventory", "sku", "reorder", "count",
            ]),
            sales: words(&[
                "revenue", "sales", "transaction", "price", "customer", "ticket", "total",
                "receipt",
            ]),
        }
    }
}

/// Filename tokens that short-circuit column scoring.
/// Checked in the order Labor → Inventory → Sales.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilenameHints {
    pub labor: Vec<String>,
    pub inventory: Vec<String>,
    pub sales: Vec<String>,
}

impl Default for FilenameHints {
    fn default() -> Self {
        FilenameHints {
            labor: words(&["labor", "payroll", "shift", "timesheet", "wage"]),
            inventory: words(&["inventory", "stock"]),
            sales: words(&["sales", "revenue", "transaction"]),
        }
    }
}

fn contains_any(name: &str, tokens: &[String]) -> bool {
    tokens.iter().any(|t| name.contains(&t.to_lowercase()))
}

impl FilenameHints {
    fn lookup(&self, filename: &str) -> Option<DatasetCategory> {
        let name = filename.to_lowercase();

        if contains_any(&name, &self.labor) {
            Some(DatasetCategory::Labor)
        } else if contains_any(&name, &self.inventory) {
            Some(DatasetCategory::Inventory)
        } else if contains_any(&name, &self.sales) {
            Some(DatasetCategory::Sales)
        } else {
            None
        }
    }
}

// ============================================================================
// CLASSIFICATION RESULT
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub labor: usize,
    pub inventory: usize,
    pub sales: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchedBy {
    /// Filename contained a category token
    Filename,
    /// One keyword set strictly out-scored the others
    Columns,
    /// Tie or no keyword at all: fell back to Sales
    Default,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: DatasetCategory,
    pub scores: CategoryScores,
    pub matched_by: MatchedBy,
}

impl ClassificationResult {
    /// Default-category results should be labelled as a guess by the dashboard
    pub fn is_low_confidence(&self) -> bool {
        self.matched_by == MatchedBy::Default
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct DatasetClassifier {
    keywords: KeywordSets,
    hints: FilenameHints,
}

/// Lower-case and treat `_` / `-` as spaces ("Hourly_Rate" → "hourly rate")
fn normalize_column(name: &str) -> String {
    name.to_lowercase().replace(['_', '-'], " ")
}

/// Distinct keywords of `set` found inside any normalized column
fn score(set: &[String], columns: &[String]) -> usize {
    set.iter()
        .filter(|kw| {
            let kw = kw.to_lowercase();
            columns.iter().any(|c| c.contains(&kw))
        })
        .count()
}

impl DatasetClassifier {
    pub fn new(keywords: KeywordSets, hints: FilenameHints) -> Self {
        DatasetClassifier { keywords, hints }
    }

    /// Classify a dataset. `filename` falls back to the dataset's own source.
    pub fn classify(&self, dataset: &TabularDataset, filename: Option<&str>) -> DatasetCategory {
        self.explain(dataset, filename).category
    }

    /// Classify and report how the decision was reached
    pub fn explain(&self, dataset: &TabularDataset, filename: Option<&str>) -> ClassificationResult {
        let scores = self.score_columns(&dataset.columns);

        if let Some(category) = filename
            .or(dataset.source.as_deref())
            .and_then(|name| self.hints.lookup(name))
        {
            debug!("classified as {} from filename hint", category.name());
            return ClassificationResult {
                category,
                scores,
                matched_by: MatchedBy::Filename,
            };
        }

        let (category, matched_by) = pick_category(&scores);
        debug!(
            "classified as {} (labor={}, inventory={}, sales={})",
            category.name(),
            scores.labor,
            scores.inventory,
            scores.sales
        );

        ClassificationResult {
            category,
            scores,
            matched_by,
        }
    }

    /// Keyword scores for a header
    pub fn score_columns(&self, columns: &[String]) -> CategoryScores {
        let normalized: Vec<String> = columns.iter().map(|c| normalize_column(c)).collect();

        CategoryScores {
            labor: score(&self.keywords.labor, &normalized),
            inventory: score(&self.keywords.inventory, &normalized),
            sales: score(&self.keywords.sales, &normalized),
        }
    }
}

/// Strict winner, otherwise Sales
fn pick_category(scores: &CategoryScores) -> (DatasetCategory, MatchedBy) {
    let CategoryScores {
        labor,
        inventory,
        sales,
    } = *scores;

    if labor > inventory && labor > sales {
        (DatasetCategory::Labor, MatchedBy::Columns)
    } else if inventory > labor && inventory > sales {
        (DatasetCategory::Inventory, MatchedBy::Columns)
    } else if sales > labor && sales > inventory {
        (DatasetCategory::Sales, MatchedBy::Columns)
    } else {
        (DatasetCategory::Sales, MatchedBy::Default)
    }
}

/// Classify with the built-in keyword sets and filename hints
pub fn classify(dataset: &TabularDataset, filename: Option<&str>) -> DatasetCategory {
    DatasetClassifier::default().classify(dataset, filename)
}

// ============================================================================
// TESTS
// ============================================================================
