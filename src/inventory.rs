// 📦 Inventory Diagnostics Engine - Turnover, safety stock, reorder point
// Period aggregates in, KPIs out. No validation: garbage in, intelligible garbage out.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

const DAYS_PER_YEAR: f64 = 365.0;

/// Fixed alert threshold (units on hand) for the simple reorder check
pub const DEFAULT_REORDER_THRESHOLD: f64 = 10.0;

// ============================================================================
// MODEL CONSTANTS
// ============================================================================

/// Tunable constants of the replenishment and capital-recovery models
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConstants {
    /// Daily demand standard deviation as a fraction of mean daily sales
    pub volatility_fraction: f64,

    /// z-score of the desired service level (1.65 ≈ 95%)
    pub service_level_z: f64,

    /// Annual holding cost as a fraction of inventory value
    pub carrying_cost_rate: f64,

    /// Share of holding cost assumed recoverable
    pub holding_recovery_factor: f64,

    /// Share of gross profit assumed recoverable
    pub profit_recovery_factor: f64,
}

impl Default for ModelConstants {
    fn default() -> Self {
        ModelConstants {
            volatility_fraction: 0.20,
            service_level_z: 1.65,
            carrying_cost_rate: 0.25,
            holding_recovery_factor: 0.15,
            profit_recovery_factor: 0.05,
        }
    }
}

// ============================================================================
// INPUT / RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryDiagnosticInput {
    pub revenue: f64,
    pub cogs: f64,
    pub avg_inventory_value: f64,
    pub avg_daily_sales: f64,
    pub lead_time_days: f64,
    pub units_sold: f64,
    pub units_received: f64,

    /// Not used by the formulas; carried so the caller can compare against the reorder point
    #[serde(default)]
    pub on_hand: f64,

    #[serde(default)]
    pub constants: ModelConstants,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub gross_profit: f64,
    pub margin_pct: f64,
    pub turnover: f64,
    /// 0 when turnover is 0 (no sales against stock), not infinity
    pub days_sales_of_inventory: f64,
    pub gmroi: f64,
    pub sell_through_pct: f64,
    pub stock_to_sales_ratio: f64,
    pub safety_stock: f64,
    pub reorder_point: f64,
    pub holding_cost: f64,
    /// Heuristic estimate of capital freed by efficiency gains.
    /// A rule of thumb, not a financial model.
    pub capital_recovery_estimate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    ReorderAlert,
    Stable,
}

impl DiagnosticResult {
    /// Caller-side reorder decision: below the reorder point means reorder
    pub fn stock_status(&self, on_hand: f64) -> StockStatus {
        if on_hand < self.reorder_point {
            StockStatus::ReorderAlert
        } else {
            StockStatus::Stable
        }
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Division that yields 0 instead of inf/NaN on a zero denominator
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

pub fn compute_inventory_diagnostics(input: &InventoryDiagnosticInput) -> DiagnosticResult {
    let k = &input.constants;

    let gross_profit = input.revenue - input.cogs;
    let turnover = safe_div(input.cogs, input.avg_inventory_value);

    let safety_stock = k.service_level_z
        * input.lead_time_days.sqrt()
        * (input.avg_daily_sales * k.volatility_fraction);
    let reorder_point = input.avg_daily_sales * input.lead_time_days + safety_stock;

    let holding_cost = input.avg_inventory_value * k.carrying_cost_rate;

    DiagnosticResult {
        gross_profit,
        margin_pct: safe_div(gross_profit, input.revenue) * 100.0,
        turnover,
        days_sales_of_inventory: safe_div(DAYS_PER_YEAR, turnover),
        gmroi: safe_div(gross_profit, input.avg_inventory_value),
        sell_through_pct: safe_div(input.units_sold, input.units_received) * 100.0,
        stock_to_sales_ratio: safe_div(input.avg_inventory_value, input.revenue),
        safety_stock,
        reorder_point,
        holding_cost,
        capital_recovery_estimate: holding_cost * k.holding_recovery_factor
            + gross_profit * k.profit_recovery_factor,
    }
}

// ============================================================================
// THRESHOLD ALERTS
// ============================================================================

/// On-hand quantity of one product variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_name: String,
    #[serde(default)]
    pub variant_title: Option<String>,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderAlert {
    pub product_name: String,
    pub variant_title: Option<String>,
    pub quantity: f64,
    pub alert_date: NaiveDateTime,
}

/// Flat-threshold check: every variant at or below `threshold` units gets an alert
pub fn threshold_reorder_alerts(
    levels: &[StockLevel],
    threshold: f64,
    alert_date: NaiveDateTime,
) -> Vec<ReorderAlert> {
    levels
        .iter()
        .filter(|level| level.quantity <= threshold)
        .map(|level| ReorderAlert {
            product_name: level.product_name.clone(),
            variant_title: level.variant_title.clone(),
            quantity: level.quantity,
            alert_date,
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
