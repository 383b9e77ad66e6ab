use anyhow::{bail, Context, Result};
use chrono::Local;
use log::info;
use std::env;
use std::fs;

use stockpilot::{
    aggregate_hourly_sales, allocate_dataset_wages, allocate_hourly_wages,
    compute_inventory_diagnostics, overlay_labor_and_sales,
    threshold_reorder_alerts, AnalyticsConfig, BucketGranularity, InventoryDiagnosticInput, Row,
    StockLevel, StockStatus, TabularDataset,
};

const USAGE: &str = "\
Usage:
  stockpilot classify [--file NAME] COLUMN...
  stockpilot allocate ROWS.json --wage COL --start COL --end COL [--by-date]
                      [--sales SALES.json --amount COL --at COL]
  stockpilot diagnose INPUT.json
  stockpilot alerts LEVELS.json [--threshold N]

Options:
  --config CFG.json   Override keyword sets and model constants";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let config = match take_option(&mut args, "--config") {
        Some(path) => AnalyticsConfig::from_file(&path)?,
        None => AnalyticsConfig::default(),
    };

    if args.is_empty() {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }

    let command = args.remove(0);
    match command.as_str() {
        "classify" => run_classify(args, &config),
        "allocate" => run_allocate(args, &config),
        "diagnose" => run_diagnose(args, &config),
        "alerts" => run_alerts(args, &config),
        other => {
            eprintln!("❌ Unknown command: {}\n\n{}", other, USAGE);
            std::process::exit(2);
        }
    }
}

/// Remove `--name VALUE` from args and return VALUE
fn take_option(args: &mut Vec<String>, name: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == name)?;
    args.remove(pos);
    if pos < args.len() {
        Some(args.remove(pos))
    } else {
        None
    }
}

/// Remove a bare `--flag` from args
fn take_flag(args: &mut Vec<String>, name: &str) -> bool {
    match args.iter().position(|a| a == name) {
        Some(pos) => {
            args.remove(pos);
            true
        }
        None => false,
    }
}

fn required_option(args: &mut Vec<String>, name: &str) -> Result<String> {
    match take_option(args, name) {
        Some(value) => Ok(value),
        None => bail!("missing required option {}", name),
    }
}

fn run_classify(mut args: Vec<String>, config: &AnalyticsConfig) -> Result<()> {
    let filename = take_option(&mut args, "--file");
    if args.is_empty() {
        bail!("classify needs at least one column name");
    }

    let dataset = TabularDataset::from_header(&args[..])?;
    let result = config.classifier().explain(&dataset, filename.as_deref());

    println!("🧭 Category: {}", result.category.name());
    println!(
        "   Scores: labor={} inventory={} sales={} ({:?})",
        result.scores.labor, result.scores.inventory, result.scores.sales, result.matched_by
    );
    if result.is_low_confidence() {
        println!("⚠️  No clear match, defaulted to Sales");
    }

    Ok(())
}

fn run_allocate(mut args: Vec<String>, config: &AnalyticsConfig) -> Result<()> {
    let wage = required_option(&mut args, "--wage")?;
    let start = required_option(&mut args, "--start")?;
    let end = required_option(&mut args, "--end")?;
    let granularity = if take_flag(&mut args, "--by-date") {
        BucketGranularity::DateHour
    } else {
        config.labor.granularity
    };
    let sales_path = take_option(&mut args, "--sales");
    let sales_columns = match sales_path {
        Some(_) => Some((
            required_option(&mut args, "--amount")?,
            required_option(&mut args, "--at")?,
        )),
        None => None,
    };

    let path = match args.first() {
        Some(path) => path,
        None => bail!("allocate needs a ROWS.json file"),
    };
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read shifts file: {}", path))?;
    let upload: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse shifts file: {}", path))?;

    // Either a full dataset (validated against its header) or a bare array of rows
    let buckets = if upload.is_object() {
        let dataset: TabularDataset = serde_json::from_value(upload)
            .with_context(|| format!("Invalid dataset in {}", path))?;
        allocate_dataset_wages(&dataset, &wage, &start, &end, granularity)?
    } else {
        let rows: Vec<Row> = serde_json::from_value(upload)
            .with_context(|| format!("Invalid shift rows in {}", path))?;
        allocate_hourly_wages(&rows, &wage, &start, &end, granularity)
    };

    let total: f64 = buckets.iter().map(|b| b.cost).sum();
    info!("{} buckets, total allocated {:.2}", buckets.len(), total);

    let (sales_path, (amount, at)) = match sales_path.zip(sales_columns) {
        Some(sales) => sales,
        None => {
            println!("{}", serde_json::to_string_pretty(&buckets)?);
            return Ok(());
        }
    };

    let content = fs::read_to_string(&sales_path)
        .with_context(|| format!("Failed to read sales file: {}", sales_path))?;
    let sales_rows: Vec<Row> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse sales file: {}", sales_path))?;

    let sales = aggregate_hourly_sales(&sales_rows, &amount, &at, granularity);
    let overlay = overlay_labor_and_sales(&buckets, &sales);
    println!("{}", serde_json::to_string_pretty(&overlay)?);

    let target = config.labor.target_prime_cost_pct;
    for hour in overlay.iter().filter(|h| h.exceeds_target(target)) {
        println!(
            "⚠️  Hour {:02}:00{}: labor is {:.1}% of sales (target {:.1}%)",
            hour.key.hour,
            hour.key.date.map(|d| format!(" on {}", d)).unwrap_or_default(),
            hour.prime_cost_pct,
            target
        );
    }

    Ok(())
}

fn run_diagnose(args: Vec<String>, config: &AnalyticsConfig) -> Result<()> {
    let path = match args.first() {
        Some(path) => path,
        None => bail!("diagnose needs an INPUT.json file"),
    };
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read input file: {}", path))?;

    let raw: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse input file: {}", path))?;
    let has_constants = raw.get("constants").is_some();
    let mut input: InventoryDiagnosticInput =
        serde_json::from_value(raw).context("Input does not match the diagnostics schema")?;

    // Per-request constants win over the config file
    if !has_constants {
        input.constants = config.model;
    }

    let result = compute_inventory_diagnostics(&input);
    println!("{}", serde_json::to_string_pretty(&result)?);

    match result.stock_status(input.on_hand) {
        StockStatus::ReorderAlert => println!(
            "🔴 Reorder: {:.0} on hand is below the reorder point of {:.0}",
            input.on_hand, result.reorder_point
        ),
        StockStatus::Stable => println!(
            "🟢 Stable: {:.0} on hand (reorder point {:.0})",
            input.on_hand, result.reorder_point
        ),
    }

    Ok(())
}

fn run_alerts(mut args: Vec<String>, config: &AnalyticsConfig) -> Result<()> {
    let threshold = match take_option(&mut args, "--threshold") {
        Some(value) => value
            .parse::<f64>()
            .with_context(|| format!("Invalid threshold: {}", value))?,
        None => config.reorder_threshold,
    };

    let path = match args.first() {
        Some(path) => path,
        None => bail!("alerts needs a LEVELS.json file"),
    };
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read stock file: {}", path))?;
    let levels: Vec<StockLevel> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse stock file: {}", path))?;

    let alerts = threshold_reorder_alerts(&levels, threshold, Local::now().naive_local());
    info!(
        "{} of {} variants at or below {} units",
        alerts.len(),
        levels.len(),
        threshold
    );

    println!("{}", serde_json::to_string_pretty(&alerts)?);
    Ok(())
}
