// ⏱️ Temporal Wage Allocator - Shift wages → calendar-hour cost buckets
// Splits each shift's pay across the wall-clock hours it covers, then overlays
// hourly sales to get a prime-cost view per hour.
//
// A shift from 23:30 to 00:45 costs 30 min in hour 23 and 45 min in hour 0 of the next day.

use crate::dataset::{Row, TabularDataset};
use crate::error::AnalyticsResult;
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prime-cost target used when the config does not override it
pub const DEFAULT_TARGET_PRIME_COST_PCT: f64 = 55.0;

// ============================================================================
// SHIFT RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRecord {
    /// Total pay for the shift
    pub wage: f64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// One hour-aligned piece of a shift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftSegment {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub cost: f64,
}

impl ShiftRecord {
    /// Usable shift, or None when the wage is negative or the interval is empty
    pub fn new(wage: f64, start: NaiveDateTime, end: NaiveDateTime) -> Option<Self> {
        if !wage.is_finite() || wage < 0.0 || end <= start {
            return None;
        }
        Some(ShiftRecord { wage, start, end })
    }

    /// Project a row onto (wage, start, end). Missing or unparseable cells yield None.
    pub fn from_row(row: &Row, wage_col: &str, start_col: &str, end_col: &str) -> Option<Self> {
        let wage = row.get(wage_col)?.as_f64()?;
        let start = row.get(start_col)?.as_timestamp()?;
        let end = row.get(end_col)?.as_timestamp()?;
        Self::new(wage, start, end)
    }

    pub fn duration_hours(&self) -> f64 {
        hours_between(self.start, self.end)
    }

    /// Wage spread uniformly over elapsed time
    pub fn rate_per_hour(&self) -> f64 {
        let hours = self.duration_hours();
        if hours <= 0.0 {
            0.0
        } else {
            self.wage / hours
        }
    }

    /// Walk [start, end) in hour-aligned pieces.
    ///
    /// The first piece ends at the next top of the hour, the last one at `end`.
    /// Costs are taken as a share of the whole shift so they always add up to `wage`.
    pub fn segments(&self) -> Vec<ShiftSegment> {
        let measure = span_measure(self.end - self.start);
        let total = measure(self.end - self.start).unwrap_or(0);
        if total <= 0 {
            return Vec::new();
        }

        let mut segments = Vec::new();
        let mut cursor = self.start;

        while cursor < self.end {
            let boundary = floor_to_hour(cursor) + Duration::hours(1);
            let seg_end = boundary.min(self.end);
            let seg = measure(seg_end - cursor).unwrap_or(0);

            segments.push(ShiftSegment {
                start: cursor,
                end: seg_end,
                cost: self.wage * seg as f64 / total as f64,
            });

            cursor = seg_end;
        }

        segments
    }
}

/// Finest unit that can hold `span` without overflow (ns, then µs, then ms).
/// Segments of the same shift are measured in that unit too.
fn span_measure(span: Duration) -> fn(Duration) -> Option<i64> {
    if span.num_nanoseconds().is_some() {
        |d| d.num_nanoseconds()
    } else if span.num_microseconds().is_some() {
        |d| d.num_microseconds()
    } else {
        |d| Some(d.num_milliseconds())
    }
}

fn hours_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let span = end - start;
    match span.num_nanoseconds() {
        Some(ns) => ns as f64 / 3_600_000_000_000.0,
        None => span.num_milliseconds() as f64 / 3_600_000.0,
    }
}

fn floor_to_hour(ts: NaiveDateTime) -> NaiveDateTime {
    ts - Duration::seconds(i64::from(ts.minute() * 60 + ts.second()))
        - Duration::nanoseconds(i64::from(ts.nanosecond()))
}

// ============================================================================
// BUCKETS
// ============================================================================

/// Hour-of-day alone, or qualified by calendar date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketGranularity {
    #[default]
    HourOfDay,
    DateHour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HourKey {
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub hour: u8,
}

impl HourKey {
    pub fn for_timestamp(ts: NaiveDateTime, granularity: BucketGranularity) -> Self {
        let date = match granularity {
            BucketGranularity::HourOfDay => None,
            BucketGranularity::DateHour => Some(ts.date()),
        };
        HourKey {
            date,
            hour: ts.hour() as u8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyCostBucket {
    pub key: HourKey,
    pub cost: f64,
}

fn into_buckets(totals: BTreeMap<HourKey, f64>) -> Vec<HourlyCostBucket> {
    totals
        .into_iter()
        .map(|(key, cost)| HourlyCostBucket { key, cost })
        .collect()
}

// ============================================================================
// ALLOCATION
// ============================================================================

/// Allocate already-projected shifts into hour buckets (sorted by key)
pub fn allocate_shifts(shifts: &[ShiftRecord], granularity: BucketGranularity) -> Vec<HourlyCostBucket> {
    let mut totals: BTreeMap<HourKey, f64> = BTreeMap::new();

    for shift in shifts {
        for segment in shift.segments() {
            let key = HourKey::for_timestamp(segment.start, granularity);
            *totals.entry(key).or_insert(0.0) += segment.cost;
        }
    }

    into_buckets(totals)
}

/// Distribute every usable row's wage across the hours of its shift.
///
/// Rows with a missing/unparseable wage or timestamp, or with `end <= start`,
/// are skipped. An empty or all-malformed batch gives an empty result.
pub fn allocate_hourly_wages(
    rows: &[Row],
    wage_col: &str,
    start_col: &str,
    end_col: &str,
    granularity: BucketGranularity,
) -> Vec<HourlyCostBucket> {
    let mut shifts = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        match ShiftRecord::from_row(row, wage_col, start_col, end_col) {
            Some(shift) => shifts.push(shift),
            None => debug!("skipping shift row {}: unusable wage or times", index),
        }
    }

    let buckets = allocate_shifts(&shifts, granularity);
    info!(
        "allocated {} of {} shift rows into {} hourly buckets",
        shifts.len(),
        rows.len(),
        buckets.len()
    );

    buckets
}

/// Same as `allocate_hourly_wages`, after checking the three columns exist
pub fn allocate_dataset_wages(
    dataset: &TabularDataset,
    wage_col: &str,
    start_col: &str,
    end_col: &str,
    granularity: BucketGranularity,
) -> AnalyticsResult<Vec<HourlyCostBucket>> {
    dataset.require_columns(&[wage_col, start_col, end_col])?;
    Ok(allocate_hourly_wages(
        &dataset.rows,
        wage_col,
        start_col,
        end_col,
        granularity,
    ))
}

// ============================================================================
// LABOR vs SALES OVERLAY
// ============================================================================

/// Sum sale amounts into the hour of their timestamp. Unusable rows are skipped.
pub fn aggregate_hourly_sales(
    rows: &[Row],
    amount_col: &str,
    timestamp_col: &str,
    granularity: BucketGranularity,
) -> Vec<HourlyCostBucket> {
    let mut totals: BTreeMap<HourKey, f64> = BTreeMap::new();
    let mut skipped = 0usize;

    for row in rows {
        let amount = row.get(amount_col).and_then(|v| v.as_f64());
        let ts = row.get(timestamp_col).and_then(|v| v.as_timestamp());

        match (amount, ts) {
            (Some(amount), Some(ts)) => {
                *totals
                    .entry(HourKey::for_timestamp(ts, granularity))
                    .or_insert(0.0) += amount;
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("skipped {} sales rows without amount or timestamp", skipped);
    }

    into_buckets(totals)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyOverlay {
    pub key: HourKey,
    pub labor_cost: f64,
    pub sales: f64,
    /// labor_cost / sales × 100 (0 when there were no sales)
    pub prime_cost_pct: f64,
}

impl HourlyOverlay {
    pub fn exceeds_target(&self, target_pct: f64) -> bool {
        self.prime_cost_pct > target_pct
    }
}

/// Outer join of labor and sales buckets on their key
pub fn overlay_labor_and_sales(
    labor: &[HourlyCostBucket],
    sales: &[HourlyCostBucket],
) -> Vec<HourlyOverlay> {
    let mut joined: BTreeMap<HourKey, (f64, f64)> = BTreeMap::new();

    for bucket in labor {
        joined.entry(bucket.key).or_insert((0.0, 0.0)).0 += bucket.cost;
    }
    for bucket in sales {
        joined.entry(bucket.key).or_insert((0.0, 0.0)).1 += bucket.cost;
    }

    joined
        .into_iter()
        .map(|(key, (labor_cost, sales))| HourlyOverlay {
            key,
            labor_cost,
            sales,
            prime_cost_pct: if sales == 0.0 {
                0.0
            } else {
                labor_cost / sales * 100.0
            },
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;

    const EPS: f64 = 1e-6;

    fn ts(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn ts_nano(day: u32, h: u32, m: u32, sec: u32, nano: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_nano_opt(h, m, sec, nano)
            .unwrap()
    }

    fn shift_row(wage: Value, start: Value, end: Value) -> Row {
        let mut row = Row::new();
        row.insert("Pay".to_string(), wage);
        row.insert("Clock_In".to_string(), start);
        row.insert("Clock_Out".to_string(), end);
        row
    }

    fn cost_at(buckets: &[HourlyCostBucket], date: Option<NaiveDate>, hour: u8) -> f64 {
        buckets
            .iter()
            .find(|b| b.key == HourKey { date, hour })
            .map(|b| b.cost)
            .unwrap_or(0.0)
    }

    #[test]
    fn test_shift_within_one_hour() {
        let shift = ShiftRecord::new(10.0, ts(1, 9, 10), ts(1, 9, 40)).unwrap();
        let segments = shift.segments();

        assert_eq!(segments.len(), 1);
        assert!((segments[0].cost - 10.0).abs() < EPS);
        assert!((shift.rate_per_hour() - 20.0).abs() < EPS);
    }

    #[test]
    fn test_segments_align_to_hour_boundaries() {
        let shift = ShiftRecord::new(80.0, ts(1, 9, 30), ts(1, 13, 15)).unwrap();
        let segments = shift.segments();

        assert_eq!(segments.len(), 5);
        assert_eq!(segments[0].start, ts(1, 9, 30));
        assert_eq!(segments[0].end, ts(1, 10, 0));
        assert_eq!(segments[1].end, ts(1, 11, 0));
        assert_eq!(segments[4].start, ts(1, 13, 0));
        assert_eq!(segments[4].end, ts(1, 13, 15));

        // 3.75 h at 80 / 3.75 per hour
        let rate = 80.0 / 3.75;
        assert!((segments[0].cost - 0.5 * rate).abs() < EPS);
        assert!((segments[2].cost - rate).abs() < EPS);
        assert!((segments[4].cost - 0.25 * rate).abs() < EPS);
    }

    #[test]
    fn test_conservation_across_boundaries() {
        let shifts = [
            ShiftRecord::new(137.42, ts(1, 6, 7), ts(1, 14, 53)).unwrap(),
            ShiftRecord::new(99.99, ts(1, 22, 1), ts(2, 7, 59)).unwrap(),
            ShiftRecord::new(1234.5, ts(1, 0, 0), ts(4, 0, 0)).unwrap(),
            ShiftRecord::new(0.0, ts(1, 8, 0), ts(1, 9, 0)).unwrap(),
            ShiftRecord::new(
                88.8,
                ts_nano(1, 6, 7, 8, 123_456_789),
                ts_nano(1, 14, 53, 1, 987_654_321),
            )
            .unwrap(),
            ShiftRecord::new(
                61.25,
                ts_nano(1, 23, 59, 59, 999_999_999),
                ts_nano(2, 3, 0, 0, 1),
            )
            .unwrap(),
        ];

        for shift in &shifts {
            let total: f64 = shift.segments().iter().map(|s| s.cost).sum();
            assert!(
                (total - shift.wage).abs() < EPS,
                "segments sum {} != wage {}",
                total,
                shift.wage
            );
        }
    }

    #[test]
    fn test_sub_millisecond_boundary_split() {
        // 0.5 ms before 10:00, 1.5 ms after
        let shift = ShiftRecord::new(
            100.0,
            ts_nano(1, 9, 59, 59, 999_500_000),
            ts_nano(1, 10, 0, 0, 1_500_000),
        )
        .unwrap();
        let segments = shift.segments();

        assert_eq!(segments.len(), 2);
        assert!((segments[0].cost - 25.0).abs() < EPS);
        assert!((segments[1].cost - 75.0).abs() < EPS);
        assert!((shift.duration_hours() * 3_600_000.0 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_shift_shorter_than_a_millisecond_keeps_its_wage() {
        let shift = ShiftRecord::new(
            50.0,
            ts_nano(1, 12, 0, 0, 100_000),
            ts_nano(1, 12, 0, 0, 500_000),
        )
        .unwrap();
        let segments = shift.segments();

        assert_eq!(segments.len(), 1);
        assert!((segments[0].cost - 50.0).abs() < EPS);

        let buckets = allocate_shifts(&[shift], BucketGranularity::HourOfDay);
        assert!((cost_at(&buckets, None, 12) - 50.0).abs() < EPS);
    }

    #[test]
    fn test_fractional_seconds_across_midnight() {
        let shift = ShiftRecord::new(
            10.0,
            ts_nano(1, 23, 59, 59, 999_999_000),
            ts_nano(2, 0, 0, 0, 1_000),
        )
        .unwrap();

        let buckets = allocate_shifts(&[shift], BucketGranularity::DateHour);

        assert_eq!(buckets.len(), 2);
        assert!((cost_at(&buckets, Some(ts(1, 0, 0).date()), 23) - 5.0).abs() < EPS);
        assert!((cost_at(&buckets, Some(ts(2, 0, 0).date()), 0) - 5.0).abs() < EPS);
    }

    #[test]
    fn test_midnight_crossing() {
        let rows = vec![shift_row(
            Value::Number(75.0),
            Value::Timestamp(ts(1, 23, 30)),
            Value::Timestamp(ts(2, 0, 45)),
        )];

        let buckets = allocate_hourly_wages(
            &rows,
            "Pay",
            "Clock_In",
            "Clock_Out",
            BucketGranularity::DateHour,
        );

        // 1.25 h at 60/h: 30 min = 30, 45 min = 45
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key, HourKey { date: Some(ts(1, 0, 0).date()), hour: 23 });
        assert_eq!(buckets[1].key, HourKey { date: Some(ts(2, 0, 0).date()), hour: 0 });
        assert!((buckets[0].cost - 30.0).abs() < EPS);
        assert!((buckets[1].cost - 45.0).abs() < EPS);
    }

    #[test]
    fn test_hour_of_day_collapses_dates() {
        let rows = vec![
            shift_row(
                Value::Number(20.0),
                Value::from("2024-03-01 09:00"),
                Value::from("2024-03-01 10:00"),
            ),
            shift_row(
                Value::Number(30.0),
                Value::from("2024-03-02 09:00"),
                Value::from("2024-03-02 10:00"),
            ),
        ];

        let by_hour = allocate_hourly_wages(
            &rows,
            "Pay",
            "Clock_In",
            "Clock_Out",
            BucketGranularity::HourOfDay,
        );
        assert_eq!(by_hour.len(), 1);
        assert!((cost_at(&by_hour, None, 9) - 50.0).abs() < EPS);

        let by_date = allocate_hourly_wages(
            &rows,
            "Pay",
            "Clock_In",
            "Clock_Out",
            BucketGranularity::DateHour,
        );
        assert_eq!(by_date.len(), 2);
        assert!((cost_at(&by_date, Some(ts(2, 0, 0).date()), 9) - 30.0).abs() < EPS);
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let rows = vec![
            // end before start
            shift_row(
                Value::Number(50.0),
                Value::Timestamp(ts(1, 12, 0)),
                Value::Timestamp(ts(1, 11, 0)),
            ),
            // zero duration
            shift_row(
                Value::Number(50.0),
                Value::Timestamp(ts(1, 12, 0)),
                Value::Timestamp(ts(1, 12, 0)),
            ),
            // unparseable start
            shift_row(
                Value::Number(50.0),
                Value::from("lunch"),
                Value::Timestamp(ts(1, 13, 0)),
            ),
            // missing wage
            shift_row(
                Value::Null,
                Value::Timestamp(ts(1, 12, 0)),
                Value::Timestamp(ts(1, 13, 0)),
            ),
            // boolean wage cell
            shift_row(
                Value::Bool(true),
                Value::Timestamp(ts(1, 12, 0)),
                Value::Timestamp(ts(1, 13, 0)),
            ),
            // negative wage
            shift_row(
                Value::Number(-5.0),
                Value::Timestamp(ts(1, 12, 0)),
                Value::Timestamp(ts(1, 13, 0)),
            ),
            // the only valid one
            shift_row(
                Value::from("$42.00"),
                Value::from("03/01/2024 2:00 PM"),
                Value::from("03/01/2024 3:00 PM"),
            ),
        ];

        let buckets = allocate_hourly_wages(
            &rows,
            "Pay",
            "Clock_In",
            "Clock_Out",
            BucketGranularity::HourOfDay,
        );

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].key.hour, 14);
        assert!((buckets[0].cost - 42.0).abs() < EPS);
    }

    #[test]
    fn test_empty_input() {
        let buckets =
            allocate_hourly_wages(&[], "Pay", "Clock_In", "Clock_Out", BucketGranularity::HourOfDay);
        assert!(buckets.is_empty());
    }

    #[test]
    fn test_dataset_projection_reports_missing_column() {
        let ds = TabularDataset::from_header(&["Pay", "Clock_In"]).unwrap();

        let err = allocate_dataset_wages(
            &ds,
            "Pay",
            "Clock_In",
            "Clock_Out",
            BucketGranularity::HourOfDay,
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "Missing column: Clock_Out");
    }

    #[test]
    fn test_dataset_allocation() {
        let ds = TabularDataset::new(
            vec!["Pay".to_string(), "Clock_In".to_string(), "Clock_Out".to_string()],
            vec![shift_row(
                Value::Number(36.0),
                Value::Timestamp(ts(1, 16, 45)),
                Value::Timestamp(ts(1, 18, 15)),
            )],
        )
        .unwrap();

        let buckets = allocate_dataset_wages(
            &ds,
            "Pay",
            "Clock_In",
            "Clock_Out",
            BucketGranularity::HourOfDay,
        )
        .unwrap();

        // 1.5 h at 24/h
        assert_eq!(buckets.len(), 3);
        assert!((cost_at(&buckets, None, 16) - 6.0).abs() < EPS);
        assert!((cost_at(&buckets, None, 17) - 24.0).abs() < EPS);
        assert!((cost_at(&buckets, None, 18) - 6.0).abs() < EPS);
    }

    #[test]
    fn test_overlay_prime_cost() {
        let mut sale_a = Row::new();
        sale_a.insert("Total_Sales".to_string(), Value::Number(150.0));
        sale_a.insert("Created_At".to_string(), Value::Timestamp(ts(1, 9, 5)));
        let mut sale_b = Row::new();
        sale_b.insert("Total_Sales".to_string(), Value::Number(50.0));
        sale_b.insert("Created_At".to_string(), Value::Timestamp(ts(1, 9, 55)));
        let mut refund = Row::new();
        refund.insert("Total_Sales".to_string(), Value::Null);
        refund.insert("Created_At".to_string(), Value::Timestamp(ts(1, 11, 0)));

        let sales = aggregate_hourly_sales(
            &[sale_a, sale_b, refund],
            "Total_Sales",
            "Created_At",
            BucketGranularity::HourOfDay,
        );
        assert_eq!(sales.len(), 1);

        let labor = allocate_shifts(
            &[ShiftRecord::new(240.0, ts(1, 9, 0), ts(1, 11, 0)).unwrap()],
            BucketGranularity::HourOfDay,
        );

        let overlay = overlay_labor_and_sales(&labor, &sales);
        assert_eq!(overlay.len(), 2);

        // hour 9: 120 labor / 200 sales
        assert!((overlay[0].prime_cost_pct - 60.0).abs() < EPS);
        assert!(overlay[0].exceeds_target(DEFAULT_TARGET_PRIME_COST_PCT));

        // hour 10: labor only, no sales → 0 %
        assert_eq!(overlay[1].key.hour, 10);
        assert_eq!(overlay[1].sales, 0.0);
        assert_eq!(overlay[1].prime_cost_pct, 0.0);
        assert!(!overlay[1].exceeds_target(DEFAULT_TARGET_PRIME_COST_PCT));
    }
}
