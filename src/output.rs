use std::path::Path;

use csv::Writer;
use serde::Serialize;

use crate::aggregate::ConstituencyStats;
use crate::error::TaxmapError;

/// Whole pounds, applied only at this boundary. Everything upstream stays
/// unrounded so rounding error never compounds across stages.
fn round_pounds(value: f64) -> u64 {
    value.round().max(0.0) as u64
}

fn round_dp(value: f64, dp: i32) -> f64 {
    let scale = 10f64.powi(dp);
    (value * scale).round() / scale
}

/// Primary table for flat-fee threshold runs, one row per matched
/// constituency, sorted by sales count descending.
#[derive(Debug, Serialize)]
pub struct ConstituencyImpactRow {
    pub constituency_name: String,
    pub num_sales: u64,
    pub mean_price: u64,
    pub median_price: u64,
    pub total_value: u64,
    pub estimated_annual_revenue: u64,
    pub total_households: Option<u64>,
    pub pct_households_affected: Option<f64>,
}

/// Secondary table for flat-fee runs: name + percentage only, sorted by
/// percentage descending with undefined rows last.
#[derive(Debug, Serialize)]
pub struct HouseholdImpactRow {
    pub constituency_name: String,
    pub pct_households_affected: Option<f64>,
    pub avg_loss_per_household: u64,
}

/// Primary table for banded surcharge runs.
#[derive(Debug, Serialize)]
pub struct SurchargeImpactRow {
    pub constituency_name: String,
    pub properties: u64,
    pub mean_price: u64,
    pub median_price: u64,
    pub total_value: u64,
    pub implied_surcharge: u64,
    pub share_pct: Option<f64>,
    pub allocated_revenue: Option<u64>,
}

/// Secondary table for banded runs, the display subset.
#[derive(Debug, Serialize)]
pub struct SurchargeSummaryRow {
    pub constituency_name: String,
    pub properties: u64,
    pub median_price: u64,
    pub implied_from_sales: u64,
    pub allocated_from_obr: Option<u64>,
    pub share_pct: Option<f64>,
}

pub fn constituency_impact_rows(stats: &[ConstituencyStats]) -> Vec<ConstituencyImpactRow> {
    stats
        .iter()
        .map(|s| ConstituencyImpactRow {
            constituency_name: s.constituency_name.clone(),
            num_sales: s.sales_count,
            mean_price: round_pounds(s.mean_price),
            median_price: round_pounds(s.median_price),
            total_value: round_pounds(s.total_value),
            estimated_annual_revenue: round_pounds(s.derived_revenue),
            total_households: s.total_households,
            pct_households_affected: s.pct_households_affected.map(|p| round_dp(p, 3)),
        })
        .collect()
}

pub fn household_impact_rows(
    stats: &[ConstituencyStats],
    fee_per_property: u64,
) -> Vec<HouseholdImpactRow> {
    let mut rows: Vec<HouseholdImpactRow> = stats
        .iter()
        .map(|s| HouseholdImpactRow {
            constituency_name: s.constituency_name.clone(),
            pct_households_affected: s.pct_households_affected.map(|p| round_dp(p, 3)),
            avg_loss_per_household: fee_per_property,
        })
        .collect();
    // Undefined percentages sort below every defined one; sort is stable so
    // equal percentages keep the primary table's order.
    rows.sort_by(|a, b| {
        let ka = a.pct_households_affected.unwrap_or(f64::NEG_INFINITY);
        let kb = b.pct_households_affected.unwrap_or(f64::NEG_INFINITY);
        kb.total_cmp(&ka)
    });
    rows
}

pub fn surcharge_impact_rows(stats: &[ConstituencyStats]) -> Vec<SurchargeImpactRow> {
    stats
        .iter()
        .map(|s| SurchargeImpactRow {
            constituency_name: s.constituency_name.clone(),
            properties: s.sales_count,
            mean_price: round_pounds(s.mean_price),
            median_price: round_pounds(s.median_price),
            total_value: round_pounds(s.total_value),
            implied_surcharge: round_pounds(s.derived_revenue),
            share_pct: s.share_of_total.map(|x| round_dp(x * 100.0, 2)),
            allocated_revenue: s.allocated_estimate.map(round_pounds),
        })
        .collect()
}

pub fn surcharge_summary_rows(stats: &[ConstituencyStats]) -> Vec<SurchargeSummaryRow> {
    stats
        .iter()
        .map(|s| SurchargeSummaryRow {
            constituency_name: s.constituency_name.clone(),
            properties: s.sales_count,
            median_price: round_pounds(s.median_price),
            implied_from_sales: round_pounds(s.derived_revenue),
            allocated_from_obr: s.allocated_estimate.map(round_pounds),
            share_pct: s.share_of_total.map(|x| round_dp(x * 100.0, 2)),
        })
        .collect()
}

/// Serializes one output table. Callers only reach this after the whole
/// computation has succeeded, so a failed run leaves no partial files.
pub fn write_table<P: AsRef<Path>, R: Serialize>(path: P, rows: &[R]) -> Result<(), TaxmapError> {
    let path = path.as_ref();
    let mut writer = Writer::from_path(path)
        .map_err(|e| TaxmapError::csv(path.display().to_string(), e))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| TaxmapError::csv(path.display().to_string(), e))?;
    }
    writer
        .flush()
        .map_err(|e| TaxmapError::csv(path.display().to_string(), csv::Error::from(e)))?;
    Ok(())
}
