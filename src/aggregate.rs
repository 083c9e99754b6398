use std::collections::HashMap;

use itertools::Itertools;

use crate::bands::BandSchedule;
use crate::config::{PolicyConfig, RevenueMode};
use crate::join::JoinedSale;
use crate::refdata::HouseholdTable;

/// Per-constituency result, computed once per run and never mutated.
/// All monetary fields stay unrounded here; rounding happens only when the
/// output tables are written.
#[derive(Debug, Clone)]
pub struct ConstituencyStats {
    pub constituency_code: String,
    pub constituency_name: String,
    pub sales_count: u64,
    pub mean_price: f64,
    pub median_price: f64,
    pub total_value: f64,
    /// Flat-fee mode: count * fee. Banded mode: sum of assigned charges.
    pub derived_revenue: f64,
    /// This group's fraction of total derived revenue; None when the total
    /// is zero (undefined, not zero).
    pub share_of_total: Option<f64>,
    /// share_of_total * external estimate, when one is configured.
    pub allocated_estimate: Option<f64>,
    pub total_households: Option<u64>,
    /// 100 * count / households; None when the constituency is absent from
    /// the household table or has zero households.
    pub pct_households_affected: Option<f64>,
}

/// One row of the band breakdown report: how many matched sales fall in
/// each band, with the matched count as denominator.
#[derive(Debug, Clone)]
pub struct BandCount {
    pub lower: u64,
    pub upper: Option<u64>,
    pub charge: u64,
    pub count: u64,
    pub share_of_matched: Option<f64>,
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Groups matched sales by constituency and derives the per-group stats.
/// Groups are materialized in first-appearance order and sorted stably by
/// count descending, so ties keep input order and reruns are identical.
pub fn aggregate(
    matched: &[JoinedSale],
    config: &PolicyConfig,
    households: Option<&HouseholdTable>,
) -> Vec<ConstituencyStats> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&JoinedSale>> = HashMap::new();
    for sale in matched {
        let name = sale.constituency_name.as_str();
        if let Some(group) = groups.get_mut(name) {
            group.push(sale);
        } else {
            order.push(name);
            groups.insert(name, vec![sale]);
        }
    }

    let mut stats: Vec<ConstituencyStats> = Vec::with_capacity(order.len());
    for name in order {
        let group = &groups[name];
        let prices: Vec<f64> = group
            .iter()
            .map(|s| s.sale.adjusted_price)
            .sorted_by(f64::total_cmp)
            .collect();
        let count = group.len() as u64;
        let total_value: f64 = prices.iter().sum();

        let derived_revenue = match config.revenue {
            RevenueMode::FlatFee(fee) => (count * fee) as f64,
            RevenueMode::Banded => group.iter().map(|s| s.sale.charge as f64).sum(),
        };

        let total_households = households.and_then(|h| h.get(&group[0].constituency_code).copied());
        let pct_households_affected = match total_households {
            Some(total) if total > 0 => Some(100.0 * count as f64 / total as f64),
            _ => None,
        };

        stats.push(ConstituencyStats {
            constituency_code: group[0].constituency_code.clone(),
            constituency_name: name.to_owned(),
            sales_count: count,
            mean_price: total_value / count as f64,
            median_price: median(&prices),
            total_value,
            derived_revenue,
            share_of_total: None,
            allocated_estimate: None,
            total_households,
            pct_households_affected,
        });
    }

    // Share-and-allocate: distribute the external top-line estimate by each
    // group's share of the internally derived total, conserving the total.
    if let Some(estimate) = config.external_estimate {
        let total_revenue: f64 = stats.iter().map(|s| s.derived_revenue).sum();
        if total_revenue > 0.0 {
            for s in &mut stats {
                let share = s.derived_revenue / total_revenue;
                s.share_of_total = Some(share);
                s.allocated_estimate = Some(share * estimate as f64);
            }
        }
    }

    stats.sort_by(|a, b| b.sales_count.cmp(&a.sales_count));
    stats
}

/// Counts matched sales per band. Denominator for the shares is the matched
/// record count.
pub fn band_breakdown(matched: &[JoinedSale], schedule: &BandSchedule) -> Vec<BandCount> {
    let mut counts = vec![0u64; schedule.bands().len()];
    for sale in matched {
        if let Some(i) = schedule.band_index(sale.sale.adjusted_price) {
            counts[i] += 1;
        }
    }
    let total = matched.len() as u64;
    schedule
        .bands()
        .iter()
        .zip(counts)
        .map(|(band, count)| BandCount {
            lower: band.lower,
            upper: band.upper,
            charge: band.charge,
            count,
            share_of_matched: (total > 0).then(|| count as f64 / total as f64),
        })
        .collect()
}
