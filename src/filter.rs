use tracing::info;

use crate::config::PolicyConfig;
use crate::sales::SaleRecord;

/// A sale that survived the scope filter, carrying the price actually used
/// downstream (uprated when the policy values properties in a later year)
/// and, in banded mode, the annual charge of its assigned band.
#[derive(Debug, Clone)]
pub struct ScopedSale {
    pub record: SaleRecord,
    pub adjusted_price: f64,
    pub charge: u64,
}

/// Filter output plus the totals the run summary reports percentages over.
#[derive(Debug)]
pub struct FilterOutcome {
    pub in_scope: Vec<ScopedSale>,
    pub total_records: usize,
}

impl FilterOutcome {
    /// Share of all loaded sales that are in scope, over the total loaded
    /// record count.
    pub fn in_scope_share(&self) -> Option<f64> {
        if self.total_records == 0 {
            None
        } else {
            Some(self.in_scope.len() as f64 / self.total_records as f64)
        }
    }
}

/// Applies optional uprating then the scope condition. Records below scope
/// are excluded from the in-scope set but counted in `total_records`.
pub fn filter_sales(sales: Vec<SaleRecord>, config: &PolicyConfig) -> FilterOutcome {
    let factor = config
        .uprating
        .as_ref()
        .map(|u| u.table.factor(u.base_year, u.valuation_year))
        .unwrap_or(1.0);

    let total_records = sales.len();
    let in_scope: Vec<ScopedSale> = sales
        .into_iter()
        .filter_map(|record| {
            let adjusted_price = record.price as f64 * factor;
            if !config.scope.in_scope(adjusted_price) {
                return None;
            }
            let charge = config.scope.charge(adjusted_price).unwrap_or(0);
            Some(ScopedSale {
                record,
                adjusted_price,
                charge,
            })
        })
        .collect();

    info!(
        total = total_records,
        in_scope = in_scope.len(),
        factor,
        "filtered sale records"
    );

    FilterOutcome {
        in_scope,
        total_records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PolicyConfig, RevenueMode, Uprating};
    use crate::uprate::GrowthTable;

    fn sale(price: u64) -> SaleRecord {
        SaleRecord {
            transaction_id: format!("{{{price}}}"),
            price,
            date: "2024-06-01 00:00".to_owned(),
            postcode: "SW1A 1AA".to_owned(),
            property_type: "D".to_owned(),
            old_new: "N".to_owned(),
            duration: "F".to_owned(),
            paon: "1".to_owned(),
            saon: String::new(),
            street: String::new(),
            locality: String::new(),
            town: "LONDON".to_owned(),
            district: String::new(),
            county: String::new(),
            ppd_category: "A".to_owned(),
            record_status: "A".to_owned(),
        }
    }

    #[test]
    fn threshold_keeps_at_or_above_cutoff() {
        let config = PolicyConfig::mansion_tax_2024(1_500_000);
        let outcome = filter_sales(
            vec![sale(1_499_999), sale(1_500_000), sale(2_000_000)],
            &config,
        );
        assert_eq!(outcome.in_scope.len(), 2);
        assert_eq!(outcome.total_records, 3);
        assert_eq!(outcome.in_scope_share(), Some(2.0 / 3.0));
    }

    #[test]
    fn uprating_pulls_sub_threshold_sales_into_scope() {
        // 10% growth in 2025 lifts a 1,900,000 sale over a 2,000,000 floor.
        let config = PolicyConfig {
            scope: crate::bands::Scope::Threshold(2_000_000),
            revenue: RevenueMode::FlatFee(2_000),
            uprating: Some(Uprating {
                table: GrowthTable::new([(2025, 10.0)]),
                base_year: 2024,
                valuation_year: 2025,
            }),
            external_estimate: None,
        };
        let outcome = filter_sales(vec![sale(1_900_000), sale(1_500_000)], &config);
        assert_eq!(outcome.in_scope.len(), 1);
        assert_eq!(
            outcome.in_scope[0].adjusted_price,
            1_900_000.0 * (1.0 + 10.0 / 100.0)
        );
    }

    #[test]
    fn banded_mode_assigns_charges() {
        let config = PolicyConfig::autumn_budget_2025().unwrap();
        let factor = 1.029 * 1.025;
        // Pick a raw price whose uprated value lands in the £2.5m-£3m band.
        let raw = (2_600_000.0 / factor) as u64 + 1;
        let outcome = filter_sales(vec![sale(raw), sale(100_000)], &config);
        assert_eq!(outcome.in_scope.len(), 1);
        assert_eq!(outcome.in_scope[0].charge, 3_500);
    }
}
