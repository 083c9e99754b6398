use std::collections::HashMap;

use crate::error::TaxmapError;

/// Per-year price growth rates (percentage change on the previous year),
/// used to uprate sale prices from the sale year to the policy's valuation
/// year. The base year itself contributes no growth.
#[derive(Debug, Clone, Default)]
pub struct GrowthTable {
    rates: HashMap<i32, f64>,
}

impl GrowthTable {
    pub fn new(rates: impl IntoIterator<Item = (i32, f64)>) -> Self {
        Self {
            rates: rates.into_iter().collect(),
        }
    }

    /// Checks the table covers every year strictly after `base_year` through
    /// `target_year`, so `factor` never falls over a missing key mid-run.
    pub fn validate(&self, base_year: i32, target_year: i32) -> Result<(), TaxmapError> {
        for year in (base_year + 1)..=target_year {
            if !self.rates.contains_key(&year) {
                return Err(TaxmapError::InvalidGrowthTable(format!(
                    "no growth rate for {year} (uprating {base_year} -> {target_year})"
                )));
            }
        }
        Ok(())
    }

    /// Cumulative uprating factor from `base_year` to `target_year`:
    /// the exact product of (1 + rate/100) over the years strictly after the
    /// base year. factor(y, y) is exactly 1.0 (empty product).
    pub fn factor(&self, base_year: i32, target_year: i32) -> f64 {
        let mut factor = 1.0;
        for year in (base_year + 1)..=target_year {
            if let Some(rate) = self.rates.get(&year) {
                factor *= 1.0 + rate / 100.0;
            }
        }
        factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obr_hpi() -> GrowthTable {
        GrowthTable::new([
            (2024, 0.0),
            (2025, 2.9),
            (2026, 2.5),
            (2027, 2.5),
            (2028, 2.4),
        ])
    }

    #[test]
    fn same_year_factor_is_exactly_one() {
        assert_eq!(obr_hpi().factor(2024, 2024), 1.0);
        assert_eq!(GrowthTable::default().factor(2030, 2030), 1.0);
    }

    #[test]
    fn factor_is_exact_product_excluding_base_year() {
        // Rates chosen to be exactly representable so the product has a
        // single correct answer: 1.5 * 1.25 = 1.875.
        let table = GrowthTable::new([(2025, 50.0), (2026, 25.0)]);
        assert_eq!(table.factor(2024, 2026), 1.875);
        // The base year's own rate never enters the product.
        let with_base = GrowthTable::new([(2024, 99.0), (2025, 50.0), (2026, 25.0)]);
        assert_eq!(with_base.factor(2024, 2026), 1.875);
    }

    #[test]
    fn obr_forecast_compounds_year_on_year() {
        let factor = obr_hpi().factor(2024, 2026);
        assert!(factor > 1.054 && factor < 1.056);
    }

    #[test]
    fn validate_rejects_gaps() {
        let table = GrowthTable::new([(2025, 2.9), (2027, 2.5)]);
        assert!(table.validate(2024, 2027).is_err());
        assert!(table.validate(2024, 2025).is_ok());
    }
}
