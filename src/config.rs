use crate::bands::{BandSchedule, Scope, ThresholdBand};
use crate::error::TaxmapError;
use crate::uprate::GrowthTable;

/// How per-constituency revenue is derived from the matched records.
#[derive(Debug, Clone)]
pub enum RevenueMode {
    /// count * fee, the flat annual charge per affected property.
    FlatFee(u64),
    /// Sum of each record's assigned band charge.
    Banded,
}

/// Uprates sale prices from the year the sales file covers to the policy's
/// valuation year before thresholds/bands are applied.
#[derive(Debug, Clone)]
pub struct Uprating {
    pub table: GrowthTable,
    pub base_year: i32,
    pub valuation_year: i32,
}

/// Everything that varies between policy scenarios, made explicit so a
/// single pipeline serves every variant.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub scope: Scope,
    pub revenue: RevenueMode,
    pub uprating: Option<Uprating>,
    /// External authoritative top-line estimate (whole pounds) to allocate
    /// across constituencies proportionally to derived revenue.
    pub external_estimate: Option<u64>,
}

impl PolicyConfig {
    /// Fails fast, before any records are processed. Band schedules are
    /// validated at construction; this checks the cross-field rules.
    pub fn validate(&self) -> Result<(), TaxmapError> {
        if matches!(self.revenue, RevenueMode::Banded) && !matches!(self.scope, Scope::Bands(_)) {
            return Err(TaxmapError::InvalidBandConfiguration(
                "banded revenue mode requires a band schedule scope".to_owned(),
            ));
        }
        if let Some(uprating) = &self.uprating {
            uprating
                .table
                .validate(uprating.base_year, uprating.valuation_year)?;
        }
        Ok(())
    }

    /// Mansion-tax variant: flat £2,000 annual charge on sales at or above
    /// `threshold`, no uprating, household-impact percentages downstream.
    pub fn mansion_tax_2024(threshold: u64) -> Self {
        Self {
            scope: Scope::Threshold(threshold),
            revenue: RevenueMode::FlatFee(2_000),
            uprating: None,
            external_estimate: None,
        }
    }

    /// Autumn Budget 2025 high value council tax surcharge: 2024 sales
    /// uprated to 2026 prices with the OBR HPI forecast, banded charges,
    /// OBR's £0.4bn 2029-30 estimate allocated by revenue share.
    pub fn autumn_budget_2025() -> Result<Self, TaxmapError> {
        let bands = BandSchedule::new(vec![
            ThresholdBand::new(2_000_000, Some(2_500_000), 2_500),
            ThresholdBand::new(2_500_000, Some(3_000_000), 3_500),
            ThresholdBand::new(3_000_000, Some(5_000_000), 5_000),
            ThresholdBand::new(5_000_000, None, 7_500),
        ])?;
        // OBR November 2025 EFO house price growth, % on previous year.
        let hpi = GrowthTable::new([
            (2025, 2.9),
            (2026, 2.5),
            (2027, 2.5),
            (2028, 2.4),
            (2029, 2.4),
            (2030, 2.4),
        ]);
        let config = Self {
            scope: Scope::Bands(bands),
            revenue: RevenueMode::Banded,
            uprating: Some(Uprating {
                table: hpi,
                base_year: 2024,
                valuation_year: 2026,
            }),
            external_estimate: Some(400_000_000),
        };
        config.validate()?;
        Ok(config)
    }
}
