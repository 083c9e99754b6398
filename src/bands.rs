use crate::error::TaxmapError;

/// One surcharge band: a half-open price interval [lower, upper) in whole
/// pounds with a fixed annual charge. `upper == None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdBand {
    pub lower: u64,
    pub upper: Option<u64>,
    pub charge: u64,
}

impl ThresholdBand {
    pub const fn new(lower: u64, upper: Option<u64>, charge: u64) -> Self {
        Self { lower, upper, charge }
    }

    /// Half-open containment: a price exactly on `lower` belongs to this
    /// band, a price exactly on `upper` belongs to the next.
    pub fn contains(&self, price: f64) -> bool {
        price >= self.lower as f64 && self.upper.map_or(true, |u| price < u as f64)
    }
}

/// An ordered, contiguous set of bands covering [lowest lower bound, inf).
/// Validated at construction so the per-record lookup can assume the
/// invariants hold.
#[derive(Debug, Clone)]
pub struct BandSchedule {
    bands: Vec<ThresholdBand>,
}

impl BandSchedule {
    pub fn new(bands: Vec<ThresholdBand>) -> Result<Self, TaxmapError> {
        if bands.is_empty() {
            return Err(TaxmapError::InvalidBandConfiguration(
                "band schedule is empty".to_owned(),
            ));
        }
        for (i, band) in bands.iter().enumerate() {
            let last = i == bands.len() - 1;
            match band.upper {
                Some(upper) if upper <= band.lower => {
                    return Err(TaxmapError::InvalidBandConfiguration(format!(
                        "band {i} upper bound {upper} <= lower bound {}",
                        band.lower
                    )));
                }
                Some(upper) if last => {
                    return Err(TaxmapError::InvalidBandConfiguration(format!(
                        "last band must be unbounded, found upper bound {upper}"
                    )));
                }
                None if !last => {
                    return Err(TaxmapError::InvalidBandConfiguration(format!(
                        "band {i} is unbounded but is not the last band"
                    )));
                }
                _ => {}
            }
            if i > 0 {
                let prev_upper = bands[i - 1].upper;
                if prev_upper != Some(band.lower) {
                    return Err(TaxmapError::InvalidBandConfiguration(format!(
                        "band {i} lower bound {} does not continue previous band",
                        band.lower
                    )));
                }
            }
        }
        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[ThresholdBand] {
        &self.bands
    }

    /// Lowest in-scope price; anything below is out of scope (charge 0).
    pub fn floor(&self) -> u64 {
        self.bands[0].lower
    }

    /// The charge of the unique band containing `price`, or None when the
    /// price is below the schedule floor.
    pub fn charge_for(&self, price: f64) -> Option<u64> {
        self.bands
            .iter()
            .find(|band| band.contains(price))
            .map(|band| band.charge)
    }

    /// Index of the band containing `price`, for band-breakdown reporting.
    pub fn band_index(&self, price: f64) -> Option<usize> {
        self.bands.iter().position(|band| band.contains(price))
    }
}

/// Scope condition applied by the record filter: either a single cutoff or
/// a validated band schedule.
#[derive(Debug, Clone)]
pub enum Scope {
    Threshold(u64),
    Bands(BandSchedule),
}

impl Scope {
    /// Half-open in both modes: a price exactly on the cutoff or on the
    /// lowest band's lower bound is in scope.
    pub fn in_scope(&self, price: f64) -> bool {
        match self {
            Scope::Threshold(threshold) => price >= *threshold as f64,
            Scope::Bands(schedule) => price >= schedule.floor() as f64,
        }
    }

    /// The per-record charge in banded mode; None in threshold mode (the
    /// flat fee is applied per group by the aggregator).
    pub fn charge(&self, price: f64) -> Option<u64> {
        match self {
            Scope::Threshold(_) => None,
            Scope::Bands(schedule) => schedule.charge_for(price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> BandSchedule {
        BandSchedule::new(vec![
            ThresholdBand::new(2_000_000, Some(2_500_000), 2_500),
            ThresholdBand::new(2_500_000, Some(3_000_000), 3_500),
            ThresholdBand::new(3_000_000, Some(5_000_000), 5_000),
            ThresholdBand::new(5_000_000, None, 7_500),
        ])
        .unwrap()
    }

    #[test]
    fn boundary_price_belongs_to_upper_band() {
        let s = schedule();
        assert_eq!(s.charge_for(2_500_000.0), Some(3_500));
        assert_eq!(s.charge_for(2_499_999.0), Some(2_500));
        assert_eq!(s.charge_for(2_000_000.0), Some(2_500));
        assert_eq!(s.charge_for(5_000_000.0), Some(7_500));
    }

    #[test]
    fn below_floor_is_out_of_scope() {
        let s = schedule();
        assert_eq!(s.charge_for(1_999_999.99), None);
        assert_eq!(s.band_index(1_000_000.0), None);
    }

    #[test]
    fn top_band_is_open_ended() {
        assert_eq!(schedule().charge_for(50_000_000.0), Some(7_500));
    }

    #[test]
    fn rejects_gap_between_bands() {
        let err = BandSchedule::new(vec![
            ThresholdBand::new(2_000_000, Some(2_500_000), 2_500),
            ThresholdBand::new(3_000_000, None, 7_500),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("does not continue"));
    }

    #[test]
    fn rejects_inverted_band() {
        assert!(BandSchedule::new(vec![
            ThresholdBand::new(2_500_000, Some(2_000_000), 2_500),
            ThresholdBand::new(2_000_000, None, 7_500),
        ])
        .is_err());
    }

    #[test]
    fn rejects_bounded_last_band() {
        assert!(BandSchedule::new(vec![ThresholdBand::new(
            2_000_000,
            Some(5_000_000),
            2_500
        )])
        .is_err());
    }

    #[test]
    fn rejects_interior_unbounded_band() {
        assert!(BandSchedule::new(vec![
            ThresholdBand::new(2_000_000, None, 2_500),
            ThresholdBand::new(5_000_000, None, 7_500),
        ])
        .is_err());
    }

    #[test]
    fn threshold_scope_is_half_open_too() {
        let scope = Scope::Threshold(1_500_000);
        assert!(scope.in_scope(1_500_000.0));
        assert!(!scope.in_scope(1_499_999.0));
    }
}
