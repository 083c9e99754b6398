use tracing::info;

use crate::aggregate::{self, BandCount, ConstituencyStats};
use crate::bands::Scope;
use crate::config::PolicyConfig;
use crate::error::TaxmapError;
use crate::filter;
use crate::join;
use crate::refdata::{ConstituencyDirectory, HouseholdTable, PostcodeIndex};
use crate::sales::SaleRecord;

/// Counts carried alongside the result tables so every run reports its own
/// data quality. Denominators: `in_scope_share` is over all loaded records,
/// `match_rate` over the in-scope records.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total_records: usize,
    pub in_scope: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub in_scope_share: Option<f64>,
    pub match_rate: Option<f64>,
}

/// Everything one pipeline run produces. Computed wholly in memory; callers
/// write the output tables only after this exists, so fatal errors leave no
/// partial files.
#[derive(Debug)]
pub struct RunOutput {
    pub stats: Vec<ConstituencyStats>,
    pub band_breakdown: Option<Vec<BandCount>>,
    pub summary: RunSummary,
}

/// The whole analysis as a pure function of (reference tables, sale records,
/// policy config). Re-running with identical inputs yields identical output.
pub fn run(
    sales: Vec<SaleRecord>,
    index: &PostcodeIndex,
    directory: &ConstituencyDirectory,
    households: Option<&HouseholdTable>,
    config: &PolicyConfig,
) -> Result<RunOutput, TaxmapError> {
    config.validate()?;

    let filtered = filter::filter_sales(sales, config);
    let in_scope = filtered.in_scope.len();
    let in_scope_share = filtered.in_scope_share();
    let total_records = filtered.total_records;

    let joined = join::join_sales(filtered.in_scope, index, directory);
    let summary = RunSummary {
        total_records,
        in_scope,
        matched: joined.matched.len(),
        unmatched: joined.unmatched,
        in_scope_share,
        match_rate: joined.match_rate(),
    };

    let band_breakdown = match &config.scope {
        Scope::Bands(schedule) => Some(aggregate::band_breakdown(&joined.matched, schedule)),
        Scope::Threshold(_) => None,
    };

    let stats = aggregate::aggregate(&joined.matched, config, households);
    info!(
        constituencies = stats.len(),
        matched = summary.matched,
        "pipeline run complete"
    );

    Ok(RunOutput {
        stats,
        band_breakdown,
        summary,
    })
}
