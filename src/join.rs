use std::collections::HashMap;

use itertools::Itertools;
use tracing::{debug, info};

use crate::filter::ScopedSale;
use crate::postcode;
use crate::refdata::{ConstituencyDirectory, PostcodeIndex};

/// An in-scope sale attached to its constituency. Exactly one per matched
/// input record; the join is many sales to one constituency.
#[derive(Debug, Clone)]
pub struct JoinedSale {
    pub sale: ScopedSale,
    pub constituency_code: String,
    pub constituency_name: String,
}

/// Join output with the unmatched count kept observable so data-quality
/// regressions in the reference tables show up in the match rate.
#[derive(Debug)]
pub struct JoinOutcome {
    pub matched: Vec<JoinedSale>,
    pub unmatched: usize,
}

impl JoinOutcome {
    /// Matched share of the filtered in-scope records.
    pub fn match_rate(&self) -> Option<f64> {
        let total = self.matched.len() + self.unmatched;
        if total == 0 {
            None
        } else {
            Some(self.matched.len() as f64 / total as f64)
        }
    }
}

/// Left join from sales to constituency code then name, via the normalized
/// postcode. A sale whose postcode misses the index, or whose code misses
/// the directory, is counted unmatched and excluded from aggregation.
pub fn join_sales(
    sales: Vec<ScopedSale>,
    index: &PostcodeIndex,
    directory: &ConstituencyDirectory,
) -> JoinOutcome {
    let mut matched = Vec::with_capacity(sales.len());
    let mut unmatched = 0usize;
    let mut unmatched_areas: HashMap<String, usize> = HashMap::new();

    for sale in sales {
        let key = postcode::normalize(&sale.record.postcode);
        let joined = index.get(&key).and_then(|code| {
            directory
                .get(code)
                .map(|name| (code.clone(), name.clone()))
        });
        match joined {
            Some((constituency_code, constituency_name)) => matched.push(JoinedSale {
                sale,
                constituency_code,
                constituency_name,
            }),
            None => {
                unmatched += 1;
                if let Some(area) = postcode::area_prefix(&sale.record.postcode) {
                    *unmatched_areas.entry(area).or_insert(0) += 1;
                }
            }
        }
    }

    // Which postcode areas the misses cluster in, for chasing stale lookups.
    for (area, count) in unmatched_areas
        .iter()
        .sorted_by_key(|(_, count)| std::cmp::Reverse(**count))
        .take(5)
    {
        debug!(area = %area, count = *count, "unmatched postcode area");
    }

    let outcome = JoinOutcome { matched, unmatched };
    info!(
        matched = outcome.matched.len(),
        unmatched = outcome.unmatched,
        match_rate = outcome.match_rate().unwrap_or(0.0),
        "joined sales to constituencies"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sales::SaleRecord;
    use std::collections::HashMap;

    fn scoped(postcode: &str, price: u64) -> ScopedSale {
        ScopedSale {
            record: SaleRecord {
                transaction_id: format!("{{{price}}}"),
                price,
                date: "2024-06-01 00:00".to_owned(),
                postcode: postcode.to_owned(),
                property_type: "D".to_owned(),
                old_new: "N".to_owned(),
                duration: "F".to_owned(),
                paon: "1".to_owned(),
                saon: String::new(),
                street: String::new(),
                locality: String::new(),
                town: String::new(),
                district: String::new(),
                county: String::new(),
                ppd_category: "A".to_owned(),
                record_status: "A".to_owned(),
            },
            adjusted_price: price as f64,
            charge: 0,
        }
    }

    fn refs() -> (PostcodeIndex, ConstituencyDirectory) {
        let index: PostcodeIndex =
            HashMap::from([("SW1A1AA".to_owned(), "C1".to_owned())]);
        let directory: ConstituencyDirectory = HashMap::from([(
            "C1".to_owned(),
            "Cities of London and Westminster".to_owned(),
        )]);
        (index, directory)
    }

    #[test]
    fn raw_postcode_variants_all_match() {
        let (index, directory) = refs();
        let outcome = join_sales(
            vec![
                scoped("SW1A 1AA", 2_000_000),
                scoped("sw1a1aa", 2_100_000),
                scoped(" SW1A  1AA ", 2_200_000),
            ],
            &index,
            &directory,
        );
        assert_eq!(outcome.matched.len(), 3);
        assert_eq!(outcome.unmatched, 0);
        assert!(outcome
            .matched
            .iter()
            .all(|j| j.constituency_name == "Cities of London and Westminster"));
    }

    #[test]
    fn unknown_postcode_is_counted_not_dropped_silently() {
        let (index, directory) = refs();
        let outcome = join_sales(
            vec![scoped("ZZ9 9ZZ", 2_000_000), scoped("SW1A 1AA", 2_000_000)],
            &index,
            &directory,
        );
        assert_eq!(outcome.matched.len(), 1);
        assert_eq!(outcome.unmatched, 1);
        assert_eq!(outcome.match_rate(), Some(0.5));
    }

    #[test]
    fn code_missing_from_directory_is_unmatched() {
        let index: PostcodeIndex =
            HashMap::from([("M11AE".to_owned(), "C9".to_owned())]);
        let directory: ConstituencyDirectory = HashMap::new();
        let outcome = join_sales(vec![scoped("M1 1AE", 2_000_000)], &index, &directory);
        assert_eq!(outcome.matched.len(), 0);
        assert_eq!(outcome.unmatched, 1);
    }

    #[test]
    fn empty_input_has_undefined_match_rate() {
        let (index, directory) = refs();
        let outcome = join_sales(Vec::new(), &index, &directory);
        assert_eq!(outcome.match_rate(), None);
    }
}
