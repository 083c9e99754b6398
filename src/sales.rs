use std::path::Path;

use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::warn;

use crate::error::TaxmapError;

/// One Land Registry price-paid transaction. The source file has no header
/// row; the 16 columns are fixed and deserialized positionally. Prices are
/// whole pounds. Postcodes arrive with inconsistent casing and spacing and
/// are only normalized at the join.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleRecord {
    pub transaction_id: String,
    pub price: u64,
    pub date: String,
    pub postcode: String,
    pub property_type: String,
    pub old_new: String,
    pub duration: String,
    pub paon: String,
    pub saon: String,
    pub street: String,
    pub locality: String,
    pub town: String,
    pub district: String,
    pub county: String,
    pub ppd_category: String,
    pub record_status: String,
}

/// Loads the headerless price-paid CSV. Rows that fail to parse are skipped
/// and counted; the file being absent is fatal.
pub fn load_sales<P: AsRef<Path>>(path: P) -> Result<Vec<SaleRecord>, TaxmapError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(TaxmapError::missing(
            "sale records",
            format!("expected file {}", path.display()),
        ));
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| TaxmapError::csv(path.display().to_string(), e))?;

    let mut sales = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.deserialize::<SaleRecord>() {
        match result {
            Ok(record) => sales.push(record),
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, "skipped unparseable sale rows");
    }
    Ok(sales)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ROW: &str = "{T1},2000000,2024-03-01 00:00,SW1A 1AA,D,N,F,1,,THE MALL,,LONDON,WESTMINSTER,GREATER LONDON,A,A\n";

    #[test]
    fn loads_headerless_rows() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(ROW.as_bytes()).unwrap();
        let sales = load_sales(f.path()).unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].price, 2_000_000);
        assert_eq!(sales[0].postcode, "SW1A 1AA");
    }

    #[test]
    fn bad_rows_are_skipped_not_fatal() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(ROW.as_bytes()).unwrap();
        f.write_all(b"{T2},not-a-price,2024-03-01 00:00,M1 1AE,D,N,F,1,,,,M,M,GM,A,A\n")
            .unwrap();
        let sales = load_sales(f.path()).unwrap();
        assert_eq!(sales.len(), 1);
    }

    #[test]
    fn missing_file_is_fatal() {
        assert!(load_sales("/nonexistent/pp.csv").is_err());
    }
}
