use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::TaxmapError;
use crate::postcode;

/// Category marker used by the census household table for rows that do not
/// describe a real household composition. Excluded before summation.
pub const HOUSEHOLD_NOT_APPLICABLE: &str = "Does not apply";

/// Normalized postcode -> constituency identifier.
pub type PostcodeIndex = HashMap<String, String>;

/// Constituency identifier -> display name.
pub type ConstituencyDirectory = HashMap<String, String>;

/// Constituency identifier -> total household count.
pub type HouseholdTable = HashMap<String, u64>;

#[derive(Deserialize)]
struct PostcodeRow {
    postcode: String,
    constituency_code: String,
}

#[derive(Deserialize)]
struct DirectoryRow {
    constituency_code: String,
    constituency_name: String,
}

#[derive(Deserialize)]
struct HouseholdRow {
    constituency_code: String,
    category: String,
    observation: u64,
}

fn require_present(path: &Path, table: &str) -> Result<(), TaxmapError> {
    if !path.exists() {
        return Err(TaxmapError::missing(
            table,
            format!("expected file {}", path.display()),
        ));
    }
    Ok(())
}

/// Loads the postcode -> constituency index. The source may be split across
/// several CSV shards; all are concatenated. Keys are normalized at load
/// time so joins are pure lookups. Rows with an empty constituency code are
/// dropped.
pub fn load_postcode_index<P: AsRef<Path>>(paths: &[P]) -> Result<PostcodeIndex, TaxmapError> {
    if paths.is_empty() {
        return Err(TaxmapError::missing("postcode index", "no source files given"));
    }

    let mut index: PostcodeIndex = HashMap::new();
    for path in paths {
        let path = path.as_ref();
        require_present(path, "postcode index")?;
        let mut rdr = csv::Reader::from_path(path)
            .map_err(|e| TaxmapError::csv(path.display().to_string(), e))?;
        for result in rdr.deserialize::<PostcodeRow>() {
            let record = result.map_err(|e| TaxmapError::csv(path.display().to_string(), e))?;
            if record.constituency_code.trim().is_empty() {
                continue;
            }
            index.insert(
                postcode::normalize(&record.postcode),
                record.constituency_code.trim().to_owned(),
            );
        }
        debug!(path = %path.display(), entries = index.len(), "loaded postcode shard");
    }

    if index.is_empty() {
        return Err(TaxmapError::missing("postcode index", "no usable rows"));
    }
    Ok(index)
}

/// Loads the constituency code -> name directory. One directory version per
/// run; callers must not mix vintages.
pub fn load_directory<P: AsRef<Path>>(path: P) -> Result<ConstituencyDirectory, TaxmapError> {
    let path = path.as_ref();
    require_present(path, "constituency directory")?;
    let mut rdr = csv::Reader::from_path(path)
        .map_err(|e| TaxmapError::csv(path.display().to_string(), e))?;

    let mut directory: ConstituencyDirectory = HashMap::new();
    for result in rdr.deserialize::<DirectoryRow>() {
        let record = result.map_err(|e| TaxmapError::csv(path.display().to_string(), e))?;
        directory.insert(
            record.constituency_code.trim().to_owned(),
            record.constituency_name.trim().to_owned(),
        );
    }

    if directory.is_empty() {
        return Err(TaxmapError::missing("constituency directory", "no usable rows"));
    }
    Ok(directory)
}

/// Loads census household counts: drops "Does not apply" rows, then sums
/// observations per constituency.
pub fn load_households<P: AsRef<Path>>(path: P) -> Result<HouseholdTable, TaxmapError> {
    let path = path.as_ref();
    require_present(path, "household table")?;
    let mut rdr = csv::Reader::from_path(path)
        .map_err(|e| TaxmapError::csv(path.display().to_string(), e))?;

    let mut households: HouseholdTable = HashMap::new();
    for result in rdr.deserialize::<HouseholdRow>() {
        let record = result.map_err(|e| TaxmapError::csv(path.display().to_string(), e))?;
        if record.category == HOUSEHOLD_NOT_APPLICABLE {
            continue;
        }
        *households
            .entry(record.constituency_code.trim().to_owned())
            .or_insert(0) += record.observation;
    }

    if households.is_empty() {
        return Err(TaxmapError::missing("household table", "no usable rows"));
    }
    Ok(households)
}
