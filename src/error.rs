use thiserror::Error;

/// Fatal pipeline errors. Anything here aborts the whole run before any
/// output file is written; unmatched records and undefined percentages are
/// not errors and are reported through the run statistics instead.
#[derive(Debug, Error)]
pub enum TaxmapError {
    #[error("missing reference data: {table} ({detail})")]
    MissingReferenceData { table: String, detail: String },

    #[error("invalid band configuration: {0}")]
    InvalidBandConfiguration(String),

    #[error("invalid growth table: {0}")]
    InvalidGrowthTable(String),

    #[error("csv failure at {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

impl TaxmapError {
    pub fn missing(table: &str, detail: impl Into<String>) -> Self {
        Self::MissingReferenceData {
            table: table.to_owned(),
            detail: detail.into(),
        }
    }

    pub fn csv(path: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}
