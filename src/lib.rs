//! Constituency-level impact analysis of UK property tax proposals.
//!
//! Joins Land Registry price-paid records to Westminster constituencies
//! through a postcode lookup, filters by (optionally uprated) price
//! thresholds or surcharge bands, and aggregates per-constituency statistics
//! and revenue estimates for the map and reporting side to consume.

pub mod aggregate;
pub mod bands;
pub mod config;
pub mod error;
pub mod filter;
pub mod join;
pub mod output;
pub mod pipeline;
pub mod postcode;
pub mod refdata;
pub mod sales;
pub mod uprate;

pub use error::TaxmapError;
