//! # listing_report
//!
//! Loads an e-commerce product listing export (one CSV row per listing) into a
//! columnar table and builds a one-shot sales report from it:
//!
//! - Memory-mapped CSV loading, text columns kept as offsets into the file
//! - Quote-aware record splitting with `memchr`, fast numeric parsing
//! - AVX2 SIMD sums and revenue dot product (scalar fallback)
//! - A small query builder: group by, aggregate, order, limit
//! - Six analyses: business metrics, top brands, price segments, categories,
//!   best sellers and inventory efficiency
//! - Text rendering with `tabled`
//!
//! Parsing batches on the rayon pool is available behind the `parallel`
//! feature.
//!
//! # Example
//!
//! ```rust,no_run
//! use listing_report::{LoadOptions, ProductTable, ReportConfig, SalesReport};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = ProductTable::load_csv(Path::new("data.csv"), &LoadOptions::default())?;
//!     let report = SalesReport::generate(&table, &ReportConfig::default())?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```

pub mod config;
mod helpers;
pub mod processor;
pub mod report;

pub use config::{DEFAULT_DATA_PATH, LoadOptions, ReportConfig};
pub use processor::ProcessorError;
pub use processor::column::Field;
pub use processor::product_table::{ProductRecord, ProductTable};
pub use report::SalesReport;
