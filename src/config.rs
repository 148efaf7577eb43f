/// Input used when no path is given on the command line
pub const DEFAULT_DATA_PATH: &str = "data/ebay_mens_perfume.csv";

/// How much of each ranking the report shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub title: String,
    pub top_brands: usize,
    pub top_categories: usize,
    pub best_sellers: usize,
    /// Rows in each of the most/least efficient listings
    pub efficiency_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "E-commerce Perfume Sales Analysis".to_string(),
            top_brands: 10,
            top_categories: 10,
            best_sellers: 10,
            efficiency_rows: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Drop malformed records instead of failing the load
    pub skip_malformed_rows: bool,
}
