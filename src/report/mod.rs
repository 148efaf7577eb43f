use std::fmt;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::ReportConfig;
use crate::processor::ProcessorError;
use crate::processor::product_table::ProductTable;

pub mod analysis;
pub mod render;

use analysis::{
    BestSeller, BrandSummary, BusinessMetrics, CategorySummary, InventoryEfficiency,
    SegmentSummary,
};

/// Every analysis of one table, ready to render
///
/// `Display` writes the full text report.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesReport {
    pub config: ReportConfig,
    pub metrics: BusinessMetrics,
    pub top_brands: Vec<BrandSummary>,
    pub price_segments: Vec<SegmentSummary>,
    pub categories: Vec<CategorySummary>,
    pub best_sellers: Vec<BestSeller>,
    pub inventory: InventoryEfficiency,
}

impl SalesReport {
    /// Runs the six analyses in report order
    pub fn generate(table: &ProductTable, config: &ReportConfig) -> Result<Self, ProcessorError> {
        let started = Instant::now();

        let metrics = analysis::calculate_business_metrics(table)?;
        debug!(
            products = metrics.total_products,
            brands = metrics.total_brands,
            "business metrics"
        );

        let top_brands = analysis::analyze_top_brands(table, config.top_brands)?;
        debug!(rows = top_brands.len(), "top brands");

        let price_segments = analysis::analyze_price_segments(table)?;
        debug!(rows = price_segments.len(), "price segments");

        let categories = analysis::analyze_product_types(table, config.top_categories)?;
        debug!(rows = categories.len(), "product categories");

        let best_sellers = analysis::best_selling_products(table, config.best_sellers)?;
        debug!(rows = best_sellers.len(), "best sellers");

        let inventory = analysis::analyze_inventory_efficiency(table, config.efficiency_rows)?;
        debug!(
            most = inventory.most_efficient.len(),
            least = inventory.least_efficient.len(),
            "inventory efficiency"
        );

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "report generated"
        );

        Ok(SalesReport {
            config: config.clone(),
            metrics,
            top_brands,
            price_segments,
            categories,
            best_sellers,
            inventory,
        })
    }
}

impl fmt::Display for SalesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::render(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoadOptions;

    fn sample() -> ProductTable {
        let csv = "brand,title,type,price,sold,available\n\
                   Dior,Sauvage,EDT,95.5,1200,30\n\
                   Chanel,Bleu,EDP,120,800,0\n\
                   Dior,Homme,EDT,15,3,97\n\
                   Versace,Eros,EDT,45,500,500\n";
        ProductTable::from_csv_bytes(csv, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_generate_respects_config() {
        let config = ReportConfig {
            top_brands: 2,
            best_sellers: 1,
            efficiency_rows: 2,
            ..ReportConfig::default()
        };
        let report = SalesReport::generate(&sample(), &config).unwrap();

        assert_eq!(report.metrics.total_products, 4);
        assert_eq!(report.top_brands.len(), 2);
        assert_eq!(report.top_brands[0].brand, "Dior");
        assert_eq!(report.top_brands[0].total_sold, 1203);
        assert_eq!(report.price_segments.len(), 4);
        assert_eq!(report.categories.len(), 2);
        assert_eq!(report.best_sellers.len(), 1);
        assert_eq!(report.best_sellers[0].title, "Sauvage");
        assert_eq!(report.inventory.most_efficient[0].title, "Bleu");
        assert_eq!(report.inventory.least_efficient[0].title, "Homme");
    }

    #[test]
    fn test_rendered_sections_in_order() {
        let report = SalesReport::generate(&sample(), &ReportConfig::default()).unwrap();
        let text = report.to_string();

        let headings = [
            "🛍️ E-commerce Perfume Sales Analysis",
            "📊 KEY PERFORMANCE METRICS",
            "🏆 TOP 10 BRANDS BY SALES",
            "💰 PRICE SEGMENT PERFORMANCE",
            "🧴 PRODUCT CATEGORY ANALYSIS",
            "🔥 TOP 10 BEST SELLING PRODUCTS",
            "📦 INVENTORY EFFICIENCY ANALYSIS",
            "Most Efficient Products:",
            "Least Efficient Products:",
        ];
        let mut last = 0;
        for heading in headings {
            let pos = text[last..]
                .find(heading)
                .unwrap_or_else(|| panic!("{heading} missing or out of order"));
            last += pos + heading.len();
        }

        assert!(text.contains("Total Units Sold: 2,503"));
        // 95.5*1200 + 120*800 + 15*3 + 45*500
        assert!(text.contains("Estimated Revenue: $233,145.00"));
        assert!(text.contains("Average Price: $68.88"));
        assert!(!text.contains("No data available"));
    }

    #[test]
    fn test_empty_table_renders_placeholders() {
        let report = SalesReport::generate(&ProductTable::new(), &ReportConfig::default()).unwrap();
        let text = report.to_string();
        assert!(text.contains("Total Products: 0"));
        assert!(text.contains("Average Price: $0.00"));
        assert!(text.contains("Estimated Revenue: $0.00"));
        assert_eq!(text.matches("No data available").count(), 6);
    }
}
