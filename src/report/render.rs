//! Text rendering of a [`SalesReport`] using the [`tabled`] crate

use std::fmt::{self, Write};

use tabled::{Table, Tabled, settings::Style};

use crate::report::SalesReport;
use crate::report::analysis::{
    BestSeller, BrandSummary, BusinessMetrics, CategorySummary, InventoryRow, SegmentSummary,
};

const RULE_WIDTH: usize = 50;
const NO_DATA: &str = "No data available";

#[derive(Debug, Clone, Tabled)]
struct BrandLine {
    #[tabled(rename = "Brand")]
    brand: String,
    #[tabled(rename = "Products")]
    products: usize,
    #[tabled(rename = "Avg Price")]
    avg_price: String,
    #[tabled(rename = "Total Sold")]
    total_sold: String,
    #[tabled(rename = "Stock")]
    stock: String,
    #[tabled(rename = "Sales Efficiency")]
    sales_efficiency: String,
}

impl From<&BrandSummary> for BrandLine {
    fn from(b: &BrandSummary) -> Self {
        Self {
            brand: b.brand.clone(),
            products: b.product_count,
            avg_price: money(b.avg_price),
            total_sold: thousands(b.total_sold),
            stock: thousands(b.stock_quantity),
            sales_efficiency: format!("{:.3}", b.sales_efficiency),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
struct SegmentLine {
    #[tabled(rename = "Segment")]
    segment: String,
    #[tabled(rename = "Products")]
    products: usize,
    #[tabled(rename = "Avg Price")]
    avg_price: String,
    #[tabled(rename = "Sold")]
    sold: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Sales Ratio")]
    sales_ratio: String,
}

impl From<&SegmentSummary> for SegmentLine {
    fn from(s: &SegmentSummary) -> Self {
        Self {
            segment: s.segment.to_string(),
            products: s.product_count,
            avg_price: money(s.avg_price),
            sold: thousands(s.total_sold),
            available: thousands(s.total_available),
            sales_ratio: format!("{:.3}", s.sales_ratio),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
struct CategoryLine {
    #[tabled(rename = "Type")]
    category: String,
    #[tabled(rename = "Products")]
    products: usize,
    #[tabled(rename = "Avg Price")]
    avg_price: String,
    #[tabled(rename = "Sold")]
    sold: String,
    #[tabled(rename = "Market Share %")]
    market_share: String,
}

impl From<&CategorySummary> for CategoryLine {
    fn from(c: &CategorySummary) -> Self {
        Self {
            category: c.category.clone(),
            products: c.product_count,
            avg_price: money(c.avg_price),
            sold: thousands(c.total_sold),
            market_share: format!("{:.2}", c.market_share),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
struct BestSellerLine {
    #[tabled(rename = "Brand")]
    brand: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Sold")]
    sold: String,
}

impl From<&BestSeller> for BestSellerLine {
    fn from(b: &BestSeller) -> Self {
        Self {
            brand: b.brand.clone(),
            title: b.title.clone(),
            kind: b.kind.clone(),
            price: money(b.price),
            sold: thousands(b.sold),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
struct InventoryLine {
    #[tabled(rename = "Brand")]
    brand: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Sold")]
    sold: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Efficiency")]
    efficiency: String,
}

impl From<&InventoryRow> for InventoryLine {
    fn from(r: &InventoryRow) -> Self {
        Self {
            brand: r.brand.clone(),
            title: r.title.clone(),
            price: money(r.price),
            sold: thousands(r.sold),
            available: thousands(r.available),
            efficiency: format!("{:.3}", r.efficiency),
        }
    }
}

/// psql-style table, or the no-data marker for an empty section
fn table<'a, T, L>(items: &'a [T]) -> String
where
    L: Tabled + From<&'a T>,
{
    if items.is_empty() {
        return NO_DATA.to_string();
    }
    let lines: Vec<L> = items.iter().map(L::from).collect();
    let mut table = Table::new(lines);
    table.with(Style::psql());
    table.to_string()
}

/// `1234567` -> `1,234,567`
pub fn thousands(value: i64) -> String {
    group_digits(&value.unsigned_abs().to_string(), value < 0)
}

/// Two decimals with thousands separators, without the currency sign
pub fn thousands_f64(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));
    // -0.00 prints as 0.00
    let negative = value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    format!("{}.{frac_part}", group_digits(int_part, negative))
}

fn group_digits(digits: &str, negative: bool) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn money(value: f64) -> String {
    if value < 0.0 {
        format!("-${:.2}", -value)
    } else {
        format!("${value:.2}")
    }
}

fn write_metrics(out: &mut String, m: &BusinessMetrics) -> fmt::Result {
    writeln!(out, "📊 KEY PERFORMANCE METRICS")?;
    writeln!(out, "Total Products: {}", m.total_products)?;
    writeln!(out, "Total Brands: {}", m.total_brands)?;
    writeln!(out, "Total Units Sold: {}", thousands(m.total_sold))?;
    writeln!(out, "Average Price: {}", money(m.avg_price))?;
    writeln!(out, "Estimated Revenue: ${}", thousands_f64(m.total_revenue))
}

/// Renders the whole report as text, sections in fixed order
pub fn render(report: &SalesReport) -> Result<String, fmt::Error> {
    let mut out = String::new();

    writeln!(out, "🛍️ {}", report.config.title)?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out)?;

    write_metrics(&mut out, &report.metrics)?;
    writeln!(out)?;

    writeln!(out, "🏆 TOP {} BRANDS BY SALES", report.config.top_brands)?;
    writeln!(out, "{}", table::<_, BrandLine>(&report.top_brands))?;
    writeln!(out)?;

    writeln!(out, "💰 PRICE SEGMENT PERFORMANCE")?;
    writeln!(out, "{}", table::<_, SegmentLine>(&report.price_segments))?;
    writeln!(out)?;

    writeln!(out, "🧴 PRODUCT CATEGORY ANALYSIS")?;
    writeln!(out, "{}", table::<_, CategoryLine>(&report.categories))?;
    writeln!(out)?;

    writeln!(out, "🔥 TOP {} BEST SELLING PRODUCTS", report.config.best_sellers)?;
    writeln!(out, "{}", table::<_, BestSellerLine>(&report.best_sellers))?;
    writeln!(out)?;

    writeln!(out, "📦 INVENTORY EFFICIENCY ANALYSIS")?;
    writeln!(out, "Most Efficient Products:")?;
    writeln!(out, "{}", table::<_, InventoryLine>(&report.inventory.most_efficient))?;
    writeln!(out)?;
    writeln!(out, "Least Efficient Products:")?;
    writeln!(out, "{}", table::<_, InventoryLine>(&report.inventory.least_efficient))?;

    Ok(out)
}
