//! The six report analyses.
//!
//! Each one is a pure read of a [`ProductTable`]. Grouped results follow the
//! query builder's ordering rules: groups in lexicographic key order, then a
//! stable sort, so ties go to the lexicographically smaller key. Row results
//! break ties by source order.

use std::fmt;
use std::str::FromStr;

use crate::helpers::math::{ratio, round_to, sell_through};
use crate::processor::column::Field;
use crate::processor::product_table::{ProductRecord, ProductTable};
use crate::processor::query_builder::{GroupRow, SortOrder};
use crate::processor::{AggregateOp, ProcessorError};

/// Headline numbers over the whole table. All zero for an empty table.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessMetrics {
    pub total_products: usize,
    pub total_brands: usize,
    pub total_sold: i64,
    pub avg_price: f64,
    /// Σ price × sold
    pub total_revenue: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrandSummary {
    pub brand: String,
    pub product_count: usize,
    pub avg_price: f64,
    pub total_sold: i64,
    pub stock_quantity: i64,
    pub sales_efficiency: f64,
}

/// Price bucket; the upper bound of each bucket is inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceSegment {
    Budget,
    MidRange,
    Premium,
    Luxury,
}

impl PriceSegment {
    pub const ALL: [PriceSegment; 4] = [
        PriceSegment::Budget,
        PriceSegment::MidRange,
        PriceSegment::Premium,
        PriceSegment::Luxury,
    ];

    pub fn classify(price: f64) -> Self {
        if price <= 20.0 {
            PriceSegment::Budget
        } else if price <= 50.0 {
            PriceSegment::MidRange
        } else if price <= 100.0 {
            PriceSegment::Premium
        } else {
            PriceSegment::Luxury
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriceSegment::Budget => "Budget (≤$20)",
            PriceSegment::MidRange => "Mid-Range ($21-50)",
            PriceSegment::Premium => "Premium ($51-100)",
            PriceSegment::Luxury => "Luxury (>$100)",
        }
    }
}

impl fmt::Display for PriceSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PriceSegment {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PriceSegment::ALL
            .into_iter()
            .find(|segment| segment.label() == s)
            .ok_or_else(|| ProcessorError::Parse(format!("unknown price segment '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSummary {
    pub segment: PriceSegment,
    pub product_count: usize,
    pub avg_price: f64,
    pub total_sold: i64,
    pub total_available: i64,
    pub sales_ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub category: String,
    pub product_count: usize,
    pub avg_price: f64,
    pub total_sold: i64,
    /// Percent of all units sold
    pub market_share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BestSeller {
    pub brand: String,
    pub title: String,
    pub kind: String,
    pub price: f64,
    pub sold: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRow {
    pub brand: String,
    pub title: String,
    pub price: f64,
    pub sold: i64,
    pub available: i64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryEfficiency {
    pub most_efficient: Vec<InventoryRow>,
    pub least_efficient: Vec<InventoryRow>,
}

pub fn calculate_business_metrics(table: &ProductTable) -> Result<BusinessMetrics, ProcessorError> {
    Ok(BusinessMetrics {
        total_products: table.row_count(),
        total_brands: table
            .aggregate(Field::Brand, AggregateOp::CountDistinct)?
            .as_i64() as usize,
        total_sold: table.aggregate(Field::Sold, AggregateOp::Sum)?.as_i64(),
        avg_price: table.aggregate(Field::Price, AggregateOp::Avg)?.as_f64(),
        total_revenue: table.sum_product(Field::Price, Field::Sold)?,
    })
}

/// Top `n` brands by units sold
pub fn analyze_top_brands(table: &ProductTable, n: usize) -> Result<Vec<BrandSummary>, ProcessorError> {
    table
        .query()
        .group_by(Field::Brand)
        .aggregate_as(Field::Price, AggregateOp::Count, "product_count")
        .aggregate_as(Field::Price, AggregateOp::Avg, "avg_price")
        .aggregate_as(Field::Sold, AggregateOp::Sum, "total_sold")
        .aggregate_as(Field::Available, AggregateOp::Sum, "stock_quantity")
        .order_by_measure("total_sold", SortOrder::Descending)
        .limit(n)
        .grouped()?
        .into_iter()
        .map(|group| -> Result<BrandSummary, ProcessorError> {
            let total_sold = group.measure("total_sold")?.as_i64();
            let stock_quantity = group.measure("stock_quantity")?.as_i64();
            Ok(BrandSummary {
                product_count: group.measure("product_count")?.as_i64() as usize,
                avg_price: round_to(group.measure("avg_price")?.as_f64(), 2),
                total_sold,
                stock_quantity,
                sales_efficiency: sell_through(total_sold, stock_quantity),
                brand: group.key,
            })
        })
        .collect()
}

fn segment_key(record: &ProductRecord<'_>) -> String {
    PriceSegment::classify(record.price).label().to_string()
}

/// Sales per price segment, in lexicographic label order
pub fn analyze_price_segments(table: &ProductTable) -> Result<Vec<SegmentSummary>, ProcessorError> {
    table
        .query()
        .group_by_derived(segment_key)
        .aggregate_as(Field::Brand, AggregateOp::Count, "product_count")
        .aggregate_as(Field::Price, AggregateOp::Avg, "avg_price")
        .aggregate_as(Field::Sold, AggregateOp::Sum, "sold")
        .aggregate_as(Field::Available, AggregateOp::Sum, "available")
        .grouped()?
        .into_iter()
        .map(|group| -> Result<SegmentSummary, ProcessorError> {
            let total_sold = group.measure("sold")?.as_i64();
            let total_available = group.measure("available")?.as_i64();
            Ok(SegmentSummary {
                segment: group.key.parse()?,
                product_count: group.measure("product_count")?.as_i64() as usize,
                avg_price: round_to(group.measure("avg_price")?.as_f64(), 2),
                total_sold,
                total_available,
                sales_ratio: sell_through(total_sold, total_available),
            })
        })
        .collect()
}

/// Every category, by units sold descending
pub fn category_breakdown(table: &ProductTable) -> Result<Vec<CategorySummary>, ProcessorError> {
    let grand_total = table.aggregate(Field::Sold, AggregateOp::Sum)?.as_f64();

    table
        .query()
        .group_by(Field::Type)
        .aggregate_as(Field::Brand, AggregateOp::Count, "product_count")
        .aggregate_as(Field::Price, AggregateOp::Avg, "avg_price")
        .aggregate_as(Field::Sold, AggregateOp::Sum, "sold")
        .order_by_measure("sold", SortOrder::Descending)
        .grouped()?
        .into_iter()
        .map(|group: GroupRow| -> Result<CategorySummary, ProcessorError> {
            let total_sold = group.measure("sold")?.as_i64();
            Ok(CategorySummary {
                product_count: group.measure("product_count")?.as_i64() as usize,
                avg_price: round_to(group.measure("avg_price")?.as_f64(), 2),
                total_sold,
                market_share: round_to(ratio(total_sold as f64, grand_total) * 100.0, 2),
                category: group.key,
            })
        })
        .collect()
}

/// Top `n` categories of [`category_breakdown`]
pub fn analyze_product_types(
    table: &ProductTable,
    n: usize,
) -> Result<Vec<CategorySummary>, ProcessorError> {
    let mut categories = category_breakdown(table)?;
    categories.truncate(n);
    Ok(categories)
}

/// The `n` listings with the most units sold
pub fn best_selling_products(table: &ProductTable, n: usize) -> Result<Vec<BestSeller>, ProcessorError> {
    table
        .query()
        .order_by(Field::Sold, SortOrder::Descending)
        .limit(n)
        .rows()?
        .into_iter()
        .map(|row| -> Result<BestSeller, ProcessorError> {
            let record = table.record(row)?;
            Ok(BestSeller {
                brand: record.brand.into_owned(),
                title: record.title.into_owned(),
                kind: record.kind.into_owned(),
                price: record.price,
                sold: record.sold,
            })
        })
        .collect()
}

fn efficiency_key(record: &ProductRecord<'_>) -> f64 {
    record.inventory_efficiency()
}

/// The `n` most and `n` least efficient listings by sell-through
pub fn analyze_inventory_efficiency(
    table: &ProductTable,
    n: usize,
) -> Result<InventoryEfficiency, ProcessorError> {
    let pick = |order: SortOrder| -> Result<Vec<InventoryRow>, ProcessorError> {
        table
            .query()
            .order_by_derived(efficiency_key, order)
            .limit(n)
            .rows()?
            .into_iter()
            .map(|row| -> Result<InventoryRow, ProcessorError> {
                let record = table.record(row)?;
                Ok(InventoryRow {
                    efficiency: record.inventory_efficiency(),
                    brand: record.brand.into_owned(),
                    title: record.title.into_owned(),
                    price: record.price,
                    sold: record.sold,
                    available: record.available,
                })
            })
            .collect()
    };

    Ok(InventoryEfficiency {
        most_efficient: pick(SortOrder::Descending)?,
        least_efficient: pick(SortOrder::Ascending)?,
    })
}
