use std::io::Write;

use listing_report::processor::AggregateOp;
use listing_report::report::analysis::{PriceSegment, analyze_price_segments};
use listing_report::{Field, LoadOptions, ProcessorError, ProductTable, ReportConfig, SalesReport};
use tempfile::NamedTempFile;

fn write_csv(csv: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    write!(tmp, "{}", csv).unwrap();
    tmp
}

const LISTINGS: &str = "brand,title,type,price,sold,available,itemLocation\n\
    Dior,\"Sauvage EDT, 3.4 oz\",Eau de Toilette,95.5,1200,30,\"Newark, NJ\"\n\
    Chanel,\"Bleu de Chanel\nParfum\",Parfum,120,800,0,Paris\n\
    Dior,Homme Sport,Eau de Toilette,15,3,97,Dallas\n\
    Versace,Eros,Eau de Parfum,45,500,500,Miami\n\
    ,Unbranded Cologne,Cologne,8.99,40,10,Unknown\n";

#[test]
fn test_end_to_end_report() {
    let tmp = write_csv(LISTINGS);
    let table = ProductTable::load_csv(tmp.path(), &LoadOptions::default()).unwrap();
    assert_eq!(table.row_count(), 5);

    let report = SalesReport::generate(&table, &ReportConfig::default()).unwrap();
    assert_eq!(report.metrics.total_brands, 4); // empty brand counts as its own key
    assert_eq!(report.metrics.total_sold, 2543);

    let text = report.to_string();
    let sections = [
        "KEY PERFORMANCE METRICS",
        "TOP 10 BRANDS BY SALES",
        "PRICE SEGMENT PERFORMANCE",
        "PRODUCT CATEGORY ANALYSIS",
        "TOP 10 BEST SELLING PRODUCTS",
        "INVENTORY EFFICIENCY ANALYSIS",
    ];
    let positions: Vec<usize> = sections
        .iter()
        .map(|s| text.find(s).unwrap_or_else(|| panic!("missing section {s}")))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(text.contains("Sauvage EDT, 3.4 oz"));
    assert!(text.contains("Total Units Sold: 2,543"));
}

#[test]
fn test_partition_properties() {
    let tmp = write_csv(LISTINGS);
    let table = ProductTable::load_csv(tmp.path(), &LoadOptions::default()).unwrap();
    let config = ReportConfig {
        top_brands: usize::MAX,
        top_categories: usize::MAX,
        ..ReportConfig::default()
    };
    let report = SalesReport::generate(&table, &config).unwrap();

    let brand_rows: usize = report.top_brands.iter().map(|b| b.product_count).sum();
    let segment_rows: usize = report.price_segments.iter().map(|s| s.product_count).sum();
    let category_rows: usize = report.categories.iter().map(|c| c.product_count).sum();
    assert_eq!(brand_rows, table.row_count());
    assert_eq!(segment_rows, table.row_count());
    assert_eq!(category_rows, table.row_count());

    let sold: i64 = report.top_brands.iter().map(|b| b.total_sold).sum();
    assert_eq!(sold, report.metrics.total_sold);

    for b in &report.top_brands {
        assert!((0.0..=1.0).contains(&b.sales_efficiency));
    }
    let share: f64 = report.categories.iter().map(|c| c.market_share).sum();
    assert!((share - 100.0).abs() < 0.05);
}

#[test]
fn test_segments_only_non_empty() {
    let tmp = write_csv("brand,title,type,price,sold,available\nA,a,EDT,10,1,1\nB,b,EDT,19.5,2,0\n");
    let table = ProductTable::load_csv(tmp.path(), &LoadOptions::default()).unwrap();
    let segments = analyze_price_segments(&table).unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].segment, PriceSegment::Budget);
    assert_eq!(segments[0].total_sold, 3);
}

#[test]
fn test_schema_error_names_missing_columns() {
    let tmp = write_csv("brand,title,price,sold\nA,a,1,2\n");
    let err = ProductTable::load_csv(tmp.path(), &LoadOptions::default()).unwrap_err();
    match err {
        ProcessorError::MissingColumn(cols) => assert_eq!(cols, "type, available"),
        other => panic!("Expected MissingColumn, got {other:?}"),
    }
}

#[test]
fn test_malformed_policy() {
    let csv = "brand,title,type,price,sold,available\nA,a,EDT,10,1,1\nB,b,EDT,n/a,2,0\n";
    let tmp = write_csv(csv);

    let strict = ProductTable::load_csv(tmp.path(), &LoadOptions::default()).unwrap_err();
    assert!(matches!(strict, ProcessorError::Malformed(ref e) if e.row == 3));
    assert!(strict.to_string().contains("n/a"));

    let lenient = ProductTable::load_csv(
        tmp.path(),
        &LoadOptions {
            skip_malformed_rows: true,
        },
    )
    .unwrap();
    assert_eq!(lenient.row_count(), 1);
    assert_eq!(lenient.summary().errors.len(), 1);
    assert_eq!(
        lenient.aggregate(Field::Sold, AggregateOp::Sum).unwrap().as_i64(),
        1
    );
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.csv");
    let err = ProductTable::load_csv(&path, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, ProcessorError::DataSource { .. }));
    assert!(err.to_string().contains("absent.csv"));
}

#[test]
fn test_header_only_file_reports_zeros() {
    let tmp = write_csv("brand,title,type,price,sold,available\n");
    let table = ProductTable::load_csv(tmp.path(), &LoadOptions::default()).unwrap();
    let text = SalesReport::generate(&table, &ReportConfig::default())
        .unwrap()
        .to_string();
    assert!(text.contains("Total Products: 0"));
    assert_eq!(text.matches("No data available").count(), 6);
}
