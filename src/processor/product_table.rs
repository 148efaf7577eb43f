use memmap2::Mmap;
use std::{
    borrow::Cow,
    collections::HashSet,
    fs::File,
    ops::Deref,
    path::Path,
    time::Instant,
};
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    config::LoadOptions,
    helpers::{
        csv_scan::{UTF8_BOM, decode_field, record_spans, split_fields},
        math::sell_through,
        simd_helpers::{dot_f64_i64, sum_f64, sum_i64},
    },
    processor::{
        AggregateOp, AggregateResult, ParseError, ParseSummary, ProcessorError,
        column::{Column, ColumnType, Field},
    },
};

/// Bytes the string columns point into
#[derive(Debug)]
enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for Backing {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Backing::Mapped(mmap) => mmap,
            Backing::Owned(bytes) => bytes,
        }
    }
}

/// One loaded product listing, borrowed from its table
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord<'a> {
    /// Position in source order
    pub row: usize,
    pub brand: Cow<'a, str>,
    pub title: Cow<'a, str>,
    /// The `type` column
    pub kind: Cow<'a, str>,
    pub price: f64,
    pub sold: i64,
    pub available: i64,
}

impl ProductRecord<'_> {
    /// `sold / (sold + available)` rounded to 3 places, 0 when both are 0
    pub fn inventory_efficiency(&self) -> f64 {
        sell_through(self.sold, self.available)
    }
}

/// Parsed columns of one slice of records
#[derive(Debug)]
struct BatchResult {
    columns: Vec<Column>,
    row_count: usize,
    errors: Vec<ParseError>,
}

/// Column positions of the required fields within a record
#[derive(Debug)]
struct SchemaLayout {
    positions: [usize; Field::ALL.len()],
    width: usize,
}

impl SchemaLayout {
    fn resolve(headers: &[String]) -> Result<Self, ProcessorError> {
        let mut positions = [0; Field::ALL.len()];
        let mut missing = Vec::new();

        for field in Field::ALL {
            match headers.iter().position(|h| h == field.name()) {
                Some(pos) => positions[field.index()] = pos,
                None => missing.push(field.name()),
            }
        }

        if !missing.is_empty() {
            return Err(ProcessorError::MissingColumn(missing.join(", ")));
        }

        Ok(SchemaLayout {
            positions,
            width: headers.len(),
        })
    }
}

/// Columnar, read-only table of product listings
///
/// Text columns hold offsets into the loaded file and are decoded on access.
///
/// # Examples
///
/// ```rust
/// # use listing_report::{LoadOptions, ProductTable, processor::AggregateOp, Field};
/// let csv = "brand,title,type,price,sold,available\nDior,Sauvage,EDT,10.0,5,5\n";
/// let table = ProductTable::from_csv_bytes(csv, &LoadOptions::default()).unwrap();
/// let sold = table.aggregate(Field::Sold, AggregateOp::Sum).unwrap();
/// assert_eq!(sold.as_i64(), 5);
/// ```
#[derive(Debug)]
pub struct ProductTable {
    backing: Backing,
    columns: Vec<Column>, // indexed by Field
    row_count: usize,
    summary: ParseSummary,
}

impl ProductTable {
    /// Create an empty table
    pub fn new() -> Self {
        ProductTable {
            backing: Backing::Owned(Vec::new()),
            columns: Field::ALL
                .iter()
                .map(|f| Column::new(f.column_type()))
                .collect(),
            row_count: 0,
            summary: ParseSummary::default(),
        }
    }

    /// Loads a CSV file into memory using memory mapping
    ///
    /// # Errors
    /// - [`ProcessorError::DataSource`] if the file cannot be opened or mapped
    /// - [`ProcessorError::MissingColumn`] if a required column is absent
    /// - [`ProcessorError::Malformed`] on the first bad record, unless
    ///   `options.skip_malformed_rows` is set
    pub fn load_csv(path: &Path, options: &LoadOptions) -> Result<Self, ProcessorError> {
        let started = Instant::now();
        let data_source = |source| ProcessorError::DataSource {
            path: path.to_path_buf(),
            source,
        };

        let mmap = {
            let file = File::open(path).map_err(data_source)?;
            unsafe { Mmap::map(&file) }.map_err(data_source)?
        };
        debug!(path = %path.display(), bytes = mmap.len(), "mapped input file");

        let table = Self::parse(Backing::Mapped(mmap), options)?;
        info!(
            path = %path.display(),
            rows = table.row_count,
            skipped = table.summary.errors.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded product table"
        );
        Ok(table)
    }

    /// Parses an in-memory CSV buffer with the same rules as [`Self::load_csv`]
    pub fn from_csv_bytes(
        bytes: impl Into<Vec<u8>>,
        options: &LoadOptions,
    ) -> Result<Self, ProcessorError> {
        Self::parse(Backing::Owned(bytes.into()), options)
    }

    fn parse(backing: Backing, options: &LoadOptions) -> Result<Self, ProcessorError> {
        let buf: &[u8] = &backing;
        let body_start = if buf.starts_with(UTF8_BOM) {
            UTF8_BOM.len()
        } else {
            0
        };

        let spans: Vec<(usize, usize)> = record_spans(&buf[body_start..])
            .into_iter()
            .map(|(s, e)| (s + body_start, e + body_start))
            .collect();

        let Some((&(hs, he), data_spans)) = spans.split_first() else {
            let all: Vec<&str> = Field::ALL.iter().map(|f| f.name()).collect();
            return Err(ProcessorError::MissingColumn(all.join(", ")));
        };

        let mut header_fields = Vec::new();
        let header_line = &buf[hs..he];
        split_fields(header_line, &mut header_fields);
        let headers: Vec<String> = header_fields
            .iter()
            .map(|&(s, e)| decode_field(&header_line[s..e]).trim().to_string())
            .collect();

        let layout = SchemaLayout::resolve(&headers)?;

        let batch_results = Self::parse_batches(buf, data_spans, &layout, &headers);

        let mut columns: Vec<Column> = Field::ALL
            .iter()
            .map(|f| Column::with_capacity(f.column_type(), data_spans.len()))
            .collect();
        let mut total_rows = 0;
        let mut all_errors = Vec::new();

        for batch in batch_results {
            total_rows += batch.row_count;
            all_errors.extend(batch.errors);
            for (column, parsed) in columns.iter_mut().zip(batch.columns) {
                column.append(parsed)?;
            }
        }

        if !options.skip_malformed_rows {
            if let Some(first) = all_errors.into_iter().next() {
                return Err(ProcessorError::Malformed(first));
            }
            all_errors = Vec::new();
        }

        for error in &all_errors {
            warn!(%error, "skipping malformed record");
        }

        Ok(ProductTable {
            backing,
            columns,
            row_count: total_rows,
            summary: ParseSummary {
                rows_processed: total_rows,
                errors: all_errors,
            },
        })
    }

    #[cfg(not(feature = "parallel"))]
    fn parse_batches(
        buf: &[u8],
        spans: &[(usize, usize)],
        layout: &SchemaLayout,
        headers: &[String],
    ) -> Vec<BatchResult> {
        vec![Self::parse_batch(buf, spans, 0, layout, headers)]
    }

    #[cfg(feature = "parallel")]
    fn parse_batches(
        buf: &[u8],
        spans: &[(usize, usize)],
        layout: &SchemaLayout,
        headers: &[String],
    ) -> Vec<BatchResult> {
        let num_threads = rayon::current_num_threads();
        let batch_len = spans.len().div_ceil(num_threads).max(1);

        // collect() on an indexed parallel iterator keeps source order
        spans
            .par_chunks(batch_len)
            .enumerate()
            .map(|(idx, chunk)| Self::parse_batch(buf, chunk, idx * batch_len, layout, headers))
            .collect()
    }

    fn parse_batch(
        buf: &[u8],
        spans: &[(usize, usize)],
        first_record: usize,
        layout: &SchemaLayout,
        headers: &[String],
    ) -> BatchResult {
        let mut columns: Vec<Column> = Field::ALL
            .iter()
            .map(|f| Column::with_capacity(f.column_type(), spans.len()))
            .collect();
        let mut errors = Vec::new();
        let mut row_count = 0;
        let mut fields = Vec::with_capacity(layout.width);

        for (i, &(start, end)) in spans.iter().enumerate() {
            if start == end {
                continue;
            }
            // header is record 1
            let record_no = first_record + i + 2;
            let line = &buf[start..end];
            split_fields(line, &mut fields);

            if fields.len() != layout.width {
                errors.push(ParseError {
                    row: record_no,
                    column: String::new(),
                    value: format!("Expected {} fields, got {}", layout.width, fields.len()),
                    error: None,
                });
                continue;
            }

            let field_bytes = |field: Field| {
                let (s, e) = fields[layout.positions[field.index()]];
                (start + s, start + e)
            };
            let bad_value = |field: Field, reason: String| {
                let (s, e) = field_bytes(field);
                ParseError {
                    row: record_no,
                    column: headers[layout.positions[field.index()]].clone(),
                    value: String::from_utf8_lossy(&buf[s..e]).to_string(),
                    error: Some(reason),
                }
            };

            // Parse every numeric field before pushing so columns stay aligned
            let parsed = (|| {
                let (s, e) = field_bytes(Field::Price);
                let price = parse_price(&buf[s..e]).map_err(|r| bad_value(Field::Price, r))?;
                let (s, e) = field_bytes(Field::Sold);
                let sold = parse_count(&buf[s..e]).map_err(|r| bad_value(Field::Sold, r))?;
                let (s, e) = field_bytes(Field::Available);
                let available =
                    parse_count(&buf[s..e]).map_err(|r| bad_value(Field::Available, r))?;
                Ok::<_, ParseError>((price, sold, available))
            })();

            let (price, sold, available) = match parsed {
                Ok(values) => values,
                Err(error) => {
                    errors.push(error);
                    continue;
                }
            };

            for field in Field::ALL {
                match &mut columns[field.index()] {
                    Column::Str(offsets) => offsets.push(field_bytes(field)),
                    Column::Float64(values) => values.push(price),
                    Column::Int64(values) => values.push(match field {
                        Field::Sold => sold,
                        _ => available,
                    }),
                }
            }

            row_count += 1;
        }

        BatchResult {
            columns,
            row_count,
            errors,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn summary(&self) -> &ParseSummary {
        &self.summary
    }

    pub fn column(&self, field: Field) -> &Column {
        &self.columns[field.index()]
    }

    pub fn f64_values(&self, field: Field) -> Result<&[f64], ProcessorError> {
        self.column(field)
            .as_f64()
            .ok_or_else(|| column_type_error(field, ColumnType::Float64))
    }

    pub fn i64_values(&self, field: Field) -> Result<&[i64], ProcessorError> {
        self.column(field)
            .as_i64()
            .ok_or_else(|| column_type_error(field, ColumnType::Int64))
    }

    pub fn str_offsets(&self, field: Field) -> Result<&[(usize, usize)], ProcessorError> {
        self.column(field)
            .as_offsets()
            .ok_or_else(|| column_type_error(field, ColumnType::Str))
    }

    /// Decodes a text value from its offsets
    pub fn get_string(&self, (start, end): (usize, usize)) -> Cow<'_, str> {
        match self.backing.get(start..end) {
            Some(bytes) => decode_field(bytes),
            None => Cow::Borrowed(""),
        }
    }

    /// Iterates all records in source order
    pub fn records(
        &self,
    ) -> Result<impl Iterator<Item = ProductRecord<'_>> + '_, ProcessorError> {
        let brand = self.str_offsets(Field::Brand)?;
        let title = self.str_offsets(Field::Title)?;
        let kind = self.str_offsets(Field::Type)?;
        let price = self.f64_values(Field::Price)?;
        let sold = self.i64_values(Field::Sold)?;
        let available = self.i64_values(Field::Available)?;

        Ok((0..self.row_count).map(move |row| ProductRecord {
            row,
            brand: self.get_string(brand[row]),
            title: self.get_string(title[row]),
            kind: self.get_string(kind[row]),
            price: price[row],
            sold: sold[row],
            available: available[row],
        }))
    }

    /// Record at `row` in source order
    pub fn record(&self, row: usize) -> Result<ProductRecord<'_>, ProcessorError> {
        if row >= self.row_count {
            return Err(ProcessorError::Parse(format!(
                "row {row} out of range ({} rows)",
                self.row_count
            )));
        }

        Ok(ProductRecord {
            row,
            brand: self.get_string(self.str_offsets(Field::Brand)?[row]),
            title: self.get_string(self.str_offsets(Field::Title)?[row]),
            kind: self.get_string(self.str_offsets(Field::Type)?[row]),
            price: self.f64_values(Field::Price)?[row],
            sold: self.i64_values(Field::Sold)?[row],
            available: self.i64_values(Field::Available)?[row],
        })
    }

    /// Aggregates one column over the whole table
    ///
    /// `Avg` over an empty table is `0.0`.
    pub fn aggregate(&self, field: Field, op: AggregateOp) -> Result<AggregateResult, ProcessorError> {
        match self.column(field) {
            Column::Int64(values) => Ok(match op {
                AggregateOp::Sum => AggregateResult::Int(sum_i64(values)),
                AggregateOp::Count => AggregateResult::Int(values.len() as i64),
                AggregateOp::Avg => AggregateResult::Float(mean(sum_i64(values) as f64, values.len())),
                AggregateOp::CountDistinct => {
                    AggregateResult::Int(values.iter().collect::<HashSet<_>>().len() as i64)
                }
            }),

            Column::Float64(values) => Ok(match op {
                AggregateOp::Sum => AggregateResult::Float(sum_f64(values)),
                AggregateOp::Count => AggregateResult::Int(values.len() as i64),
                AggregateOp::Avg => AggregateResult::Float(mean(sum_f64(values), values.len())),
                AggregateOp::CountDistinct => AggregateResult::Int(
                    values.iter().map(|v| v.to_bits()).collect::<HashSet<_>>().len() as i64,
                ),
            }),

            Column::Str(offsets) => match op {
                AggregateOp::Count => Ok(AggregateResult::Int(offsets.len() as i64)),
                AggregateOp::CountDistinct => {
                    let distinct: HashSet<Cow<'_, str>> =
                        offsets.iter().map(|&o| self.get_string(o)).collect();
                    Ok(AggregateResult::Int(distinct.len() as i64))
                }
                AggregateOp::Sum | AggregateOp::Avg => Err(ProcessorError::Parse(format!(
                    "Cannot {op:?} string column '{}'",
                    field.name()
                ))),
            },
        }
    }

    /// Aggregates one column over the given rows
    pub fn aggregate_rows(
        &self,
        field: Field,
        op: AggregateOp,
        rows: &[usize],
    ) -> Result<AggregateResult, ProcessorError> {
        match self.column(field) {
            Column::Int64(values) => {
                let picked: Vec<i64> = rows.iter().map(|&i| values[i]).collect();
                Ok(match op {
                    AggregateOp::Sum => AggregateResult::Int(sum_i64(&picked)),
                    AggregateOp::Count => AggregateResult::Int(picked.len() as i64),
                    AggregateOp::Avg => {
                        AggregateResult::Float(mean(sum_i64(&picked) as f64, picked.len()))
                    }
                    AggregateOp::CountDistinct => {
                        AggregateResult::Int(picked.iter().collect::<HashSet<_>>().len() as i64)
                    }
                })
            }

            Column::Float64(values) => {
                let picked: Vec<f64> = rows.iter().map(|&i| values[i]).collect();
                Ok(match op {
                    AggregateOp::Sum => AggregateResult::Float(sum_f64(&picked)),
                    AggregateOp::Count => AggregateResult::Int(picked.len() as i64),
                    AggregateOp::Avg => AggregateResult::Float(mean(sum_f64(&picked), picked.len())),
                    AggregateOp::CountDistinct => AggregateResult::Int(
                        picked.iter().map(|v| v.to_bits()).collect::<HashSet<_>>().len() as i64,
                    ),
                })
            }

            Column::Str(offsets) => match op {
                AggregateOp::Count => Ok(AggregateResult::Int(rows.len() as i64)),
                AggregateOp::CountDistinct => {
                    let distinct: HashSet<Cow<'_, str>> =
                        rows.iter().map(|&i| self.get_string(offsets[i])).collect();
                    Ok(AggregateResult::Int(distinct.len() as i64))
                }
                AggregateOp::Sum | AggregateOp::Avg => Err(ProcessorError::Parse(format!(
                    "Cannot {op:?} string column '{}'",
                    field.name()
                ))),
            },
        }
    }

    /// `Σ value[i] * weight[i]`, e.g. price × sold
    pub fn sum_product(&self, value: Field, weight: Field) -> Result<f64, ProcessorError> {
        Ok(dot_f64_i64(self.f64_values(value)?, self.i64_values(weight)?))
    }
}

impl Default for ProductTable {
    fn default() -> Self {
        Self::new()
    }
}

fn column_type_error(field: Field, expected: ColumnType) -> ProcessorError {
    ProcessorError::ColumnType {
        column: field.name(),
        expected: expected.name(),
    }
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}

fn parse_price(raw: &[u8]) -> Result<f64, String> {
    fast_float::parse::<f64, _>(raw.trim_ascii()).map_err(|e| e.to_string())
}

/// Integer counts, also accepting integral float spellings like `12.0`
fn parse_count(raw: &[u8]) -> Result<i64, String> {
    let raw = raw.trim_ascii();
    if let Ok(v) = atoi_simd::parse::<i64>(raw) {
        return Ok(v);
    }
    match fast_float::parse::<f64, _>(raw) {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        Ok(_) => Err("not a whole number".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "brand,title,type,price,sold,available\n";

    fn make_table_from_str(csv: &str) -> ProductTable {
        use std::io::Write;
        use tempfile::NamedTempFile;

        // write CSV to temp file
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "{}", csv).unwrap();

        ProductTable::load_csv(tmp.path(), &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_row_count() {
        let csv = format!("{HEADER}A,t1,EDT,10,5,5\nB,t2,EDP,30,0,0\nA,t3,EDT,50.5,1,2\n");
        let table = make_table_from_str(&csv);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.summary().rows_processed, 3);
        assert!(table.summary().errors.is_empty());
    }

    #[test]
    fn test_aggregate_sum_and_distinct() {
        let csv = format!("{HEADER}A,t1,EDT,10,5,5\nB,t2,EDP,30,0,0\nA,t3,EDT,50,1,2\n");
        let table = make_table_from_str(&csv);
        assert_eq!(
            table.aggregate(Field::Sold, AggregateOp::Sum).unwrap(),
            AggregateResult::Int(6)
        );
        assert_eq!(
            table.aggregate(Field::Brand, AggregateOp::CountDistinct).unwrap(),
            AggregateResult::Int(2)
        );
        assert_eq!(
            table.aggregate(Field::Price, AggregateOp::Avg).unwrap(),
            AggregateResult::Float(30.0)
        );
        assert!(table.aggregate(Field::Title, AggregateOp::Sum).is_err());
    }

    #[test]
    fn test_missing_file_is_data_source_error() {
        let err = ProductTable::load_csv(
            Path::new("/definitely/not/here.csv"),
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ProcessorError::DataSource { .. }));
    }

    #[test]
    fn test_missing_columns_are_listed() {
        let err = ProductTable::from_csv_bytes("brand,title,price\nA,t,1\n", &LoadOptions::default())
            .unwrap_err();
        match err {
            ProcessorError::MissingColumn(cols) => assert_eq!(cols, "type, sold, available"),
            other => panic!("Expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_file_has_no_schema() {
        let err = ProductTable::from_csv_bytes("", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, ProcessorError::MissingColumn(_)));
    }

    #[test]
    fn test_header_only_is_empty_table() {
        let table = ProductTable::from_csv_bytes(HEADER, &LoadOptions::default()).unwrap();
        assert!(table.is_empty());
        assert_eq!(
            table.aggregate(Field::Price, AggregateOp::Avg).unwrap(),
            AggregateResult::Float(0.0)
        );
    }

    #[test]
    fn test_extra_columns_and_reordered_header() {
        let csv = "\u{feff}sold,itemLocation,available,price,type,title,brand\r\n\
                   3,\"Paris, FR\",7,19.99,EDT,\"Bleu \"\"Intense\"\", 50ml\",Chanel\r\n";
        let table = ProductTable::from_csv_bytes(csv, &LoadOptions::default()).unwrap();
        let records: Vec<_> = table.records().unwrap().collect();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.brand, "Chanel");
        assert_eq!(r.title, "Bleu \"Intense\", 50ml");
        assert_eq!(r.kind, "EDT");
        assert_eq!(r.price, 19.99);
        assert_eq!((r.sold, r.available), (3, 7));
    }

    #[test]
    fn test_float_spelled_counts_and_negatives() {
        let csv = format!("{HEADER}A,t,EDT,-4.5, 12.0 ,-3\n");
        let table = ProductTable::from_csv_bytes(csv, &LoadOptions::default()).unwrap();
        let r = table.records().unwrap().next().unwrap();
        assert_eq!((r.price, r.sold, r.available), (-4.5, 12, -3));
    }

    #[test]
    fn test_malformed_row_strict() {
        let csv = format!("{HEADER}A,t1,EDT,10,5,5\nB,t2,EDP,30,,0\n");
        let err = ProductTable::from_csv_bytes(csv, &LoadOptions::default()).unwrap_err();
        match err {
            ProcessorError::Malformed(e) => {
                assert_eq!(e.row, 3);
                assert_eq!(e.column, "sold");
            }
            other => panic!("Expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_rows_skipped_when_lenient() {
        let csv = format!("{HEADER}A,t1,EDT,10,5,5\nB,t2,EDP,abc,1,0\nC,t3\nD,t4,EDT,1,2,3\n");
        let options = LoadOptions {
            skip_malformed_rows: true,
        };
        let table = ProductTable::from_csv_bytes(csv, &options).unwrap();
        assert_eq!(table.row_count(), 2);
        let errors = &table.summary().errors;
        assert_eq!(errors.len(), 2);
        assert_eq!((errors[0].row, errors[0].column.as_str()), (3, "price"));
        assert_eq!(errors[1].row, 4);
        let brands: Vec<_> = table.records().unwrap().map(|r| r.brand.into_owned()).collect();
        assert_eq!(brands, vec!["A", "D"]);
    }

    #[test]
    fn test_sum_product() {
        let csv = format!("{HEADER}A,t1,EDT,10,5,5\nB,t2,EDP,30,0,0\nC,t3,EDP,2.5,4,0\n");
        let table = make_table_from_str(&csv);
        let revenue = table.sum_product(Field::Price, Field::Sold).unwrap();
        assert!((revenue - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_stray_quote_in_title_is_literal() {
        let csv = format!(
            "{HEADER}Dior,Sauvage 3.4\" spray,EDT,10,5,5\nChanel,Bleu,EDP,30,2,1\nVersace,Eros,EDT,45,1,0\n"
        );
        let table = ProductTable::from_csv_bytes(csv, &LoadOptions::default()).unwrap();
        assert_eq!(table.row_count(), 3);
        let titles: Vec<_> = table.records().unwrap().map(|r| r.title.into_owned()).collect();
        assert_eq!(titles, vec!["Sauvage 3.4\" spray", "Bleu", "Eros"]);
    }

    /// 203 listings, every 17th one (from the 6th) with an unparseable price
    fn batched_csv() -> (String, Vec<String>, Vec<usize>) {
        let mut csv = HEADER.to_string();
        let mut brands = Vec::new();
        let mut bad_records = Vec::new();
        for i in 0..203 {
            if i % 17 == 5 {
                csv.push_str(&format!("B{i},t{i},EDT,x,{i},1\n"));
                bad_records.push(i + 2);
            } else {
                csv.push_str(&format!("B{i},t{i},EDT,1.5,{i},1\n"));
                brands.push(format!("B{i}"));
            }
        }
        (csv, brands, bad_records)
    }

    fn assert_batches_merged_in_order() {
        let (csv, brands, bad_records) = batched_csv();
        let options = LoadOptions {
            skip_malformed_rows: true,
        };
        let table = ProductTable::from_csv_bytes(csv.clone(), &options).unwrap();

        let loaded: Vec<_> = table.records().unwrap().map(|r| r.brand.into_owned()).collect();
        assert_eq!(loaded, brands);
        let errors: Vec<_> = table.summary().errors.iter().map(|e| e.row).collect();
        assert_eq!(errors, bad_records);
        assert!(table.summary().errors.iter().all(|e| e.column == "price"));

        let strict = ProductTable::from_csv_bytes(csv, &LoadOptions::default()).unwrap_err();
        assert!(matches!(strict, ProcessorError::Malformed(ref e) if e.row == bad_records[0]));
    }

    #[test]
    fn test_record_order_and_error_rows() {
        assert_batches_merged_in_order();
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_batches_match_sequential_order() {
        // more rows than threads, so several batches get merged
        let pool = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();
        pool.install(assert_batches_merged_in_order);
    }
}
