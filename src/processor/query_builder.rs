use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::processor::column::{Column, Field};
use crate::processor::product_table::{ProductRecord, ProductTable};
use crate::processor::{AggregateOp, AggregateResult, ProcessorError};

/// What rows are grouped on
#[derive(Debug, Clone, Copy)]
pub enum GroupKey {
    /// A text column
    Column(Field),
    /// A key computed from each record, e.g. a price bucket
    Derived(fn(&ProductRecord<'_>) -> String),
}

/// What rows are ordered on
#[derive(Debug, Clone, Copy)]
pub enum OrderKey {
    /// A numeric column
    Column(Field),
    Derived(fn(&ProductRecord<'_>) -> f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn compare(self, a: f64, b: f64) -> Ordering {
        match self {
            SortOrder::Ascending => a.total_cmp(&b),
            SortOrder::Descending => b.total_cmp(&a),
        }
    }
}

/// One group of a grouped query
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub key: String,
    /// Member rows in source order
    pub rows: Vec<usize>,
    /// (measure name, value) in the order the aggregations were added
    pub measures: Vec<(String, AggregateResult)>,
}

impl GroupRow {
    pub fn measure(&self, name: &str) -> Result<AggregateResult, ProcessorError> {
        self.measures
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .ok_or_else(|| ProcessorError::MissingMeasure(name.to_string()))
    }
}

/// Query builder over a loaded [`ProductTable`]
///
/// Groups come out in lexicographic key order and rows in source order. All
/// ordering is a stable sort on top of that, so ties keep the earlier group
/// or row.
///
/// ```rust
/// # use listing_report::{Field, LoadOptions, ProductTable};
/// # use listing_report::processor::{AggregateOp, query_builder::SortOrder};
/// # let csv = "brand,title,type,price,sold,available\nA,x,EDT,1,5,0\nB,y,EDT,2,9,1\n";
/// # let table = ProductTable::from_csv_bytes(csv, &LoadOptions::default()).unwrap();
/// let brands = table
///     .query()
///     .group_by(Field::Brand)
///     .aggregate_as(Field::Sold, AggregateOp::Sum, "total_sold")
///     .order_by_measure("total_sold", SortOrder::Descending)
///     .limit(10)
///     .grouped()
///     .unwrap();
/// assert_eq!(brands[0].key, "B");
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    table: &'a ProductTable,
    group_key: Option<GroupKey>,
    aggregations: Vec<(Field, AggregateOp, Option<String>)>, // (column, op, alias)
    row_order: Option<(OrderKey, SortOrder)>,
    group_order: Option<(String, SortOrder)>,
    limit: Option<usize>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(table: &'a ProductTable) -> Self {
        Self {
            table,
            group_key: None,
            aggregations: Vec::new(),
            row_order: None,
            group_order: None,
            limit: None,
        }
    }

    /// Group on a text column
    pub fn group_by(mut self, field: Field) -> Self {
        self.group_key = Some(GroupKey::Column(field));
        self
    }

    /// Group on a key computed per record
    pub fn group_by_derived(mut self, key: fn(&ProductRecord<'_>) -> String) -> Self {
        self.group_key = Some(GroupKey::Derived(key));
        self
    }

    /// Add an aggregation named `<column>_<op>`
    pub fn aggregate(mut self, field: Field, op: AggregateOp) -> Self {
        self.aggregations.push((field, op, None));
        self
    }

    /// Add an aggregation with a custom alias
    pub fn aggregate_as(mut self, field: Field, op: AggregateOp, alias: &str) -> Self {
        self.aggregations.push((field, op, Some(alias.to_string())));
        self
    }

    /// Order rows by a numeric column
    pub fn order_by(mut self, field: Field, order: SortOrder) -> Self {
        self.row_order = Some((OrderKey::Column(field), order));
        self
    }

    /// Order rows by a value computed per record
    pub fn order_by_derived(mut self, key: fn(&ProductRecord<'_>) -> f64, order: SortOrder) -> Self {
        self.row_order = Some((OrderKey::Derived(key), order));
        self
    }

    /// Order groups by one of their measures
    pub fn order_by_measure(mut self, measure: &str, order: SortOrder) -> Self {
        self.group_order = Some((measure.to_string(), order));
        self
    }

    /// Limit number of results
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Execute as a grouped query
    pub fn grouped(self) -> Result<Vec<GroupRow>, ProcessorError> {
        let key = self
            .group_key
            .ok_or_else(|| ProcessorError::Parse("Grouped query needs a group key".into()))?;

        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        match key {
            GroupKey::Column(field) => {
                let offsets = match self.table.column(field) {
                    Column::Str(offsets) => offsets,
                    _ => {
                        return Err(ProcessorError::Parse(format!(
                            "Group-by column '{}' must be string",
                            field.name()
                        )));
                    }
                };
                for (row, &o) in offsets.iter().enumerate() {
                    let key = self.table.get_string(o).into_owned();
                    groups.entry(key).or_default().push(row);
                }
            }
            GroupKey::Derived(key_fn) => {
                for record in self.table.records()? {
                    groups.entry(key_fn(&record)).or_default().push(record.row);
                }
            }
        }

        let names: Vec<String> = self
            .aggregations
            .iter()
            .map(|(field, op, alias)| measure_name(*field, *op, alias.as_deref()))
            .collect();

        let mut result = Vec::with_capacity(groups.len());
        for (key, rows) in groups {
            let mut measures = Vec::with_capacity(self.aggregations.len());
            for ((field, op, _), name) in self.aggregations.iter().zip(&names) {
                let value = self.table.aggregate_rows(*field, *op, &rows)?;
                measures.push((name.clone(), value));
            }
            result.push(GroupRow {
                key,
                rows,
                measures,
            });
        }

        if let Some((measure, order)) = &self.group_order {
            let idx = names
                .iter()
                .position(|n| n == measure)
                .ok_or_else(|| ProcessorError::MissingMeasure(measure.clone()))?;
            result.sort_by(|a, b| {
                order.compare(a.measures[idx].1.as_f64(), b.measures[idx].1.as_f64())
            });
        }

        if let Some(n) = self.limit {
            result.truncate(n);
        }

        Ok(result)
    }

    /// Execute as a row selection, returning row indices
    pub fn rows(self) -> Result<Vec<usize>, ProcessorError> {
        let mut rows: Vec<usize> = (0..self.table.row_count()).collect();

        if let Some((key, order)) = self.row_order {
            let values: Vec<f64> = match key {
                OrderKey::Column(field) => match self.table.column(field) {
                    Column::Int64(values) => values.iter().map(|&v| v as f64).collect(),
                    Column::Float64(values) => values.clone(),
                    Column::Str(_) => {
                        return Err(ProcessorError::Parse(format!(
                            "Cannot order by string column '{}'",
                            field.name()
                        )));
                    }
                },
                OrderKey::Derived(key_fn) => self.table.records()?.map(|r| key_fn(&r)).collect(),
            };
            rows.sort_by(|&a, &b| order.compare(values[a], values[b]));
        }

        if let Some(n) = self.limit {
            rows.truncate(n);
        }

        Ok(rows)
    }
}

fn measure_name(field: Field, op: AggregateOp, alias: Option<&str>) -> String {
    alias
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}_{:?}", field.name(), op).to_lowercase())
}

impl ProductTable {
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(self)
    }
}
