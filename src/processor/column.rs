use crate::processor::ProcessorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Float64,
    Str,
}

impl ColumnType {
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Int64 => "integer",
            ColumnType::Float64 => "float",
            ColumnType::Str => "text",
        }
    }
}

/// The columns every product listing file must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Brand,
    Title,
    Type,
    Price,
    Sold,
    Available,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Brand,
        Field::Title,
        Field::Type,
        Field::Price,
        Field::Sold,
        Field::Available,
    ];

    /// Header name in the source file
    pub fn name(self) -> &'static str {
        match self {
            Field::Brand => "brand",
            Field::Title => "title",
            Field::Type => "type",
            Field::Price => "price",
            Field::Sold => "sold",
            Field::Available => "available",
        }
    }

    pub fn column_type(self) -> ColumnType {
        match self {
            Field::Brand | Field::Title | Field::Type => ColumnType::Str,
            Field::Price => ColumnType::Float64,
            Field::Sold | Field::Available => ColumnType::Int64,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone)]
pub enum Column {
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Str(Vec<(usize, usize)>), // Absolute offsets into the table buffer
}

impl Column {
    pub fn new(col_type: ColumnType) -> Self {
        Self::with_capacity(col_type, 0)
    }

    pub fn with_capacity(col_type: ColumnType, capacity: usize) -> Self {
        match col_type {
            ColumnType::Int64 => Column::Int64(Vec::with_capacity(capacity)),
            ColumnType::Float64 => Column::Float64(Vec::with_capacity(capacity)),
            ColumnType::Str => Column::Str(Vec::with_capacity(capacity)),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Int64(_) => ColumnType::Int64,
            Column::Float64(_) => ColumnType::Float64,
            Column::Str(_) => ColumnType::Str,
        }
    }

    /// Moves the values of a parsed batch onto the end of this column
    pub fn append(&mut self, batch: Column) -> Result<(), ProcessorError> {
        match (self, batch) {
            (Column::Int64(values), Column::Int64(mut more)) => values.append(&mut more),
            (Column::Float64(values), Column::Float64(mut more)) => values.append(&mut more),
            (Column::Str(values), Column::Str(mut more)) => values.append(&mut more),
            (this, other) => {
                return Err(ProcessorError::Parse(format!(
                    "cannot append {} batch to {} column",
                    other.column_type().name(),
                    this.column_type().name()
                )));
            }
        }
        Ok(())
    }

    pub fn as_i64(&self) -> Option<&[i64]> {
        match self {
            Column::Int64(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match self {
            Column::Float64(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_offsets(&self) -> Option<&[(usize, usize)]> {
        match self {
            Column::Str(values) => Some(values),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int64(values) => values.len(),
            Column::Float64(values) => values.len(),
            Column::Str(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
