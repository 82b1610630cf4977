//! Tabular input for the transcoder.
//!
//! A [`Table`] is an ordered set of named, uniformly typed columns backed by a
//! single Arrow [`RecordBatch`]. Every construction path (typed columns, JSON
//! records, Arrow batches, CSV / JSON Lines / Parquet files) normalizes the
//! column types onto the small set of [`ScalarType`]s the renderer accepts and
//! rejects anything else with [`Error::Schema`].

use std::{collections::HashSet, path::Path, sync::Arc};

use arrow::{
    array::{ArrayRef, BooleanArray, Float64Array, Int32Array, Int64Array, RecordBatch, StringArray},
    compute::{
        concat_batches,
        kernels::cast::{cast_with_options, CastOptions},
    },
    datatypes::{DataType, Field, Schema, SchemaRef},
};
use serde_json::Value;

use crate::error::{Error, Result};

/// Scalar type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer. Narrowed by the transcoder.
    Int64,
    /// 64-bit float.
    Float64,
    /// UTF-8 string.
    Utf8,
    /// Boolean.
    Boolean,
}

impl ScalarType {
    /// The Arrow type used to store columns of this scalar type.
    pub fn data_type(self) -> DataType {
        match self {
            Self::Int32 => DataType::Int32,
            Self::Int64 => DataType::Int64,
            Self::Float64 => DataType::Float64,
            Self::Utf8 => DataType::Utf8,
            Self::Boolean => DataType::Boolean,
        }
    }

    /// Maps a canonical Arrow type back to its scalar type.
    ///
    /// Returns `None` for types a [`Table`] never stores.
    pub fn from_data_type(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Int32 => Some(Self::Int32),
            DataType::Int64 => Some(Self::Int64),
            DataType::Float64 => Some(Self::Float64),
            DataType::Utf8 => Some(Self::Utf8),
            DataType::Boolean => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Whether this is an integer type.
    pub fn is_integer(self) -> bool {
        matches!(self, Self::Int32 | Self::Int64)
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Utf8 => "string",
            Self::Boolean => "bool",
        };
        f.write_str(name)
    }
}

/// Values of a single column. `None` entries are nulls.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// 32-bit integers.
    Int32(Vec<Option<i32>>),
    /// 64-bit integers.
    Int64(Vec<Option<i64>>),
    /// 64-bit floats.
    Float64(Vec<Option<f64>>),
    /// Strings.
    Utf8(Vec<Option<String>>),
    /// Booleans.
    Boolean(Vec<Option<bool>>),
}

impl ColumnData {
    /// Number of values in the column.
    pub fn len(&self) -> usize {
        match self {
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::Utf8(v) => v.len(),
            Self::Boolean(v) => v.len(),
        }
    }

    /// Returns true if the column holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scalar type of the column.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Self::Int32(_) => ScalarType::Int32,
            Self::Int64(_) => ScalarType::Int64,
            Self::Float64(_) => ScalarType::Float64,
            Self::Utf8(_) => ScalarType::Utf8,
            Self::Boolean(_) => ScalarType::Boolean,
        }
    }

    fn into_array(self) -> ArrayRef {
        match self {
            Self::Int32(v) => Arc::new(Int32Array::from(v)),
            Self::Int64(v) => Arc::new(Int64Array::from(v)),
            Self::Float64(v) => Arc::new(Float64Array::from(v)),
            Self::Utf8(v) => Arc::new(StringArray::from(v)),
            Self::Boolean(v) => Arc::new(BooleanArray::from(v)),
        }
    }
}

macro_rules! impl_column_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for ColumnData {
                fn from(values: Vec<$ty>) -> Self {
                    Self::$variant(values.into_iter().map(|v| Some(v.into())).collect())
                }
            }

            impl From<Vec<Option<$ty>>> for ColumnData {
                fn from(values: Vec<Option<$ty>>) -> Self {
                    Self::$variant(values.into_iter().map(|v| v.map(Into::into)).collect())
                }
            }
        )*
    };
}

impl_column_from! {
    i32 => Int32,
    i64 => Int64,
    f64 => Float64,
    String => Utf8,
    &str => Utf8,
    bool => Boolean,
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Creates a column from a name and its values.
    pub fn new(name: impl Into<String>, data: impl Into<ColumnData>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column values.
    pub fn data(&self) -> &ColumnData {
        &self.data
    }
}

/// An immutable, validated table of uniformly typed columns.
///
/// # Example
///
/// ```
/// use cosmolink::{Column, Table};
///
/// let table = Table::new(vec![
///     Column::new("id", vec![1_i64, 2, 3]),
///     Column::new("label", vec!["a", "b", "c"]),
/// ])
/// .unwrap();
/// assert_eq!(table.num_rows(), 3);
/// assert_eq!(table.column_names(), vec!["id", "label"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    batch: RecordBatch,
}

impl Table {
    /// Builds a table from typed columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if there are no columns, a name repeats, or
    /// the columns differ in length.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::schema("a table needs at least one column"));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::schema(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }

        let expected = columns[0].data.len();
        if let Some(bad) = columns.iter().find(|c| c.data.len() != expected) {
            return Err(Error::schema(format!(
                "column '{}' has {} values, expected {}",
                bad.name,
                bad.data.len(),
                expected
            )));
        }

        let fields: Vec<Field> = columns
            .iter()
            .map(|c| Field::new(&c.name, c.data.scalar_type().data_type(), true))
            .collect();
        let arrays: Vec<ArrayRef> = columns.into_iter().map(|c| c.data.into_array()).collect();

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
            .map_err(|e| Error::schema(e.to_string()))?;
        Ok(Self { batch })
    }

    /// Builds a table from JSON records (one object per row).
    ///
    /// Column order follows first appearance of each key. A key missing from
    /// a record is a null. Integers and floats in the same column widen to
    /// float; any other mix of types is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if a record is not an object, a column mixes
    /// incompatible types, holds nested values, or is entirely null.
    pub fn from_records(records: &[Value]) -> Result<Self> {
        let mut names: Vec<String> = Vec::new();
        let mut index = std::collections::HashMap::new();

        for (row, record) in records.iter().enumerate() {
            let object = record
                .as_object()
                .ok_or_else(|| Error::schema(format!("record {} is not an object", row)))?;
            for key in object.keys() {
                if !index.contains_key(key) {
                    index.insert(key.clone(), names.len());
                    names.push(key.clone());
                }
            }
        }

        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let values: Vec<&Value> = records
                .iter()
                .map(|r| r.get(&name).unwrap_or(&Value::Null))
                .collect();
            let data = infer_column(&name, &values)?;
            columns.push(Column { name, data });
        }

        Self::new(columns)
    }

    /// Builds a table from an Arrow record batch.
    ///
    /// Narrow integer and float widths are widened, unsigned integers are
    /// mapped to signed 64-bit, large and dictionary-encoded strings become
    /// plain strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if a column type has no scalar counterpart or
    /// an unsigned value does not fit in 64 signed bits.
    pub fn from_batch(batch: RecordBatch) -> Result<Self> {
        if batch.num_columns() == 0 {
            return Err(Error::schema("a table needs at least one column"));
        }

        let schema = batch.schema();
        let mut fields = Vec::with_capacity(schema.fields().len());
        let mut arrays = Vec::with_capacity(schema.fields().len());

        for (field, array) in schema.fields().iter().zip(batch.columns()) {
            let target = canonical_type(field.name(), field.data_type())?;
            let array = if array.data_type() == &target {
                Arc::clone(array)
            } else {
                let options = CastOptions {
                    safe: false,
                    ..Default::default()
                };
                cast_with_options(array.as_ref(), &target, &options).map_err(|e| {
                    Error::schema(format!(
                        "column '{}' cannot be converted to {}: {}",
                        field.name(),
                        target,
                        e
                    ))
                })?
            };
            fields.push(Field::new(field.name(), target, field.is_nullable()));
            arrays.push(array);
        }

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name().as_str()) {
                return Err(Error::schema(format!(
                    "duplicate column name '{}'",
                    field.name()
                )));
            }
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
            .map_err(|e| Error::schema(e.to_string()))?;
        Ok(Self { batch })
    }

    /// Builds a table from batches sharing `schema`. No batches yields an
    /// empty table with that schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the batches do not match the schema or a column
    /// type is unsupported.
    pub fn from_batches(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Self> {
        let combined = if batches.is_empty() {
            RecordBatch::new_empty(schema)
        } else {
            concat_batches(&schema, batches).map_err(Error::Arrow)?
        };
        Self::from_batch(combined)
    }

    /// Loads a table from a CSV file with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        use std::io::{BufReader, Seek, SeekFrom};

        use arrow_csv::{reader::Format, ReaderBuilder};

        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;
        let mut buf_reader = BufReader::new(file);

        let (inferred, _) = Format::default()
            .with_header(true)
            .infer_schema(&mut buf_reader, Some(1000))
            .map_err(Error::Arrow)?;
        buf_reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::io(e, path))?;

        let schema = Arc::new(inferred);
        let reader = ReaderBuilder::new(Arc::clone(&schema))
            .with_header(true)
            .build(buf_reader)
            .map_err(Error::Arrow)?;

        let batches: Vec<RecordBatch> = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::Arrow)?;

        Self::from_batches(schema, &batches)
    }

    /// Loads a table from a CSV string with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid CSV.
    pub fn from_csv_str(data: &str) -> Result<Self> {
        use std::io::Cursor;

        use arrow_csv::{reader::Format, ReaderBuilder};

        let mut cursor_for_infer = Cursor::new(data.as_bytes());
        let (inferred, _) = Format::default()
            .with_header(true)
            .infer_schema(&mut cursor_for_infer, Some(1000))
            .map_err(Error::Arrow)?;

        let schema = Arc::new(inferred);
        let reader = ReaderBuilder::new(Arc::clone(&schema))
            .with_header(true)
            .build(Cursor::new(data.as_bytes()))
            .map_err(Error::Arrow)?;

        let batches: Vec<RecordBatch> = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::Arrow)?;

        Self::from_batches(schema, &batches)
    }

    /// Loads a table from a JSON Lines file (one object per line).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        use std::io::BufReader;

        use arrow_json::ReaderBuilder;

        let path = path.as_ref();

        let infer_file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;
        let (inferred, _) =
            arrow_json::reader::infer_json_schema(BufReader::new(infer_file), Some(1000))
                .map_err(Error::Arrow)?;
        let schema = Arc::new(inferred);

        let file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;
        let reader = ReaderBuilder::new(Arc::clone(&schema))
            .build(BufReader::new(file))
            .map_err(Error::Arrow)?;

        let batches: Vec<RecordBatch> = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::Arrow)?;

        Self::from_batches(schema, &batches)
    }

    /// Loads a table from a Parquet file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid Parquet.
    pub fn from_parquet(path: impl AsRef<Path>) -> Result<Self> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(Error::Parquet)?;
        let schema = Arc::clone(builder.schema());
        let reader = builder.build().map_err(Error::Parquet)?;

        let batches: Vec<RecordBatch> = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::Arrow)?;

        Self::from_batches(schema, &batches)
    }

    /// Loads a table from a file, choosing the reader by extension
    /// (`csv`, `json`/`jsonl`, `parquet`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for other extensions, or the
    /// loader's error.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
            "csv" => Self::from_csv(path),
            "json" | "jsonl" => Self::from_json(path),
            "parquet" => Self::from_parquet(path),
            ext => Err(Error::unsupported_format(ext)),
        }
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Arrow schema of the table.
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// The backing record batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    /// Column name to scalar type, in column order.
    pub fn scalar_schema(&self) -> Vec<(String, ScalarType)> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .filter_map(|f| {
                ScalarType::from_data_type(f.data_type()).map(|t| (f.name().clone(), t))
            })
            .collect()
    }

    /// Looks up a column by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] if no column has that name.
    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| Error::column_not_found(name))
    }

    /// Rows as JSON objects. Null values are omitted from each object.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON writer fails.
    pub fn to_records(&self) -> Result<Vec<Value>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let mut writer = arrow_json::ArrayWriter::new(Vec::new());
        writer.write(&self.batch).map_err(Error::Arrow)?;
        writer.finish().map_err(Error::Arrow)?;
        let json = writer.into_inner();

        match serde_json::from_slice(&json)? {
            Value::Array(rows) => Ok(rows),
            _ => Err(Error::encoding("JSON writer did not produce an array")),
        }
    }
}

/// Canonical storage type for an incoming Arrow column type.
fn canonical_type(name: &str, data_type: &DataType) -> Result<DataType> {
    let target = match data_type {
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::UInt8 | DataType::UInt16 => {
            DataType::Int32
        }
        DataType::Int64 | DataType::UInt32 | DataType::UInt64 => DataType::Int64,
        DataType::Float16 | DataType::Float32 | DataType::Float64 => DataType::Float64,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => DataType::Utf8,
        DataType::Dictionary(_, value)
            if matches!(value.as_ref(), DataType::Utf8 | DataType::LargeUtf8) =>
        {
            DataType::Utf8
        }
        DataType::Boolean => DataType::Boolean,
        other => {
            return Err(Error::schema(format!(
                "column '{}' has unsupported type {}",
                name, other
            )))
        }
    };
    Ok(target)
}

#[derive(Clone, Copy, PartialEq)]
enum Inferred {
    Int,
    Float,
    Str,
    Bool,
}

fn value_kind(name: &str, value: &Value) -> Result<Option<Inferred>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(_) => Ok(Some(Inferred::Bool)),
        Value::Number(n) if n.is_i64() => Ok(Some(Inferred::Int)),
        Value::Number(_) => Ok(Some(Inferred::Float)),
        Value::String(_) => Ok(Some(Inferred::Str)),
        Value::Array(_) | Value::Object(_) => Err(Error::schema(format!(
            "column '{}' holds nested values",
            name
        ))),
    }
}

fn infer_column(name: &str, values: &[&Value]) -> Result<ColumnData> {
    let mut kind: Option<Inferred> = None;
    for value in values {
        let Some(next) = value_kind(name, value)? else {
            continue;
        };
        kind = match (kind, next) {
            (None, k) => Some(k),
            (Some(a), b) if a == b => Some(a),
            (Some(Inferred::Int), Inferred::Float) | (Some(Inferred::Float), Inferred::Int) => {
                Some(Inferred::Float)
            }
            (Some(_), _) => {
                return Err(Error::schema(format!(
                    "column '{}' mixes incompatible value types",
                    name
                )))
            }
        };
    }

    let data = match kind {
        None => {
            return Err(Error::schema(format!(
                "column '{}' has no non-null values to infer a type from",
                name
            )))
        }
        Some(Inferred::Int) => ColumnData::Int64(values.iter().map(|v| v.as_i64()).collect()),
        Some(Inferred::Float) => ColumnData::Float64(values.iter().map(|v| v.as_f64()).collect()),
        Some(Inferred::Str) => ColumnData::Utf8(
            values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        Some(Inferred::Bool) => ColumnData::Boolean(values.iter().map(|v| v.as_bool()).collect()),
    };
    Ok(data)
}

#[cfg(test)]
mod tests {
    use arrow::{
        array::{Array, Float32Array, LargeStringArray, UInt64Array},
        datatypes::Int8Type,
    };
    use serde_json::json;

    use super::*;

    #[test]
    fn test_new_table_shape() {
        let table = Table::new(vec![
            Column::new("id", vec![1_i64, 2, 3]),
            Column::new("label", vec!["a", "b", "c"]),
            Column::new("score", vec![Some(0.5), None, Some(1.5)]),
        ])
        .unwrap();

        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.num_columns(), 3);
        assert_eq!(
            table.scalar_schema(),
            vec![
                ("id".to_string(), ScalarType::Int64),
                ("label".to_string(), ScalarType::Utf8),
                ("score".to_string(), ScalarType::Float64),
            ]
        );
        assert_eq!(table.column("score").unwrap().null_count(), 1);
    }

    #[test]
    fn test_column_accessors() {
        let column = Column::new("flag", vec![Some(true), None]);
        assert_eq!(column.name(), "flag");
        assert_eq!(column.data(), &ColumnData::Boolean(vec![Some(true), None]));
        assert_eq!(column.data().len(), 2);
        assert_eq!(column.data().scalar_type(), ScalarType::Boolean);
        assert!(!column.data().scalar_type().is_integer());

        let ids = Column::new("id", vec![7_i32]);
        assert!(ids.data().scalar_type().is_integer());
        assert_eq!(ids.data().scalar_type().to_string(), "int32");
    }

    #[test]
    fn test_new_rejects_no_columns() {
        assert!(matches!(Table::new(vec![]), Err(Error::Schema { .. })));
    }

    #[test]
    fn test_new_rejects_duplicate_names() {
        let result = Table::new(vec![
            Column::new("id", vec![1_i32]),
            Column::new("id", vec![2_i32]),
        ]);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("duplicate column name 'id'"));
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let result = Table::new(vec![
            Column::new("a", vec![1_i32, 2]),
            Column::new("b", vec![true]),
        ]);
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
        assert!(err.to_string().contains("column 'b' has 1 values"));
    }

    #[test]
    fn test_zero_row_table() {
        let table = Table::new(vec![
            Column::new("id", Vec::<i32>::new()),
            Column::new("label", Vec::<String>::new()),
        ])
        .unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_names(), vec!["id", "label"]);
        assert!(table.to_records().unwrap().is_empty());
    }

    #[test]
    fn test_column_not_found() {
        let table = Table::new(vec![Column::new("id", vec![1_i32])]).unwrap();
        assert!(matches!(
            table.column("missing"),
            Err(Error::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_from_records_infers_types_in_key_order() {
        let records = vec![
            json!({"id": 1, "label": "a", "weight": 1, "active": true}),
            json!({"id": 2, "label": "b", "weight": 2.5}),
        ];
        let table = Table::from_records(&records).unwrap();

        assert_eq!(table.column_names(), vec!["id", "label", "weight", "active"]);
        assert_eq!(
            table.scalar_schema(),
            vec![
                ("id".to_string(), ScalarType::Int64),
                ("label".to_string(), ScalarType::Utf8),
                ("weight".to_string(), ScalarType::Float64),
                ("active".to_string(), ScalarType::Boolean),
            ]
        );
        assert_eq!(table.column("active").unwrap().null_count(), 1);
    }

    #[test]
    fn test_from_records_rejects_mixed_column() {
        let records = vec![json!({"id": 1}), json!({"id": "two"})];
        let err = Table::from_records(&records).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
        assert!(err.to_string().contains("mixes incompatible"));
    }

    #[test]
    fn test_from_records_rejects_nested_and_non_objects() {
        assert!(Table::from_records(&[json!({"xs": [1, 2]})]).is_err());
        assert!(Table::from_records(&[json!(42)]).is_err());
    }

    #[test]
    fn test_from_records_rejects_all_null_column() {
        let records = vec![json!({"id": 1, "x": null}), json!({"id": 2})];
        let err = Table::from_records(&records).unwrap_err();
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn test_from_batch_normalizes_types() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("small", DataType::Float32, false),
            Field::new("big", DataType::UInt64, false),
            Field::new("name", DataType::LargeUtf8, false),
            Field::new(
                "category",
                DataType::Dictionary(Box::new(DataType::Int8), Box::new(DataType::Utf8)),
                false,
            ),
        ]));
        let category: arrow::array::DictionaryArray<Int8Type> =
            vec!["x", "y"].into_iter().collect();
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Float32Array::from(vec![1.5, 2.5])),
                Arc::new(UInt64Array::from(vec![7, 8])),
                Arc::new(LargeStringArray::from(vec!["a", "b"])),
                Arc::new(category),
            ],
        )
        .unwrap();

        let table = Table::from_batch(batch).unwrap();
        assert_eq!(
            table.scalar_schema(),
            vec![
                ("small".to_string(), ScalarType::Float64),
                ("big".to_string(), ScalarType::Int64),
                ("name".to_string(), ScalarType::Utf8),
                ("category".to_string(), ScalarType::Utf8),
            ]
        );
    }

    #[test]
    fn test_from_batch_rejects_unsigned_overflow() {
        let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::UInt64, false)]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(UInt64Array::from(vec![u64::MAX]))])
                .unwrap();
        assert!(matches!(
            Table::from_batch(batch),
            Err(Error::Schema { .. })
        ));
    }

    #[test]
    fn test_from_batch_rejects_unsupported_type() {
        let schema = Arc::new(Schema::new(vec![Field::new("d", DataType::Date32, false)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(arrow::array::Date32Array::from(vec![1]))],
        )
        .unwrap();
        let err = Table::from_batch(batch).unwrap_err();
        assert!(err.to_string().contains("unsupported type"));
    }

    #[test]
    fn test_from_csv_str() {
        let table = Table::from_csv_str("id,label,x\n1,a,0.5\n2,b,1.5\n").unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column_names(), vec!["id", "label", "x"]);
        assert_eq!(table.scalar_schema()[0].1, ScalarType::Int64);
    }

    #[test]
    fn test_from_csv_header_only_is_empty() {
        let table = Table::from_csv_str("id,label\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.num_columns(), 2);
    }

    #[test]
    fn test_from_path_loaders() {
        let dir = tempfile::tempdir().unwrap();

        let csv_path = dir.path().join("points.csv");
        std::fs::write(&csv_path, "id,label\n1,a\n2,b\n").unwrap();
        assert_eq!(Table::from_path(&csv_path).unwrap().num_rows(), 2);

        let json_path = dir.path().join("links.jsonl");
        std::fs::write(
            &json_path,
            "{\"source\": 1, \"target\": 2}\n{\"source\": 2, \"target\": 3}\n",
        )
        .unwrap();
        let links = Table::from_path(&json_path).unwrap();
        assert_eq!(links.column_names(), vec!["source", "target"]);

        let bad = dir.path().join("points.xlsx");
        assert!(matches!(
            Table::from_path(&bad),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_from_parquet() {
        use parquet::arrow::ArrowWriter;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.parquet");
        let table = Table::new(vec![
            Column::new("id", vec![1_i32, 2]),
            Column::new("x", vec![0.1, 0.2]),
        ])
        .unwrap();

        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, table.schema(), None).unwrap();
        writer.write(table.batch()).unwrap();
        writer.close().unwrap();

        let loaded = Table::from_parquet(&path).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_to_records() {
        let table = Table::new(vec![
            Column::new("id", vec![1_i32, 2]),
            Column::new("label", vec![Some("a"), None]),
        ])
        .unwrap();
        let rows = table.to_records().unwrap();
        assert_eq!(rows, vec![json!({"id": 1, "label": "a"}), json!({"id": 2})]);
    }
}
