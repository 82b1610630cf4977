//! Table to Arrow IPC stream transcoding.
//!
//! [`encode`] turns a [`Table`] into a self-describing Arrow IPC *stream*:
//! a schema message, one record batch holding every row, and the
//! end-of-stream marker. The buffer is fully materialized in memory and
//! returned as immutable [`Bytes`]; any standard Arrow stream reader
//! (including [`decode`]) can read it back.
//!
//! 64-bit integer columns are narrowed to 32 bits before encoding because the
//! renderer indexes points with 32-bit integers. The [`IntNarrowing`] policy
//! decides what happens to values outside the 32-bit range.

use std::{io::Cursor, sync::Arc};

use arrow::{
    array::{ArrayRef, AsArray, RecordBatch},
    datatypes::{DataType, Field, Int32Type, Int64Type, Schema, SchemaRef},
    ipc::{reader::StreamReader, writer::StreamWriter},
};
use bytes::Bytes;

use crate::{
    error::{Error, Result},
    table::Table,
};

/// What to do with 64-bit integer columns when encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntNarrowing {
    /// Truncate to the low 32 bits (two's complement), like a dataframe
    /// `astype("int32")`. Out-of-range values change and are reported with a
    /// `warn` event.
    #[default]
    Wrapping,
    /// Fail the encode with [`Error::Schema`] if any value is out of range.
    Checked,
    /// Keep 64-bit integers as they are.
    Preserve,
}

impl std::str::FromStr for IntNarrowing {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "wrapping" => Ok(Self::Wrapping),
            "checked" => Ok(Self::Checked),
            "preserve" => Ok(Self::Preserve),
            other => Err(Error::invalid_config(format!(
                "unknown integer narrowing policy '{}' (expected wrapping, checked or preserve)",
                other
            ))),
        }
    }
}

/// Encodes tables into Arrow IPC streams.
///
/// # Example
///
/// ```
/// use cosmolink::{Column, IntNarrowing, Table, Transcoder};
///
/// let table = Table::new(vec![Column::new("id", vec![1_i64, 2, 3])]).unwrap();
/// let bytes = Transcoder::new()
///     .int_narrowing(IntNarrowing::Checked)
///     .encode(&table)
///     .unwrap();
/// let decoded = cosmolink::decode(&bytes).unwrap();
/// assert_eq!(decoded.num_rows(), 3);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Transcoder {
    narrowing: IntNarrowing,
}

impl Transcoder {
    /// Creates a transcoder with the default [`IntNarrowing::Wrapping`]
    /// policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the integer narrowing policy.
    #[must_use]
    pub fn int_narrowing(mut self, narrowing: IntNarrowing) -> Self {
        self.narrowing = narrowing;
        self
    }

    /// Returns the integer narrowing policy.
    pub fn narrowing(&self) -> IntNarrowing {
        self.narrowing
    }

    /// Encodes `table` as an Arrow IPC stream.
    ///
    /// A table with zero rows produces a schema-only stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if checked narrowing finds an out-of-range
    /// value, or [`Error::Encoding`] if the stream cannot be written or
    /// finalized.
    pub fn encode(&self, table: &Table) -> Result<Bytes> {
        let batch = self.narrow(table.batch())?;
        let schema = batch.schema();

        let mut sink = Vec::new();
        {
            let mut writer = StreamWriter::try_new(&mut sink, &schema)
                .map_err(|e| Error::encoding(format!("cannot open stream writer: {}", e)))?;
            if batch.num_rows() > 0 {
                writer
                    .write(&batch)
                    .map_err(|e| Error::encoding(format!("cannot write record batch: {}", e)))?;
            }
            writer
                .finish()
                .map_err(|e| Error::encoding(format!("cannot finalize stream: {}", e)))?;
        }

        tracing::debug!(
            rows = batch.num_rows(),
            columns = batch.num_columns(),
            bytes = sink.len(),
            "encoded table as IPC stream"
        );
        Ok(Bytes::from(sink))
    }

    /// Applies the narrowing policy to every 64-bit integer column.
    fn narrow(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        if self.narrowing == IntNarrowing::Preserve {
            return Ok(batch.clone());
        }

        let schema = batch.schema();
        if !schema
            .fields()
            .iter()
            .any(|f| f.data_type() == &DataType::Int64)
        {
            return Ok(batch.clone());
        }

        let mut fields = Vec::with_capacity(schema.fields().len());
        let mut arrays = Vec::with_capacity(schema.fields().len());

        for (field, column) in schema.fields().iter().zip(batch.columns()) {
            if field.data_type() == &DataType::Int64 {
                arrays.push(self.narrow_column(field.name(), column)?);
                fields.push(Field::new(field.name(), DataType::Int32, field.is_nullable()));
            } else {
                arrays.push(Arc::clone(column));
                fields.push(field.as_ref().clone());
            }
        }

        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
            .map_err(|e| Error::encoding(format!("narrowed batch does not match schema: {}", e)))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn narrow_column(&self, name: &str, column: &ArrayRef) -> Result<ArrayRef> {
        let values = column.as_primitive::<Int64Type>();
        let mut out_of_range = values
            .iter()
            .flatten()
            .filter(|v| i32::try_from(*v).is_err());

        match self.narrowing {
            IntNarrowing::Checked => {
                if let Some(value) = out_of_range.next() {
                    return Err(Error::schema(format!(
                        "column '{}' value {} does not fit in a 32-bit integer",
                        name, value
                    )));
                }
            }
            IntNarrowing::Wrapping => {
                let count = out_of_range.count();
                if count > 0 {
                    tracing::warn!(
                        column = name,
                        values = count,
                        "64-bit integers outside the 32-bit range were truncated"
                    );
                }
            }
            IntNarrowing::Preserve => return Ok(Arc::clone(column)),
        }

        let narrowed = values.unary::<_, Int32Type>(|v| v as i32);
        Ok(Arc::new(narrowed))
    }
}

/// Encodes `table` with the default transcoder.
///
/// # Errors
///
/// See [`Transcoder::encode`].
pub fn encode(table: &Table) -> Result<Bytes> {
    Transcoder::default().encode(table)
}

/// A decoded IPC stream.
#[derive(Debug, Clone)]
pub struct Decoded {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl Decoded {
    /// Schema carried by the stream header.
    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    /// Record batches in stream order.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total rows across all batches.
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> Vec<&str> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    /// Concatenates the batches into a [`Table`].
    ///
    /// # Errors
    ///
    /// Returns an error if the stream holds a column type tables cannot
    /// store.
    pub fn to_table(&self) -> Result<Table> {
        Table::from_batches(self.schema(), &self.batches)
    }
}

/// Reads an Arrow IPC stream produced by [`encode`] (or any other writer).
///
/// # Errors
///
/// Returns [`Error::Encoding`] if the bytes are not a valid IPC stream.
pub fn decode(bytes: &[u8]) -> Result<Decoded> {
    let reader = StreamReader::try_new(Cursor::new(bytes), None)
        .map_err(|e| Error::encoding(format!("cannot read stream header: {}", e)))?;
    let schema = reader.schema();

    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::encoding(format!("cannot read record batch: {}", e)))?;

    Ok(Decoded { schema, batches })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use arrow::array::{Array, Int32Array, Int64Array, StringArray};
    use tracing::field::Visit;
    use tracing_subscriber::{
        layer::{Context, SubscriberExt},
        Layer,
    };

    use super::*;
    use crate::table::{Column, ScalarType};

    fn id_label_table() -> Table {
        Table::new(vec![
            Column::new("id", vec![1_i64, 2, 3]),
            Column::new("label", vec!["a", "b", "c"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_roundtrip_narrows_id_column() {
        let bytes = encode(&id_label_table()).unwrap();
        let decoded = decode(&bytes).unwrap();

        assert_eq!(decoded.column_names(), vec!["id", "label"]);
        assert_eq!(decoded.num_rows(), 3);
        assert_eq!(decoded.batches().len(), 1);

        let table = decoded.to_table().unwrap();
        assert_eq!(
            table.scalar_schema(),
            vec![
                ("id".to_string(), ScalarType::Int32),
                ("label".to_string(), ScalarType::Utf8),
            ]
        );

        let ids = table.column("id").unwrap().as_primitive::<Int32Type>();
        assert_eq!(ids, &Int32Array::from(vec![1, 2, 3]));
        let labels = table.column("label").unwrap().as_string::<i32>();
        assert_eq!(labels, &StringArray::from(vec!["a", "b", "c"]));
    }

    #[test]
    fn test_empty_table_is_schema_only() {
        let table = Table::new(vec![
            Column::new("id", Vec::<i64>::new()),
            Column::new("x", Vec::<f64>::new()),
        ])
        .unwrap();

        let decoded = decode(&encode(&table).unwrap()).unwrap();
        assert!(decoded.batches().is_empty());
        assert_eq!(decoded.num_rows(), 0);
        assert_eq!(decoded.column_names(), vec!["id", "x"]);
        assert_eq!(decoded.schema().field(0).data_type(), &DataType::Int32);
        assert!(decoded.to_table().unwrap().is_empty());
    }

    #[test]
    fn test_encode_is_deterministic() {
        let table = id_label_table();
        assert_eq!(encode(&table).unwrap(), encode(&table).unwrap());
    }

    #[test]
    fn test_wrapping_truncates_out_of_range_values() {
        let table = Table::new(vec![Column::new(
            "n",
            vec![Some(3_000_000_000_i64), None, Some(-5)],
        )])
        .unwrap();

        let decoded = decode(&encode(&table).unwrap()).unwrap();
        let values = decoded.batches()[0].column(0).as_primitive::<Int32Type>();
        assert_eq!(values.value(0), 3_000_000_000_i64 as i32);
        assert!(values.is_null(1));
        assert_eq!(values.value(2), -5);
    }

    /// Records `(column, values)` of every WARN event.
    #[derive(Clone, Default)]
    struct WarnCapture(Arc<Mutex<Vec<(String, u64)>>>);

    #[derive(Default)]
    struct NarrowingFields {
        column: String,
        values: u64,
    }

    impl Visit for NarrowingFields {
        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            if field.name() == "column" {
                self.column = value.to_string();
            }
        }

        fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
            if field.name() == "values" {
                self.values = value;
            }
        }

        fn record_debug(&mut self, _field: &tracing::field::Field, _value: &dyn std::fmt::Debug) {}
    }

    impl<S: tracing::Subscriber> Layer<S> for WarnCapture {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() != tracing::Level::WARN {
                return;
            }
            let mut fields = NarrowingFields::default();
            event.record(&mut fields);
            self.0.lock().unwrap().push((fields.column, fields.values));
        }
    }

    #[test]
    fn test_wrapping_reports_out_of_range_count() {
        let table = Table::new(vec![
            Column::new("big", vec![Some(i64::MAX), Some(1), None, Some(-5_000_000_000)]),
            Column::new("small", vec![1_i64, -2, 3, 4]),
        ])
        .unwrap();

        let capture = WarnCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        tracing::subscriber::with_default(subscriber, || {
            Transcoder::new().encode(&table).unwrap();
        });

        let warnings = capture.0.lock().unwrap().clone();
        assert_eq!(warnings, vec![("big".to_string(), 2)]);
    }

    #[test]
    fn test_in_range_narrowing_is_quiet() {
        let table = Table::new(vec![Column::new("id", vec![1_i64, 2, 3])]).unwrap();

        let capture = WarnCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        tracing::subscriber::with_default(subscriber, || {
            Transcoder::new().encode(&table).unwrap();
            Transcoder::new()
                .int_narrowing(IntNarrowing::Preserve)
                .encode(&Table::new(vec![Column::new("id", vec![i64::MAX])]).unwrap())
                .unwrap();
        });

        assert!(capture.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_narrowing_accessor() {
        assert_eq!(Transcoder::new().narrowing(), IntNarrowing::Wrapping);
        assert_eq!(
            Transcoder::new().int_narrowing(IntNarrowing::Checked).narrowing(),
            IntNarrowing::Checked
        );
    }

    #[test]
    fn test_checked_rejects_out_of_range_values() {
        let table = Table::new(vec![Column::new("n", vec![1_i64, i64::MAX])]).unwrap();
        let err = Transcoder::new()
            .int_narrowing(IntNarrowing::Checked)
            .encode(&table)
            .unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
        assert!(err.to_string().contains("column 'n'"));
    }

    #[test]
    fn test_checked_accepts_in_range_values() {
        let table = Table::new(vec![Column::new("n", vec![i64::from(i32::MIN), 0])]).unwrap();
        let bytes = Transcoder::new()
            .int_narrowing(IntNarrowing::Checked)
            .encode(&table)
            .unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.schema().field(0).data_type(), &DataType::Int32);
    }

    #[test]
    fn test_preserve_keeps_int64() {
        let table = Table::new(vec![Column::new("n", vec![i64::MAX])]).unwrap();
        let bytes = Transcoder::new()
            .int_narrowing(IntNarrowing::Preserve)
            .encode(&table)
            .unwrap();
        let decoded = decode(&bytes).unwrap();
        let values = decoded.batches()[0].column(0).as_primitive::<Int64Type>();
        assert_eq!(values, &Int64Array::from(vec![i64::MAX]));
    }

    #[test]
    fn test_non_integer_columns_untouched() {
        let table = Table::new(vec![
            Column::new("x", vec![0.25, 0.5]),
            Column::new("flag", vec![true, false]),
            Column::new("small", vec![7_i32, 8]),
        ])
        .unwrap();
        let decoded = decode(&encode(&table).unwrap()).unwrap();
        assert_eq!(decoded.to_table().unwrap(), table);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode(b"definitely not arrow").unwrap_err();
        assert!(matches!(err, Error::Encoding { .. }));
    }

    #[test]
    fn test_narrowing_from_str() {
        assert_eq!("checked".parse::<IntNarrowing>().unwrap(), IntNarrowing::Checked);
        assert_eq!("wrapping".parse::<IntNarrowing>().unwrap(), IntNarrowing::Wrapping);
        assert_eq!("preserve".parse::<IntNarrowing>().unwrap(), IntNarrowing::Preserve);
        assert!("saturating".parse::<IntNarrowing>().is_err());
    }
}
