//! Basic CLI commands for encoding and inspection.

use std::path::{Path, PathBuf};

use arrow::util::pretty::print_batches;

use crate::{decode, Error, IntNarrowing, Transcoder, Table, WidgetConfig};

/// Default output path for an encoded table.
pub(crate) fn default_output(input: &Path) -> PathBuf {
    input.with_extension("arrows")
}

/// Encode a table file as an Arrow IPC stream.
pub(crate) fn cmd_encode(
    input: &Path,
    output: Option<&Path>,
    narrowing: IntNarrowing,
) -> crate::Result<()> {
    let table = Table::from_path(input)?;
    let bytes = Transcoder::new().int_narrowing(narrowing).encode(&table)?;

    let output = output.map_or_else(|| default_output(input), Path::to_path_buf);
    std::fs::write(&output, &bytes).map_err(|e| Error::io(e, &output))?;

    println!(
        "Encoded {} -> {} ({} rows, {} bytes)",
        input.display(),
        output.display(),
        table.num_rows(),
        bytes.len()
    );

    Ok(())
}

/// Display the schema and first N rows of an Arrow IPC stream.
pub(crate) fn cmd_inspect(path: &Path, rows: usize) -> crate::Result<()> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(e, path))?;
    let decoded = decode(&bytes)?;

    println!("File: {}", path.display());
    println!("Rows: {}", decoded.num_rows());
    println!("Batches: {}", decoded.batches().len());
    println!("Columns:");
    for (i, field) in decoded.schema().fields().iter().enumerate() {
        println!("  {}: {} ({})", i, field.name(), field.data_type());
    }

    if decoded.num_rows() == 0 {
        println!("Stream has no rows");
        return Ok(());
    }

    let mut collected = Vec::new();
    let mut count = 0;
    for batch in decoded.batches() {
        let take = (rows - count).min(batch.num_rows());
        if take > 0 {
            collected.push(batch.slice(0, take));
            count += take;
        }
        if count >= rows {
            break;
        }
    }

    if !collected.is_empty() {
        println!();
        print_batches(&collected).map_err(Error::Arrow)?;
    }

    if count < decoded.num_rows() {
        println!("... showing {} of {} rows", count, decoded.num_rows());
    }

    Ok(())
}

/// Validate a widget config file and list its set fields.
pub(crate) fn cmd_config(path: &Path) -> crate::Result<()> {
    let config = WidgetConfig::from_json_file(path)?;
    let entries = config.entries();

    println!("Config: {}", path.display());
    println!("Fields set: {} of {}", entries.len(), WidgetConfig::FIELDS.len());
    for (name, value) in entries {
        let kind = WidgetConfig::kind_of(name).map_or_else(String::new, |k| k.to_string());
        println!("  {} ({}) = {}", name, kind, value.to_json());
    }

    Ok(())
}
