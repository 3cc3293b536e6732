//! Triplet export
//!
//! Writes a Triplet Collection as CSV (`subject,relation,object`), a JSON
//! array, or JSON lines.

use std::io::Write;

use sro_core::{OutputFormat, Result, Triplet};

const CSV_HEADER: &str = "subject,relation,object";

/// Write `triplets` to `writer` in `format`
pub fn write_triplets<W: Write>(writer: &mut W, triplets: &[Triplet], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            writeln!(writer, "{CSV_HEADER}")?;
            for t in triplets {
                writeln!(
                    writer,
                    "{},{},{}",
                    csv_field(&t.subject),
                    csv_field(&t.relation),
                    csv_field(&t.object)
                )?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, triplets)?;
            writeln!(writer)?;
        }
        OutputFormat::Jsonl => {
            for t in triplets {
                serde_json::to_writer(&mut *writer, t)?;
                writeln!(writer)?;
            }
        }
    }
    Ok(())
}

/// Render `triplets` in `format`
pub fn to_string(triplets: &[Triplet], format: OutputFormat) -> Result<String> {
    let mut buf = Vec::new();
    write_triplets(&mut buf, triplets, format)?;
    String::from_utf8(buf).map_err(|e| sro_core::SroError::Serialization(e.to_string()))
}

/// Quote a field when it holds a delimiter, quote, or line break
fn csv_field(value: &str) -> std::borrow::Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\"")).into()
    } else {
        value.into()
    }
}
