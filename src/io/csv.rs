//! Semicolon-delimited CSV reading and writing.
//!
//! Every column is read as a string: the source exports mix zero-padded codes,
//! percentages and locale-specific decimals, so typed parsing happens at the
//! point of use.

use std::{fs, fs::File, path::Path};

use anyhow::{Context, Result};
use polars::{
    frame::DataFrame,
    io::{SerReader, SerWriter},
    prelude::{CsvReadOptions, CsvWriter, StringChunked},
};

/// Reads a `;`-separated CSV file with a header row into a Polars DataFrame.
pub(crate) fn read_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv] Failed to open CSV file: {}", path.display()))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|po| po.with_separator(b';'))
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[io::csv] Failed to read CSV from {:?}", path))
}

/// Writes a DataFrame as a `;`-separated CSV file, creating parent directories.
pub(crate) fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).with_context(|| {
                format!("[io::csv] Failed to create output directory: {}", dir.display())
            })?;
        }
    }
    let file = File::create(path)
        .with_context(|| format!("[io::csv] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(file)
        .with_separator(b';')
        .finish(df)
        .with_context(|| format!("[io::csv] Failed to write CSV to {:?}", path))
}

/// Borrow a column as strings, with a readable error when it is absent.
pub(crate) fn str_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    df.column(name)
        .with_context(|| format!("[io::csv] Missing column {name:?}"))?
        .str()
        .with_context(|| format!("[io::csv] Column {name:?} is not a string column"))
}
