//! CSV manifests for cross-check runs
//!
//! This module handles the tabular side of a batch:
//! - Reading the input table and mapping its configured columns
//! - Writing the full results manifest (original columns plus scraped fields)
//! - Writing the retry manifest (failed rows only, always written)
//! - Previewing an input table's columns

use crate::batch::row::{non_blank, BatchInput, BatchRow, FailureEntry};
use crate::config::BatchConfig;
use crate::lookup::BankDetails;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

/// Timestamp format used in manifest cells
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Columns appended to every results manifest row
pub const RESULT_COLUMNS: [&str; 9] = [
    "Scraped_Swift_Code",
    "Swift_Codes_Match",
    "Scraped_Bank_Name",
    "Scraped_Country",
    "Scraped_City",
    "Scraped_Branch",
    "Scraped_Address",
    "Scraped_At",
    "Failure_Kind",
];

/// Original row number column of the retry manifest
pub const RETRY_ROW_INDEX_COLUMN: &str = "Row_Index";

/// Prefix for input columns that clash with [`RESULT_COLUMNS`]
pub const PREVIOUS_COLUMN_PREFIX: &str = "Previous_";

/// Identifier column of the retry manifest
pub const RETRY_IDENTIFIER_COLUMN: &str = "IBAN";

/// Expected-code column of the retry manifest
pub const RETRY_EXPECTED_CODE_COLUMN: &str = "Existing_Swift";

/// Errors that can occur while reading or writing manifests
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Column '{column}' not found; available columns: {available:?}")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
}

/// Result type for manifest operations
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Which input columns feed the cross-check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub identifier: String,
    pub expected_code: String,
    pub references: Vec<String>,

    /// Column carrying the original row number, if rows were re-ingested
    pub row_index: Option<String>,
}

impl ColumnMapping {
    /// Mapping for an original input table
    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            identifier: config.identifier_column.clone(),
            expected_code: config.expected_code_column.clone(),
            references: config.reference_columns.clone(),
            row_index: None,
        }
    }

    /// Mapping for re-ingesting a retry manifest written by [`write_failures`]
    pub fn retry_manifest(config: &BatchConfig) -> Self {
        Self {
            identifier: RETRY_IDENTIFIER_COLUMN.to_string(),
            expected_code: RETRY_EXPECTED_CODE_COLUMN.to_string(),
            references: config.reference_columns.clone(),
            row_index: Some(RETRY_ROW_INDEX_COLUMN.to_string()),
        }
    }
}

/// An input table: its header and its rows
#[derive(Debug, Clone, Default)]
pub struct InputTable {
    pub headers: Vec<String>,
    pub rows: Vec<BatchInput>,
}

fn clean_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_string()
}

/// Decodes every cell, replacing bytes that are not valid UTF-8
///
/// Returns the cells and whether any replacement happened.
fn decode_record(record: &csv::ByteRecord) -> (Vec<String>, bool) {
    let mut replaced = false;
    let cells = record
        .iter()
        .map(|field| match String::from_utf8_lossy(field) {
            Cow::Borrowed(text) => text.to_string(),
            Cow::Owned(text) => {
                replaced = true;
                text
            }
        })
        .collect();
    (cells, replaced)
}

fn read_headers<R: Read>(reader: &mut csv::Reader<R>) -> ManifestResult<Vec<String>> {
    let (headers, replaced) = decode_record(reader.byte_headers()?);
    if replaced {
        tracing::warn!("Header row is not valid UTF-8; undecodable bytes replaced");
    }
    Ok(headers.iter().map(|h| clean_header(h)).collect())
}

fn create_output(path: &Path) -> ManifestResult<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(File::create(path)?)
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Reads an input table from a CSV file
///
/// # Returns
///
/// * `Ok(InputTable)` - Header and rows, in file order
/// * `Err(ManifestError)` - The file is unreadable or lacks the identifier column
pub fn read_input(path: &Path, mapping: &ColumnMapping) -> ManifestResult<InputTable> {
    let file = File::open(path)?;
    read_input_from(file, mapping)
}

/// Reads an input table from any CSV source
pub fn read_input_from<R: Read>(source: R, mapping: &ColumnMapping) -> ManifestResult<InputTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(source);

    let headers = read_headers(&mut reader)?;
    let position = |name: &str| headers.iter().position(|h| h == name.trim());

    let identifier_index =
        position(&mapping.identifier).ok_or_else(|| ManifestError::MissingColumn {
            column: mapping.identifier.clone(),
            available: headers.clone(),
        })?;

    let expected_index = position(&mapping.expected_code);
    if expected_index.is_none() {
        tracing::warn!(
            "Expected-code column '{}' not found; every resolved row will mismatch",
            mapping.expected_code
        );
    }

    let reference_indices: Vec<(String, Option<usize>)> = mapping
        .references
        .iter()
        .map(|name| {
            let index = position(name);
            if index.is_none() {
                tracing::warn!("Reference column '{}' not found; it will be left blank", name);
            }
            (name.clone(), index)
        })
        .collect();

    let row_index = mapping.row_index.as_deref().and_then(position);

    let mut rows = Vec::new();
    for (index, record) in reader.byte_records().enumerate() {
        let (mut values, replaced) = decode_record(&record?);
        values.resize(headers.len(), String::new());

        let cell = |column: Option<usize>| column.map(|i| values[i].as_str()).unwrap_or("");

        let row_number = cell(row_index).trim().parse().unwrap_or(index + 1);
        if replaced {
            tracing::warn!(
                "Row {} has cells that are not valid UTF-8; undecodable bytes replaced",
                row_number
            );
        }

        let identifier = non_blank(cell(Some(identifier_index)));
        let expected_code = non_blank(cell(expected_index));
        let references = reference_indices
            .iter()
            .map(|(name, column)| (name.clone(), cell(*column).to_string()))
            .collect();

        rows.push(BatchInput {
            row_number,
            identifier,
            expected_code,
            references,
            values,
        });
    }

    tracing::info!(
        "Loaded {} rows ({} columns) from input table",
        rows.len(),
        headers.len()
    );

    Ok(InputTable { headers, rows })
}

/// Writes the full results manifest to a CSV file
pub fn write_results(path: &Path, headers: &[String], rows: &[BatchRow]) -> ManifestResult<()> {
    write_results_to(create_output(path)?, headers, rows)
}

/// Writes the full results manifest
///
/// Every input row is written once, in order, with its original cells
/// followed by [`RESULT_COLUMNS`]. Absent values are empty cells. Input
/// columns named like a result column are renamed with
/// [`PREVIOUS_COLUMN_PREFIX`].
pub fn write_results_to<W: Write>(
    sink: W,
    headers: &[String],
    rows: &[BatchRow],
) -> ManifestResult<()> {
    let mut writer = csv::Writer::from_writer(sink);

    let inherited: Vec<String> = headers
        .iter()
        .map(|header| {
            if RESULT_COLUMNS.contains(&header.as_str()) {
                format!("{}{}", PREVIOUS_COLUMN_PREFIX, header)
            } else {
                header.clone()
            }
        })
        .collect();
    writer.write_record(inherited.iter().map(String::as_str).chain(RESULT_COLUMNS))?;

    let empty = BankDetails::default();
    for row in rows {
        let details = row.record().map(|r| &r.details).unwrap_or(&empty);
        let timestamp = row
            .record()
            .map(|r| r.resolved_at)
            .or_else(|| row.processed_at());

        let mut cells = row.input().values.clone();
        cells.resize(headers.len(), String::new());
        cells.extend([
            details.swift_code.clone().unwrap_or_default(),
            row.match_status().as_str().to_string(),
            details.bank_name.clone().unwrap_or_default(),
            details.country.clone().unwrap_or_default(),
            details.city.clone().unwrap_or_default(),
            details.branch.clone().unwrap_or_default(),
            details.address.clone().unwrap_or_default(),
            timestamp.map(format_timestamp).unwrap_or_default(),
            row.failure_kind()
                .map(|kind| kind.as_str().to_string())
                .unwrap_or_default(),
        ]);

        writer.write_record(&cells)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the retry manifest to a CSV file
pub fn write_failures(
    path: &Path,
    reference_columns: &[String],
    failures: &[FailureEntry],
) -> ManifestResult<()> {
    write_failures_to(create_output(path)?, reference_columns, failures)
}

/// Writes the retry manifest
///
/// The header is written even when there are no failures.
pub fn write_failures_to<W: Write>(
    sink: W,
    reference_columns: &[String],
    failures: &[FailureEntry],
) -> ManifestResult<()> {
    let mut writer = csv::Writer::from_writer(sink);

    let mut header = vec![
        RETRY_ROW_INDEX_COLUMN,
        RETRY_IDENTIFIER_COLUMN,
        RETRY_EXPECTED_CODE_COLUMN,
    ];
    header.extend(reference_columns.iter().map(String::as_str));
    header.extend(["Failure_Kind", "Failure_Detail", "Failed_At"]);
    writer.write_record(&header)?;

    for failure in failures {
        let mut cells = vec![
            failure.row_number.to_string(),
            failure.identifier.clone(),
            failure.expected_code.clone().unwrap_or_default(),
        ];
        cells.extend(
            reference_columns
                .iter()
                .map(|column| failure.reference(column).unwrap_or("").to_string()),
        );
        cells.extend([
            failure.kind.as_str().to_string(),
            failure.detail.clone(),
            format_timestamp(failure.failed_at),
        ]);
        writer.write_record(&cells)?;
    }

    writer.flush()?;
    Ok(())
}

/// Preview of a single input column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPreview {
    pub name: String,
    pub non_empty: usize,
    pub samples: Vec<String>,
}

/// Shape and column previews of an input table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOverview {
    pub rows: usize,
    pub columns: Vec<ColumnPreview>,
}

/// Reads a CSV file and previews each column's first non-empty values
pub fn inspect_table(path: &Path, sample_size: usize) -> ManifestResult<TableOverview> {
    inspect_table_from(File::open(path)?, sample_size)
}

/// Previews a CSV source
pub fn inspect_table_from<R: Read>(source: R, sample_size: usize) -> ManifestResult<TableOverview> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(source);

    let mut columns: Vec<ColumnPreview> = read_headers(&mut reader)?
        .into_iter()
        .map(|name| ColumnPreview {
            name,
            non_empty: 0,
            samples: Vec::new(),
        })
        .collect();

    let mut rows = 0;
    for record in reader.byte_records() {
        let (values, _) = decode_record(&record?);
        rows += 1;
        for (column, value) in columns.iter_mut().zip(values) {
            if value.trim().is_empty() {
                continue;
            }
            column.non_empty += 1;
            if column.samples.len() < sample_size {
                column.samples.push(value);
            }
        }
    }

    Ok(TableOverview { rows, columns })
}

/// Prints a table overview to stdout
pub fn print_overview(overview: &TableOverview) {
    println!("=== Input Table ===\n");
    println!(
        "Shape: {} rows x {} columns\n",
        overview.rows,
        overview.columns.len()
    );

    for column in &overview.columns {
        println!(
            "Column '{}' ({} non-empty)",
            column.name, column.non_empty
        );
        if column.samples.is_empty() {
            println!("  No data available");
        }
        for (i, sample) in column.samples.iter().enumerate() {
            println!("  {}. {}", i + 1, sample);
        }
    }
}
