//! CSV adapter: Parse bulk patient uploads.
//!
//! Expected header (order free, extra columns ignored):
//!
//! ```text
//! patient_id,age,sex,medications,comorbidities[,race,study_group,
//!     creatinine,alt,ast,bp_systolic,bp_diastolic,heart_rate]
//! ```
//!
//! List cells hold comma-separated names and must be quoted. A row that
//! cannot be converted is reported as a [`RowError`] and does not abort the
//! import.

use std::collections::HashMap;

use crate::domain::PatientRecord;

/// Columns every upload must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "patient_id",
    "age",
    "sex",
    "medications",
    "comorbidities",
];

const LAB_COLUMNS: [&str; 3] = ["creatinine", "alt", "ast"];
const VITAL_COLUMNS: [&str; 3] = ["bp_systolic", "bp_diastolic", "heart_rate"];

/// File-level import failures. Each maps to a distinct 400 response.
#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    #[error("File must be a CSV")]
    NotCsv,

    #[error("Uploaded file is empty")]
    Empty,

    #[error("Malformed CSV: {0}")]
    Malformed(String),

    #[error("Missing required columns: {0:?}")]
    MissingColumns(Vec<String>),
}

/// A single row that could not be converted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("row {line}: {reason}")]
pub struct RowError {
    /// 1-based line number in the file (header is line 1)
    pub line: u64,
    pub reason: String,
}

/// Result of parsing an upload.
#[derive(Debug, Default)]
pub struct CsvImport {
    /// Data rows read, converted or not
    pub total_rows: usize,
    pub records: Vec<PatientRecord>,
    pub rejected: Vec<RowError>,
}

/// Reject uploads whose file name does not end in `.csv`.
///
/// # Errors
/// Returns `CsvError::NotCsv` for any other name.
pub fn ensure_csv_filename(file_name: &str) -> Result<(), CsvError> {
    if file_name.to_ascii_lowercase().ends_with(".csv") {
        Ok(())
    } else {
        Err(CsvError::NotCsv)
    }
}

/// Split a list cell on commas, trimming parts and dropping empty ones.
#[must_use]
pub fn split_list(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

struct Columns(HashMap<String, usize>);

impl Columns {
    fn get<'r>(&self, row: &'r csv::StringRecord, name: &str) -> Option<&'r str> {
        self.0
            .get(name)
            .and_then(|&i| row.get(i))
            .filter(|cell| !cell.is_empty())
    }
}

/// Parse an uploaded CSV body into patient records.
///
/// # Errors
/// Returns `CsvError` when the body is empty, unreadable, or lacks a
/// required column. Row-level problems end up in `CsvImport::rejected`.
pub fn parse_patients(bytes: &[u8]) -> Result<CsvImport, CsvError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(CsvError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| CsvError::Malformed(e.to_string()))?
        .clone();

    let columns = Columns(
        headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i))
            .collect(),
    );

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !columns.0.contains_key(**c))
        .map(|c| (*c).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CsvError::MissingColumns(missing));
    }

    let mut import = CsvImport::default();
    for (index, row) in reader.records().enumerate() {
        import.total_rows += 1;
        let line = index as u64 + 2;

        let converted = row
            .map_err(|e| e.to_string())
            .and_then(|row| convert_row(&columns, &row));
        match converted {
            Ok(record) => import.records.push(record),
            Err(reason) => {
                tracing::warn!("Skipping CSV row {}: {}", line, reason);
                import.rejected.push(RowError { line, reason });
            }
        }
    }

    Ok(import)
}

fn parse_number(column: &str, cell: &str) -> Result<f64, String> {
    cell.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("{column} is not a number: {cell:?}"))
}

fn parse_age(cell: Option<&str>) -> Result<u32, String> {
    let cell = cell.ok_or_else(|| "age is empty".to_string())?;
    let age = parse_number("age", cell)?;
    if !(0.0..=150.0).contains(&age) {
        return Err(format!("age out of range: {age}"));
    }
    // Spreadsheet exports often write whole numbers as `65.0`.
    Ok(age.trunc() as u32)
}

fn convert_row(columns: &Columns, row: &csv::StringRecord) -> Result<PatientRecord, String> {
    let patient_id = columns
        .get(row, "patient_id")
        .ok_or_else(|| "patient_id is empty".to_string())?;
    let age = parse_age(columns.get(row, "age"))?;
    let sex = columns
        .get(row, "sex")
        .ok_or_else(|| "sex is empty".to_string())?;

    let mut record = PatientRecord::new(patient_id, age, sex)
        .with_medications(columns.get(row, "medications").map(split_list).unwrap_or_default())
        .with_comorbidities(columns.get(row, "comorbidities").map(split_list).unwrap_or_default());

    if let Some(race) = columns.get(row, "race") {
        record.race = race.to_string();
    }
    if let Some(group) = columns.get(row, "study_group") {
        record = record.with_study_group(group);
    }
    for name in LAB_COLUMNS {
        if let Some(cell) = columns.get(row, name) {
            record.lab_results.insert(name.to_string(), parse_number(name, cell)?);
        }
    }
    for name in VITAL_COLUMNS {
        if let Some(cell) = columns.get(row, name) {
            record.vital_signs.insert(name.to_string(), parse_number(name, cell)?);
        }
    }

    Ok(record)
}
