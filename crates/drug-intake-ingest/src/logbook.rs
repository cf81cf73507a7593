//! Hand-entered CSV intake log.
//!
//! Rows are `drug_name,dosage,time,notes[,patient_id]` where `dosage` is free
//! text such as `500 mg` and `time` uses [`LOG_TIME_FORMAT`]. Four-column rows
//! (no patient) are accepted and import under the tracker's default patient.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Offset, Utc};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use drug_intake_core::models::{IntakeRecord, DEFAULT_UNIT};
use drug_intake_core::store::validate_record;
use drug_intake_core::{Tracker, ValidationError};

/// Timestamp format of the `time` column.
pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Log file used when none is given.
pub const DEFAULT_LOG_FILE: &str = "drug_intake_log.csv";

#[derive(Error, Debug)]
pub enum LogbookError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row {row}: expected at least 4 fields, found {found}")]
    MalformedRow { row: usize, found: usize },

    #[error("Row {row}: invalid time '{value}'")]
    InvalidTime { row: usize, value: String },

    #[error("Row {row}: invalid dosage '{text}'")]
    InvalidDosage { row: usize, text: String },

    #[error("Row {row}: cannot express {dosage} in {unit}")]
    UnitMismatch {
        row: usize,
        dosage: String,
        unit: String,
    },

    #[error("Row {row}: {source}")]
    Rejected { row: usize, source: ValidationError },
}

pub type LogbookResult<T> = Result<T, LogbookError>;

/// Dosage text that is not a finite, non-negative amount.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid dosage '{0}'")]
pub struct DosageParseError(pub String);

/// A parsed dosage such as `500 mg`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dosage {
    pub amount: f64,
    pub unit: String,
}

impl Dosage {
    /// Amount expressed in `unit`, converting between mass units.
    ///
    /// Returns `None` when the units are unrelated (e.g. IU and mg).
    pub fn in_unit(&self, unit: &str) -> Option<f64> {
        if self.unit.eq_ignore_ascii_case(unit) {
            return Some(self.amount);
        }
        let from = milligrams_per(&self.unit)?;
        let to = milligrams_per(unit)?;
        Some(self.amount * from / to)
    }
}

impl FromStr for Dosage {
    type Err = DosageParseError;

    /// Accepts `500 mg`, `500mg`, `1,000 IU` and bare numbers (unit mg).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let split = text
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
            .unwrap_or(text.len());
        let (number, unit) = text.split_at(split);
        let number: String = number.chars().filter(|c| *c != ',').collect();

        let amount: f64 = number.parse().map_err(|_| DosageParseError(s.to_string()))?;
        if !amount.is_finite() {
            return Err(DosageParseError(s.to_string()));
        }

        let unit = unit.trim();
        Ok(Self {
            amount,
            unit: if unit.is_empty() { DEFAULT_UNIT } else { unit }.to_string(),
        })
    }
}

impl fmt::Display for Dosage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.unit)
    }
}

fn milligrams_per(unit: &str) -> Option<f64> {
    match unit.to_ascii_lowercase().as_str() {
        "mcg" | "ug" | "µg" => Some(0.001),
        "mg" => Some(1.0),
        "g" => Some(1000.0),
        _ => None,
    }
}

/// One row of the intake log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub drug_name: String,
    /// Dosage as typed, e.g. `500 mg`
    pub dosage: String,
    pub time: NaiveDateTime,
    pub notes: String,
    pub patient_id: Option<String>,
}

impl LogEntry {
    pub fn new(drug_name: impl Into<String>, dosage: impl Into<String>, time: NaiveDateTime) -> Self {
        Self {
            drug_name: drug_name.into(),
            dosage: dosage.into(),
            time,
            notes: String::new(),
            patient_id: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_patient(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    /// Parsed dosage.
    pub fn parsed_dosage(&self) -> Result<Dosage, DosageParseError> {
        self.dosage.parse()
    }

    fn fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.drug_name.clone(),
            self.dosage.clone(),
            self.time.format(LOG_TIME_FORMAT).to_string(),
            self.notes.clone(),
        ];
        fields.extend(self.patient_id.clone());
        fields
    }

    fn from_record(row: usize, record: &StringRecord) -> LogbookResult<Self> {
        if record.len() < 4 {
            return Err(LogbookError::MalformedRow {
                row,
                found: record.len(),
            });
        }

        let field = |i: usize| record.get(i).unwrap_or_default();
        let time_text = field(2);
        let time = NaiveDateTime::parse_from_str(time_text.trim(), LOG_TIME_FORMAT).map_err(|_| {
            LogbookError::InvalidTime {
                row,
                value: time_text.to_string(),
            }
        })?;

        Ok(Self {
            drug_name: field(0).trim().to_string(),
            dosage: field(1).trim().to_string(),
            time,
            notes: field(3).to_string(),
            patient_id: record
                .get(4)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        })
    }
}

/// Result of importing a log into a tracker.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImportSummary {
    pub imported: usize,
    /// Drugs not found in the reference table
    pub unknown_drugs: BTreeSet<String>,
}

/// Append-only CSV intake log on disk.
#[derive(Debug, Clone)]
pub struct Logbook {
    path: PathBuf,
}

impl Logbook {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry, creating the file if needed.
    pub fn append(&self, entry: &LogEntry) -> LogbookResult<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        write_entry(file, entry)?;
        tracing::debug!(drug = %entry.drug_name, path = %self.path.display(), "Logged intake");
        Ok(())
    }

    /// All entries in file order. A missing file is an empty log.
    pub fn entries(&self) -> LogbookResult<Vec<LogEntry>> {
        Ok(self.rows()?.into_iter().map(|(_, entry)| entry).collect())
    }

    /// Entries paired with their 1-based record number.
    fn rows(&self) -> LogbookResult<Vec<(usize, LogEntry)>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        read_rows(File::open(&self.path)?)
    }

    /// Record every entry into the tracker.
    ///
    /// Every row is parsed, converted and validated before anything is
    /// recorded, so a bad row leaves the tracker untouched.
    pub fn import_into(&self, tracker: &Tracker) -> LogbookResult<ImportSummary> {
        let rows = self.rows()?;
        let mut records = Vec::with_capacity(rows.len());

        for (row, entry) in rows {
            let dosage = entry
                .parsed_dosage()
                .map_err(|e| LogbookError::InvalidDosage { row, text: e.0 })?;
            let unit = tracker.reference().lookup(&entry.drug_name).unit();
            let dose = dosage.in_unit(unit).ok_or_else(|| LogbookError::UnitMismatch {
                row,
                dosage: dosage.to_string(),
                unit: unit.to_string(),
            })?;
            let patient = entry
                .patient_id
                .as_deref()
                .unwrap_or(tracker.default_patient_id());
            let timestamp = DateTime::from_naive_utc_and_offset(entry.time, Utc.fix());
            let record = IntakeRecord::new(patient, entry.drug_name.as_str(), dose, timestamp);

            // Conversion can overflow a finite dosage, e.g. 1e308 g in mg
            validate_record(&record).map_err(|source| LogbookError::Rejected { row, source })?;
            records.push((row, record));
        }

        let mut summary = ImportSummary::default();
        for (row, record) in records {
            let outcome = tracker
                .record(record)
                .map_err(|source| LogbookError::Rejected { row, source })?;
            if let Some(notice) = outcome.unknown_drug {
                summary.unknown_drugs.insert(notice.drug_name);
            }
            summary.imported += 1;
        }

        tracing::info!(
            imported = summary.imported,
            path = %self.path.display(),
            "Imported intake log"
        );
        Ok(summary)
    }
}

/// Parse log text into entries, skipping blank lines.
pub fn parse_log(text: &str) -> LogbookResult<Vec<LogEntry>> {
    Ok(read_rows(text.as_bytes())?
        .into_iter()
        .map(|(_, entry)| entry)
        .collect())
}

fn read_rows<R: Read>(source: R) -> LogbookResult<Vec<(usize, LogEntry)>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let row = i + 1;
        rows.push((row, LogEntry::from_record(row, &record)?));
    }
    Ok(rows)
}

fn write_entry<W: Write>(sink: W, entry: &LogEntry) -> LogbookResult<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(sink);
    writer.write_record(entry.fields())?;
    writer.flush()?;
    Ok(())
}
