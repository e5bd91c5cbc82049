use std::path::Path;

use log::{debug, warn};

use crate::error::{Error, Result};

/// Cells read as a missing measurement: the `?` used by the raw data files
/// plus the usual spellings of NA written by spreadsheet and dataframe tools.
const MISSING: &[&str] = &[
    "?", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan",
    "1.#IND", "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a",
    "nan", "null",
];

/// A table of named numeric columns, stored row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl Dataset {
    /// Builds a dataset from already-parsed rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Dataset> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(Error::Data(format!(
                "row {} has {} values but {} columns are named",
                i + 1, row.len(), columns.len()
            )));
        }
        Ok(Dataset { columns, rows })
    }

    /// Reads a header-less CSV whose columns are named by `column_names`.
    pub fn from_csv<P: AsRef<Path>>(path: P, column_names: &[String]) -> Result<Dataset> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let dataset = Dataset::from_csv_str(&text, column_names)?;
        debug!("loaded {} rows from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Parses CSV text.
    ///
    /// - fields are comma-separated; leading and trailing blanks are ignored
    /// - anything after a tab on a line is a comment
    /// - `?`, NA spellings and non-finite numbers mark a missing value; such
    ///   rows are dropped
    /// - a first row whose filled cells are all non-numeric is a header
    pub fn from_csv_str(text: &str, column_names: &[String]) -> Result<Dataset> {
        if column_names.is_empty() {
            return Err(Error::Data("no column names given".into()));
        }

        // Cut comments line by line so record positions still match the file.
        let stripped: String = text
            .lines()
            .map(|line| line.split('\t').next().unwrap_or(""))
            .collect::<Vec<_>>()
            .join("\n");

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(stripped.as_bytes());

        let mut rows = Vec::new();
        let mut dropped = 0usize;

        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(index as u64 + 1);

            if record.iter().all(|cell| cell.is_empty()) {
                continue;
            }
            if index == 0 && is_header(&record) {
                debug!("skipping header row on line {line}");
                continue;
            }
            if record.len() != column_names.len() {
                return Err(Error::Data(format!(
                    "line {}: expected {} fields, found {}",
                    line, column_names.len(), record.len()
                )));
            }

            match parse_row(&record, line)? {
                Some(values) => rows.push(values),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            warn!("dropped {dropped} row(s) with missing values");
        }
        if rows.is_empty() {
            return Err(Error::Data("dataset contains no complete rows".into()));
        }

        Dataset::new(column_names.to_vec(), rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::Data(format!("unknown column '{name}'")))
    }

    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// Every row projected onto `names`, in that column order.
    pub fn select(&self, names: &[String]) -> Result<Vec<Vec<f64>>> {
        let cols = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Result<Vec<_>>>()?;
        Ok(self
            .rows
            .iter()
            .map(|row| cols.iter().map(|&c| row[c]).collect())
            .collect())
    }

    /// A new dataset holding the rows at `indices`, in that order.
    pub fn take_rows(&self, indices: &[usize]) -> Result<Dataset> {
        let rows = indices
            .iter()
            .map(|&r| {
                self.rows.get(r).cloned().ok_or_else(|| {
                    Error::Data(format!("row {r} out of range ({} rows)", self.rows.len()))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Dataset { columns: self.columns.clone(), rows })
    }
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || MISSING.contains(&cell)
}

fn is_header(record: &csv::StringRecord) -> bool {
    let mut filled = record.iter().filter(|cell| !is_missing(cell)).peekable();
    filled.peek().is_some() && filled.all(|cell| cell.parse::<f64>().is_err())
}

/// Returns `None` when the row holds a missing value.
fn parse_row(record: &csv::StringRecord, line: u64) -> Result<Option<Vec<f64>>> {
    let mut values = Vec::with_capacity(record.len());
    for cell in record.iter() {
        if is_missing(cell) {
            return Ok(None);
        }
        let value = cell.parse::<f64>().map_err(|_| {
            Error::Data(format!("line {line}: '{cell}' is not a valid number"))
        })?;
        if !value.is_finite() {
            return Ok(None);
        }
        values.push(value);
    }
    Ok(Some(values))
}
