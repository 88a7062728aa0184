use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use rayon::prelude::*;
use tracing::info;

use crate::error::DatasetError;
use crate::normalize::{coerce_numeric_or_string, parse_relative_duration};
use crate::record::{IntOrText, JobRecord, SalaryPeriod, COLUMNS};

pub const DEFAULT_DATASET: &str = "indeed_scraped_data.csv";

const ACTIVITY: usize = 8;
const RELATIVE_TIME: usize = 9;
const HIRES: usize = 10;
const TAXONOMY_START: usize = 12;

// ── Rows ──

fn to_row(r: &JobRecord) -> Vec<String> {
    let mut row = Vec::with_capacity(COLUMNS.len());
    row.push(r.company.clone());
    row.push(r.company_rating.map(|v| v.to_string()).unwrap_or_default());
    row.push(r.display_title.clone());
    row.push(bool_cell(r.employer_responsive));
    row.push(r.max_salary.to_string());
    row.push(r.min_salary.to_string());
    row.push(r.salary_type.as_str().to_string());
    row.push(r.formatted_location.clone());
    row.push(r.activity_days.map(|d| d.to_string()).unwrap_or_default());
    row.push(r.relative_time.to_string());
    row.push(r.hires_needed.to_string());
    row.push(r.salary_snippet.clone());
    row.extend(r.taxonomy.iter().cloned());
    row.push(bool_cell(r.urgently_hiring));
    row.push(r.job_url.clone().unwrap_or_default());
    row.push(list_cell(&r.job_desc1));
    row.push(list_cell(&r.job_desc2));
    row
}

fn bool_cell(v: bool) -> String {
    if v { "True" } else { "False" }.to_string()
}

fn list_cell(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

struct Cells<'a> {
    row: &'a StringRecord,
    line: usize,
}

impl Cells<'_> {
    fn get(&self, col: usize) -> &str {
        self.row.get(col).unwrap_or("")
    }

    fn bad(&self, col: usize) -> DatasetError {
        DatasetError::Cell {
            row: self.line,
            column: COLUMNS[col],
            value: self.get(col).to_string(),
        }
    }

    fn text(&self, col: usize) -> String {
        self.get(col).to_string()
    }

    fn boolean(&self, col: usize) -> Result<bool, DatasetError> {
        match self.get(col) {
            "True" | "true" => Ok(true),
            "False" | "false" => Ok(false),
            _ => Err(self.bad(col)),
        }
    }

    /// Integer cell; "12.0" is accepted since float-typed columns write it that way.
    fn int(&self, col: usize) -> Result<Option<i64>, DatasetError> {
        let cell = self.get(col);
        if cell.is_empty() {
            return Ok(None);
        }
        if let Ok(n) = cell.parse::<i64>() {
            return Ok(Some(n));
        }
        match cell.parse::<f64>() {
            Ok(f) if f.fract() == 0.0 => Ok(Some(f as i64)),
            _ => Err(self.bad(col)),
        }
    }

    fn salary(&self, col: usize) -> Result<u64, DatasetError> {
        match self.int(col)? {
            None => Ok(0),
            Some(n) => u64::try_from(n).map_err(|_| self.bad(col)),
        }
    }

    fn float(&self, col: usize) -> Result<Option<f64>, DatasetError> {
        let cell = self.get(col);
        if cell.is_empty() {
            return Ok(None);
        }
        cell.parse().map(Some).map_err(|_| self.bad(col))
    }

    /// JSON list cell, or the `['a', 'b']` form older pandas exports wrote.
    fn list(&self, col: usize) -> Result<Vec<String>, DatasetError> {
        let cell = self.get(col);
        if cell.is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(cell)
            .ok()
            .or_else(|| repr_list(cell))
            .ok_or_else(|| self.bad(col))
    }

    fn record(&self) -> Result<JobRecord, DatasetError> {
        let url = self.get(19);
        Ok(JobRecord {
            company: self.text(0),
            company_rating: self.float(1)?,
            display_title: self.text(2),
            employer_responsive: self.boolean(3)?,
            max_salary: self.salary(4)?,
            min_salary: self.salary(5)?,
            salary_type: SalaryPeriod::parse(self.get(6)),
            formatted_location: self.text(7),
            activity_days: self.int(ACTIVITY)?,
            relative_time: IntOrText::from_cell(self.get(RELATIVE_TIME)),
            hires_needed: IntOrText::from_cell(self.get(HIRES)),
            salary_snippet: self.text(11),
            taxonomy: std::array::from_fn(|i| self.text(TAXONOMY_START + i)),
            urgently_hiring: self.boolean(18)?,
            job_url: (!url.is_empty()).then(|| url.to_string()),
            job_desc1: self.list(20)?,
            job_desc2: self.list(21)?,
        })
    }
}

/// Parse a Python list-of-strings repr. Items may be single or double quoted.
fn repr_list(cell: &str) -> Option<Vec<String>> {
    let inner = cell.trim().strip_prefix('[')?.strip_suffix(']')?;
    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let quote = match chars.next() {
            None => return Some(items),
            Some(q @ ('\'' | '"')) => q,
            Some(_) => return None,
        };

        let mut item = String::new();
        loop {
            match chars.next()? {
                '\\' => match chars.next()? {
                    'n' => item.push('\n'),
                    't' => item.push('\t'),
                    'r' => item.push('\r'),
                    c @ ('\\' | '\'' | '"') => item.push(c),
                    c => {
                        item.push('\\');
                        item.push(c);
                    }
                },
                c if c == quote => break,
                c => item.push(c),
            }
        }
        items.push(item);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => return Some(items),
            Some(',') => {}
            Some(_) => return None,
        }
    }
}

// ── Files ──

fn read_rows(path: &Path) -> Result<Vec<StringRecord>, DatasetError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?;
    if !headers.iter().eq(COLUMNS.iter().copied()) {
        return Err(DatasetError::Schema {
            expected: COLUMNS.iter().map(|c| c.to_string()).collect(),
            found: headers.iter().map(str::to_string).collect(),
        });
    }
    Ok(reader.records().collect::<Result<Vec<_>, _>>()?)
}

fn parse_rows(rows: &[StringRecord]) -> Result<Vec<JobRecord>, DatasetError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| Cells { row, line: i + 2 }.record())
        .collect()
}

pub fn load(path: &Path) -> Result<Vec<JobRecord>, DatasetError> {
    parse_rows(&read_rows(path)?)
}

/// Write the whole dataset, replacing any existing file.
pub fn save(path: &Path, records: &[JobRecord]) -> Result<(), DatasetError> {
    write_rows(path, records.iter().map(to_row))
}

fn write_rows<I>(path: &Path, rows: I) -> Result<(), DatasetError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    {
        let mut writer = csv::Writer::from_path(&tmp)?;
        writer.write_record(COLUMNS)?;
        for row in rows {
            writer.write_record(&row)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

// ── Merge ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub new_rows: usize,
    pub previous_rows: usize,
    pub dropped_duplicates: usize,
    pub total: usize,
}

/// Put `new` in front of whatever the dataset at `path` holds and rewrite it.
pub fn merge(path: &Path, new: Vec<JobRecord>, dedupe: bool) -> Result<MergeSummary, DatasetError> {
    let new_rows = new.len();
    let mut rows = new;
    let previous_rows = if path.exists() {
        let previous = load(path)?;
        let n = previous.len();
        rows.extend(previous);
        n
    } else {
        info!("No dataset at {}, creating it", path.display());
        0
    };

    let dropped_duplicates = if dedupe {
        dedupe_by_job_url(&mut rows)
    } else {
        0
    };

    save(path, &rows)?;
    Ok(MergeSummary {
        new_rows,
        previous_rows,
        dropped_duplicates,
        total: rows.len(),
    })
}

/// Drop rows whose `job_url` appeared earlier; rows without one always stay.
/// Returns how many were dropped.
pub fn dedupe_by_job_url(rows: &mut Vec<JobRecord>) -> usize {
    let before = rows.len();
    let mut seen = HashSet::new();
    rows.retain(|r| match &r.job_url {
        Some(url) => seen.insert(url.clone()),
        None => true,
    });
    before - rows.len()
}

// ── Clean ──

/// Re-normalize the text-valued columns of a dataset written by an older
/// scraper, then rewrite it. Python-repr description cells are rewritten as
/// JSON lists. Returns the number of rows.
pub fn clean(path: &Path) -> Result<usize, DatasetError> {
    let rows = read_rows(path)?;
    let cleaned: Vec<StringRecord> = rows.par_iter().map(clean_row).collect();
    // Validate before replacing anything.
    let records = parse_rows(&cleaned)?;
    save(path, &records)?;
    Ok(records.len())
}

fn clean_row(row: &StringRecord) -> StringRecord {
    row.iter()
        .enumerate()
        .map(|(col, cell)| match col {
            ACTIVITY if !cell.is_empty() => match parse_relative_duration(cell) {
                IntOrText::Int(days) => days.to_string(),
                IntOrText::Text(_) => String::new(),
            },
            RELATIVE_TIME => parse_relative_duration(cell).to_string(),
            HIRES if !cell.is_empty() => coerce_numeric_or_string(cell).to_string(),
            _ => cell.to_string(),
        })
        .collect()
}

// ── Stats ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetStats {
    pub rows: usize,
    pub with_url: usize,
    pub with_description: usize,
    pub duplicate_urls: usize,
}

pub fn stats(path: &Path) -> Result<DatasetStats, DatasetError> {
    let records = load(path)?;
    let mut seen = HashSet::new();
    let mut duplicate_urls = 0;
    for url in records.iter().filter_map(|r| r.job_url.as_deref()) {
        if !seen.insert(url) {
            duplicate_urls += 1;
        }
    }
    Ok(DatasetStats {
        rows: records.len(),
        with_url: records.iter().filter(|r| r.job_url.is_some()).count(),
        with_description: records.iter().filter(|r| r.has_description()).count(),
        duplicate_urls,
    })
}
