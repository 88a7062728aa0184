use std::fmt;

use crate::normalize::is_numeric;

/// Canonical column order of a persisted dataset.
pub const COLUMNS: [&str; 22] = [
    "company",
    "companyRating",
    "displayTitle",
    "employerResponsive",
    "max_salary",
    "min_salary",
    "type",
    "formattedLocation",
    "formattedActivityDate",
    "formattedRelativeTime",
    "hiresNeededExact",
    "salarySnippet",
    "job_type",
    "shift",
    "remote",
    "benefits",
    "job_type_cc",
    "schedules",
    "urgentlyHiring",
    "job_url",
    "job_desc1",
    "job_desc2",
];

/// Taxonomy slots in the order the results JSON lists its attribute groups.
pub const TAXONOMY_SLOTS: [&str; 6] = [
    "job_type",
    "shift",
    "remote",
    "benefits",
    "job_type_cc",
    "schedules",
];

#[cfg(test)]
pub fn column_index(name: &str) -> Option<usize> {
    COLUMNS.iter().position(|c| *c == name)
}

/// A cell that is an integer when the source text was numeric, else the text itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntOrText {
    Int(i64),
    Text(String),
}

impl IntOrText {
    /// Reads a persisted cell: all-digit cells come back as integers, the
    /// same rule normalization uses, so signed text like "-1" stays text.
    pub fn from_cell(cell: &str) -> Self {
        if is_numeric(cell) {
            if let Ok(n) = cell.parse::<i64>() {
                return IntOrText::Int(n);
            }
        }
        IntOrText::Text(cell.to_string())
    }
}

impl Default for IntOrText {
    fn default() -> Self {
        IntOrText::Text(String::new())
    }
}

impl fmt::Display for IntOrText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntOrText::Int(n) => write!(f, "{}", n),
            IntOrText::Text(t) => f.write_str(t),
        }
    }
}

/// Pay period reported by the listing's extracted salary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SalaryPeriod {
    Yearly,
    Monthly,
    Hourly,
    #[default]
    Unknown,
}

impl SalaryPeriod {
    pub fn parse(s: &str) -> Self {
        match s {
            "yearly" => SalaryPeriod::Yearly,
            "monthly" => SalaryPeriod::Monthly,
            "hourly" => SalaryPeriod::Hourly,
            _ => SalaryPeriod::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SalaryPeriod::Yearly => "yearly",
            SalaryPeriod::Monthly => "monthly",
            SalaryPeriod::Hourly => "hourly",
            SalaryPeriod::Unknown => "",
        }
    }
}

/// One row of the output dataset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobRecord {
    pub company: String,
    pub company_rating: Option<f64>,
    pub display_title: String,
    pub employer_responsive: bool,
    pub max_salary: u64,
    pub min_salary: u64,
    pub salary_type: SalaryPeriod,
    pub formatted_location: String,
    /// Days since the employer was last active.
    pub activity_days: Option<i64>,
    pub relative_time: IntOrText,
    pub hires_needed: IntOrText,
    pub salary_snippet: String,
    /// Labels indexed like [`TAXONOMY_SLOTS`]; "" when the slot is empty.
    pub taxonomy: [String; 6],
    pub urgently_hiring: bool,
    pub job_url: Option<String>,
    /// Bullet-list fragments of the description.
    pub job_desc1: Vec<String>,
    /// Paragraph fragments of the description.
    pub job_desc2: Vec<String>,
}

impl JobRecord {
    #[cfg(test)]
    pub fn taxonomy_label(&self, slot: &str) -> Option<&str> {
        TAXONOMY_SLOTS
            .iter()
            .position(|s| *s == slot)
            .map(|i| self.taxonomy[i].as_str())
    }

    pub fn has_description(&self) -> bool {
        !self.job_desc1.is_empty() || !self.job_desc2.is_empty()
    }
}
