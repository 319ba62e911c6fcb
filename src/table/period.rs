use chrono::{Datelike, NaiveDate};

/// A `"Mon - YYYY"` column identifier read as a calendar month.
///
/// Only used for output paths and log context. Column selection is positional
/// and never consults this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PeriodLabel {
    first_day: NaiveDate,
}

impl PeriodLabel {
    /// Accepts abbreviated or full month names, e.g. `"Dec - 2024"` or `"December - 2024"`.
    pub fn parse(label: &str) -> Option<Self> {
        let (month, year) = label.split_once(" - ")?;
        let text = format!("1 {} {}", month.trim(), year.trim());
        NaiveDate::parse_from_str(&text, "%d %B %Y")
            .ok()
            .map(|first_day| Self { first_day })
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    /// Full English month name, e.g. `"December"`.
    pub fn month_name(&self) -> String {
        self.first_day.format("%B").to_string()
    }

    /// Whole months from `earlier` to `self`.
    pub fn months_since(&self, earlier: &PeriodLabel) -> i32 {
        (self.first_day.year() - earlier.first_day.year()) * 12
            + self.first_day.month() as i32
            - earlier.first_day.month() as i32
    }
}
