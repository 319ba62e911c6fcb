use crate::error::{PipelineError, Result, REQUIRED_PERIODS};
use crate::table::{CleanTable, SourceKind};

/// The three period columns a change computation reads, by identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSelection {
    pub recent: String,
    pub previous: String,
    pub year_ago: String,
}

/// Pick recent, previous and year-ago columns from a chronologically ordered list.
///
/// Purely positional: `len-1`, `len-2` and `len-13`.
pub fn select_periods(columns: &[String]) -> Result<PeriodSelection> {
    let len = columns.len();
    if len < REQUIRED_PERIODS {
        return Err(PipelineError::InsufficientHistory {
            available: len,
            required: REQUIRED_PERIODS,
        });
    }

    Ok(PeriodSelection {
        recent: columns[len - 1].clone(),
        previous: columns[len - 2].clone(),
        year_ago: columns[len - REQUIRED_PERIODS].clone(),
    })
}

/// A `PeriodSelection` bound to one table's cell positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub recent: usize,
    pub previous: usize,
    pub year_ago: usize,
}

impl PeriodSelection {
    pub fn resolve(&self, table: &CleanTable, kind: SourceKind) -> Result<ResolvedSelection> {
        let find = |period: &str| {
            table
                .period_index(period)
                .ok_or_else(|| PipelineError::MissingPeriod {
                    source_kind: kind,
                    period: period.to_string(),
                })
        };

        Ok(ResolvedSelection {
            recent: find(&self.recent)?,
            previous: find(&self.previous)?,
            year_ago: find(&self.year_ago)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];

    fn periods(from_year: i32, count: usize) -> Vec<String> {
        (0..count)
            .map(|i| format!("{} - {}", MONTHS[i % 12], from_year + (i / 12) as i32))
            .collect()
    }

    #[test]
    fn test_select_three_years_of_columns() {
        let cols = periods(2022, 36);
        let sel = select_periods(&cols).unwrap();
        assert_eq!(sel.recent, "Dec - 2024");
        assert_eq!(sel.previous, "Nov - 2024");
        assert_eq!(sel.year_ago, "Dec - 2023");
    }

    #[test]
    fn test_select_exactly_thirteen() {
        let cols = periods(2023, 13);
        let sel = select_periods(&cols).unwrap();
        assert_eq!(sel.recent, "Jan - 2024");
        assert_eq!(sel.previous, "Dec - 2023");
        assert_eq!(sel.year_ago, "Jan - 2023");
    }

    #[test]
    fn test_select_twelve_is_insufficient() {
        let cols = periods(2024, 12);
        match select_periods(&cols) {
            Err(PipelineError::InsufficientHistory {
                available,
                required,
            }) => {
                assert_eq!(available, 12);
                assert_eq!(required, 13);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(select_periods(&[]).is_err());
    }

    #[test]
    fn test_resolve_missing_column() {
        let table = CleanTable {
            periods: periods(2024, 2),
            rows: Vec::new(),
            dropped_rows: 0,
        };
        let sel = PeriodSelection {
            recent: "Feb - 2024".into(),
            previous: "Jan - 2024".into(),
            year_ago: "Feb - 2023".into(),
        };
        let err = sel.resolve(&table, SourceKind::County).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingPeriod { source_kind: SourceKind::County, ref period } if period == "Feb - 2023"
        ));
    }
}
