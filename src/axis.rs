// 📅 Time Axis Generator - view mode → ordered display columns
//
// Three modes:
// 1. Month: one column per calendar day
// 2. Year:  12 months × 4 buckets (1-7, 8-14, 15-21, 22-end); M4 absorbs the tail
// 3. Range: one column per day from start to end, capped as a runaway guard
//
// Columns of one axis are contiguous, never overlap, and increase in `start`.
// An invalid range (missing bound, start > end) falls back to the current month.

use crate::config::TimelineConfig;
use crate::error::{Result, TimelineError};
use crate::source::parse_date;
use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

// ============================================================================
// VIEW MODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ViewMode {
    Month { year: i32, month: u32 },
    Year { year: i32 },
    Range {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

impl ViewMode {
    pub fn name(&self) -> &'static str {
        match self {
            ViewMode::Month { .. } => "month",
            ViewMode::Year { .. } => "year",
            ViewMode::Range { .. } => "range",
        }
    }

    /// Build a mode from UI-style string parameters
    ///
    /// Missing month/year default to `today`. Range bounds are `YYYY-MM-DD`;
    /// unparseable bounds become None and are handled by the generator's
    /// fallback rather than rejected here.
    pub fn from_params(
        mode: &str,
        year: Option<i32>,
        month: Option<u32>,
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Result<ViewMode> {
        match mode.trim().to_lowercase().as_str() {
            "month" => {
                let month = month.unwrap_or_else(|| today.month());
                if !(1..=12).contains(&month) {
                    return Err(TimelineError::InvalidParameter {
                        name: "month",
                        value: month.to_string(),
                    });
                }
                Ok(ViewMode::Month {
                    year: year.unwrap_or_else(|| today.year()),
                    month,
                })
            }
            "year" => Ok(ViewMode::Year {
                year: year.unwrap_or_else(|| today.year()),
            }),
            "range" => Ok(ViewMode::Range {
                start: start.and_then(parse_date),
                end: end.and_then(parse_date),
            }),
            other => Err(TimelineError::UnknownMode(other.to_string())),
        }
    }
}

// ============================================================================
// COLUMN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub label: String,
    pub sub_label: Option<String>,
    pub start: NaiveDate,
    /// Inclusive
    pub end: NaiveDate,
    pub width: u32,
    pub is_weekend: bool,
    pub is_first_of_period: bool,
}

impl Column {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    fn day(date: NaiveDate, width: u32, is_first_of_period: bool) -> Self {
        Column {
            id: date.format("%Y-%m-%d").to_string(),
            label: date.day().to_string(),
            sub_label: Some(date.format("%a").to_string()),
            start: date,
            end: date,
            width,
            is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
            is_first_of_period,
        }
    }
}

// ============================================================================
// TIME AXIS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeAxis {
    /// Mode actually rendered (a fallen-back range reports Month here)
    pub mode: ViewMode,
    pub columns: Vec<Column>,
    pub column_width: u32,
    pub total_width: u32,
}

impl TimeAxis {
    /// Generate the axis for `mode`, using the local date for fallbacks
    pub fn generate_now(mode: ViewMode, config: &TimelineConfig) -> Self {
        Self::generate(mode, config, Local::now().date_naive())
    }

    /// Generate the axis for `mode`; `today` picks the fallback month
    pub fn generate(mode: ViewMode, config: &TimelineConfig, today: NaiveDate) -> Self {
        let (mode, columns, column_width) = match mode {
            ViewMode::Month { year, month } => match month_columns(year, month, config.month_column_width) {
                Some(columns) => (mode, columns, config.month_column_width),
                None => {
                    tracing::warn!(year, month, "invalid month, falling back to current month");
                    current_month(today, config)
                }
            },
            ViewMode::Year { year } => match year_columns(year, config.year_column_width) {
                Some(columns) => (mode, columns, config.year_column_width),
                None => {
                    tracing::warn!(year, "year out of range, falling back to current month");
                    current_month(today, config)
                }
            },
            ViewMode::Range {
                start: Some(start),
                end: Some(end),
            } if start <= end => {
                let columns = range_columns(
                    start,
                    end,
                    config.range_column_width,
                    config.max_range_columns,
                );
                (mode, columns, config.range_column_width)
            }
            ViewMode::Range { start, end } => {
                tracing::warn!(?start, ?end, "empty or invalid range, falling back to current month");
                current_month(today, config)
            }
        };

        let total_width = (columns.len() as u32)
            .saturating_mul(column_width)
            .max(config.minimum_width);

        TimeAxis {
            mode,
            columns,
            column_width,
            total_width,
        }
    }

    /// First visible day
    pub fn view_start(&self) -> Option<NaiveDate> {
        self.columns.first().map(|c| c.start)
    }

    /// Last visible day
    pub fn view_end(&self) -> Option<NaiveDate> {
        self.columns.last().map(|c| c.end)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

fn current_month(today: NaiveDate, config: &TimelineConfig) -> (ViewMode, Vec<Column>, u32) {
    let mode = ViewMode::Month {
        year: today.year(),
        month: today.month(),
    };
    let columns =
        month_columns(today.year(), today.month(), config.month_column_width).unwrap_or_default();
    (mode, columns, config.month_column_width)
}

/// One column per day of the month; None for an invalid month
pub fn month_columns(year: i32, month: u32, width: u32) -> Option<Vec<Column>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = last_day_of_month(first)?;

    Some(
        first
            .iter_days()
            .take_while(|d| *d <= last)
            .map(|d| Column::day(d, width, d.day() == 1))
            .collect(),
    )
}

/// 48 week buckets: for every month M1 (1-7), M2 (8-14), M3 (15-21), M4 (22-end)
pub fn year_columns(year: i32, width: u32) -> Option<Vec<Column>> {
    let mut columns = Vec::with_capacity(48);

    for month in 1..=12 {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let last = last_day_of_month(first)?;
        let month_label = first.format("%b").to_string();

        let buckets = [(1, 7), (8, 14), (15, 21), (22, last.day())];
        for (i, (from, to)) in buckets.iter().enumerate() {
            let start = first.with_day(*from)?;
            let end = first.with_day(*to)?;
            columns.push(Column {
                id: format!("{}-{:02}-M{}", year, month, i + 1),
                label: format!("M{}", i + 1),
                sub_label: Some(month_label.clone()),
                start,
                end,
                width,
                is_weekend: false,
                is_first_of_period: i == 0,
            });
        }
    }

    Some(columns)
}

/// One column per day from start to end inclusive, at most `cap` columns
pub fn range_columns(start: NaiveDate, end: NaiveDate, width: u32, cap: usize) -> Vec<Column> {
    let columns: Vec<Column> = start
        .iter_days()
        .take_while(|d| *d <= end)
        .take(cap)
        .enumerate()
        .map(|(i, d)| Column::day(d, width, i == 0 || d.day() == 1))
        .collect();

    if columns.len() == cap && columns.last().map_or(false, |c| c.end < end) {
        tracing::warn!(%start, %end, cap, "range truncated at column cap");
    }

    columns
}

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).map(|next| next - Duration::days(1))
}

// ============================================================================
// TESTS
// ============================================================================
