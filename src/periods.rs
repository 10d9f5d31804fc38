use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{FinboardError, Result};

const MONTH_NAMES: [&str; 12] = [
    "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho",
    "Julho", "Agosto", "Setembro", "Outubro", "Novembro", "Dezembro",
];

pub const ALL_PERIODS: &str = "all";
const ROLLING_MONTHS: u32 = 12;

// ---------------------------------------------------------------------------
// Cycle table
// ---------------------------------------------------------------------------

/// Statement cycle: from `start_day` of the previous month through `end_day`
/// of the billed month. When `start_day <= end_day` the cycle sits inside the
/// billed month. Days past the end of a short month roll into the next one,
/// so consecutive cycles stay contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRule {
    pub start_day: u32,
    pub end_day: u32,
}

impl Default for CycleRule {
    fn default() -> Self {
        Self {
            start_day: 29,
            end_day: 28,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleOverride {
    pub bank: String,
    pub owner: String,
    pub start_day: u32,
    pub end_day: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleTable {
    #[serde(default)]
    pub default: CycleRule,
    #[serde(default)]
    pub overrides: Vec<CycleOverride>,
}

impl CycleTable {
    /// Resolve the cycle for a (bank, owner) identity. Names compare
    /// case-insensitively; a missing half of the identity gets the default.
    pub fn rule_for(&self, bank: Option<&str>, owner: Option<&str>) -> CycleRule {
        let (Some(bank), Some(owner)) = (bank, owner) else {
            return self.default;
        };
        self.overrides
            .iter()
            .find(|o| same_name(&o.bank, bank) && same_name(&o.owner, owner))
            .map(|o| CycleRule {
                start_day: o.start_day,
                end_day: o.end_day,
            })
            .unwrap_or(self.default)
    }

    pub fn validate(&self) -> Result<()> {
        let days = std::iter::once((self.default.start_day, self.default.end_day))
            .chain(self.overrides.iter().map(|o| (o.start_day, o.end_day)));
        for (start, end) in days {
            if !(1..=31).contains(&start) || !(1..=31).contains(&end) {
                return Err(FinboardError::Settings(format!(
                    "billing cycle days must be within 1..=31 (got {start}/{end})"
                )));
            }
        }
        Ok(())
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

/// Inclusive date window; `end` carries the final day's 23:59:59.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    fn from_days(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            start: first.and_time(NaiveTime::MIN),
            end: first_second_after(last) - Duration::seconds(1),
        }
    }

    pub fn start_key(&self) -> String {
        self.start.date().format("%Y-%m-%d").to_string()
    }

    pub fn end_key(&self) -> String {
        self.end.date().format("%Y-%m-%d").to_string()
    }
}

fn first_second_after(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN) + Duration::days(1)
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| FinboardError::Validation(format!("invalid period {year:04}-{month:02}")))
}

/// Day `day` of the month, rolling past the month end instead of clamping.
fn nth_day(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    Ok(first_of_month(year, month)? + Duration::days(i64::from(day) - 1))
}

pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

pub fn calendar_month(year: i32, month: u32) -> Result<Window> {
    let first = first_of_month(year, month)?;
    let (ny, nm) = next_month(year, month);
    let last = first_of_month(ny, nm)? - Duration::days(1);
    Ok(Window::from_days(first, last))
}

pub fn cycle_window(rule: CycleRule, year: i32, month: u32) -> Result<Window> {
    let (start_year, start_month) = if rule.start_day > rule.end_day {
        previous_month(year, month)
    } else {
        (year, month)
    };
    let first = nth_day(start_year, start_month, rule.start_day)?;
    let last = nth_day(year, month, rule.end_day)?;
    Ok(Window::from_days(first, last))
}

/// Billing cycle for `year`/`month`, resolved for an optional account identity.
pub fn cycle_period(
    table: &CycleTable,
    year: i32,
    month: u32,
    bank: Option<&str>,
    owner: Option<&str>,
) -> Result<Window> {
    cycle_window(table.rule_for(bank, owner), year, month)
}

/// The billed month whose cycle contains `today`.
pub fn current_cycle_month(rule: CycleRule, today: NaiveDate) -> Result<(i32, u32)> {
    let (year, month) = (today.year(), today.month());
    let window = cycle_window(rule, year, month)?;
    if today > window.end.date() {
        Ok(next_month(year, month))
    } else {
        Ok((year, month))
    }
}

// ---------------------------------------------------------------------------
// Period selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    All,
    Month { year: i32, month: u32 },
}

impl Period {
    /// Parse `all` (or nothing) and `YYYY-MM`.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let raw = raw.map(str::trim).unwrap_or("");
        if raw.is_empty() || raw.eq_ignore_ascii_case(ALL_PERIODS) {
            return Ok(Self::All);
        }
        let invalid = || FinboardError::Validation(format!("invalid period '{raw}' (expected YYYY-MM or 'all')"));
        let (y, m) = raw.split_once('-').ok_or_else(invalid)?;
        if y.len() != 4 || m.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = y.parse().map_err(|_| invalid())?;
        let month: u32 = m.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self::Month { year, month })
    }

    pub fn key(&self) -> String {
        match self {
            Self::All => ALL_PERIODS.to_string(),
            Self::Month { year, month } => format!("{year:04}-{month:02}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodOption {
    pub value: String,
    pub label: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

pub fn month_label(year: i32, month: u32) -> String {
    let name = MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?");
    format!("{name} {year}")
}

/// The last twelve calendar months (most recent first) with their default
/// cycle windows, followed by the all-time sentinel. Per-identity windows are
/// resolved at aggregation time.
pub fn available_periods(today: NaiveDate) -> Result<Vec<PeriodOption>> {
    let rule = CycleRule::default();
    let (mut year, mut month) = (today.year(), today.month());
    let mut periods = Vec::with_capacity(ROLLING_MONTHS as usize + 1);
    for _ in 0..ROLLING_MONTHS {
        let window = cycle_window(rule, year, month)?;
        periods.push(PeriodOption {
            value: Period::Month { year, month }.key(),
            label: month_label(year, month),
            start: Some(window.start),
            end: Some(window.end),
        });
        (year, month) = previous_month(year, month);
    }
    periods.push(PeriodOption {
        value: ALL_PERIODS.to_string(),
        label: "Todo o período".to_string(),
        start: None,
        end: None,
    });
    Ok(periods)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn table() -> CycleTable {
        CycleTable {
            overrides: vec![CycleOverride {
                bank: "Nubank".to_string(),
                owner: "Ana".to_string(),
                start_day: 27,
                end_day: 26,
            }],
            ..CycleTable::default()
        }
    }

    #[test]
    fn test_default_cycle_leap_year() {
        let w = cycle_period(&table(), 2024, 3, None, None).unwrap();
        assert_eq!(w.start, dt("2024-02-29T00:00:00"));
        assert_eq!(w.end, dt("2024-03-28T23:59:59"));
    }

    #[test]
    fn test_override_cycle() {
        let w = cycle_period(&table(), 2024, 3, Some("Nubank"), Some("Ana")).unwrap();
        assert_eq!(w.start, dt("2024-02-27T00:00:00"));
        assert_eq!(w.end, dt("2024-03-26T23:59:59"));
    }

    #[test]
    fn test_override_matches_case_insensitively() {
        let w = cycle_period(&table(), 2024, 3, Some(" nubank"), Some("ANA")).unwrap();
        assert_eq!(w.start_key(), "2024-02-27");
    }

    #[test]
    fn test_unknown_identity_uses_default() {
        let w = cycle_period(&table(), 2024, 3, Some("Nubank"), Some("Bruno")).unwrap();
        assert_eq!(w.start_key(), "2024-02-29");
        let w = cycle_period(&table(), 2024, 3, Some("Nubank"), None).unwrap();
        assert_eq!(w.start_key(), "2024-02-29");
    }

    #[test]
    fn test_year_rollover() {
        let w = cycle_period(&table(), 2024, 1, None, None).unwrap();
        assert_eq!(w.start_key(), "2023-12-29");
        assert_eq!(w.end_key(), "2024-01-28");
    }

    #[test]
    fn test_short_february_rolls_into_march() {
        // No 29th in Feb 2023: the March cycle starts on March 1st, right
        // after the February cycle ends on the 28th.
        let march = cycle_period(&table(), 2023, 3, None, None).unwrap();
        let february = cycle_period(&table(), 2023, 2, None, None).unwrap();
        assert_eq!(march.start_key(), "2023-03-01");
        assert_eq!(february.end_key(), "2023-02-28");
    }

    #[test]
    fn test_same_month_cycle() {
        let rule = CycleRule { start_day: 1, end_day: 20 };
        let w = cycle_window(rule, 2024, 5).unwrap();
        assert_eq!(w.start_key(), "2024-05-01");
        assert_eq!(w.end_key(), "2024-05-20");
    }

    #[test]
    fn test_calendar_month() {
        let w = calendar_month(2024, 2).unwrap();
        assert_eq!(w.start, dt("2024-02-01T00:00:00"));
        assert_eq!(w.end, dt("2024-02-29T23:59:59"));
        let w = calendar_month(2023, 12).unwrap();
        assert_eq!(w.end_key(), "2023-12-31");
    }

    #[test]
    fn test_consecutive_cycles_are_contiguous() {
        let t = table();
        for (year, month) in [(2024, 1), (2024, 2), (2024, 3), (2023, 2), (2023, 12)] {
            let this = cycle_period(&t, year, month, None, None).unwrap();
            let (ny, nm) = next_month(year, month);
            let next = cycle_period(&t, ny, nm, None, None).unwrap();
            assert_eq!(next.start - this.end, Duration::seconds(1), "{year}-{month}");
        }
    }

    #[test]
    fn test_current_cycle_month() {
        let rule = CycleRule::default();
        assert_eq!(current_cycle_month(rule, day("2024-03-10")).unwrap(), (2024, 3));
        assert_eq!(current_cycle_month(rule, day("2024-03-28")).unwrap(), (2024, 3));
        assert_eq!(current_cycle_month(rule, day("2024-03-29")).unwrap(), (2024, 4));
        assert_eq!(current_cycle_month(rule, day("2024-12-30")).unwrap(), (2025, 1));
    }

    #[test]
    fn test_available_periods() {
        let periods = available_periods(day("2024-02-10")).unwrap();
        assert_eq!(periods.len(), 13);
        assert_eq!(periods[0].value, "2024-02");
        assert_eq!(periods[0].label, "Fevereiro 2024");
        assert_eq!(periods[1].value, "2024-01");
        assert_eq!(periods[2].value, "2023-12");
        assert_eq!(periods[11].value, "2023-03");
        assert_eq!(periods[12].value, "all");
        assert!(periods[12].start.is_none());
        assert_eq!(periods[0].start, Some(dt("2024-01-29T00:00:00")));
        assert_eq!(periods[0].end, Some(dt("2024-02-28T23:59:59")));
    }

    #[test]
    fn test_parse_period() {
        assert_eq!(Period::parse(None).unwrap(), Period::All);
        assert_eq!(Period::parse(Some("all")).unwrap(), Period::All);
        assert_eq!(
            Period::parse(Some("2024-03")).unwrap(),
            Period::Month { year: 2024, month: 3 }
        );
        assert!(Period::parse(Some("2024-13")).is_err());
        assert!(Period::parse(Some("March")).is_err());
        assert!(Period::parse(Some("2024-3")).is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_days() {
        let mut t = table();
        assert!(t.validate().is_ok());
        t.overrides[0].end_day = 32;
        assert!(t.validate().is_err());
    }
}
