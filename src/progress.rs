use std::fmt::Write as _;

use crate::state::{
    AGGREGATE_MONTH, DailyPoint, DailyRecord, LikesRecord, SummaryRecord,
};

/// The latest reporting period of a summary table: the last non-aggregate
/// row, taken on trust from source order. No calendar comparison happens
/// here; if the source ever emits months out of order, so do we.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthRef {
    pub year: String,
    pub month_name: String,
    pub month_number: &'static str,
}

impl MonthRef {
    pub fn label(&self) -> String {
        format!("{} {}", self.month_name, self.year)
    }
}

pub fn month_number(name: &str) -> &'static str {
    match name {
        "January" => "01",
        "February" => "02",
        "March" => "03",
        "April" => "04",
        "May" => "05",
        "June" => "06",
        "July" => "07",
        "August" => "08",
        "September" => "09",
        "October" => "10",
        "November" => "11",
        "December" => "12",
        _ => "01",
    }
}

pub fn latest_month(summary: &[SummaryRecord]) -> Option<MonthRef> {
    let last = summary
        .iter()
        .filter(|row| !row.month.is_empty() && row.month != AGGREGATE_MONTH)
        .next_back()?;
    Some(MonthRef {
        year: last.year.clone(),
        month_name: last.month.clone(),
        month_number: month_number(&last.month),
    })
}

/// Pick the single row the summary cards show. Exact latest-period match
/// first, then the "ALL" aggregate, then whatever row came last.
pub fn resolve_summary_row<'a>(
    summary: &'a [SummaryRecord],
    latest: Option<&MonthRef>,
) -> Option<&'a SummaryRecord> {
    let fallback = summary
        .iter()
        .find(|row| row.month == AGGREGATE_MONTH)
        .or_else(|| summary.last());
    match latest {
        Some(latest) => summary
            .iter()
            .find(|row| row.month == latest.month_name && row.year == latest.year)
            .or(fallback),
        None => fallback,
    }
}

/// Reduce monthly detail rows to chartable points. A row needs both cells;
/// an XP cell that will not parse becomes NaN rather than sinking the
/// series, so the render edge must filter non-finite values.
pub fn daily_series(rows: &[DailyRecord]) -> Vec<DailyPoint> {
    rows.iter()
        .filter(|row| !row.date.is_empty() && !row.xp.is_empty())
        .map(|row| DailyPoint {
            date: row.date.clone(),
            xp: row.xp.trim().parse::<f64>().unwrap_or(f64::NAN),
        })
        .collect()
}

/// Numeric cells get thousands grouping, blanks get a dash, anything else
/// passes through untouched.
pub fn format_number(value: Option<&str>) -> String {
    let Some(raw) = value else {
        return "-".to_string();
    };
    if raw.is_empty() {
        return "-".to_string();
    }
    match raw.trim().parse::<f64>() {
        Ok(num) if num.is_finite() => group_thousands(&num.to_string()),
        _ => raw.to_string(),
    }
}

/// Average daily XP is the one derived rate shown with fixed precision.
pub fn format_avg_daily(value: &str) -> String {
    match value.trim().parse::<f64>() {
        Ok(num) if num.is_finite() => format!("{num:.2}"),
        _ => format_number(Some(value)),
    }
}

/// The display window of the likes log: last 10 attempts, newest first.
pub fn recent_likes(likes: &[LikesRecord]) -> Vec<&LikesRecord> {
    let start = likes.len().saturating_sub(10);
    likes[start..].iter().rev().collect()
}

fn group_thousands(numeric: &str) -> String {
    let (mantissa, fraction) = match numeric.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (numeric, None),
    };
    let (sign, digits) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    grouped.push_str(sign);
    let offset = digits.len() % 3;
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && idx % 3 == offset % 3 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = fraction {
        let _ = write!(grouped, ".{frac}");
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month_row(year: &str, month: &str) -> SummaryRecord {
        SummaryRecord {
            year: year.to_string(),
            month: month.to_string(),
            ..SummaryRecord::default()
        }
    }

    fn daily_row(date: &str, xp: &str) -> DailyRecord {
        DailyRecord {
            date: date.to_string(),
            xp: xp.to_string(),
        }
    }

    fn likes_row(date: &str) -> LikesRecord {
        LikesRecord {
            date: date.to_string(),
            ..LikesRecord::default()
        }
    }

    #[test]
    fn latest_month_skips_aggregate_and_takes_last() {
        let summary = vec![
            month_row("2024", "March"),
            month_row("2024", "April"),
            month_row("2024", "ALL"),
        ];
        let latest = latest_month(&summary).expect("two qualifying rows");
        assert_eq!(latest.year, "2024");
        assert_eq!(latest.month_name, "April");
        assert_eq!(latest.month_number, "04");
    }

    #[test]
    fn latest_month_trusts_source_order_over_calendar() {
        let summary = vec![month_row("2024", "April"), month_row("2024", "March")];
        let latest = latest_month(&summary).expect("qualifying rows");
        assert_eq!(latest.month_name, "March");
    }

    #[test]
    fn latest_month_none_without_qualifying_rows() {
        assert!(latest_month(&[]).is_none());
        let only_aggregate = vec![month_row("2024", "ALL"), month_row("2024", "")];
        assert!(latest_month(&only_aggregate).is_none());
    }

    #[test]
    fn month_numbers_cover_all_twelve_and_default() {
        let expected = [
            ("January", "01"),
            ("February", "02"),
            ("March", "03"),
            ("April", "04"),
            ("May", "05"),
            ("June", "06"),
            ("July", "07"),
            ("August", "08"),
            ("September", "09"),
            ("October", "10"),
            ("November", "11"),
            ("December", "12"),
        ];
        for (name, number) in expected {
            assert_eq!(month_number(name), number, "{name}");
        }
        assert_eq!(month_number("Brumaire"), "01");
        assert_eq!(month_number(""), "01");
    }

    #[test]
    fn resolver_prefers_exact_period_match() {
        let summary = vec![
            month_row("2024", "March"),
            month_row("2024", "April"),
            month_row("2024", "ALL"),
        ];
        let latest = latest_month(&summary);
        let row = resolve_summary_row(&summary, latest.as_ref()).expect("row");
        assert_eq!(row.month, "April");
    }

    #[test]
    fn resolver_falls_back_to_aggregate_then_last() {
        let latest = MonthRef {
            year: "2024".to_string(),
            month_name: "April".to_string(),
            month_number: "04",
        };

        let with_aggregate = vec![month_row("2024", "March"), month_row("2024", "ALL")];
        let row = resolve_summary_row(&with_aggregate, Some(&latest)).expect("row");
        assert_eq!(row.month, "ALL");

        let without_aggregate = vec![month_row("2024", "February"), month_row("2024", "March")];
        let row = resolve_summary_row(&without_aggregate, Some(&latest)).expect("row");
        assert_eq!(row.month, "March");

        assert!(resolve_summary_row(&[], Some(&latest)).is_none());
        assert!(resolve_summary_row(&[], None).is_none());
    }

    #[test]
    fn daily_series_drops_rows_missing_either_cell() {
        let rows = vec![
            daily_row("2024-04-01", "100"),
            daily_row("", "50"),
            daily_row("2024-04-03", ""),
        ];
        let series = daily_series(&rows);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].date, "2024-04-01");
        assert_eq!(series[0].xp, 100.0);
    }

    #[test]
    fn daily_series_coerces_garbage_to_nan() {
        let rows = vec![daily_row("2024-04-01", "oops"), daily_row("2024-04-02", "7")];
        let series = daily_series(&rows);
        assert_eq!(series.len(), 2);
        assert!(series[0].xp.is_nan());
        assert_eq!(series[1].xp, 7.0);
    }

    #[test]
    fn format_number_matches_contract() {
        assert_eq!(format_number(None), "-");
        assert_eq!(format_number(Some("")), "-");
        assert_eq!(format_number(Some("1234")), "1,234");
        assert_eq!(format_number(Some("1234567")), "1,234,567");
        assert_eq!(format_number(Some("987")), "987");
        assert_eq!(format_number(Some("1234.5")), "1,234.5");
        assert_eq!(format_number(Some("-41000")), "-41,000");
        assert_eq!(format_number(Some("abc")), "abc");
    }

    #[test]
    fn format_avg_daily_fixes_two_decimals() {
        assert_eq!(format_avg_daily("1234.5"), "1234.50");
        assert_eq!(format_avg_daily("3"), "3.00");
        assert_eq!(format_avg_daily(""), "-");
        assert_eq!(format_avg_daily("n/a"), "n/a");
    }

    #[test]
    fn recent_likes_windows_and_reverses() {
        let rows: Vec<LikesRecord> = (1..=15).map(|i| likes_row(&format!("day-{i}"))).collect();
        let window = recent_likes(&rows);
        assert_eq!(window.len(), 10);
        assert_eq!(window[0].date, "day-15");
        assert_eq!(window[9].date, "day-6");

        let few: Vec<LikesRecord> = (1..=3).map(|i| likes_row(&format!("day-{i}"))).collect();
        let window = recent_likes(&few);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].date, "day-3");
        assert_eq!(window[2].date, "day-1");

        assert!(recent_likes(&[]).is_empty());
    }

    #[test]
    fn derivations_are_idempotent() {
        let summary = vec![month_row("2024", "March"), month_row("2024", "April")];
        let rows = vec![daily_row("2024-04-01", "100"), daily_row("2024-04-02", "250")];

        let first = (latest_month(&summary), daily_series(&rows));
        let second = (latest_month(&summary), daily_series(&rows));
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }
}
