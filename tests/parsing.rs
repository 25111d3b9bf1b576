use std::fs;
use std::path::PathBuf;

use ffprog_terminal::progress::{self, MonthRef};
use ffprog_terminal::progress_fetch::{
    monthly_source_name, parse_daily_csv, parse_likes_csv, parse_summary_csv,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_summary_fixture() {
    let raw = read_fixture("summary.csv");
    let rows = parse_summary_csv(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].year, "2024");
    assert_eq!(rows[0].month, "March");
    assert_eq!(rows[0].days_logged, "31");
    assert_eq!(rows[0].average_daily_xp, "1022.58");
    assert_eq!(rows[2].month, "ALL");
    assert_eq!(rows[2].total_xp_gained, "46100");
}

#[test]
fn parses_likes_fixture_including_ragged_row() {
    let raw = read_fixture("likes_activity.csv");
    let rows = parse_likes_csv(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].date, "7/1/2024");
    assert_eq!(rows[0].success, "TRUE");
    assert_eq!(rows[1].success, "true");
    // The last row is missing its Success column entirely.
    assert_eq!(rows[3].likes_received, "20");
    assert_eq!(rows[3].success, "");
}

#[test]
fn parses_monthly_fixture_ignoring_extra_columns() {
    let raw = read_fixture("monthly_2024_04.csv");
    let rows = parse_daily_csv(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].date, "4/1/2024");
    assert_eq!(rows[0].xp, "41900");
    assert_eq!(rows[2].xp, "");

    let series = progress::daily_series(&rows);
    assert_eq!(series.len(), 3);
    assert_eq!(series[0].xp, 41900.0);
    assert_eq!(series[1].xp, 43500.0);
    assert!(series[2].xp.is_nan());
}

#[test]
fn empty_and_header_only_inputs_parse_to_nothing() {
    assert!(parse_summary_csv("").expect("empty should parse").is_empty());
    assert!(
        parse_likes_csv("Date,Likes Before,Likes After,Likes Received,Success\n")
            .expect("header-only should parse")
            .is_empty()
    );
}

#[test]
fn monthly_source_name_percent_encodes_the_space() {
    let latest = MonthRef {
        year: "2024".to_string(),
        month_name: "April".to_string(),
        month_number: "04",
    };
    assert_eq!(monthly_source_name(&latest), "2024%2004.CSV");
}

#[test]
fn monthly_source_name_tracks_the_period() {
    let latest = MonthRef {
        year: "2023".to_string(),
        month_name: "December".to_string(),
        month_number: "12",
    };
    assert_eq!(monthly_source_name(&latest), "2023%2012.CSV");
}
