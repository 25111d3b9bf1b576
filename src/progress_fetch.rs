use std::fmt::Write as _;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;

use crate::config::TrackerConfig;
use crate::progress;
use crate::state::{DailyRecord, LikesRecord, PlayerData, SummaryRecord};

const REQUEST_TIMEOUT_SECS: u64 = 10;

static CLIENT: OnceCell<Client> = OnceCell::new();

fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("ffprog-terminal/0.1")
            .build()
            .context("failed to build http client")
    })
}

/// A finished per-player load. Warnings carry the non-fatal degradations
/// (missing monthly detail) for the provider to surface in the console.
#[derive(Debug, Clone)]
pub struct PlayerLoad {
    pub data: PlayerData,
    pub warnings: Vec<String>,
}

/// Run one player's pipeline: summary, then likes, then the latest month's
/// detail file. Summary and likes are required; the monthly file degrades to
/// an empty chart series when it cannot be fetched or parsed.
pub fn load_player(config: &TrackerConfig, uid: &str) -> Result<PlayerLoad> {
    let base = config.player_base(uid);

    let summary = fetch_csv_text(&format!("{base}/summary.csv"))
        .and_then(|raw| parse_summary_csv(&raw))
        .context("summary table")?;
    let likes = fetch_csv_text(&format!("{base}/likes_activity.csv"))
        .and_then(|raw| parse_likes_csv(&raw))
        .context("likes activity table")?;

    let latest = progress::latest_month(&summary);
    let mut daily_series = Vec::new();
    let mut month_label = String::new();
    let mut warnings = Vec::new();

    if let Some(latest) = &latest {
        let source = monthly_source_name(latest);
        match fetch_csv_text(&format!("{base}/{source}")).and_then(|raw| parse_daily_csv(&raw)) {
            Ok(rows) => {
                daily_series = progress::daily_series(&rows);
                month_label = latest.label();
            }
            Err(err) => {
                warnings.push(format!("monthly file {source} for {uid}: {err:#}"));
            }
        }
    }

    let latest_summary = progress::resolve_summary_row(&summary, latest.as_ref()).cloned();

    Ok(PlayerLoad {
        data: PlayerData {
            summary,
            likes,
            daily_series,
            month_label,
            latest_summary,
        },
        warnings,
    })
}

pub fn parse_summary_csv(raw: &str) -> Result<Vec<SummaryRecord>> {
    parse_rows(raw).context("invalid summary csv")
}

pub fn parse_likes_csv(raw: &str) -> Result<Vec<LikesRecord>> {
    parse_rows(raw).context("invalid likes csv")
}

pub fn parse_daily_csv(raw: &str) -> Result<Vec<DailyRecord>> {
    parse_rows(raw).context("invalid monthly csv")
}

/// Resource name of a month's detail file: exact year, a space, the
/// two-digit month number, uppercase extension — then percent-encoded so it
/// can ride in a URL path segment.
pub fn monthly_source_name(latest: &progress::MonthRef) -> String {
    encode_path_segment(&format!("{} {}.CSV", latest.year, latest.month_number))
}

fn fetch_csv_text(url: &str) -> Result<String> {
    let client = http_client()?;
    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("request failed: {url}"))?;
    let status = resp.status();
    let body = resp.text().context("failed reading csv body")?;
    if !status.is_success() {
        let snippet = body
            .trim()
            .replace(['\n', '\r'], " ")
            .chars()
            .take(120)
            .collect::<String>();
        return Err(anyhow!("http {status} for {url}: {snippet}"));
    }
    Ok(body)
}

fn parse_rows<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());
    let mut rows = Vec::new();
    for record in reader.deserialize::<T>() {
        rows.push(record.context("malformed csv row")?);
    }
    Ok(rows)
}

fn encode_path_segment(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => {
                let _ = write!(encoded, "%{byte:02X}");
            }
        }
    }
    encoded
}
