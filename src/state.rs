use std::collections::VecDeque;
use std::time::SystemTime;

use serde::Deserialize;

use crate::config::{Player, TrackerConfig};

pub const AGGREGATE_MONTH: &str = "ALL";

const LOG_CAPACITY: usize = 200;

/// One summary.csv row: one reporting month, or the all-time aggregate row
/// whose Month is the "ALL" sentinel. Values stay as the source emitted them;
/// blank cells decode to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SummaryRecord {
    #[serde(rename = "Year", default)]
    pub year: String,
    #[serde(rename = "Month", default)]
    pub month: String,
    #[serde(rename = "Days Logged", default)]
    pub days_logged: String,
    #[serde(rename = "Start XP", default)]
    pub start_xp: String,
    #[serde(rename = "End XP", default)]
    pub end_xp: String,
    #[serde(rename = "Total XP Gained", default)]
    pub total_xp_gained: String,
    #[serde(rename = "Average Daily XP Gained", default)]
    pub average_daily_xp: String,
}

/// One likes_activity.csv row. Source order is trusted chronological.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LikesRecord {
    #[serde(rename = "Date", default)]
    pub date: String,
    #[serde(rename = "Likes Before", default)]
    pub likes_before: String,
    #[serde(rename = "Likes After", default)]
    pub likes_after: String,
    #[serde(rename = "Likes Received", default)]
    pub likes_received: String,
    #[serde(rename = "Success", default)]
    pub success: String,
}

/// One monthly detail row. The source files carry more columns (BR score,
/// likes, notes); only Date and XP feed the chart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyRecord {
    #[serde(rename = "Date", default)]
    pub date: String,
    #[serde(rename = "XP", default)]
    pub xp: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyPoint {
    pub date: String,
    pub xp: f64,
}

/// Everything derived for one player in a single refresh. Rebuilt from
/// scratch each time; nothing here is mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct PlayerData {
    pub summary: Vec<SummaryRecord>,
    pub likes: Vec<LikesRecord>,
    pub daily_series: Vec<DailyPoint>,
    pub month_label: String,
    pub latest_summary: Option<SummaryRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    Loading,
    Ready,
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct PlayerSection {
    pub player: Player,
    pub status: PlayerStatus,
    pub data: Option<PlayerData>,
    pub fetched_at: Option<SystemTime>,
}

impl PlayerSection {
    fn new(player: Player) -> Self {
        Self {
            player,
            status: PlayerStatus::Loading,
            data: None,
            fetched_at: None,
        }
    }

    pub fn badge(&self) -> String {
        match self.status {
            PlayerStatus::Loading => "Loading data…".to_string(),
            PlayerStatus::Unavailable => "Data unavailable".to_string(),
            PlayerStatus::Ready => {
                let label = self
                    .data
                    .as_ref()
                    .map(|data| data.month_label.as_str())
                    .filter(|label| !label.is_empty())
                    .unwrap_or("N/A");
                format!("Latest month: {label}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Roster,
    Dashboard,
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetPlayerData { uid: String, data: PlayerData },
    PlayerUnavailable { uid: String },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    RefreshPlayer { uid: String },
    RefreshAll,
}

pub struct AppState {
    pub screen: Screen,
    pub selected: usize,
    pub sections: Vec<PlayerSection>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl AppState {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            screen: Screen::Roster,
            selected: 0,
            sections: config
                .players
                .iter()
                .cloned()
                .map(PlayerSection::new)
                .collect(),
            logs: VecDeque::with_capacity(LOG_CAPACITY),
            help_overlay: false,
        }
    }

    pub fn selected_section(&self) -> Option<&PlayerSection> {
        self.sections.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if !self.sections.is_empty() {
            self.selected = (self.selected + 1).min(self.sections.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn mark_loading(&mut self, uid: &str) {
        if let Some(section) = self.section_mut(uid) {
            section.status = PlayerStatus::Loading;
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        if self.logs.len() == LOG_CAPACITY {
            self.logs.pop_front();
        }
        self.logs.push_back(msg.into());
    }

    fn section_mut(&mut self, uid: &str) -> Option<&mut PlayerSection> {
        self.sections
            .iter_mut()
            .find(|section| section.player.uid == uid)
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetPlayerData { uid, data } => {
            if let Some(section) = state.section_mut(&uid) {
                section.status = PlayerStatus::Ready;
                section.data = Some(data);
                section.fetched_at = Some(SystemTime::now());
            }
        }
        Delta::PlayerUnavailable { uid } => {
            if let Some(section) = state.section_mut(&uid) {
                section.status = PlayerStatus::Unavailable;
                section.data = None;
                section.fetched_at = Some(SystemTime::now());
            }
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
