use std::env;

pub const DEFAULT_REMOTE_BASE: &str =
    "https://raw.githubusercontent.com/rasikasrimal/ff-acc-progress/main";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub uid: String,
    pub label: String,
    pub description: String,
}

impl Player {
    pub fn new(uid: &str, label: &str, description: &str) -> Self {
        Self {
            uid: uid.to_string(),
            label: label.to_string(),
            description: description.to_string(),
        }
    }
}

/// Remote base plus the fixed roster. Built once in `main` and handed to the
/// provider; tests construct their own with fixture locations.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub remote_base: String,
    pub players: Vec<Player>,
}

impl TrackerConfig {
    pub fn tracked() -> Self {
        Self {
            remote_base: remote_base_env_or_default(),
            players: default_players(),
        }
    }

    pub fn with_base(remote_base: impl Into<String>, players: Vec<Player>) -> Self {
        Self {
            remote_base: remote_base.into(),
            players,
        }
    }

    pub fn player_base(&self, uid: &str) -> String {
        format!("{}/players/{uid}", self.remote_base.trim_end_matches('/'))
    }
}

fn default_players() -> Vec<Player> {
    vec![
        Player::new(
            "2805365702",
            "Main Account",
            "Full progress tracking (XP, BR score, likes).",
        ),
        Player::new("667352678", "Likes Automation", "Likes-only automation target."),
    ]
}

fn remote_base_env_or_default() -> String {
    env::var("APP_REMOTE_BASE")
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
        .unwrap_or_else(|| DEFAULT_REMOTE_BASE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_base_strips_trailing_slash() {
        let config = TrackerConfig::with_base("http://localhost:8080/", Vec::new());
        assert_eq!(
            config.player_base("123"),
            "http://localhost:8080/players/123"
        );
    }

    #[test]
    fn tracked_roster_is_fixed() {
        let config = TrackerConfig::tracked();
        assert_eq!(config.players.len(), 2);
        assert_eq!(config.players[0].uid, "2805365702");
    }
}
