use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::config::TrackerConfig;
use crate::progress_fetch;
use crate::state::{Delta, ProviderCommand};

/// Background worker that owns all network I/O. Sweeps the roster once on
/// startup, then serves refresh commands until the UI hangs up. Players are
/// processed strictly one at a time; a failed player is reported and the
/// sweep moves on.
pub fn spawn_provider(
    config: TrackerConfig,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) {
    thread::spawn(move || {
        refresh_all(&config, &tx);

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                ProviderCommand::RefreshPlayer { uid } => refresh_player(&config, &uid, &tx),
                ProviderCommand::RefreshAll => refresh_all(&config, &tx),
            }
        }
    });
}

fn refresh_all(config: &TrackerConfig, tx: &Sender<Delta>) {
    for player in &config.players {
        refresh_player(config, &player.uid, tx);
    }
}

fn refresh_player(config: &TrackerConfig, uid: &str, tx: &Sender<Delta>) {
    match progress_fetch::load_player(config, uid) {
        Ok(load) => {
            for warning in load.warnings {
                let _ = tx.send(Delta::Log(format!("[WARN] {warning}")));
            }
            let _ = tx.send(Delta::SetPlayerData {
                uid: uid.to_string(),
                data: load.data,
            });
        }
        Err(err) => {
            let _ = tx.send(Delta::Log(format!("[WARN] Player {uid} load failed: {err:#}")));
            let _ = tx.send(Delta::PlayerUnavailable {
                uid: uid.to_string(),
            });
        }
    }
}
