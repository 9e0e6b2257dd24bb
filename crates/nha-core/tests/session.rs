//! End-to-end monitor sessions against a replayed screen.

use std::collections::VecDeque;
use std::time::Duration;

use nha_core::Result;
use nha_core::frame::Frame;
use nha_core::monitor::{Action, Monitor, MonitorSettings, SyncState, TickOutcome};
use nha_core::persistence::PersistenceStore;
use nha_core::tmux::{FrameBridge, Key};

struct Replay {
    frames: VecDeque<Frame>,
    current: Frame,
    typed: Vec<Key>,
}

impl Replay {
    fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
            current: Frame::default(),
            typed: Vec::new(),
        }
    }

    fn next(&mut self) -> Frame {
        if let Some(frame) = self.frames.pop_front() {
            self.current = frame;
        }
        self.current.clone()
    }
}

impl FrameBridge for Replay {
    fn pane(&self) -> &str {
        "game:1.0"
    }

    fn current(&self) -> &Frame {
        &self.current
    }

    async fn capture(&mut self) -> Result<Frame> {
        Ok(self.next())
    }

    async fn wait_for_change(&mut self) -> Result<Frame> {
        Ok(self.next())
    }

    async fn send_keys(&mut self, keys: &[Key]) -> Result<()> {
        self.typed.extend_from_slice(keys);
        Ok(())
    }

    async fn display_message(&mut self, _text: &str, _duration: Duration, _modal: bool) -> Result<()> {
        Ok(())
    }
}

fn screen(top: &str, turn: u32) -> Frame {
    Frame::from_lines(&[
        top.to_string(),
        String::new(),
        "[Wulfgar the Stripling   ] St:18 Dx:12 Co:16 In:8 Wi:10 Ch:11 Lawful".to_string(),
        format!("Dlvl:2 $:300 HP:16(16) Pw:1(1) AC:6 Xp:2/25 T:{turn}"),
    ])
}

#[tokio::test]
async fn shop_visit_then_death() {
    let dir = tempfile::tempdir().unwrap();
    let store = PersistenceStore::new(dir.path().join("nha.json"));

    let replay = Replay::new(vec![
        screen("", 40),
        screen("You see here a ruby ring (for sale, 150 zorkmids).", 41),
        screen("", 41),
        screen("Call a ruby ring:   ", 42),
        screen("", 42),
        screen("", 43),
        screen("Do you want your possessions identified? [ynq] (n)", 43),
    ]);
    let mut monitor = Monitor::new(replay, MonitorSettings::default(), Some(store.clone())).unwrap();

    assert_eq!(monitor.tick().await.unwrap(), TickOutcome::Idle);
    assert_eq!(monitor.sync_state(), SyncState::Synced);
    assert_eq!(
        monitor.tick().await.unwrap(),
        TickOutcome::Handled(Action::PurchasePrice)
    );
    assert_eq!(
        monitor.tick().await.unwrap(),
        TickOutcome::Handled(Action::CallLabel)
    );
    assert_eq!(monitor.tick().await.unwrap(), TickOutcome::Idle);

    let saved = store.load();
    let record = &saved.price_id["ruby ring"];
    assert!(record.item_called);
    assert!(record.candidates.iter().all(|c| c.starts_with("ring of ")));
    assert_eq!(saved.charisma, 11);

    assert_eq!(monitor.tick().await.unwrap(), TickOutcome::GameOver);
    assert!(!store.path().exists());

    let replay = monitor.into_bridge();
    assert_eq!(replay.typed.last(), Some(&Key::Enter));
}

#[tokio::test]
async fn reset_rebuilds_from_scratch() {
    let dir = tempfile::tempdir().unwrap();
    let store = PersistenceStore::new(dir.path().join("nha.json"));

    let replay = Replay::new(vec![
        screen("", 40),
        screen("You see here a ruby ring (for sale, 150 zorkmids).", 41),
        screen("", 41),
        screen("", 42),
        screen("# reset", 42),
        screen("", 43),
    ]);
    let mut monitor = Monitor::new(replay, MonitorSettings::default(), Some(store.clone())).unwrap();
    for _ in 0..3 {
        monitor.tick().await.unwrap();
    }
    assert!(store.path().exists());
    assert_eq!(monitor.tick().await.unwrap(), TickOutcome::Reset);
    assert!(!store.path().exists());

    let replay = monitor.into_bridge();
    let mut monitor = Monitor::new(replay, MonitorSettings::default(), Some(store)).unwrap();
    assert!(monitor.price_ids().is_empty());
    assert_eq!(monitor.player().charisma, 0);
    assert_eq!(monitor.sync_state(), SyncState::Unsynced);

    monitor.tick().await.unwrap();
    assert_eq!(monitor.sync_state(), SyncState::Synced);
}

#[tokio::test]
async fn pending_label_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = PersistenceStore::new(dir.path().join("nha.json"));

    let first = Replay::new(vec![
        screen("", 40),
        screen("You see here a ruby ring (for sale, 150 zorkmids).", 41),
        screen("", 41),
        screen("", 42),
    ]);
    let mut monitor = Monitor::new(first, MonitorSettings::default(), Some(store.clone())).unwrap();
    for _ in 0..3 {
        monitor.tick().await.unwrap();
    }
    let label = monitor.price_ids()["ruby ring"].short_name.clone();
    drop(monitor);

    let second = Replay::new(vec![screen("", 50), screen("Call a ruby ring:   ", 50)]);
    let mut monitor = Monitor::new(second, MonitorSettings::default(), Some(store)).unwrap();
    monitor.tick().await.unwrap();
    assert_eq!(
        monitor.tick().await.unwrap(),
        TickOutcome::Handled(Action::CallLabel)
    );
    let replay = monitor.into_bridge();
    assert_eq!(replay.typed, vec![Key::Text(label), Key::Enter]);
}
