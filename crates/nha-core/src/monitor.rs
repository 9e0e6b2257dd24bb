//! Game state tracker
//!
//! [`Monitor`] owns everything learned about the running game and drives
//! one decision per [`Monitor::tick`]:
//!
//! 1. flush the snapshot if a previous tick dirtied it
//! 2. capture a frame and read the status lines (always, synced or not)
//! 3. while synced, run the first matching handler, highest priority first:
//!    death, auto-engrave, engraving wait, control word, purchase price,
//!    sale price, call prompt, discoveries
//!
//! Price deduction and abbreviation are pure functions in
//! [`crate::priceid`] and [`crate::abbrev`]; this module only decides when
//! to call them and what to do with the result.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::Result;
use crate::abbrev;
use crate::boxes::{self, BorderGlyphs};
use crate::catalog;
use crate::config::Config;
use crate::frame::Frame;
use crate::patterns::{self, GamePatterns};
use crate::persistence::{PersistenceStore, PriceIdRecord, Snapshot};
use crate::priceid::{self, TradeDirection};
use crate::tmux::{FrameBridge, Key};

/// Experience level at which tourists stop being overcharged
const TOURIST_SUCKER_LEVEL: u32 = 15;
/// Upper bound on prompts dismissed in one protocol run
const MAX_PROMPTS: usize = 16;

/// Behaviour knobs taken from the `[monitor]` and `[boxes]` config sections
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub max_label_length: usize,
    pub turn_limit: Option<u32>,
    pub aligned_turn_limit: bool,
    pub auto_engrave: bool,
    pub engrave_word: String,
    pub message_duration: Duration,
    pub border_glyphs: BorderGlyphs,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl MonitorSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_label_length: config.monitor.max_label_length,
            turn_limit: config.monitor.turn_limit,
            aligned_turn_limit: config.monitor.aligned_turn_limit,
            auto_engrave: config.monitor.auto_engrave,
            engrave_word: config.monitor.engrave_word.clone(),
            message_duration: config.monitor.message_duration(),
            border_glyphs: config.boxes.clone(),
        }
    }

    /// Turn at which to save and quit, for a game first seen at `turn`
    #[must_use]
    pub fn stop_turn(&self, turn: u32) -> Option<u32> {
        let limit = self.turn_limit.filter(|&limit| limit > 0)?;
        Some(if self.aligned_turn_limit {
            limit.saturating_mul(turn / limit + 1)
        } else {
            turn.saturating_add(limit)
        })
    }
}

/// Whether the tracker trusts it is looking at a live game screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Unsynced,
    Synced,
}

/// Player facts read from the status lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerState {
    pub charisma: u32,
    pub xplevel: u32,
    pub turn: Option<u32>,
    pub tourist: bool,
    pub sucker: bool,
    pub stop_on_turn: Option<u32>,
}

/// Handler that consumed a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AutoEngrave,
    EngravingWait,
    ControlWord,
    PurchasePrice,
    SalePrice,
    CallLabel,
    Discoveries,
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing matched
    Idle,
    Handled(Action),
    /// Knowledge wiped on request; rebuild the monitor
    Reset,
    /// The character died; stop ticking
    GameOver,
}

/// Screen-driven game state machine over a [`FrameBridge`]
pub struct Monitor<B: FrameBridge> {
    bridge: B,
    patterns: GamePatterns,
    settings: MonitorSettings,
    store: Option<PersistenceStore>,
    price_id: BTreeMap<String, PriceIdRecord>,
    known_items: BTreeMap<String, String>,
    player: PlayerState,
    sync: SyncState,
    dirty: bool,
}

impl<B: FrameBridge> Monitor<B> {
    /// Build a monitor, restoring learned facts from `store` if given
    pub fn new(bridge: B, settings: MonitorSettings, store: Option<PersistenceStore>) -> Result<Self> {
        let snapshot = store.as_ref().map(PersistenceStore::load).unwrap_or_default();
        Ok(Self {
            bridge,
            patterns: GamePatterns::compile()?,
            settings,
            store,
            price_id: snapshot.price_id,
            known_items: snapshot.known_items,
            player: PlayerState {
                charisma: snapshot.charisma,
                xplevel: snapshot.xplevel,
                tourist: snapshot.tourist,
                sucker: snapshot.sucker,
                ..PlayerState::default()
            },
            sync: SyncState::Unsynced,
            dirty: false,
        })
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Give the bridge back, e.g. to rebuild after a reset
    pub fn into_bridge(self) -> B {
        self.bridge
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn store(&self) -> Option<&PersistenceStore> {
        self.store.as_ref()
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync
    }

    pub fn price_ids(&self) -> &BTreeMap<String, PriceIdRecord> {
        &self.price_id
    }

    pub fn known_items(&self) -> &BTreeMap<String, String> {
        &self.known_items
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Everything that survives a restart
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            price_id: self.price_id.clone(),
            known_items: self.known_items.clone(),
            charisma: self.player.charisma,
            xplevel: self.player.xplevel,
            sucker: self.player.sucker,
            tourist: self.player.tourist,
        }
    }

    /// Run one iteration of screen analysis
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        self.persist();
        let frame = self.bridge.capture().await?;
        self.read_status(&frame).await?;

        if self.sync != SyncState::Synced {
            return Ok(TickOutcome::Idle);
        }

        if frame.contains(patterns::DEATH_MARKER) {
            tracing::info!(pane = %self.bridge.pane(), "Character died, forgetting this game");
            self.lose_sync();
            self.forget();
            return Ok(TickOutcome::GameOver);
        }
        if self.settings.auto_engrave && frame.contains(patterns::DUST_ENGRAVE_MARKER) {
            tracing::info!(word = %self.settings.engrave_word, "Finger-engraving detected, writing automatically");
            self.write_engrave_word().await?;
            return Ok(TickOutcome::Handled(Action::AutoEngrave));
        }
        if frame.contains(patterns::EWAIT_MARKER) {
            self.engraving_wait().await?;
            return Ok(TickOutcome::Handled(Action::EngravingWait));
        }
        if let Some(command) = patterns::extended_command(&frame) {
            if let Some(outcome) = self.handle_control_word(command.trim()).await? {
                return Ok(outcome);
            }
        }
        if let Some(sale) = self.patterns.sale(&frame) {
            self.identify(&sale.item, sale.price, TradeDirection::Buying)
                .await?;
            self.bridge.wait_for_change().await?;
            return Ok(TickOutcome::Handled(Action::PurchasePrice));
        }
        if let Some(offer) = self.patterns.sell_offer(&frame) {
            self.identify(&offer.item, offer.price, TradeDirection::Selling)
                .await?;
            self.bridge.wait_for_change().await?;
            return Ok(TickOutcome::Handled(Action::SalePrice));
        }
        if let Some(item) = self.patterns.call_prompt(&frame) {
            if self.dispatch_label(&item).await? {
                return Ok(TickOutcome::Handled(Action::CallLabel));
            }
        }
        if self.learn_discoveries(&frame) {
            return Ok(TickOutcome::Handled(Action::Discoveries));
        }

        Ok(TickOutcome::Idle)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn persist(&mut self) {
        if !self.dirty {
            return;
        }
        let Some(store) = self.store.as_ref() else {
            return;
        };
        match store.save(&self.snapshot()) {
            Ok(()) => self.dirty = false,
            Err(e) if e.is_transient() => {
                tracing::warn!(error = %e, "Snapshot write failed, retrying next tick");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Snapshot write failed, persistence disabled for this run");
                self.store = None;
            }
        }
    }

    fn forget(&mut self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.remove() {
                tracing::warn!(error = %e, "Failed to remove snapshot");
            }
        }
        self.dirty = false;
    }

    // =========================================================================
    // Status line
    // =========================================================================

    async fn read_status(&mut self, frame: &Frame) -> Result<()> {
        let reading = self.patterns.status(frame);
        if let Some(turn) = reading.turn {
            self.set_turn(turn).await?;
            if let Some(xplevel) = reading.xplevel {
                self.set_xplevel(xplevel);
            }
        }
        if let Some(charisma) = reading.charisma {
            self.set_charisma(charisma);
            let low_rank = reading
                .rank
                .as_deref()
                .is_some_and(|rank| catalog::TOURIST_LOW_RANKS.contains(&rank));
            if !self.player.tourist && low_rank {
                tracing::info!("Identified as a low-level tourist");
                self.player.tourist = true;
                self.mark_dirty();
            }
            self.check_sucker().await?;
        }
        Ok(())
    }

    async fn set_turn(&mut self, turn: u32) -> Result<()> {
        let previous = self.player.turn;
        if previous.is_none() {
            self.acquire_sync();
            self.player.stop_on_turn = self.settings.stop_turn(turn);
            if let Some(stop) = self.player.stop_on_turn {
                tracing::info!(turn, stop, "Turn limit armed");
            }
        }

        let mut current = Some(turn);
        let limit_reached = self
            .player
            .stop_on_turn
            .is_some_and(|stop| turn >= stop);
        if limit_reached && previous != Some(turn) {
            self.announce("Turn limit reached, saving game...").await?;
            self.mark_dirty();
            if self.save_and_quit().await? {
                current = None;
            }
        }
        self.player.turn = current;
        Ok(())
    }

    fn set_charisma(&mut self, charisma: u32) {
        if self.player.charisma != charisma {
            tracing::info!(charisma, "New charisma value learned");
            self.player.charisma = charisma;
            self.mark_dirty();
        }
    }

    fn set_xplevel(&mut self, xplevel: u32) {
        if self.player.xplevel != xplevel {
            tracing::info!(xplevel, "New experience level learned");
            self.player.xplevel = xplevel;
            self.mark_dirty();
        }
    }

    async fn set_sucker(&mut self, sucker: bool) -> Result<()> {
        if self.player.sucker == sucker {
            return Ok(());
        }
        self.player.sucker = sucker;
        self.mark_dirty();
        if sucker {
            tracing::info!("Identified as sucker");
            self.announce("You are now sucker").await
        } else {
            tracing::info!("No longer identified as sucker");
            self.announce("You are no longer sucker").await
        }
    }

    async fn check_sucker(&mut self) -> Result<()> {
        if self.player.tourist {
            self.set_sucker(self.player.xplevel < TOURIST_SUCKER_LEVEL)
                .await?;
        }
        Ok(())
    }

    fn acquire_sync(&mut self) {
        if self.sync != SyncState::Synced {
            tracing::info!(pane = %self.bridge.pane(), "Acquired sync with the game");
        }
        self.sync = SyncState::Synced;
    }

    fn lose_sync(&mut self) {
        self.sync = SyncState::Unsynced;
        self.player.turn = None;
        self.player.stop_on_turn = None;
        tracing::info!(pane = %self.bridge.pane(), "Lost sync with the game");
    }

    async fn announce(&mut self, text: &str) -> Result<()> {
        let duration = self.settings.message_duration;
        self.bridge.display_message(text, duration, false).await
    }

    // =========================================================================
    // Keystroke protocols
    // =========================================================================

    async fn press(&mut self, keys: &[Key]) -> Result<Frame> {
        self.bridge.send_keys_and_wait(keys).await
    }

    async fn save_and_quit(&mut self) -> Result<bool> {
        let frame = self.press(&[Key::text("S")]).await?;
        if frame.contains(patterns::SAVE_CONFIRM_MARKER) {
            self.bridge.send_keys(&[Key::text("y")]).await?;
            self.lose_sync();
            tracing::info!("Game saved at turn limit");
            return Ok(true);
        }
        tracing::warn!("Game refused to save, will retry on a later turn");
        Ok(false)
    }

    async fn write_engrave_word(&mut self) -> Result<()> {
        let word = self.settings.engrave_word.clone();
        self.press(&[Key::Enter]).await?;
        self.press(&[Key::Text(word)]).await?;
        self.press(&[Key::Enter]).await?;
        self.bridge.send_keys(&[Key::text(":")]).await
    }

    /// Dismiss `--More--` prompts; with `all` unset only the first one
    async fn skip_more(&mut self, mut frame: Frame, all: bool) -> Result<()> {
        for _ in 0..MAX_PROMPTS {
            if !frame.contains(patterns::MORE_MARKER) {
                break;
            }
            self.bridge.send_keys(&[Key::Enter]).await?;
            if !all {
                break;
            }
            frame = self.bridge.wait_for_change().await?;
        }
        Ok(())
    }

    /// Rest one turn on an intact engraving, or engrave it again
    async fn engraving_wait(&mut self) -> Result<()> {
        let word = self.settings.engrave_word.clone();
        self.bridge.send_keys(&[Key::text(":")]).await?;

        for _ in 0..MAX_PROMPTS {
            let frame = self.bridge.wait_for_change().await?;

            if patterns::engraving_intact(&frame, &word) {
                self.skip_more(frame, true).await?;
                let frame = self.press(&[Key::text(".")]).await?;
                if frame.contains(patterns::UNSAFE_REST_MARKER) {
                    tracing::warn!("Cannot rest safely, a hostile is adjacent");
                    return Ok(());
                }
                tracing::info!(word = %word, "Engraving intact, resting");
                let frame = self.press(&[Key::text(":")]).await?;
                return self.skip_more(frame, false).await;
            }

            if frame.contains(patterns::READ_ENGRAVING_MARKER)
                || frame.contains(patterns::NOTHING_HERE_MARKER)
            {
                tracing::info!(word = %word, "Engraving missing or smudged, engraving again");
                self.press(&[Key::text("E")]).await?;
                let mut frame = self.press(&[Key::text("-")]).await?;
                if frame.contains(patterns::ADD_ENGRAVING_MARKER) {
                    frame = self.press(&[Key::text("n")]).await?;
                }
                self.skip_more(frame, true).await?;
                self.press(&[Key::Text(word)]).await?;
                return self.bridge.send_keys(&[Key::Enter, Key::text(":")]).await;
            }

            if frame.contains(patterns::MORE_MARKER) {
                self.skip_more(frame, false).await?;
                continue;
            }

            tracing::info!("Unrecognized messages, skipping engraving wait");
            return Ok(());
        }
        tracing::warn!("Too many prompts, skipping engraving wait");
        Ok(())
    }

    /// Apply an in-band control word typed at the extended command prompt
    async fn handle_control_word(&mut self, command: &str) -> Result<Option<TickOutcome>> {
        let outcome = match command {
            "sucker" => {
                self.set_sucker(true).await?;
                TickOutcome::Handled(Action::ControlWord)
            }
            "!sucker" => {
                self.set_sucker(false).await?;
                TickOutcome::Handled(Action::ControlWord)
            }
            "reset" => {
                tracing::info!("Reset requested, forgetting learned facts");
                self.forget();
                TickOutcome::Reset
            }
            _ => return Ok(None),
        };
        self.bridge
            .send_keys(&[Key::Escape, Key::Escape])
            .await?;
        Ok(Some(outcome))
    }

    // =========================================================================
    // Price identification
    // =========================================================================

    /// Deduce candidates for an item from a quoted price
    ///
    /// Returns whether a record was learned.
    async fn identify(&mut self, item: &str, price: u32, direction: TradeDirection) -> Result<bool> {
        match direction {
            TradeDirection::Buying => tracing::info!(item, price, "Item offered for sale"),
            TradeDirection::Selling => tracing::info!(item, price, "Shopkeeper offers to buy"),
        }

        if let Some(identity) = catalog::fixed_identity(item) {
            tracing::debug!(item, identity, "Appearance is not randomized");
            return Ok(false);
        }
        if let Some(identity) = self.known_items.get(item) {
            tracing::debug!(item, identity = %identity, "Item already identified");
            return Ok(false);
        }
        let Some(found) = catalog::lookup_item(item) else {
            tracing::debug!(item, "Not a price-identifiable item");
            return Ok(false);
        };
        tracing::info!(class = %found.class, appearance = found.appearance, "Item resolved");

        let sucker = Some(self.player.sucker);
        if direction == TradeDirection::Selling {
            let greedy = priceid::infer_shopkeeper_greed(price, found.class, sucker);
            tracing::info!(item, price, greedy = ?greedy, "Shopkeeper greed");
        }

        let candidates: Vec<&str> = priceid::find_price_candidates(
            price,
            found.class,
            self.player.charisma,
            sucker,
            direction,
        )
        .into_iter()
        .filter(|identity| !self.known_elsewhere(identity, item))
        .collect();

        if candidates.is_empty() {
            tracing::info!(item, price, "No items matched the price");
            return Ok(false);
        }
        self.learn(item, &candidates).await?;
        Ok(true)
    }

    /// Identity already confirmed for a different appearance
    fn known_elsewhere(&self, identity: &str, item: &str) -> bool {
        self.known_items
            .iter()
            .any(|(appearance, known)| known == identity && appearance != item)
    }

    async fn learn(&mut self, item: &str, candidates: &[&str]) -> Result<()> {
        let short_name = if let [identity] = candidates {
            tracing::info!(item, identity, "Item uniquely identified");
            self.announce(&format!("Item uniquely identified: {identity}! Now call it."))
                .await?;
            self.known_items
                .insert(item.to_string(), (*identity).to_string());
            self.mark_dirty();
            (*identity).to_string()
        } else {
            let label = abbrev::abbreviate(candidates, self.settings.max_label_length);
            tracing::info!(item, candidates = ?candidates, label = %label, "Possible items");
            self.announce(&format!("Possible items: {label}. Now call it."))
                .await?;
            label
        };

        let current: BTreeSet<&str> = candidates.iter().copied().collect();
        let unchanged = self.price_id.get(item).is_some_and(|record| {
            record.candidates.iter().map(String::as_str).collect::<BTreeSet<_>>() == current
        });
        if unchanged {
            return Ok(());
        }

        let replacing = self.price_id.contains_key(item);
        self.price_id.insert(
            item.to_string(),
            PriceIdRecord {
                short_name: short_name.clone(),
                candidates: candidates.iter().map(|c| (*c).to_string()).collect(),
                item_called: false,
            },
        );
        if replacing {
            tracing::info!(item, label = %short_name, "Label updated");
        } else {
            tracing::info!(item, label = %short_name, "Label recorded");
        }
        self.mark_dirty();
        Ok(())
    }

    /// Type the pending label into an open call prompt
    async fn dispatch_label(&mut self, item: &str) -> Result<bool> {
        let label = match self.price_id.get(item) {
            Some(record) if !record.item_called => record.short_name.clone(),
            _ => return Ok(false),
        };
        self.bridge
            .send_keys(&[Key::Text(label.clone()), Key::Enter])
            .await?;
        if let Some(record) = self.price_id.get_mut(item) {
            record.item_called = true;
        }
        self.bridge.wait_for_change().await?;
        tracing::info!(item, label = %label, "Label typed");
        self.mark_dirty();
        Ok(true)
    }

    // =========================================================================
    // Discoveries
    // =========================================================================

    /// Learn identities from an on-screen discoveries list
    fn learn_discoveries(&mut self, frame: &Frame) -> bool {
        if !frame.contains(patterns::DISCOVERIES_MARKER) {
            return false;
        }
        let mut texts: Vec<String> = boxes::extract_boxes(frame, &self.settings.border_glyphs)
            .into_iter()
            .filter(|panel| panel.contains(patterns::DISCOVERIES_MARKER))
            .collect();
        if texts.is_empty() {
            texts.push(frame.as_str().to_string());
        }

        let mut learned = false;
        for row in texts.iter().flat_map(|text| self.patterns.discoveries(text)) {
            let Some(name) = catalog::discovered_name(&row.identity, &row.appearance) else {
                continue;
            };
            if self.known_items.get(&name) == Some(&row.identity) {
                continue;
            }
            tracing::info!(item = %name, identity = %row.identity, "Learned from discoveries");
            self.known_items.insert(name, row.identity);
            learned = true;
        }
        if learned {
            self.mark_dirty();
        }
        learned
    }
}
