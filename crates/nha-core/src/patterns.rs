//! Game text patterns
//!
//! Every piece of screen understanding is a regex over game-emitted text
//! or a fixed marker substring. Patterns compile once into
//! [`GamePatterns`]; the typed accessors turn matches into small structs
//! so callers never touch capture group names.

use regex::Regex;

use crate::Result;
use crate::error::PatternError;
use crate::frame::{self, Frame, FrameMatch};

/// "Do you want your possessions identified?"
pub const DEATH_MARKER: &str = "Do you want your possessions identified?";
/// Finger-engraving in dust has started
pub const DUST_ENGRAVE_MARKER: &str = "You write in the dust with your fingertip.--More--";
/// Echo of the unbound wizard-mode command used as the wait-on-engraving key
pub const EWAIT_MARKER: &str = "Unavailable command 'wizdetect'.";
pub const MORE_MARKER: &str = "--More--";
/// Resting refused because a hostile is adjacent
pub const UNSAFE_REST_MARKER: &str = "Are you waiting to get hit?";
pub const ADD_ENGRAVING_MARKER: &str = "Do you want to add to the current engraving?";
pub const NOTHING_HERE_MARKER: &str = "You see no objects here.";
/// Prefix of any engraving being read back
pub const READ_ENGRAVING_MARKER: &str = "You read: \"";
pub const SAVE_CONFIRM_MARKER: &str = "Really save? [yn]";
pub const DISCOVERIES_MARKER: &str = "Discoveries";
/// Top-line prefix of an open extended command prompt
pub const EXTCMD_PREFIX: &str = "# ";

const SALE_RE: &str = r"(?:You see here |Things that are here: )?(?:a|an|(?P<quantity>\d+)) (?P<item>[\w -]+) \(for sale, (?P<price>\d+) zorkmids\)";
const PICKUP_SALE_RE: &str =
    r#""For you, [\w ]+; only (?P<price>\d+) zorkmids for this (?P<item>.+?)\.""#;
const OFFER_RE: &str = r"[\w '=-]+ offers (?P<price>\d+) gold pieces for your (?P<item>[\w -]+)\.(?:  Sell it\?)?";
const STATUS_RE: &str = r"\[(?P<name>[\w _-]+?)\s+the\s+(?P<rank>[\w _-]+?)\s+\]\s+St:(?P<strength>\d+(?:/\d+)?)\s+Dx:(?P<dexterity>\d+)\s+Co:(?P<constitution>\d+)\s+In:(?P<intelligence>\d+)\s+Wi:(?P<wisdom>\d+)\s+Ch:(?P<charisma>\d+)\s+(?P<alignment>\w+)";
const STATUS_CONT_RE: &str = r"(?:Dlvl:)?(?:(?P<dlvl>\d+)|(?P<plane>[\w ]+))\s+\$:(?P<money>\d+)\s+HP:(?P<hp>\d+)\((?P<maxhp>\d+)\)\s+Pw:(?P<pw>\d+)\((?P<maxpw>\d+)\)\s+AC:(?P<ac>-?\d+)\s+(?:Xp:|HD:)(?:(?P<xplevel>\d+)/(?P<xp>\d+)|(?P<hd>\d+))\s+T:(?P<turn>\d+)";
const CALL_PROMPT_RE: &str = r"^Call (?:a|an) (?P<item>[\w -]+):\s\s+";
const DISCOVERY_RE: &str =
    r"(?:\*| ) (?P<item>[\w ]+?)(?: called (?P<called>.+))? \((?P<appearance>[\w ]+)\)";

/// Item quoted for sale, price already divided by quantity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleNotice {
    pub item: String,
    pub price: u32,
}

/// Shopkeeper offering to buy an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellOffer {
    pub item: String,
    pub price: u32,
}

/// Fields read from the two bottom status lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReading {
    pub turn: Option<u32>,
    pub xplevel: Option<u32>,
    pub charisma: Option<u32>,
    pub rank: Option<String>,
}

/// One `identity (appearance)` row of the discoveries list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRow {
    pub identity: String,
    pub appearance: String,
}

/// Compiled game patterns
#[derive(Debug, Clone)]
pub struct GamePatterns {
    sale: Regex,
    pickup_sale: Regex,
    offer: Regex,
    status: Regex,
    status_cont: Regex,
    call_prompt: Regex,
    discovery: Regex,
}

fn compile(name: &str, raw: &str) -> Result<Regex> {
    Regex::new(raw).map_err(|e| {
        PatternError::InvalidRegex(format!("pattern '{name}' has invalid regex: {e}")).into()
    })
}

impl GamePatterns {
    pub fn compile() -> Result<Self> {
        Ok(Self {
            sale: compile("sale", SALE_RE)?,
            pickup_sale: compile("pickup_sale", PICKUP_SALE_RE)?,
            offer: compile("offer", OFFER_RE)?,
            status: compile("status", STATUS_RE)?,
            status_cont: compile("status_cont", STATUS_CONT_RE)?,
            call_prompt: compile("call_prompt", CALL_PROMPT_RE)?,
            discovery: compile("discovery", DISCOVERY_RE)?,
        })
    }

    /// First item quoted for sale, from a listing or a pickup quote
    #[must_use]
    pub fn sale(&self, frame: &Frame) -> Option<SaleNotice> {
        frame::search_all(frame, &self.sale, true)
            .chain(frame::search_all(frame, &self.pickup_sale, true))
            .find_map(|m| sale_notice(&m))
    }

    #[must_use]
    pub fn sell_offer(&self, frame: &Frame) -> Option<SellOffer> {
        let m = frame::search(frame, &self.offer, true)?;
        Some(SellOffer {
            item: m.group("item")?.to_string(),
            price: m.number("price")?,
        })
    }

    /// Status line fields; absent fields stay `None`
    #[must_use]
    pub fn status(&self, frame: &Frame) -> StatusReading {
        let mut reading = StatusReading::default();
        if let Some(m) = frame::search(frame, &self.status_cont, false) {
            reading.turn = m.number("turn");
            reading.xplevel = m.number("xplevel");
        }
        if let Some(m) = frame::search(frame, &self.status, false) {
            reading.charisma = m.number("charisma");
            reading.rank = m.group("rank").map(str::to_string);
        }
        reading
    }

    /// Item named by an open call prompt
    #[must_use]
    pub fn call_prompt(&self, frame: &Frame) -> Option<String> {
        frame::search(frame, &self.call_prompt, false)
            .and_then(|m| m.group("item").map(str::to_string))
    }

    /// Discovery rows in `text`, which is either a whole frame or a panel
    #[must_use]
    pub fn discoveries(&self, text: &str) -> Vec<DiscoveryRow> {
        text.lines()
            .filter_map(|line| self.discovery.captures(line))
            .filter_map(|caps| {
                Some(DiscoveryRow {
                    identity: caps.name("item")?.as_str().trim().to_string(),
                    appearance: caps.name("appearance")?.as_str().trim().to_string(),
                })
            })
            .collect()
    }
}

fn sale_notice(m: &FrameMatch) -> Option<SaleNotice> {
    let price = m.number("price")?;
    let quantity = m.number("quantity").filter(|&q| q > 0).unwrap_or(1);
    Some(SaleNotice {
        item: singular(m.group("item")?),
        price: price / quantity,
    })
}

/// Singular form of a stacked item name
#[must_use]
pub fn singular(item: &str) -> String {
    item.replace("potions", "potion").replace("scrolls", "scroll")
}

/// Text typed into an open extended command prompt
#[must_use]
pub fn extended_command(frame: &Frame) -> Option<&str> {
    frame.top_line().strip_prefix(EXTCMD_PREFIX)
}

/// Engraving read back with exactly `word`
#[must_use]
pub fn engraving_intact(frame: &Frame, word: &str) -> bool {
    frame.contains(&format!("{READ_ENGRAVING_MARKER}{word}\"."))
}
