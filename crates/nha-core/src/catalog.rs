//! Static game data: base cost tables, randomized appearances, tourist ranks
//!
//! These tables mirror vanilla NetHack 3.7 object data. They are consumed
//! read-only by the price engine and the monitor.

use std::fmt;

/// Item classes whose identity is randomized per game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemClass {
    Boots,
    Cloak,
    Helm,
    Gloves,
    Scroll,
    Potion,
    Ring,
    Wand,
    Spellbook,
    Amulet,
}

impl ItemClass {
    /// Every class, in display order
    pub const ALL: [Self; 10] = [
        Self::Boots,
        Self::Cloak,
        Self::Helm,
        Self::Gloves,
        Self::Scroll,
        Self::Potion,
        Self::Ring,
        Self::Wand,
        Self::Spellbook,
        Self::Amulet,
    ];

    /// Name used in game text ("potion", "wand", ...)
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Boots => "boots",
            Self::Cloak => "cloak",
            Self::Helm => "helmet",
            Self::Gloves => "gloves",
            Self::Scroll => "scroll",
            Self::Potion => "potion",
            Self::Ring => "ring",
            Self::Wand => "wand",
            Self::Spellbook => "spellbook",
            Self::Amulet => "amulet",
        }
    }

    /// Classes sharing an inventory symbol
    #[must_use]
    pub fn from_symbol(symbol: char) -> &'static [Self] {
        match symbol {
            '[' => &[Self::Boots, Self::Cloak, Self::Helm, Self::Gloves],
            '?' => &[Self::Scroll],
            '!' => &[Self::Potion],
            '=' => &[Self::Ring],
            '/' => &[Self::Wand],
            '+' => &[Self::Spellbook],
            '"' => &[Self::Amulet],
            _ => &[],
        }
    }

    /// Base cost table, `None` for classes where price carries no information
    #[must_use]
    pub fn cost_table(self) -> Option<&'static [(u32, &'static [&'static str])]> {
        match self {
            Self::Boots => Some(BOOTS_COSTS),
            Self::Cloak => Some(CLOAK_COSTS),
            Self::Helm => Some(HELM_COSTS),
            Self::Gloves => Some(GLOVES_COSTS),
            Self::Scroll => Some(SCROLL_COSTS),
            Self::Potion => Some(POTION_COSTS),
            Self::Ring => Some(RING_COSTS),
            Self::Wand => Some(WAND_COSTS),
            Self::Spellbook => Some(SPELLBOOK_COSTS),
            Self::Amulet => None,
        }
    }

    /// Identities with the given base cost
    #[must_use]
    pub fn items_at(self, cost: u32) -> &'static [&'static str] {
        self.cost_table()
            .and_then(|table| table.iter().find(|(price, _)| *price == cost))
            .map_or(&[], |(_, items)| *items)
    }

    /// Randomized appearances for this class
    #[must_use]
    pub fn appearances(self) -> &'static [&'static str] {
        match self {
            Self::Boots => BOOTS_APPEARANCES,
            Self::Cloak => CLOAK_APPEARANCES,
            Self::Helm => HELM_APPEARANCES,
            Self::Gloves => GLOVES_APPEARANCES,
            Self::Scroll => SCROLL_APPEARANCES,
            Self::Potion => POTION_APPEARANCES,
            Self::Ring => RING_APPEARANCES,
            Self::Wand => WAND_APPEARANCES,
            Self::Spellbook => SPELLBOOK_APPEARANCES,
            Self::Amulet => AMULET_APPEARANCES,
        }
    }

    /// How the game names an unidentified item of this class
    #[must_use]
    pub fn full_name(self, appearance: &str) -> String {
        match self {
            Self::Scroll => format!("scroll labeled {appearance}"),
            Self::Cloak => appearance.to_string(),
            _ => format!("{appearance} {}", self.name()),
        }
    }
}

impl fmt::Display for ItemClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An on-screen item name resolved to its class and randomized appearance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appearance {
    pub class: ItemClass,
    pub appearance: &'static str,
}

/// Resolve an unidentified item name ("bubbly potion", "scroll labeled FNORD")
#[must_use]
pub fn lookup_item(item: &str) -> Option<Appearance> {
    ItemClass::ALL.iter().find_map(|&class| {
        class
            .appearances()
            .iter()
            .find(|appearance| class.full_name(appearance) == item)
            .map(|&appearance| Appearance { class, appearance })
    })
}

/// Class whose cost table lists the identity
#[must_use]
pub fn class_of_identity(identity: &str) -> Option<ItemClass> {
    ItemClass::ALL.iter().copied().find(|class| {
        class.cost_table().is_some_and(|table| {
            table
                .iter()
                .any(|(_, items)| items.contains(&identity))
        })
    })
}

/// Whether any class lists an item at this base cost
#[must_use]
pub fn any_class_has_cost(cost: u32) -> bool {
    ItemClass::ALL
        .iter()
        .any(|class| !class.items_at(cost).is_empty())
}

/// Identity of an item whose appearance never changes between games
#[must_use]
pub fn fixed_identity(item: &str) -> Option<&'static str> {
    FIXED_APPEARANCES
        .iter()
        .find(|(appearance, _)| *appearance == item)
        .map(|(_, identity)| *identity)
}

/// On-screen name of an item listed as `identity (appearance)` in discoveries
///
/// Discoveries print bare appearances ("bubbly"), class-suffixed ones
/// ("combat boots") and labels ("labeled FOOBIE BLETCH").
#[must_use]
pub fn discovered_name(identity: &str, appearance: &str) -> Option<String> {
    let class = class_of_identity(identity)?;
    let label = appearance.strip_prefix("labeled ").unwrap_or(appearance);
    class
        .appearances()
        .iter()
        .find(|&&known| known == label || class.full_name(known) == appearance)
        .map(|known| class.full_name(known))
}

/// Tourist ranks below experience level 14
pub const TOURIST_LOW_RANKS: &[&str] = &[
    "Rambler",
    "Sightseer",
    "Excursionist",
    "Peregrinator",
    "Peregrinatrix",
    "Traveler",
];

/// Substrings naming an item's class inside its identity
pub const CLASS_QUALIFIERS: &[&str] = &[
    " boots",
    " cloak",
    "cloak of ",
    "helm of ",
    " gloves",
    "gauntlets of ",
    "scroll of ",
    "potion of ",
    "ring of ",
    "wand of ",
    "spellbook of ",
];

const FIXED_APPEARANCES: &[(&str, &str)] = &[
    ("coarse mantelet", "orcish cloak"),
    ("apron", "alchemy smock"),
    ("hooded cloak", "dwarvish cloak"),
    ("slippery cloak", "oilskin cloak"),
    ("faded pall", "elven cloak"),
    ("unlabeled scroll", "blank paper"),
    ("clear potion", "water"),
];

const BOOTS_COSTS: &[(u32, &[&str])] = &[
    (8, &["elven boots", "kicking boots"]),
    (30, &["fumble boots", "levitation boots"]),
    (50, &["jumping boots", "speed boots", "water walking boots"]),
];

const CLOAK_COSTS: &[(u32, &[&str])] = &[
    (40, &["leather cloak", "orcish cloak"]),
    (50, &["cloak of displacement", "cloak of protection"]),
    (60, &["cloak of invisibility", "cloak of magic resistance"]),
];

const HELM_COSTS: &[(u32, &[&str])] = &[
    (10, &["helmet"]),
    (
        50,
        &[
            "helm of brilliance",
            "helm of opposite alignment",
            "helm of telepathy",
            "helm of caution",
        ],
    ),
];

const GLOVES_COSTS: &[(u32, &[&str])] = &[
    (8, &["leather gloves"]),
    (
        50,
        &[
            "gauntlets of dexterity",
            "gauntlets of fumbling",
            "gauntlets of power",
        ],
    ),
];

const SCROLL_COSTS: &[(u32, &[&str])] = &[
    (20, &["scroll of identify"]),
    (50, &["scroll of light"]),
    (60, &["scroll of enchant weapon"]),
    (80, &["scroll of enchant armor", "scroll of remove curse"]),
    (
        100,
        &[
            "scroll of confuse monster",
            "scroll of destroy armor",
            "scroll of fire",
            "scroll of food detection",
            "scroll of gold detection",
            "scroll of magic mapping",
            "scroll of scare monster",
            "scroll of teleportation",
        ],
    ),
    (
        200,
        &[
            "scroll of amnesia",
            "scroll of create monster",
            "scroll of earth",
            "scroll of taming",
        ],
    ),
    (
        300,
        &[
            "scroll of charging",
            "scroll of genocide",
            "scroll of punishment",
            "scroll of stinking cloud",
        ],
    ),
];

const POTION_COSTS: &[(u32, &[&str])] = &[
    (20, &["potion of healing"]),
    (
        50,
        &[
            "potion of booze",
            "potion of fruit juice",
            "potion of see invisible",
            "potion of sickness",
        ],
    ),
    (
        100,
        &[
            "potion of confusion",
            "potion of extra healing",
            "potion of hallucination",
            "potion of restore ability",
            "potion of sleeping",
        ],
    ),
    (
        150,
        &[
            "potion of blindness",
            "potion of gain energy",
            "potion of invisibility",
            "potion of monster detection",
            "potion of object detection",
        ],
    ),
    (
        200,
        &[
            "potion of enlightenment",
            "potion of full healing",
            "potion of levitation",
            "potion of polymorph",
            "potion of speed",
        ],
    ),
    (250, &["potion of acid", "potion of oil"]),
    (
        300,
        &[
            "potion of gain ability",
            "potion of gain level",
            "potion of paralysis",
        ],
    ),
];

const RING_COSTS: &[(u32, &[&str])] = &[
    (
        100,
        &[
            "ring of adornment",
            "ring of hunger",
            "ring of protection",
            "ring of protection from shape changers",
            "ring of stealth",
            "ring of sustain ability",
            "ring of warning",
        ],
    ),
    (
        150,
        &[
            "ring of aggravate monster",
            "ring of cold resistance",
            "ring of gain constitution",
            "ring of gain strength",
            "ring of increase accuracy",
            "ring of increase damage",
            "ring of invisibility",
            "ring of poison resistance",
            "ring of see invisible",
            "ring of shock resistance",
        ],
    ),
    (
        200,
        &[
            "ring of fire resistance",
            "ring of free action",
            "ring of levitation",
            "ring of regeneration",
            "ring of searching",
            "ring of slow digestion",
            "ring of teleportation",
        ],
    ),
    (
        300,
        &[
            "ring of conflict",
            "ring of polymorph",
            "ring of polymorph control",
            "ring of teleport control",
        ],
    ),
];

const WAND_COSTS: &[(u32, &[&str])] = &[
    (100, &["wand of light", "wand of nothing"]),
    (
        150,
        &[
            "wand of digging",
            "wand of enlightenment",
            "wand of locking",
            "wand of magic missile",
            "wand of make invisible",
            "wand of opening",
            "wand of probing",
            "wand of secret door detection",
            "wand of slow monster",
            "wand of speed monster",
            "wand of striking",
            "wand of undead turning",
        ],
    ),
    (
        175,
        &["wand of cold", "wand of fire", "wand of lightning", "wand of sleep"],
    ),
    (
        200,
        &[
            "wand of cancellation",
            "wand of create monster",
            "wand of polymorph",
            "wand of teleportation",
        ],
    ),
    (500, &["wand of death", "wand of wishing"]),
];

const SPELLBOOK_COSTS: &[(u32, &[&str])] = &[
    (
        100,
        &[
            "spellbook of force bolt",
            "spellbook of protection",
            "spellbook of detect monsters",
            "spellbook of light",
            "spellbook of sleep",
            "spellbook of jumping",
            "spellbook of healing",
            "spellbook of knock",
        ],
    ),
    (
        200,
        &[
            "spellbook of magic missile",
            "spellbook of drain life",
            "spellbook of create monster",
            "spellbook of detect food",
            "spellbook of confuse monster",
            "spellbook of slow monster",
            "spellbook of cure blindness",
            "spellbook of wizard lock",
            "spellbook of chain lightning",
        ],
    ),
    (
        300,
        &[
            "spellbook of remove curse",
            "spellbook of clairvoyance",
            "spellbook of detect unseen",
            "spellbook of identify",
            "spellbook of cause fear",
            "spellbook of charm monster",
            "spellbook of haste self",
            "spellbook of cure sickness",
            "spellbook of extra healing",
            "spellbook of stone to flesh",
        ],
    ),
    (
        400,
        &[
            "spellbook of cone of cold",
            "spellbook of fireball",
            "spellbook of detect treasure",
            "spellbook of invisibility",
            "spellbook of levitation",
            "spellbook of restore ability",
        ],
    ),
    (500, &["spellbook of magic mapping", "spellbook of dig"]),
    (
        600,
        &[
            "spellbook of create familiar",
            "spellbook of turn undead",
            "spellbook of teleport away",
            "spellbook of polymorph",
        ],
    ),
    (
        700,
        &["spellbook of finger of death", "spellbook of cancellation"],
    ),
];

const SCROLL_APPEARANCES: &[&str] = &[
    "ZELGO MER",
    "JUYED AWK YACC",
    "NR 9",
    "XIXAXA XOXAXA XUXAXA",
    "PRATYAVAYAH",
    "DAIYEN FOOELS",
    "LEP GEX VEN ZEA",
    "PRIRUTSENIE",
    "ELBIB YLOH",
    "VERR YED HORRE",
    "VENZAR BORGAVVE",
    "THARR",
    "YUM YUM",
    "KERNOD WEL",
    "ELAM EBOW",
    "DUAM XNAHT",
    "ANDOVA BEGARIN",
    "KIRJE",
    "VE FORBRYDERNE",
    "HACKEM MUCHE",
    "VELOX NEB",
    "FOOBIE BLETCH",
    "TEMOV",
    "GARVEN DEH",
    "READ ME",
    "ETAOIN SHRDLU",
    "LOREM IPSUM",
    "FNORD",
    "KO BATE",
    "ABRA KA DABRA",
    "ASHPD SODALG",
    "MAPIRO MAHAMA DIROMAT",
    "GNIK SISI VLE",
    "HAPAX LEGOMENON",
    "EIRIS SAZUN IDISI",
    "PHOL ENDE WODAN",
    "GHOTI",
    "ZLORFIK",
    "VAS CORP BET MANI",
    "STRC PRST SKRZ KRK",
    "XOR OTA",
];

const POTION_APPEARANCES: &[&str] = &[
    "ruby",
    "pink",
    "orange",
    "yellow",
    "emerald",
    "dark green",
    "cyan",
    "sky blue",
    "brilliant blue",
    "magenta",
    "purple-red",
    "puce",
    "milky",
    "swirly",
    "bubbly",
    "smoky",
    "cloudy",
    "effervescent",
    "black",
    "golden",
    "brown",
    "fizzy",
    "dark",
    "white",
    "murky",
];

const SPELLBOOK_APPEARANCES: &[&str] = &[
    "parchment",
    "vellum",
    "ragged",
    "dog eared",
    "mottled",
    "stained",
    "cloth",
    "leather",
    "white",
    "pink",
    "red",
    "orange",
    "yellow",
    "velvet",
    "light green",
    "dark green",
    "turquoise",
    "cyan",
    "light blue",
    "dark blue",
    "indigo",
    "magenta",
    "purple",
    "violet",
    "tan",
    "plaid",
    "light brown",
    "dark brown",
    "gray",
    "wrinkled",
    "dusty",
    "bronze",
    "copper",
    "silver",
    "gold",
    "glittering",
    "shining",
    "dull",
    "thin",
    "thick",
    "checkered",
];

const RING_APPEARANCES: &[&str] = &[
    "pearl",
    "iron",
    "twisted",
    "steel",
    "wire",
    "engagement",
    "shiny",
    "bronze",
    "brass",
    "copper",
    "silver",
    "gold",
    "wooden",
    "granite",
    "opal",
    "clay",
    "coral",
    "black onyx",
    "moonstone",
    "tiger eye",
    "jade",
    "agate",
    "topaz",
    "sapphire",
    "ruby",
    "diamond",
    "ivory",
    "emerald",
];

const AMULET_APPEARANCES: &[&str] = &[
    "circular",
    "spherical",
    "oval",
    "triangular",
    "pyramidal",
    "square",
    "concave",
    "hexagonal",
    "octagonal",
];

const WAND_APPEARANCES: &[&str] = &[
    "aluminum",
    "balsa",
    "brass",
    "copper",
    "crystal",
    "curved",
    "ebony",
    "forked",
    "glass",
    "hexagonal",
    "iridium",
    "iron",
    "jeweled",
    "long",
    "maple",
    "marble",
    "oak",
    "pine",
    "platinum",
    "runed",
    "short",
    "silver",
    "spiked",
    "steel",
    "tin",
    "uranium",
    "zinc",
];

const HELM_APPEARANCES: &[&str] = &["plumed", "etched", "crested", "visored"];

const CLOAK_APPEARANCES: &[&str] = &[
    "tattered cape",
    "ornamental cope",
    "opera cloak",
    "piece of cloth",
];

const GLOVES_APPEARANCES: &[&str] = &["old", "padded", "riding", "fencing"];

const BOOTS_APPEARANCES: &[&str] = &[
    "mud", "snow", "riding", "buckled", "hiking", "combat", "jungle",
];
