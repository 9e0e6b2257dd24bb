//! Call-label abbreviation
//!
//! Candidate identities have to fit into the game's naming prompt, so the
//! label is shortened in phases until the slash-joined result fits the
//! budget:
//!
//! 1. class qualifiers stripped, names joined as they are;
//! 2. a dictionary pass: CamelCase (step 0), then four progressively
//!    shorter hand-picked forms (steps 1-4);
//! 3. after a dictionary step fits, spare room is spent lengthening the
//!    most compressed names back toward a readable form;
//! 4. if the dictionary never fits, words are truncated uniformly.

use crate::catalog::CLASS_QUALIFIERS;

const SEPARATOR: &str = "/";

/// Remove class words ("potion of ", " boots", ...) from an identity
#[must_use]
pub fn strip_class_qualifiers(identity: &str) -> String {
    CLASS_QUALIFIERS
        .iter()
        .fold(identity.to_string(), |name, qualifier| name.replace(qualifier, ""))
}

/// Shorten candidate identities into one label of at most `budget` chars
///
/// Best effort: when even the narrowest form is too long, the shortest
/// attempt is returned.
#[must_use]
pub fn abbreviate(identities: &[&str], budget: usize) -> String {
    let names: Vec<String> = identities
        .iter()
        .map(|identity| strip_class_qualifiers(identity))
        .collect();

    let plain = names.join(SEPARATOR);
    if width(&plain) <= budget {
        return plain;
    }

    let forms: Vec<Forms> = names.iter().map(|name| Forms::new(name)).collect();
    for step in 0..LEVELS {
        let joined = join_level(&forms, step);
        if width(&joined) <= budget {
            if step == 0 {
                return joined;
            }
            return fine_tune(&forms, step, budget);
        }
    }

    let narrowest = join_level(&forms, LEVELS - 1);
    let truncated = truncate_words(&names, budget);
    if width(&truncated) <= width(&narrowest) {
        truncated
    } else {
        narrowest
    }
}

const LEVELS: usize = 5;

/// Every abbreviation level for one name; index 0 is CamelCase
struct Forms {
    /// Width of the stripped name before any abbreviation
    original: usize,
    levels: [String; LEVELS],
}

impl Forms {
    fn new(name: &str) -> Self {
        let camel: String = name.split_whitespace().map(capitalize).collect();
        let levels = match dictionary_entry(name) {
            Some(entry) => [
                camel,
                entry[0].to_string(),
                entry[1].to_string(),
                entry[2].to_string(),
                entry[3].to_string(),
            ],
            None => std::array::from_fn(|_| camel.clone()),
        };
        Self {
            original: width(name),
            levels,
        }
    }

    fn at(&self, level: usize) -> &str {
        &self.levels[level]
    }
}

fn width(text: &str) -> usize {
    text.chars().count()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect()
    })
}

fn join_level(forms: &[Forms], level: usize) -> String {
    forms
        .iter()
        .map(|form| form.at(level))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

fn fine_tune(forms: &[Forms], step: usize, budget: usize) -> String {
    let mut chosen = vec![step; forms.len()];
    let mut leftover = budget.saturating_sub(width(&join_level(forms, step)));

    for index in lengthening_order(forms, step) {
        let current = width(forms[index].at(chosen[index]));
        for level in 0..step {
            let longer = width(forms[index].at(level));
            if longer <= current {
                continue;
            }
            let extra = longer - current;
            if extra <= leftover {
                chosen[index] = level;
                leftover -= extra;
                break;
            }
        }
    }

    let mut parts: Vec<&str> = forms
        .iter()
        .zip(&chosen)
        .map(|(form, &level)| form.at(level))
        .collect();
    parts.sort_unstable();
    parts.join(SEPARATOR)
}

/// Most compressed first; equal ratios keep input order
fn lengthening_order(forms: &[Forms], step: usize) -> Vec<usize> {
    #[allow(clippy::cast_precision_loss)]
    let ratio = |form: &Forms| form.original as f64 / width(form.at(step)).max(1) as f64;
    let mut order: Vec<usize> = (0..forms.len()).collect();
    order.sort_by(|&a, &b| ratio(&forms[b]).total_cmp(&ratio(&forms[a])));
    order
}

fn truncate_words(names: &[String], budget: usize) -> String {
    let words: Vec<Vec<String>> = names
        .iter()
        .map(|name| name.split_whitespace().map(capitalize).collect())
        .collect();
    let longest = words.iter().flatten().map(|word| width(word)).max().unwrap_or(0);

    let mut attempt = String::new();
    for size in (1..=longest).rev() {
        attempt = words
            .iter()
            .map(|item| {
                let keep = size.div_ceil(item.len().max(1));
                item.iter()
                    .map(|word| word.chars().take(keep).collect::<String>())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join(SEPARATOR);
        if width(&attempt) <= budget {
            break;
        }
    }
    attempt
}

fn dictionary_entry(name: &str) -> Option<&'static [&'static str; 4]> {
    ABBREVIATIONS
        .binary_search_by(|(key, _)| key.cmp(&name))
        .ok()
        .map(|index| &ABBREVIATIONS[index].1)
}

/// Hand-picked short forms, sorted by name for binary search
const ABBREVIATIONS: &[(&str, [&str; 4])] = &[
    ("acid", ["Acid", "Acid", "Acd", "Ac"]),
    ("adornment", ["Adorn", "Adrn", "Adn", "Ad"]),
    ("aggravate monster", ["AggrMon", "AggMn", "Agg", "Ag"]),
    ("amnesia", ["Amnes", "Amns", "Amn", "Am"]),
    ("blindness", ["Blind", "Blnd", "Bli", "Bl"]),
    ("booze", ["Booze", "Booz", "Boo", "Bo"]),
    ("brilliance", ["Brill", "Bril", "Brl", "Br"]),
    ("cancellation", ["Cancel", "Cncl", "Can", "Ca"]),
    ("cause fear", ["CauseFear", "CsFear", "CaF", "CF"]),
    ("caution", ["Caution", "Caut", "Cau", "Cu"]),
    ("chain lightning", ["ChainLtng", "ChLtng", "ChL", "CL"]),
    ("charging", ["Charge", "Chrg", "Chg", "Ch"]),
    ("charm monster", ["CharmMon", "ChrmMn", "Chm", "CM"]),
    ("clairvoyance", ["Clairv", "Clrv", "Clv", "Cv"]),
    ("cold", ["Cold", "Cold", "Cld", "Co"]),
    ("cold resistance", ["ColdRes", "ColdR", "CdR", "CR"]),
    ("cone of cold", ["ConeCold", "ConeC", "CoC", "CC"]),
    ("conflict", ["Conflict", "Cnflct", "Cnf", "Cf"]),
    ("confuse monster", ["ConfMon", "CnfMn", "CfM", "CM"]),
    ("confusion", ["Confus", "Conf", "Cnf", "Cf"]),
    ("create familiar", ["CreatFam", "CrFam", "CrF", "Fa"]),
    ("create monster", ["CreatMon", "CrMon", "CrM", "Cr"]),
    ("cure blindness", ["CureBlind", "CrBlnd", "CuB", "CB"]),
    ("cure sickness", ["CureSick", "CrSick", "CuS", "CS"]),
    ("death", ["Death", "Deth", "Dth", "Dt"]),
    ("destroy armor", ["DestrArm", "DstrAr", "DsA", "DA"]),
    ("detect food", ["DetFood", "DtFd", "DtF", "DF"]),
    ("detect monsters", ["DetMons", "DtMn", "DtM", "DM"]),
    ("detect treasure", ["DetTreas", "DtTr", "DtT", "DT"]),
    ("detect unseen", ["DetUnsn", "DtUn", "DtU", "DU"]),
    ("dexterity", ["Dexter", "Dext", "Dex", "Dx"]),
    ("dig", ["Dig", "Dig", "Dg", "D"]),
    ("digging", ["Digging", "Digg", "Dig", "Dg"]),
    ("displacement", ["Displace", "Displ", "Dsp", "Dp"]),
    ("drain life", ["DrainLife", "DrnLf", "DrL", "DL"]),
    ("earth", ["Earth", "Erth", "Ear", "Ea"]),
    ("elven", ["Elven", "Elvn", "Elv", "El"]),
    ("enchant armor", ["EnchArmor", "EnchAr", "EnA", "EA"]),
    ("enchant weapon", ["EnchWeap", "EnchWp", "EnW", "EW"]),
    ("enlightenment", ["Enlight", "Enlgt", "Enl", "En"]),
    ("extra healing", ["ExtraHeal", "ExHeal", "XHl", "XH"]),
    ("finger of death", ["FingDeath", "FngDth", "FoD", "FD"]),
    ("fire", ["Fire", "Fire", "Fir", "Fi"]),
    ("fire resistance", ["FireRes", "FireR", "FiR", "FR"]),
    ("fireball", ["Fireball", "FirBl", "FBl", "FB"]),
    ("food detection", ["FoodDet", "FdDet", "FdD", "FD"]),
    ("force bolt", ["ForceBolt", "FrcBlt", "FoB", "Fo"]),
    ("free action", ["FreeAct", "FrAct", "FrA", "FA"]),
    ("fruit juice", ["FruitJc", "FrJc", "FrJ", "FJ"]),
    ("full healing", ["FullHeal", "FHeal", "FHl", "FH"]),
    ("fumble", ["Fumble", "Fmbl", "Fum", "Fu"]),
    ("fumbling", ["Fumbling", "Fmbl", "Fum", "Fu"]),
    ("gain ability", ["GainAbil", "GnAb", "GnA", "GA"]),
    ("gain constitution", ["GainCon", "GnCon", "GnC", "GC"]),
    ("gain energy", ["GainEnrg", "GnEn", "GnE", "GE"]),
    ("gain level", ["GainLvl", "GnLv", "GnL", "GL"]),
    ("gain strength", ["GainStr", "GnStr", "GnS", "GS"]),
    ("genocide", ["Genocide", "Geno", "Gen", "Ge"]),
    ("gold detection", ["GoldDet", "GdDet", "GdD", "GD"]),
    ("hallucination", ["Halluc", "Hallu", "Hal", "Ha"]),
    ("haste self", ["HasteSelf", "HstSlf", "HaS", "HS"]),
    ("healing", ["Healing", "Heal", "Hea", "He"]),
    ("helmet", ["Helmet", "Helm", "Hlm", "Hm"]),
    ("hunger", ["Hunger", "Hungr", "Hun", "Hu"]),
    ("identify", ["Identify", "Ident", "Idf", "Id"]),
    ("increase accuracy", ["IncAccur", "IncAcc", "InA", "IA"]),
    ("increase damage", ["IncDamage", "IncDmg", "InD", "ID"]),
    ("invisibility", ["Invisible", "Invis", "Inv", "Iv"]),
    ("jumping", ["Jumping", "Jump", "Jmp", "Ju"]),
    ("kicking", ["Kicking", "Kick", "Kck", "Ki"]),
    ("knock", ["Knock", "Knck", "Kno", "Kn"]),
    ("leather", ["Leather", "Lthr", "Lth", "Le"]),
    ("levitation", ["Levitate", "Levit", "Lev", "Lv"]),
    ("light", ["Light", "Lght", "Lgt", "Li"]),
    ("lightning", ["Lightning", "Ltng", "Ltn", "Lt"]),
    ("locking", ["Locking", "Lock", "Lck", "Lk"]),
    ("magic mapping", ["MagicMap", "MgMap", "MMp", "Mp"]),
    ("magic missile", ["MagicMiss", "MgMsl", "MMs", "Ms"]),
    ("magic resistance", ["MagicRes", "MgRes", "MgR", "MR"]),
    ("make invisible", ["MakeInvis", "MkInv", "MkI", "MI"]),
    ("monster detection", ["MonDetect", "MonDt", "MnD", "MD"]),
    ("nothing", ["Nothing", "Nthng", "Not", "No"]),
    ("object detection", ["ObjDetect", "ObjDt", "ObD", "OD"]),
    ("oil", ["Oil", "Oil", "Oil", "Oi"]),
    ("opening", ["Opening", "Open", "Opn", "Op"]),
    ("opposite alignment", ["OppAlign", "OpAln", "OpA", "OA"]),
    ("orcish", ["Orcish", "Orcsh", "Orc", "Or"]),
    ("paralysis", ["Paralysis", "Paral", "Par", "Pa"]),
    ("poison resistance", ["PoisonRes", "PsnRes", "PsR", "PR"]),
    ("polymorph", ["Polymorph", "Poly", "Ply", "Py"]),
    ("polymorph control", ["PolyCtrl", "PlyCt", "PlC", "PC"]),
    ("power", ["Power", "Powr", "Pow", "Pw"]),
    ("probing", ["Probing", "Probe", "Prb", "Pb"]),
    ("protection", ["Protect", "Prot", "Prt", "Pr"]),
    ("protection from shape changers", ["ProtShpCh", "PrtShp", "PSC", "PS"]),
    ("punishment", ["Punish", "Pnsh", "Pun", "Pu"]),
    ("regeneration", ["Regen", "Regn", "Reg", "Rg"]),
    ("remove curse", ["RemCurse", "RmCrs", "RmC", "RC"]),
    ("restore ability", ["RestAbil", "RstAb", "RsA", "RA"]),
    ("scare monster", ["ScareMon", "ScrMn", "ScM", "SM"]),
    ("searching", ["Search", "Srch", "Src", "Sr"]),
    ("secret door detection", ["SecDoorDet", "SDDet", "SDD", "SD"]),
    ("see invisible", ["SeeInvis", "SInv", "SeI", "SI"]),
    ("shock resistance", ["ShockRes", "ShkR", "ShR", "SR"]),
    ("sickness", ["Sickness", "Sick", "Sck", "Si"]),
    ("sleep", ["Sleep", "Sleep", "Slp", "Sl"]),
    ("sleeping", ["Sleeping", "Sleep", "Slp", "Sl"]),
    ("slow digestion", ["SlowDigest", "SlwDg", "SlD", "SD"]),
    ("slow monster", ["SlowMon", "SlwMn", "SlM", "SM"]),
    ("speed", ["Speed", "Sped", "Spd", "Sp"]),
    ("speed monster", ["SpeedMon", "SpdMn", "SpM", "SpM"]),
    ("stealth", ["Stealth", "Stlth", "Stl", "St"]),
    ("stinking cloud", ["StinkCloud", "StnkCl", "StC", "SC"]),
    ("stone to flesh", ["StoneFlesh", "StnFl", "StF", "SF"]),
    ("striking", ["Striking", "Strike", "Str", "Sk"]),
    ("sustain ability", ["SustAbil", "SusAb", "SuA", "SA"]),
    ("taming", ["Taming", "Tame", "Tam", "Ta"]),
    ("telepathy", ["Telepathy", "Telep", "Tlp", "Tp"]),
    ("teleport away", ["TeleAway", "TlAwy", "TlA", "TA"]),
    ("teleport control", ["TeleCtrl", "TlCtl", "TlC", "TC"]),
    ("teleportation", ["Teleport", "Telep", "Tel", "Te"]),
    ("turn undead", ["TurnUndead", "TrnUd", "TuU", "TU"]),
    ("undead turning", ["UndeadTurn", "UdTrn", "UdT", "UT"]),
    ("warning", ["Warning", "Warn", "Wrn", "Wa"]),
    ("water walking", ["WaterWalk", "WtrWk", "WtW", "WW"]),
    ("wishing", ["Wishing", "Wish", "Wsh", "Wi"]),
    ("wizard lock", ["WizLock", "WzLck", "WzL", "WL"]),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemClass;

    #[test]
    fn lengthening_ranks_by_unabbreviated_width() {
        // "StoneToFlesh" hides two spaces, so its source is the more compressed
        let forms = [Forms::new("enlightenment"), Forms::new("stone to flesh")];
        assert_eq!(lengthening_order(&forms, 3), vec![1, 0]);

        let same = [Forms::new("fireball"), Forms::new("fireball")];
        assert_eq!(lengthening_order(&same, 2), vec![0, 1]);
    }

    #[test]
    fn dictionary_is_sorted_for_binary_search() {
        assert!(ABBREVIATIONS.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }

    #[test]
    fn every_catalog_identity_has_a_dictionary_entry() {
        for class in ItemClass::ALL {
            let Some(table) = class.cost_table() else {
                continue;
            };
            for (_, items) in table {
                for item in *items {
                    let name = strip_class_qualifiers(item);
                    assert!(dictionary_entry(&name).is_some(), "missing {name}");
                }
            }
        }
    }

    #[test]
    fn qualifiers_are_stripped() {
        assert_eq!(strip_class_qualifiers("potion of gain level"), "gain level");
        assert_eq!(strip_class_qualifiers("elven boots"), "elven");
        assert_eq!(strip_class_qualifiers("cloak of displacement"), "displacement");
        assert_eq!(
            strip_class_qualifiers("ring of protection from shape changers"),
            "protection from shape changers"
        );
        assert_eq!(strip_class_qualifiers("helmet"), "helmet");
    }

    #[test]
    fn short_lists_pass_through() {
        assert_eq!(
            abbreviate(&["potion of healing", "potion of sleeping"], 60),
            "healing/sleeping"
        );
    }

    #[test]
    fn camel_case_step_returns_unsorted() {
        let label = abbreviate(
            &["ring of teleport control", "ring of protection from shape changers"],
            45,
        );
        assert_eq!(label, "TeleportControl/ProtectionFromShapeChangers");
    }

    #[test]
    fn fine_tuning_restores_most_compressed_first() {
        let identities = ["potion of extra healing", "potion of full healing"];
        assert_eq!(abbreviate(&identities, 20), "ExtraHeal/FullHeal");
        assert_eq!(abbreviate(&identities, 21), "ExtraHeal/FullHealing");
    }

    #[test]
    fn large_bucket_fits_budget() {
        let label = abbreviate(ItemClass::Wand.items_at(150), 60);
        assert!(label.len() <= 60, "{label}");
        assert_eq!(label.split('/').count(), 12);
    }

    #[test]
    fn every_single_bucket_fits_default_budget() {
        for class in ItemClass::ALL {
            let Some(table) = class.cost_table() else {
                continue;
            };
            for (cost, items) in table {
                let label = abbreviate(items, 60);
                assert!(label.len() <= 60, "{class} {cost}: {label}");
            }
        }
    }

    #[test]
    fn unknown_names_fall_back_to_word_truncation() {
        let identities = ["potion of foo bar baz", "potion of quux"];
        assert_eq!(abbreviate(&identities, 5), "FBB/Q");
        assert_eq!(abbreviate(&identities, 7), "FBB/Quu");
        assert_eq!(abbreviate(&identities, 2), "FBB/Q");
    }

    #[test]
    fn empty_input() {
        assert_eq!(abbreviate(&[], 10), "");
    }
}
