//! Price deduction engine
//!
//! Pure functions turning an observed shop price into candidate base
//! costs, and base costs into candidate identities from the catalog.
//!
//! Buying: the quoted price is the base cost scaled by a charisma band
//! multiplier, with up to two extra 33% markups (sucker status and the
//! random "dunce" surcharge). Selling: the offer is half the base cost
//! (a third for suckers), sometimes reduced by another quarter by a
//! greedy shopkeeper.

use crate::catalog::{self, ItemClass};

/// Which side of the counter the player is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeDirection {
    Buying,
    Selling,
}

/// Price multiplier applied by shopkeepers for a charisma score
#[must_use]
pub fn charisma_multiplier(charisma: u32) -> f64 {
    match charisma {
        0..=5 => 2.0,
        6..=7 => 1.5,
        8..=10 => 4.0 / 3.0,
        11..=15 => 1.0,
        16..=17 => 0.75,
        18 => 2.0 / 3.0,
        _ => 0.5,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_price(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

/// Candidate base costs for a price a shopkeeper asks
///
/// Unknown sucker status yields all three markup levels; a known status
/// narrows to the two that are possible for it.
#[must_use]
pub fn guess_base_cost_buying(price: u32, charisma: u32, sucker: Option<bool>) -> Vec<u32> {
    let unmarked = f64::from(price) / charisma_multiplier(charisma);
    let candidates = [
        round_price(unmarked),
        round_price(unmarked / (4.0 / 3.0)),
        round_price(unmarked / (16.0 / 9.0)),
    ];
    match sucker {
        None => candidates.to_vec(),
        Some(true) => candidates[1..3].to_vec(),
        Some(false) => candidates[0..2].to_vec(),
    }
}

/// Candidate base costs for a price a shopkeeper offers
///
/// Returns `[normal, greedy]`. Results snap to multiples of 5 (or 2 for
/// tiny prices) since nearly every base cost is one.
#[must_use]
pub fn guess_base_cost_selling(price: u32, sucker: bool) -> [u32; 2] {
    if price == 1 {
        return [2, 2];
    }
    let multiplier = if sucker { 3.0 } else { 2.0 };
    let nearest = if price >= 5 { 5.0 } else { 2.0 };
    let base = f64::from(price) * multiplier;
    [
        round_price(nearest * (base / nearest).round()),
        round_price(nearest * (base * 4.0 / 3.0 / nearest).round()),
    ]
}

/// Catalog identities whose base cost matches the observed price
///
/// Entries are returned in candidate-price order; no deduplication.
#[must_use]
pub fn find_price_candidates(
    price: u32,
    class: ItemClass,
    charisma: u32,
    sucker: Option<bool>,
    direction: TradeDirection,
) -> Vec<&'static str> {
    let costs = match direction {
        TradeDirection::Buying => guess_base_cost_buying(price, charisma, sucker),
        TradeDirection::Selling => {
            guess_base_cost_selling(price, sucker.unwrap_or(false)).to_vec()
        }
    };
    costs
        .into_iter()
        .flat_map(|cost| class.items_at(cost).iter().copied())
        .collect()
}

/// Whether the shopkeeper making an offer is greedy
///
/// `Some(true)` when only the greedy base cost exists in the catalog,
/// `Some(false)` when only the normal one matches this class, `None`
/// when both or neither are plausible.
#[must_use]
pub fn infer_shopkeeper_greed(price: u32, class: ItemClass, sucker: Option<bool>) -> Option<bool> {
    let [normal, greedy] = guess_base_cost_selling(price, sucker.unwrap_or(false));
    let greedy_matches = !class.items_at(greedy).is_empty();
    let normal_matches = !class.items_at(normal).is_empty();
    if greedy_matches {
        if catalog::any_class_has_cost(normal) {
            None
        } else {
            Some(true)
        }
    } else if normal_matches {
        Some(false)
    } else {
        None
    }
}
