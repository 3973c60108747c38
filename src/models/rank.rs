use serde::Serialize;

/// Inclusive LP ceilings of every tier except the last, paired with the
/// tier's label and badge.
const TIERS: [(u32, &str, &str); 11] = [
    (50, "Scribbler", "badge-quill"),
    (100, "Speller", "badge-ink"),
    (200, "Reader", "badge-page"),
    (300, "Wordsmith", "badge-anvil"),
    (400, "Lexicographer", "badge-lexicon"),
    (500, "Linguist", "badge-tongue"),
    (600, "Poet", "badge-laurel"),
    (700, "Bard", "badge-lyre"),
    (800, "Sage", "badge-scroll"),
    (900, "Oracle", "badge-eye"),
    (999, "Grand Lexicon", "badge-crown"),
];

const TOP_TIER: (&str, &str) = ("Word Legend", "badge-star");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rank {
    pub tier: u8,
    pub label: &'static str,
    pub badge: &'static str,
}

impl Rank {
    pub fn for_rating(lp: u32) -> Self {
        TIERS
            .iter()
            .enumerate()
            .find(|(_, (ceiling, _, _))| lp <= *ceiling)
            .map(|(tier, (_, label, badge))| Rank {
                tier: tier as u8,
                label: *label,
                badge: *badge,
            })
            .unwrap_or(Rank {
                tier: TIERS.len() as u8,
                label: TOP_TIER.0,
                badge: TOP_TIER.1,
            })
    }
}

pub fn score_for_word_length(len: usize) -> u32 {
    match len {
        0..=2 => 0,
        3 | 4 => 1,
        5 => 2,
        6 => 3,
        7 => 5,
        _ => 11,
    }
}
