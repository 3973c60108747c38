//! Placement and LP arithmetic for the end of a round.
//!
//! Everything here is pure: the room hands over its human standings and gets
//! back one [`Placement`] per player. Reading and writing ratings happens in
//! the lobby, which owns the user store.

use super::player::PlayerId;
use std::str::FromStr;

/// Charged for quitting or dropping out of a rated room.
pub const FORFEIT_PENALTY: i32 = -20;
/// Last place, whatever the tie size.
pub const LAST_PLACE_DELTA: i32 = -5;
pub const FIRST_PLACE_DELTA: i32 = 20;
/// Practice games against bots only pay out from this score upwards.
pub const AI_MIN_SCORE: u32 = 10;

/// Which delta table settles rated rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LpRuleset {
    /// Shared first places split the pot: +10 for a pair, +6 for three.
    #[default]
    Tiered,
    /// Every first place earns the full +20.
    Flat,
}

impl FromStr for LpRuleset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiered" | "tie-aware" => Ok(LpRuleset::Tiered),
            "flat" => Ok(LpRuleset::Flat),
            other => Err(format!("unknown LP ruleset {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub player: PlayerId,
    pub score: u32,
    pub forfeited: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub player: PlayerId,
    /// Competition place among contenders; `None` for forfeits.
    pub place: Option<usize>,
    pub delta: i32,
    pub outcome: Outcome,
}

/// LP for a tie group of `tie_size` players starting at `place`, in a room
/// that seated `players` humans.
fn placement_delta(ruleset: LpRuleset, players: usize, place: usize, tie_size: usize) -> i32 {
    if players < 2 || place == 0 || tie_size == 0 {
        return 0;
    }
    let reaches_last = place + tie_size - 1 >= players;
    match place {
        // the whole room tied
        1 if reaches_last => 0,
        1 => match (ruleset, tie_size) {
            (LpRuleset::Flat, _) | (LpRuleset::Tiered, 1) => FIRST_PLACE_DELTA,
            (LpRuleset::Tiered, 2) => 10,
            (LpRuleset::Tiered, 3) => 6,
            _ => 0,
        },
        _ if reaches_last => LAST_PLACE_DELTA,
        2 if players >= 4 => 5,
        _ => 0,
    }
}

/// Settles a rated room. Output order follows `standings`.
pub fn settle_standings(standings: &[Standing], ruleset: LpRuleset) -> Vec<Placement> {
    let players = standings.len();
    let contenders: Vec<u32> = standings
        .iter()
        .filter(|s| !s.forfeited)
        .map(|s| s.score)
        .collect();
    let total_tie = contenders.len() > 1 && contenders.iter().all(|&s| s == contenders[0]);

    standings
        .iter()
        .map(|standing| {
            if standing.forfeited {
                return Placement {
                    player: standing.player.clone(),
                    place: None,
                    delta: FORFEIT_PENALTY,
                    outcome: Outcome::Loss,
                };
            }
            if total_tie {
                return Placement {
                    player: standing.player.clone(),
                    place: Some(1),
                    delta: 0,
                    outcome: Outcome::Draw,
                };
            }

            let place = 1 + contenders.iter().filter(|&&s| s > standing.score).count();
            let tie_size = contenders.iter().filter(|&&s| s == standing.score).count();
            let delta = placement_delta(ruleset, players, place, tie_size);
            let outcome = if place == 1 {
                Outcome::Win
            } else if place + tie_size - 1 >= players {
                Outcome::Loss
            } else {
                Outcome::Draw
            };
            Placement {
                player: standing.player.clone(),
                place: Some(place),
                delta,
                outcome,
            }
        })
        .collect()
}

/// Practice conversion: a tenth of the score, for players who stayed to the
/// end and reached [`AI_MIN_SCORE`].
pub fn ai_delta(score: u32, forfeited: bool) -> i32 {
    if forfeited || score < AI_MIN_SCORE {
        return 0;
    }
    i32::try_from(score / 10).unwrap_or(i32::MAX)
}

pub fn apply_delta(lp: u32, delta: i32) -> u32 {
    if delta >= 0 {
        lp.saturating_add(delta.unsigned_abs())
    } else {
        lp.saturating_sub(delta.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standings(scores: &[(&str, u32, bool)]) -> Vec<Standing> {
        scores
            .iter()
            .map(|(name, score, forfeited)| Standing {
                player: PlayerId::from(*name),
                score: *score,
                forfeited: *forfeited,
            })
            .collect()
    }

    fn deltas(placements: &[Placement]) -> Vec<i32> {
        placements.iter().map(|p| p.delta).collect()
    }

    #[test]
    fn base_table() {
        let t = LpRuleset::Tiered;
        assert_eq!(placement_delta(t, 2, 1, 1), 20);
        assert_eq!(placement_delta(t, 2, 2, 1), -5);
        assert_eq!(placement_delta(t, 3, 1, 1), 20);
        assert_eq!(placement_delta(t, 3, 2, 1), 0);
        assert_eq!(placement_delta(t, 3, 3, 1), -5);
        assert_eq!(placement_delta(t, 4, 1, 1), 20);
        assert_eq!(placement_delta(t, 4, 2, 1), 5);
        assert_eq!(placement_delta(t, 4, 3, 1), 0);
        assert_eq!(placement_delta(t, 4, 4, 1), -5);
    }

    #[test]
    fn four_players_tied_first() {
        let room = standings(&[
            ("a", 30, false),
            ("b", 30, false),
            ("c", 10, false),
            ("d", 0, false),
        ]);

        let tiered = settle_standings(&room, LpRuleset::Tiered);
        assert_eq!(deltas(&tiered), vec![10, 10, 0, -5]);
        assert_eq!(tiered[0].place, Some(1));
        assert_eq!(tiered[2].place, Some(3));
        assert_eq!(tiered[3].outcome, Outcome::Loss);

        let flat = settle_standings(&room, LpRuleset::Flat);
        assert_eq!(deltas(&flat), vec![20, 20, 0, -5]);
    }

    #[test]
    fn three_way_tie_for_first() {
        let room = standings(&[("a", 9, false), ("b", 9, false), ("c", 9, false), ("d", 1, false)]);
        assert_eq!(deltas(&settle_standings(&room, LpRuleset::Tiered)), vec![6, 6, 6, -5]);
    }

    #[test]
    fn shared_last_place_is_still_minus_five() {
        let room = standings(&[("a", 10, false), ("b", 5, false), ("c", 5, false)]);
        assert_eq!(deltas(&settle_standings(&room, LpRuleset::Tiered)), vec![20, -5, -5]);
    }

    #[test]
    fn total_tie_pays_nothing_but_forfeits() {
        let room = standings(&[("a", 7, false), ("b", 7, false), ("c", 7, true)]);
        let placements = settle_standings(&room, LpRuleset::Tiered);
        assert_eq!(deltas(&placements), vec![0, 0, FORFEIT_PENALTY]);
        assert_eq!(placements[0].outcome, Outcome::Draw);
    }

    #[test]
    fn total_tie_ignores_a_higher_scoring_dropout() {
        // the dropout's 40 does not break the tie between those still playing
        let room = standings(&[("a", 7, false), ("b", 7, false), ("c", 40, true)]);
        for ruleset in [LpRuleset::Tiered, LpRuleset::Flat] {
            let placements = settle_standings(&room, ruleset);
            assert_eq!(deltas(&placements), vec![0, 0, FORFEIT_PENALTY]);
            assert_eq!(placements[0].place, Some(1));
            assert_eq!(placements[1].outcome, Outcome::Draw);
            assert_eq!(placements[2].place, None);
        }
    }

    #[test]
    fn forfeit_ignores_score() {
        let room = standings(&[("a", 99, true), ("b", 0, false)]);
        let placements = settle_standings(&room, LpRuleset::Tiered);
        assert_eq!(deltas(&placements), vec![-20, 20]);
        assert_eq!(placements[0].place, None);
        assert_eq!(placements[1].outcome, Outcome::Win);
    }

    #[test]
    fn forfeit_takes_last_place_off_the_table() {
        // remaining contenders fill places 1 and 2 of a three-seat room
        let room = standings(&[("a", 10, false), ("b", 5, false), ("c", 50, true)]);
        assert_eq!(deltas(&settle_standings(&room, LpRuleset::Tiered)), vec![20, 0, -20]);
    }

    #[test]
    fn ai_conversion() {
        assert_eq!(ai_delta(9, false), 0);
        assert_eq!(ai_delta(10, false), 1);
        assert_eq!(ai_delta(57, false), 5);
        assert_eq!(ai_delta(57, true), 0);
    }

    #[test]
    fn delta_clamps_at_zero() {
        assert_eq!(apply_delta(3, -5), 0);
        assert_eq!(apply_delta(30, -5), 25);
        assert_eq!(apply_delta(30, 20), 50);
    }

    #[test]
    fn ruleset_parses() {
        assert_eq!("flat".parse::<LpRuleset>(), Ok(LpRuleset::Flat));
        assert_eq!("Tiered".parse::<LpRuleset>(), Ok(LpRuleset::Tiered));
        assert!("other".parse::<LpRuleset>().is_err());
    }
}
