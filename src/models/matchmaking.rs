use super::player::PlayerId;
use std::collections::VecDeque;

/// Ranked players accept opponents within this many LP.
pub const DEFAULT_LP_BAND: u32 = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub player: PlayerId,
    pub lp: u32,
}

pub fn within_band(a: u32, b: u32, band: u32) -> bool {
    a.abs_diff(b) <= band
}

/// Players waiting for a match, oldest first.
#[derive(Debug, Default)]
pub struct MatchQueue {
    entries: VecDeque<QueueEntry>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the player unless already queued. Returns whether it was added.
    pub fn enqueue(&mut self, player: PlayerId, lp: u32) -> bool {
        if self.contains(&player) {
            return false;
        }
        self.entries.push_back(QueueEntry { player, lp });
        true
    }

    pub fn remove(&mut self, player: &PlayerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| &entry.player != player);
        self.entries.len() != before
    }

    pub fn contains(&self, player: &PlayerId) -> bool {
        self.entries.iter().any(|entry| &entry.player == player)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pulls out a group for `requester`: the requester plus the oldest
    /// entries within `band` of its rating, at most `max` in total, kept in
    /// queue order so the first element anchors the room. `None` (and the
    /// queue untouched) if fewer than two would be grouped.
    pub fn take_group(
        &mut self,
        requester: &PlayerId,
        band: u32,
        max: usize,
    ) -> Option<Vec<QueueEntry>> {
        let lp = self.entries.iter().find(|e| &e.player == requester)?.lp;

        let mut picked = 0;
        let chosen: Vec<bool> = self
            .entries
            .iter()
            .map(|entry| {
                if &entry.player == requester {
                    return true;
                }
                if picked + 1 < max && within_band(entry.lp, lp, band) {
                    picked += 1;
                    return true;
                }
                false
            })
            .collect();
        if picked == 0 {
            return None;
        }

        let mut group = Vec::with_capacity(picked + 1);
        let mut kept = VecDeque::with_capacity(self.entries.len());
        for (entry, take) in self.entries.drain(..).zip(chosen) {
            if take {
                group.push(entry);
            } else {
                kept.push_back(entry);
            }
        }
        self.entries = kept;
        Some(group)
    }

    /// Oldest `count` entries, if that many are waiting.
    pub fn take_front(&mut self, count: usize) -> Option<Vec<QueueEntry>> {
        if count == 0 || self.entries.len() < count {
            return None;
        }
        Some(self.entries.drain(..count).collect())
    }
}
