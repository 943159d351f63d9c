//! Per-command cast counters and the favourite spell.

use std::collections::HashMap;

use archmage_types::Command;

/// Successful-cast counts, keyed by command. Only spells are counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageStats {
    counts: HashMap<Command, u32>,
}

impl UsageStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one successful cast. Non-spell commands are ignored.
    pub fn record(&mut self, command: Command) {
        if command.is_spell() {
            *self.counts.entry(command).or_insert(0) += 1;
        }
    }

    pub fn count(&self, command: Command) -> u32 {
        self.counts.get(&command).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn reset(&mut self) {
        self.counts.clear();
    }

    /// The most cast spell and its count. Ties resolve to the spell listed
    /// first in [`Command::SPELLS`]; `None` when nothing has been cast.
    pub fn most_used(&self) -> Option<(Command, u32)> {
        let mut best: Option<(Command, u32)> = None;
        for spell in Command::SPELLS {
            let n = self.count(spell);
            if n > 0 && best.is_none_or(|(_, b)| n > b) {
                best = Some((spell, n));
            }
        }
        best
    }

    /// Counts for every spell (zeros included) in [`Command::SPELLS`] order.
    pub fn snapshot(&self) -> Vec<(Command, u32)> {
        Command::SPELLS.iter().map(|c| (*c, self.count(*c))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stats_have_no_favourite() {
        assert_eq!(UsageStats::new().most_used(), None);
    }

    #[test]
    fn non_spells_are_not_counted() {
        let mut stats = UsageStats::new();
        stats.record(Command::Cooldown);
        stats.record(Command::ThumbsUp);
        stats.record(Command::ChallengeSuccess);
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn most_used_picks_highest_count() {
        let mut stats = UsageStats::new();
        stats.record(Command::Fireball);
        stats.record(Command::Heal);
        stats.record(Command::Heal);
        assert_eq!(stats.most_used(), Some((Command::Heal, 2)));
    }

    #[test]
    fn ties_go_to_enumeration_order() {
        let mut stats = UsageStats::new();
        stats.record(Command::LightningStrikeCombo);
        stats.record(Command::IceShard);
        assert_eq!(stats.most_used(), Some((Command::IceShard, 1)));
    }

    #[test]
    fn reset_clears_everything() {
        let mut stats = UsageStats::new();
        stats.record(Command::Lightning);
        stats.reset();
        assert_eq!(stats.count(Command::Lightning), 0);
        assert!(stats.snapshot().iter().all(|(_, n)| *n == 0));
        assert_eq!(stats.snapshot().len(), Command::SPELLS.len());
    }
}
