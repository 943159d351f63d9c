//! Static command table.
//!
//! Lookup order, highest specificity first:
//!
//! | Current | Previous | Command | Combo points |
//! |---|---|---|---|
//! | `FIST` | `OPEN_PALM` | `EXPLOSION_COMBO` | 2 |
//! | `POINT` | `OPEN_PALM` | `HEALING_LIGHT_COMBO` | 2 |
//! | `FIST` | `POINT` | `LIGHTNING_STRIKE_COMBO` | 2 |
//! | `FIST` | any | `FIREBALL` | 1 |
//! | `OPEN_PALM` | any | `ICE_SHARD` | 1 |
//! | `POINT` | any | `LIGHTNING` | 1 |
//! | `BANDO` | any | `HEAL` | 0 |
//! | `PUNCH` | any | `PUNCH_COMBO` | 0 |

use archmage_types::{Command, GestureLabel};

/// A castable entry of the spellbook.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spell {
    pub command: Command,
    pub mana_cost: f32,
    pub combo_points: u32,
}

const COMBOS: [(GestureLabel, GestureLabel, Command); 3] = [
    (GestureLabel::Fist, GestureLabel::OpenPalm, Command::ExplosionCombo),
    (GestureLabel::Point, GestureLabel::OpenPalm, Command::HealingLightCombo),
    (GestureLabel::Fist, GestureLabel::Point, Command::LightningStrikeCombo),
];

/// Mana cost of a command. Gate outcomes and acknowledgements are free.
pub fn mana_cost(command: Command) -> f32 {
    match command {
        Command::Fireball => 20.0,
        Command::IceShard => 15.0,
        Command::Lightning => 25.0,
        Command::Heal => 30.0,
        Command::PunchCombo => 10.0,
        Command::ExplosionCombo => 40.0,
        Command::HealingLightCombo => 35.0,
        Command::LightningStrikeCombo => 45.0,
        Command::None
        | Command::Cooldown
        | Command::InsufficientMana
        | Command::ChallengeSuccess
        | Command::ThumbsUp => 0.0,
    }
}

fn spell(command: Command, combo_points: u32) -> Spell {
    Spell {
        command,
        mana_cost: mana_cost(command),
        combo_points,
    }
}

/// Look up the spell cast by entering `gesture` right after `previous`.
pub fn lookup(gesture: GestureLabel, previous: GestureLabel) -> Option<Spell> {
    if let Some((_, _, command)) = COMBOS
        .iter()
        .find(|(cur, prev, _)| *cur == gesture && *prev == previous)
    {
        return Some(spell(*command, 2));
    }

    match gesture {
        GestureLabel::Fist => Some(spell(Command::Fireball, 1)),
        GestureLabel::OpenPalm => Some(spell(Command::IceShard, 1)),
        GestureLabel::Point => Some(spell(Command::Lightning, 1)),
        GestureLabel::Bando => Some(spell(Command::Heal, 0)),
        GestureLabel::Punch => Some(spell(Command::PunchCombo, 0)),
        GestureLabel::None | GestureLabel::ThumbsUp => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combo_beats_single_spell() {
        let s = lookup(GestureLabel::Fist, GestureLabel::OpenPalm).unwrap();
        assert_eq!(s.command, Command::ExplosionCombo);
        assert_eq!(s.combo_points, 2);

        let s = lookup(GestureLabel::Fist, GestureLabel::None).unwrap();
        assert_eq!(s.command, Command::Fireball);
        assert_eq!(s.combo_points, 1);
    }

    #[test]
    fn all_combo_pairs_resolve() {
        assert_eq!(
            lookup(GestureLabel::Point, GestureLabel::OpenPalm).unwrap().command,
            Command::HealingLightCombo
        );
        assert_eq!(
            lookup(GestureLabel::Fist, GestureLabel::Point).unwrap().command,
            Command::LightningStrikeCombo
        );
    }

    #[test]
    fn combos_are_ordered_pairs() {
        // OPEN_PALM after FIST is just an ice shard.
        assert_eq!(
            lookup(GestureLabel::OpenPalm, GestureLabel::Fist).unwrap().command,
            Command::IceShard
        );
    }

    #[test]
    fn bando_and_punch_are_fixed_non_combo_commands() {
        let heal = lookup(GestureLabel::Bando, GestureLabel::OpenPalm).unwrap();
        assert_eq!(heal.command, Command::Heal);
        assert_eq!(heal.combo_points, 0);

        let punch = lookup(GestureLabel::Punch, GestureLabel::Fist).unwrap();
        assert_eq!(punch.command, Command::PunchCombo);
        assert_eq!(punch.combo_points, 0);
    }

    #[test]
    fn none_and_thumbs_up_cast_nothing() {
        assert!(lookup(GestureLabel::None, GestureLabel::Fist).is_none());
        assert!(lookup(GestureLabel::ThumbsUp, GestureLabel::None).is_none());
    }

    #[test]
    fn every_spell_has_a_cost_and_gate_outcomes_are_free() {
        for c in Command::SPELLS {
            assert!(mana_cost(c) > 0.0, "{c} should cost mana");
        }
        assert_eq!(mana_cost(Command::Cooldown), 0.0);
        assert_eq!(mana_cost(Command::Fireball), 20.0);
    }
}
