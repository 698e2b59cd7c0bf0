//! Turn-based combat between the player and the single enemy named by the combat marker.
//!
//! The session state machine is `Idle -> Engaged(enemy_id) -> Idle`: movement engages,
//! and only the enemy's defeat or a successful flee disengages.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::errors::DungeonError;
use super::types::{DamageRoll, Dungeon, GameState, Stats};

pub const FLEE_CHANCE: f64 = 0.6;
pub const XP_PER_KILL: u32 = 20;
pub const MITIGATION_DIE: i32 = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CombatAction {
    Attack,
    Flee,
}

impl CombatAction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "attack" | "a" => Some(CombatAction::Attack),
            "flee" | "f" | "run" => Some(CombatAction::Flee),
            _ => None,
        }
    }
}

/// One resolved blow, with the raw dice kept for display and logs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HitReport {
    pub roll: i32,
    pub mitigation_roll: i32,
    pub damage: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CombatOutcome {
    pub action: CombatAction,
    pub enemy_id: String,
    pub player_hit: Option<HitReport>,
    pub enemy_hit: Option<HitReport>,
    pub enemy_hp: i32,
    pub enemy_defeated: bool,
    pub fled: bool,
    /// True once the combat marker has been cleared.
    pub combat_over: bool,
    pub player_hp: i32,
    /// Game-over flag; the session is left for the caller to deal with.
    pub player_defeated: bool,
    pub experience_gained: u32,
    pub level_up: Option<u32>,
    pub message: String,
}

/// `max(1, attack + roll - defense - mitigation)`.
pub fn compute_damage(attack: i32, roll: i32, defense: i32, mitigation: i32) -> i32 {
    (attack + roll - defense - mitigation).max(1)
}

/// Sum of `dice.count` independent draws in `1..=dice.sides`.
pub fn roll_dice<R: Rng + ?Sized>(rng: &mut R, dice: DamageRoll) -> i32 {
    let sides = dice.sides.max(1) as i32;
    (0..dice.count).map(|_| rng.gen_range(1..=sides)).sum()
}

pub fn resolve_hit<R: Rng + ?Sized>(
    rng: &mut R,
    attack: i32,
    dice: DamageRoll,
    defense: i32,
) -> HitReport {
    let roll = roll_dice(rng, dice);
    let mitigation_roll = rng.gen_range(1..=MITIGATION_DIE);
    HitReport {
        roll,
        mitigation_roll,
        damage: compute_damage(attack, roll, defense, mitigation_roll),
    }
}

fn apply_signed(stats: &mut Stats, modifiers: &BTreeMap<String, i32>, sign: i32) {
    for (field, value) in modifiers {
        let (stat, delta) = if let Some(stat) = field.strip_suffix("_bonus") {
            (stat, *value)
        } else if let Some(stat) = field.strip_suffix("_penalty") {
            (stat, -*value)
        } else {
            continue;
        };
        if let Some(slot) = stats.stat_mut(stat) {
            *slot += sign * delta;
        }
    }
}

/// Every `<stat>_bonus` adds to the stat, every `<stat>_penalty` subtracts.
/// Unknown stats and fields without either suffix are ignored.
pub fn apply_item_effects(stats: &mut Stats, modifiers: &BTreeMap<String, i32>) {
    apply_signed(stats, modifiers, 1);
}

/// Exact inverse of [`apply_item_effects`].
pub fn revert_item_effects(stats: &mut Stats, modifiers: &BTreeMap<String, i32>) {
    apply_signed(stats, modifiers, -1);
}

/// Total experience needed to advance past `level`.
pub fn level_threshold(level: u32) -> u32 {
    level.max(1) * 100
}

/// Add experience and apply any level-ups; returns the new level if it changed.
pub fn award_experience(state: &mut GameState, xp: u32) -> Option<u32> {
    state.experience += xp;
    let before = state.level;
    while state.experience >= level_threshold(state.level) {
        state.level += 1;
        state.stats.max_hp += 10;
        state.stats.hp = state.stats.max_hp;
        state.stats.attack += 2;
        state.stats.defense += 1;
    }
    (state.level != before).then_some(state.level)
}

/// Resolve one combat action for the session's engaged enemy.
pub fn resolve<R: Rng + ?Sized>(
    state: &mut GameState,
    dungeon: &mut Dungeon,
    action: CombatAction,
    rng: &mut R,
) -> Result<CombatOutcome, DungeonError> {
    let Some(enemy_id) = state.combat.clone() else {
        return Err(DungeonError::invalid("not in combat"));
    };

    let mut out = CombatOutcome {
        action,
        enemy_id: enemy_id.clone(),
        player_hit: None,
        enemy_hit: None,
        enemy_hp: 0,
        enemy_defeated: false,
        fled: false,
        combat_over: false,
        player_hp: state.stats.hp,
        player_defeated: state.is_defeated(),
        experience_gained: 0,
        level_up: None,
        message: String::new(),
    };

    let Some(enemy) = dungeon.enemy_mut(&enemy_id).filter(|e| e.alive) else {
        // Another session sharing this dungeon got there first.
        state.combat = None;
        out.enemy_defeated = true;
        out.combat_over = true;
        out.message = "Your foe is already dead.".to_string();
        return Ok(out);
    };
    let species = enemy.species;

    let retaliate = match action {
        CombatAction::Attack => {
            let hit = resolve_hit(rng, state.stats.attack, state.dice, enemy.defense);
            enemy.hp -= hit.damage;
            out.player_hit = Some(hit);
            out.message = format!(
                "You hit the {} for {} (rolled {}).",
                species, hit.damage, hit.roll
            );
            if enemy.hp <= 0 {
                enemy.hp = 0;
                enemy.alive = false;
                false
            } else {
                true
            }
        }
        CombatAction::Flee => {
            let roll: f64 = rng.gen();
            if roll < FLEE_CHANCE {
                out.fled = true;
                out.message = format!("You escape from the {}.", species);
                false
            } else {
                out.message = format!("You fail to escape the {}.", species);
                true
            }
        }
    };

    if retaliate {
        let hit = resolve_hit(rng, enemy.attack, enemy.dice, state.stats.defense);
        state.stats.hp -= hit.damage;
        out.enemy_hit = Some(hit);
        out.message.push_str(&format!(
            " The {} hits you for {} (rolled {}).",
            species, hit.damage, hit.roll
        ));
    }
    out.enemy_hp = enemy.hp;
    out.enemy_defeated = !enemy.alive;

    if out.enemy_defeated {
        state.combat = None;
        state.defeated_enemies.insert(enemy_id.clone());
        out.experience_gained = XP_PER_KILL;
        out.level_up = award_experience(state, XP_PER_KILL);
        out.message.push_str(&format!(
            " The {} is defeated! (+{} XP)",
            species, XP_PER_KILL
        ));
        if let Some(level) = out.level_up {
            out.message.push_str(&format!(" You reach level {}!", level));
        }
    } else if out.fled {
        state.combat = None;
    }

    out.combat_over = state.combat.is_none();
    out.player_hp = state.stats.hp;
    out.player_defeated = state.is_defeated();
    if out.player_defeated {
        out.message.push_str(" You have fallen.");
    }
    debug!(
        "combat {} {:?} vs {}: player_hp={} enemy_hp={} over={}",
        state.id, action, enemy_id, out.player_hp, out.enemy_hp, out.combat_over
    );
    Ok(out)
}
