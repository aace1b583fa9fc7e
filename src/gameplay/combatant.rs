//! Per-entity combat state: health, cooldowns, invincibility and hit cues.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::gameplay::species::SpeciesProps;
use crate::{GameSet, gameplay_running};

// === Constants ===

/// Seconds of invincibility granted by any damaging hit.
pub const HIT_INVINCIBILITY_SECS: f32 = 0.2;

/// Vertical speed (pixels/sec) below which the player counts as still.
pub const GROUNDED_SPEED_EPSILON: f32 = 1.0;

/// Consecutive still frames before the player counts as standing. The apex
/// of a jump or dash is still for a single frame only.
pub const GROUNDED_SETTLE_FRAMES: u8 = 3;

// === Types ===

/// Coarse attack category remembered for hit feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum BaseAttackKind {
    Melee,
    Ranged,
    Explosion,
}

/// Where an enemy is in its approach / attack / cooldown loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum AiPhase {
    #[default]
    Approaching,
    Attacking,
    Cooling,
}

/// Result of [`Combatant::receive_damage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Invincible or already removed; nothing changed.
    Blocked,
    Damaged,
    /// Health reached zero on this hit.
    Killed,
}

// === Components ===

/// Mutable combat state of a player, enemy, mirror or spawner.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Combatant {
    pub health: i32,
    pub max_health: i32,
    pub attack_cooldown: f32,
    pub is_attacking: bool,
    pub time_since_last_attack: f32,
    pub invincibility_remaining: f32,
    pub last_damaged_by: Option<BaseAttackKind>,
    /// Set by the presentation layer once the hit cue for the last damage has played.
    pub damage_particle_played: bool,
    /// Marked for the removal sweep. Removed combatants take no further hits.
    pub removed: bool,
    pub phase: AiPhase,
    /// Last committed vertical steering direction for flying species.
    pub vertical_sign: f32,
}

impl Combatant {
    /// Fresh state at full health, ready to attack immediately.
    #[must_use]
    pub const fn new(max_health: i32, attack_cooldown: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            attack_cooldown,
            is_attacking: false,
            time_since_last_attack: attack_cooldown,
            invincibility_remaining: 0.0,
            last_damaged_by: None,
            damage_particle_played: true,
            removed: false,
            phase: AiPhase::Approaching,
            vertical_sign: 0.0,
        }
    }

    #[must_use]
    pub const fn from_props(props: &SpeciesProps) -> Self {
        Self::new(props.max_health, props.attack_cooldown)
    }

    #[must_use]
    pub fn is_invincible(&self) -> bool {
        self.invincibility_remaining > 0.0
    }

    #[must_use]
    pub fn ready_to_attack(&self) -> bool {
        self.time_since_last_attack >= self.attack_cooldown
    }

    /// Restarts the cooldown clock after an attack is issued.
    pub const fn start_attack(&mut self) {
        self.time_since_last_attack = 0.0;
        self.is_attacking = true;
    }

    /// Applies `damage` unless invincible or already removed.
    ///
    /// Health never drops below zero. A hit that deals damage grants
    /// [`HIT_INVINCIBILITY_SECS`] of invincibility and records `kind` for
    /// the hit cue.
    pub fn receive_damage(&mut self, damage: i32, kind: BaseAttackKind) -> DamageOutcome {
        if self.removed || self.is_invincible() {
            return DamageOutcome::Blocked;
        }
        self.health = self.health.saturating_sub(damage).max(0);
        if damage > 0 {
            self.invincibility_remaining = HIT_INVINCIBILITY_SECS;
            self.damage_particle_played = false;
            self.last_damaged_by = Some(kind);
        }
        if self.health <= 0 {
            self.removed = true;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Damaged
        }
    }

    /// Advances the cooldown clock and burns down invincibility.
    pub fn tick(&mut self, dt: f32) {
        self.time_since_last_attack += dt;
        self.invincibility_remaining = (self.invincibility_remaining - dt).max(0.0);
    }
}

/// Marker and status flags for the player body.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct PlayerModel {
    pub invincible: bool,
    /// Movement and attacks are ignored while stunned.
    pub stunned: bool,
    pub grounded: bool,
    /// Frames in a row with near-zero vertical speed.
    pub still_frames: u8,
}

/// Back-reference from a spawned enemy to the spawner that produced it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct SpawnedBy {
    pub spawner: Entity,
    pub index: u32,
}

// === Systems ===

/// Ticks every combatant's timers and lifts the player's hit status
/// once invincibility has run out.
///
/// Runs in `GameSet::Lifecycle`.
fn tick_combat_timers(time: Res<Time>, mut combatants: Query<(&mut Combatant, Option<&mut PlayerModel>)>) {
    let dt = time.delta_secs();
    for (mut combatant, player) in &mut combatants {
        combatant.tick(dt);

        let Some(mut player) = player else {
            continue;
        };
        if combatant.is_attacking && combatant.ready_to_attack() {
            combatant.is_attacking = false;
        }
        if !combatant.is_invincible() && (player.invincible || player.stunned) {
            player.invincible = false;
            player.stunned = false;
        }
    }
}

/// Derives the grounded flag from how long vertical speed has stayed near zero.
///
/// Runs in `GameSet::Input`, before attacks read it.
fn update_grounded(mut players: Query<(&mut PlayerModel, &LinearVelocity)>) {
    for (mut player, velocity) in &mut players {
        let still_frames = if velocity.y.abs() < GROUNDED_SPEED_EPSILON {
            player.still_frames.saturating_add(1)
        } else {
            0
        };
        let grounded = still_frames >= GROUNDED_SETTLE_FRAMES;
        if player.still_frames != still_frames || player.grounded != grounded {
            player.still_frames = still_frames;
            player.grounded = grounded;
        }
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Combatant>()
        .register_type::<PlayerModel>()
        .register_type::<SpawnedBy>();

    app.add_systems(
        Update,
        (
            update_grounded
                .in_set(GameSet::Input)
                .run_if(gameplay_running),
            tick_combat_timers
                .in_set(GameSet::Lifecycle)
                .run_if(gameplay_running),
        ),
    );
}
