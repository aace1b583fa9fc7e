//! Enemy behavior: approach, attack, cool down. Mirrors drift after the
//! combatant they are linked to.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::gameplay::collision::Mirror;
use crate::gameplay::combatant::{AiPhase, Combatant, PlayerModel};
use crate::gameplay::species::{CombatStyle, Species, SpeciesProps, SpeciesRegistry};
use crate::{GameSet, gameplay_running};

// === Constants ===

/// Flying species only change vertical direction once the player is this
/// far above or below them.
pub const FLYING_HYSTERESIS: f32 = 10.0;

/// A linked mirror stops closing in once it is this close to its anchor.
pub const MIRROR_HOVER_DISTANCE: f32 = 24.0;

// === Types ===

/// What one combatant does this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorOutput {
    pub movement: Vec2,
    /// The combatant entered `Attacking` this tick.
    pub trigger_attack: bool,
}

impl BehaviorOutput {
    pub const IDLE: Self = Self {
        movement: Vec2::ZERO,
        trigger_attack: false,
    };

    const fn moving(movement: Vec2) -> Self {
        Self {
            movement,
            trigger_attack: false,
        }
    }
}

// === Pure Functions ===

/// Whether `player` sits inside the species' attack box around `own`.
#[must_use]
pub fn in_attack_range(props: &SpeciesProps, own: Vec2, player: Vec2) -> bool {
    let distance = (player - own).abs();
    let range = props.attack_range();
    distance.x <= range.x && distance.y <= range.y
}

/// Vertical steering. Ground species are pulled down; flying species chase
/// the player's height with hysteresis.
fn vertical_bias(props: &SpeciesProps, combatant: &mut Combatant, own: Vec2, player: Vec2) -> f32 {
    if !props.style.is_flying() {
        return -props.vertical_speed;
    }
    let dy = player.y - own.y;
    if dy > FLYING_HYSTERESIS {
        combatant.vertical_sign = 1.0;
    } else if dy < -FLYING_HYSTERESIS {
        combatant.vertical_sign = -1.0;
    }
    combatant.vertical_sign * props.vertical_speed
}

/// Advances one combatant's approach / attack / cooldown loop.
///
/// Unknown and stationary species stay idle.
pub fn select_behavior(
    species: Species,
    registry: &SpeciesRegistry,
    combatant: &mut Combatant,
    own: Vec2,
    player: Vec2,
) -> BehaviorOutput {
    let Some(props) = registry.get(species) else {
        return BehaviorOutput::IDLE;
    };
    if props.style == CombatStyle::Stationary {
        return BehaviorOutput::IDLE;
    }

    match combatant.phase {
        AiPhase::Approaching => {
            let vertical = vertical_bias(props, combatant, own, player);
            if !in_attack_range(props, own, player) {
                let dx = player.x - own.x;
                let toward = if dx == 0.0 { 0.0 } else { dx.signum() };
                return BehaviorOutput::moving(Vec2::new(toward * props.horizontal_speed, vertical));
            }
            if combatant.ready_to_attack() {
                combatant.start_attack();
                combatant.phase = AiPhase::Attacking;
                return BehaviorOutput {
                    movement: Vec2::new(0.0, vertical),
                    trigger_attack: true,
                };
            }
            BehaviorOutput::moving(Vec2::new(0.0, vertical))
        }
        AiPhase::Attacking => {
            // Trigger was not consumed this tick.
            combatant.phase = AiPhase::Cooling;
            BehaviorOutput::IDLE
        }
        AiPhase::Cooling => {
            if combatant.time_since_last_attack > combatant.attack_cooldown {
                combatant.is_attacking = false;
                combatant.phase = AiPhase::Approaching;
            }
            BehaviorOutput::IDLE
        }
    }
}

/// Velocity that carries a mirror toward `anchor`, or zero when unlinked or close.
#[must_use]
pub fn mirror_steering(props: &SpeciesProps, own: Vec2, anchor: Option<Vec2>) -> Vec2 {
    let Some(anchor) = anchor else {
        return Vec2::ZERO;
    };
    let offset = anchor - own;
    if offset.length() <= MIRROR_HOVER_DISTANCE {
        return Vec2::ZERO;
    }
    let direction = offset.normalize_or_zero();
    Vec2::new(
        direction.x * props.horizontal_speed,
        direction.y * props.vertical_speed,
    )
}

// === Systems ===

/// Clears mirror links whose target is gone, removed or out of health.
///
/// Runs in `GameSet::Ai`, before any link is read.
pub(crate) fn clear_dead_mirror_links(
    mut mirrors: Query<&mut Mirror>,
    combatants: Query<&Combatant>,
) {
    for mut mirror in &mut mirrors {
        let Some(linked) = mirror.linked else {
            continue;
        };
        let alive = combatants
            .get(linked)
            .is_ok_and(|combatant| !combatant.removed && combatant.health > 0);
        if !alive {
            debug!("Mirror link to {linked} cleared");
            mirror.linked = None;
        }
    }
}

/// Runs the behavior loop for every enemy and writes its velocity.
///
/// Runs in `GameSet::Ai`.
fn select_enemy_behaviors(
    registry: Res<SpeciesRegistry>,
    player: Query<&Transform, With<PlayerModel>>,
    mut enemies: Query<
        (&Species, &mut Combatant, &Transform, &mut LinearVelocity),
        (Without<PlayerModel>, Without<Mirror>),
    >,
) {
    let Ok(player) = player.single() else {
        for (_, _, _, mut velocity) in &mut enemies {
            velocity.0 = Vec2::ZERO;
        }
        return;
    };
    let player = player.translation.truncate();

    for (species, mut combatant, transform, mut velocity) in &mut enemies {
        if combatant.removed {
            velocity.0 = Vec2::ZERO;
            continue;
        }
        let output = select_behavior(
            *species,
            &registry,
            &mut combatant,
            transform.translation.truncate(),
            player,
        );
        velocity.0 = output.movement;
    }
}

/// Steers mirrors toward their linked combatant.
///
/// Runs in `GameSet::Ai`, after links are cleared.
fn steer_mirrors(
    registry: Res<SpeciesRegistry>,
    mut mirrors: Query<(&Mirror, &Transform, &mut LinearVelocity)>,
    anchors: Query<&Transform, Without<Mirror>>,
) {
    let Some(props) = registry.get(Species::Mirror) else {
        return;
    };
    for (mirror, transform, mut velocity) in &mut mirrors {
        let anchor = mirror
            .linked
            .and_then(|linked| anchors.get(linked).ok())
            .map(|anchor| anchor.translation.truncate());
        velocity.0 = mirror_steering(props, transform.translation.truncate(), anchor);
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (
            clear_dead_mirror_links,
            (select_enemy_behaviors, steer_mirrors),
        )
            .chain()
            .in_set(GameSet::Ai)
            .run_if(gameplay_running),
    );
}
