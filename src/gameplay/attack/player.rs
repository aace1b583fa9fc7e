//! Player attacks: swipe intents become melee swings, dashes and projectiles.

use avian2d::prelude::*;
use bevy::prelude::*;

use super::{AttackBuffers, AttackKind, AttackSpec, attachment_offset};
use crate::gameplay::WORLD_SCALE;
use crate::gameplay::combatant::{Combatant, PlayerModel};
use crate::gameplay::gesture::{
    InputBindings, InputSide, SwipeAttack, SwipeDirection, SwipeIntents, gate_airborne,
};
use crate::gameplay::species::{Species, SpeciesProps, SpeciesRegistry};
use crate::{GameSet, gameplay_running};

// === Constants ===

pub const MELEE_RADIUS_UNITS: f32 = 1.0;

pub const DASH_RADIUS_UNITS: f32 = 1.25;
pub const DASH_LIFETIME_SECS: f32 = 0.3;
/// Speed of the impulse a dash gives the player, in world units per second.
pub const DASH_SPEED_UNITS: f32 = 30.0;
pub const DASH_DAMAGE_MULTIPLIER: i32 = 2;

pub const RANGED_RADIUS_UNITS: f32 = 0.4;
pub const RANGED_LIFETIME_SECS: f32 = 1.2;

pub const PACKAGE_RADIUS_UNITS: f32 = 0.75;
pub const PACKAGE_LIFETIME_SECS: f32 = 2.0;
/// Packages fly at this fraction of the normal projectile speed.
pub const PACKAGE_SPEED_FACTOR: f32 = 0.5;

// === Types ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackStyle {
    Melee,
    Ranged,
}

// === Pure Functions ===

/// Attacks produced by one swipe from a player standing at `origin`.
///
/// Returns nothing for [`SwipeAttack::NoAttack`]. A plain downward swing on
/// the ground turns into two side swings.
#[must_use]
pub fn plan_player_attacks(
    swipe: SwipeAttack,
    style: AttackStyle,
    grounded: bool,
    origin: Vec2,
    props: &SpeciesProps,
) -> Vec<AttackSpec> {
    let Some(direction) = swipe.direction() else {
        return Vec::new();
    };

    match (style, swipe.is_charged()) {
        (AttackStyle::Melee, false) => {
            let directions = if direction == SwipeDirection::Down && grounded {
                vec![SwipeDirection::Left, SwipeDirection::Right]
            } else {
                vec![direction]
            };
            directions
                .into_iter()
                .map(|direction| {
                    let offset = attachment_offset(direction);
                    AttackSpec::new(
                        AttackKind::Melee,
                        origin + offset,
                        MELEE_RADIUS_UNITS * WORLD_SCALE,
                        props.attack_lifetime,
                        props.damage,
                    )
                    .tracking(offset)
                })
                .collect()
        }
        (AttackStyle::Melee, true) => vec![
            AttackSpec::new(
                AttackKind::Dash,
                origin,
                DASH_RADIUS_UNITS * WORLD_SCALE,
                DASH_LIFETIME_SECS,
                props.damage * DASH_DAMAGE_MULTIPLIER,
            )
            .tracking(Vec2::ZERO),
        ],
        (AttackStyle::Ranged, false) => vec![
            AttackSpec::new(
                AttackKind::Ranged,
                origin + attachment_offset(direction),
                RANGED_RADIUS_UNITS * WORLD_SCALE,
                RANGED_LIFETIME_SECS,
                props.damage,
            )
            .with_velocity(direction.unit() * props.projectile_speed),
        ],
        (AttackStyle::Ranged, true) => vec![
            AttackSpec::new(
                AttackKind::RangedChargePackage,
                origin + attachment_offset(direction),
                PACKAGE_RADIUS_UNITS * WORLD_SCALE,
                PACKAGE_LIFETIME_SECS,
                props.damage,
            )
            .with_velocity(direction.unit() * props.projectile_speed * PACKAGE_SPEED_FACTOR),
        ],
    }
}

/// Velocity a dash in `direction` gives the player.
#[must_use]
pub fn dash_impulse(direction: SwipeDirection) -> Vec2 {
    direction.unit() * DASH_SPEED_UNITS * WORLD_SCALE
}

// === Systems ===

/// Turns this tick's swipe intents into pending player attacks.
///
/// Both sides share the player's cooldown. Runs in `GameSet::Attack`.
fn player_attacks_from_intents(
    intents: Res<SwipeIntents>,
    bindings: Res<InputBindings>,
    registry: Res<SpeciesRegistry>,
    mut buffers: ResMut<AttackBuffers>,
    mut players: Query<(&Transform, &mut Combatant, &PlayerModel, &mut LinearVelocity)>,
) {
    let Ok((transform, mut combatant, status, mut velocity)) = players.single_mut() else {
        return;
    };
    let Some(props) = registry.get(Species::Player) else {
        return;
    };
    if status.stunned || combatant.removed {
        return;
    }
    let origin = transform.translation.truncate();

    for side in [InputSide::Left, InputSide::Right] {
        let swipe = gate_airborne(intents.get(side), side, &bindings, status.grounded);
        if swipe == SwipeAttack::NoAttack || !combatant.ready_to_attack() {
            continue;
        }
        let style = if side == bindings.melee_side {
            AttackStyle::Melee
        } else {
            AttackStyle::Ranged
        };
        let specs = plan_player_attacks(swipe, style, status.grounded, origin, props);
        if specs.is_empty() {
            continue;
        }

        combatant.start_attack();
        if style == AttackStyle::Melee && swipe.is_charged() {
            if let Some(direction) = swipe.direction() {
                velocity.0 = dash_impulse(direction);
            }
        }
        let group = buffers.allocate_group();
        debug!("Player {swipe:?} on {side:?} side: {} attacks", specs.len());
        for spec in specs {
            buffers.create_attack(spec.in_group(group));
        }
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        player_attacks_from_intents
            .in_set(GameSet::Attack)
            .run_if(gameplay_running),
    );
}
