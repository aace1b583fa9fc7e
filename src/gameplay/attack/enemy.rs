//! Enemy attacks: combatants the AI put into `Attacking` swing or shoot once.

use bevy::prelude::*;

use super::{AttackBuffers, AttackKind, AttackSpec, attachment_offset};
use crate::gameplay::combatant::{AiPhase, Combatant, PlayerModel};
use crate::gameplay::gesture::SwipeDirection;
use crate::gameplay::species::{CombatStyle, Species, SpeciesProps, SpeciesRegistry};
use crate::{GameSet, gameplay_running};

/// Enemy projectile radius in pixels.
pub const ENEMY_SHOT_RADIUS: f32 = 5.0;

/// The single attack a combatant at `own` makes against a player at `player`.
#[must_use]
pub fn plan_enemy_attack(props: &SpeciesProps, own: Vec2, player: Vec2) -> Option<AttackSpec> {
    match props.style.attack_kind()? {
        AttackKind::EnemyMelee => {
            let facing = if player.x >= own.x {
                SwipeDirection::Right
            } else {
                SwipeDirection::Left
            };
            Some(AttackSpec::new(
                AttackKind::EnemyMelee,
                own + attachment_offset(facing),
                props.attack_radius / 2.0,
                props.attack_lifetime,
                props.damage,
            ))
        }
        _ => {
            let aim = (player - own).try_normalize().unwrap_or(Vec2::X);
            Some(
                AttackSpec::new(
                    AttackKind::EnemyRanged,
                    own,
                    ENEMY_SHOT_RADIUS,
                    props.attack_lifetime,
                    props.damage,
                )
                .with_velocity(aim * props.projectile_speed)
                .splitable(),
            )
        }
    }
}

/// Consumes the one-tick `Attacking` trigger and moves the combatant to `Cooling`.
///
/// Runs in `GameSet::Attack`.
fn enemy_attacks_from_triggers(
    registry: Res<SpeciesRegistry>,
    player: Query<&Transform, With<PlayerModel>>,
    mut enemies: Query<(&Species, &mut Combatant, &Transform), Without<PlayerModel>>,
    mut buffers: ResMut<AttackBuffers>,
) {
    let player = player.single().ok().map(|transform| transform.translation.truncate());

    for (species, mut combatant, transform) in &mut enemies {
        if combatant.phase != AiPhase::Attacking {
            continue;
        }
        combatant.phase = AiPhase::Cooling;
        if combatant.removed {
            continue;
        }
        let (Some(props), Some(player)) = (registry.get(*species), player) else {
            continue;
        };
        if props.style == CombatStyle::Stationary {
            continue;
        }
        if let Some(spec) = plan_enemy_attack(props, transform.translation.truncate(), player) {
            debug!("{} attacks with {:?}", species.display_name(), spec.kind);
            buffers.create_attack(spec);
        }
    }
}

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        enemy_attacks_from_triggers
            .in_set(GameSet::Attack)
            .run_if(gameplay_running),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_test_app, test_registry};
    use pretty_assertions::assert_eq;

    #[test]
    fn melee_swing_faces_player() {
        let registry = test_registry();
        let grunt = registry.get(Species::Grunt).unwrap();
        let spec = plan_enemy_attack(grunt, Vec2::ZERO, Vec2::new(-30.0, 0.0)).unwrap();
        assert_eq!(spec.kind, AttackKind::EnemyMelee);
        assert_eq!(spec.origin, attachment_offset(SwipeDirection::Left));
        assert_eq!(spec.damage, grunt.damage);
        assert!(!spec.splitable);
    }

    #[test]
    fn ranged_shot_aims_at_player() {
        let registry = test_registry();
        let archer = registry.get(Species::Archer).unwrap();
        let spec = plan_enemy_attack(archer, Vec2::ZERO, Vec2::new(0.0, 100.0)).unwrap();
        assert_eq!(spec.kind, AttackKind::EnemyRanged);
        assert_eq!(spec.velocity, Vec2::new(0.0, archer.projectile_speed));
        assert!(spec.splitable);
    }

    #[test]
    fn stationary_species_never_attack() {
        let registry = test_registry();
        let mirror = registry.get(Species::Mirror).unwrap();
        assert_eq!(plan_enemy_attack(mirror, Vec2::ZERO, Vec2::X), None);
    }

    #[test]
    fn trigger_is_consumed_once() {
        let mut app = create_test_app();
        app.insert_resource(test_registry())
            .init_resource::<AttackBuffers>();
        app.add_systems(Update, enemy_attacks_from_triggers);

        app.world_mut()
            .spawn((PlayerModel::default(), Transform::from_xyz(20.0, 0.0, 0.0)));
        let mut combatant = Combatant::new(10, 1.0);
        combatant.phase = AiPhase::Attacking;
        let grunt = app
            .world_mut()
            .spawn((Species::Grunt, combatant, Transform::default()))
            .id();

        app.update();
        app.update();

        assert_eq!(app.world().resource::<AttackBuffers>().pending().len(), 1);
        assert_eq!(
            app.world().get::<Combatant>(grunt).unwrap().phase,
            AiPhase::Cooling
        );
    }
}
