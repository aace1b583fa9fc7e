//! One level, several ticks: attacks enter, land, reflect and restart the level.

use bevy::prelude::*;
use pretty_assertions::assert_eq;
use swipe_brawler::GameState;
use swipe_brawler::gameplay::attack::{Attack, AttackBuffers, AttackKind, AttackSpec};
use swipe_brawler::gameplay::collision::{ContactBegan, ContactSide, Mirror, SensorTag};
use swipe_brawler::gameplay::combatant::{Combatant, PlayerModel};
use swipe_brawler::gameplay::species::Species;

use crate::{boot_level, create_game_app};

fn find_species(app: &mut App, wanted: Species) -> Entity {
    let mut query = app.world_mut().query::<(Entity, &Species)>();
    query
        .iter(app.world())
        .find(|(_, species)| **species == wanted)
        .map(|(entity, _)| entity)
        .expect("species should be in the level")
}

fn find_player(app: &mut App) -> Entity {
    let mut query = app.world_mut().query_filtered::<Entity, With<PlayerModel>>();
    query.single(app.world()).expect("level should have one player")
}

/// Queues `spec` and runs the tick that promotes it. Returns the new attack.
fn launch(app: &mut App, spec: AttackSpec) -> Entity {
    app.world_mut()
        .resource_mut::<AttackBuffers>()
        .create_attack(spec);
    app.update();
    *app.world()
        .resource::<AttackBuffers>()
        .current()
        .last()
        .expect("attack should be promoted")
}

fn touch(app: &mut App, attack: Entity, body: Entity, sensor: SensorTag) {
    app.world_mut().write_message(ContactBegan {
        first: ContactSide::untagged(attack),
        second: ContactSide::tagged(body, sensor),
    });
    app.update();
}

fn count_attacks(app: &mut App, kind: AttackKind) -> usize {
    let mut query = app.world_mut().query::<&Attack>();
    query
        .iter(app.world())
        .filter(|attack| attack.kind == kind)
        .count()
}

#[test]
fn swing_damages_brute_once() {
    let mut app = create_game_app();
    boot_level(&mut app);
    let brute = find_species(&mut app, Species::Brute);

    let swing = launch(
        &mut app,
        AttackSpec::new(AttackKind::Melee, Vec2::ZERO, 16.0, 5.0, 4),
    );
    touch(&mut app, swing, brute, SensorTag::PlayerAttackSensor);
    assert_eq!(app.world().get::<Combatant>(brute).unwrap().health, 26);

    touch(&mut app, swing, brute, SensorTag::PlayerAttackSensor);
    assert_eq!(app.world().get::<Combatant>(brute).unwrap().health, 26);
}

#[test]
fn shot_off_square_mirror_comes_back_as_enemy_shot() {
    let mut app = create_game_app();
    boot_level(&mut app);
    let mirror = find_species(&mut app, Species::Mirror);

    let shot = launch(
        &mut app,
        AttackSpec::new(AttackKind::Ranged, Vec2::ZERO, 6.0, 5.0, 2)
            .with_velocity(Vec2::new(200.0, 0.0)),
    );
    touch(&mut app, shot, mirror, SensorTag::PlayerAttackSensor);

    // The spent shot is swept and its reflection is already in the world.
    assert!(app.world().get_entity(shot).is_err());
    assert_eq!(count_attacks(&mut app, AttackKind::Ranged), 0);
    assert_eq!(count_attacks(&mut app, AttackKind::EnemyRanged), 1);
    assert_eq!(app.world().get::<Combatant>(mirror).unwrap().health, 12);
    assert!(app.world().get::<Mirror>(mirror).unwrap().attack_animation);
}

#[test]
fn killing_brute_unlinks_mirror() {
    let mut app = create_game_app();
    boot_level(&mut app);
    let brute = find_species(&mut app, Species::Brute);
    let mirror = find_species(&mut app, Species::Mirror);

    let swing = launch(
        &mut app,
        AttackSpec::new(AttackKind::Dash, Vec2::ZERO, 20.0, 5.0, 100),
    );
    touch(&mut app, swing, brute, SensorTag::PlayerAttackSensor);
    assert!(app.world().get_entity(brute).is_err());

    app.update();
    assert_eq!(app.world().get::<Mirror>(mirror).unwrap().linked, None);
}

#[test]
fn lethal_hit_on_player_restarts_level() {
    let mut app = create_game_app();
    boot_level(&mut app);
    let player = find_player(&mut app);

    let blow = launch(
        &mut app,
        AttackSpec::new(AttackKind::EnemyMelee, Vec2::ZERO, 16.0, 5.0, 100),
    );
    touch(&mut app, blow, player, SensorTag::EnemyAttackSensor);
    assert!(app.world().get_entity(player).is_err());

    // Exit the level, finish loading, enter the fresh level.
    app.update();
    app.update();
    assert_eq!(
        *app.world().resource::<State<GameState>>().get(),
        GameState::InGame
    );

    let fresh = find_player(&mut app);
    assert_ne!(fresh, player);
    assert_eq!(app.world().get::<Combatant>(fresh).unwrap().health, 20);
    assert!(app.world().resource::<AttackBuffers>().current().is_empty());
}

#[test]
fn paused_time_freezes_attack_promotion() {
    let mut app = create_game_app();
    boot_level(&mut app);

    app.world_mut().resource_mut::<Time<Virtual>>().pause();
    app.world_mut()
        .resource_mut::<AttackBuffers>()
        .create_attack(AttackSpec::new(AttackKind::Melee, Vec2::ZERO, 8.0, 1.0, 1));
    app.update();
    assert_eq!(app.world().resource::<AttackBuffers>().pending().len(), 1);

    app.world_mut().resource_mut::<Time<Virtual>>().unpause();
    app.update();
    assert!(app.world().resource::<AttackBuffers>().pending().is_empty());
}
