//! The level: combatant archetypes, the starting layout, and the sweep that
//! removes the dead and the spent at the end of every tick.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::gameplay::attack::{Attack, AttackBuffers};
use crate::gameplay::collision::{CombatBody, Mirror, MirrorShape, SensorTag};
use crate::gameplay::combatant::{Combatant, PlayerModel, SpawnedBy};
use crate::gameplay::spawn::Spawner;
use crate::gameplay::species::{Species, SpeciesProps, SpeciesRegistry};
use crate::screens::GameState;
use crate::third_party::avian::{body_layers, hurtbox_layers, terrain_layers};
use crate::{GameSet, Z_COMBATANT, Z_TERRAIN, gameplay_running};

// === Constants ===

/// Half the arena width in pixels.
pub const ARENA_HALF_WIDTH: f32 = 480.0;
/// Top surface of the floor.
pub const FLOOR_Y: f32 = -160.0;
const FLOOR_THICKNESS: f32 = 32.0;
const WALL_THICKNESS: f32 = 32.0;
const WALL_HEIGHT: f32 = 480.0;

/// Bleeds off the dash impulse; the player has no other horizontal drive.
const PLAYER_DAMPING: f32 = 3.0;

const PLAYER_START: Vec2 = Vec2::new(-200.0, FLOOR_Y + 40.0);
const BRUTE_START: Vec2 = Vec2::new(160.0, FLOOR_Y + 40.0);
const MIRROR_START: Vec2 = Vec2::new(160.0, 40.0);
const GROUND_SPAWNER_POSITION: Vec2 = Vec2::new(380.0, FLOOR_Y + 24.0);
const AIR_SPAWNER_POSITION: Vec2 = Vec2::new(-380.0, 120.0);

const TERRAIN_COLOR: Color = Color::srgb(0.3, 0.3, 0.35);
const PLAYER_COLOR: Color = Color::srgb(0.2, 0.6, 1.0);
const MIRROR_COLOR: Color = Color::srgb(0.8, 0.85, 0.95);
const SPAWNER_COLOR: Color = Color::srgb(0.45, 0.2, 0.5);

const fn species_color(species: Species) -> Color {
    match species {
        Species::Player => PLAYER_COLOR,
        Species::Grunt => Color::srgb(0.8, 0.3, 0.2),
        Species::Brute => Color::srgb(0.6, 0.15, 0.1),
        Species::Archer => Color::srgb(0.85, 0.6, 0.2),
        Species::Bat => Color::srgb(0.4, 0.3, 0.45),
        Species::Wisp => Color::srgb(0.5, 0.9, 0.8),
        Species::Mirror => MIRROR_COLOR,
        Species::Spawner => SPAWNER_COLOR,
    }
}

// === Archetypes ===

fn lookup(registry: &SpeciesRegistry, species: Species) -> Option<&SpeciesProps> {
    let props = registry.get(species);
    if props.is_none() {
        warn!("Cannot spawn {}: no species entry", species.display_name());
    }
    props
}

/// Parts every combatant shares: identity, combat state, sprite and body.
fn combatant_bundle(species: Species, props: &SpeciesProps, body: CombatBody, position: Vec2) -> impl Bundle {
    (
        Name::new(species.display_name()),
        body,
        species,
        Combatant::from_props(props),
        Sprite::from_color(species_color(species), Vec2::splat(props.body_radius * 2.0)),
        Transform::from_xyz(position.x, position.y, Z_COMBATANT),
        DespawnOnExit(GameState::InGame),
        Collider::circle(props.body_radius),
        body_layers(),
        LockedAxes::ROTATION_LOCKED,
        LinearVelocity::ZERO,
    )
}

/// Child collider that receives one owner's attacks.
fn hurtbox(sensor: SensorTag, radius: f32) -> impl Bundle {
    (
        Name::new(sensor.as_str()),
        sensor,
        Collider::circle(radius),
        hurtbox_layers(sensor),
        Transform::default(),
    )
}

fn gravity_for(props: &SpeciesProps) -> GravityScale {
    if props.style.is_flying() {
        GravityScale(0.0)
    } else {
        GravityScale(1.0)
    }
}

pub fn spawn_player(commands: &mut Commands, registry: &SpeciesRegistry, position: Vec2) -> Option<Entity> {
    let props = lookup(registry, Species::Player)?;
    let entity = commands
        .spawn((
            combatant_bundle(Species::Player, props, CombatBody::Player, position),
            PlayerModel::default(),
            RigidBody::Dynamic,
            LinearDamping(PLAYER_DAMPING),
        ))
        .with_child(hurtbox(SensorTag::EnemyAttackSensor, props.body_radius))
        .id();
    Some(entity)
}

/// Spawns a regular enemy. Flying species ignore gravity.
pub fn spawn_enemy(
    commands: &mut Commands,
    registry: &SpeciesRegistry,
    species: Species,
    position: Vec2,
    spawned_by: Option<SpawnedBy>,
) -> Option<Entity> {
    let props = lookup(registry, species)?;
    let mut entity = commands.spawn((
        combatant_bundle(species, props, CombatBody::Enemy, position),
        RigidBody::Dynamic,
        gravity_for(props),
    ));
    entity.with_child(hurtbox(SensorTag::PlayerAttackSensor, props.body_radius));
    if let Some(link) = spawned_by {
        entity.insert(link);
    }
    Some(entity.id())
}

/// Mirrors float and carry both sensors: player shots reflect off the face,
/// enemy shots split through the back.
pub fn spawn_mirror(
    commands: &mut Commands,
    registry: &SpeciesRegistry,
    shape: MirrorShape,
    position: Vec2,
    linked: Option<Entity>,
) -> Option<Entity> {
    let props = lookup(registry, Species::Mirror)?;
    let mirror = Mirror {
        linked,
        ..Mirror::new(shape)
    };
    let entity = commands
        .spawn((
            combatant_bundle(Species::Mirror, props, CombatBody::Mirror, position),
            mirror,
            RigidBody::Dynamic,
            GravityScale(0.0),
        ))
        .with_child(hurtbox(SensorTag::PlayerAttackSensor, props.body_radius))
        .with_child(hurtbox(SensorTag::EnemyAttackSensor, props.body_radius))
        .id();
    Some(entity)
}

pub fn spawn_spawner(
    commands: &mut Commands,
    registry: &SpeciesRegistry,
    index: u32,
    species: Species,
    position: Vec2,
) -> Option<Entity> {
    let props = lookup(registry, Species::Spawner)?;
    let entity = commands
        .spawn((
            combatant_bundle(Species::Spawner, props, CombatBody::Enemy, position),
            Spawner::new(index, species),
            RigidBody::Static,
        ))
        .with_child(hurtbox(SensorTag::PlayerAttackSensor, props.body_radius))
        .id();
    Some(entity)
}

fn hazard(name: &'static str, size: Vec2, center: Vec2) -> impl Bundle {
    (
        Name::new(name),
        CombatBody::Hazard,
        Sprite::from_color(TERRAIN_COLOR, size),
        Transform::from_xyz(center.x, center.y, Z_TERRAIN),
        DespawnOnExit(GameState::InGame),
        RigidBody::Static,
        Collider::rectangle(size.x, size.y),
        terrain_layers(),
    )
}

// === Systems ===

fn setup_level(mut commands: Commands, registry: Res<SpeciesRegistry>) {
    let width = ARENA_HALF_WIDTH.mul_add(2.0, WALL_THICKNESS * 2.0);
    commands.spawn(hazard(
        "Floor",
        Vec2::new(width, FLOOR_THICKNESS),
        Vec2::new(0.0, FLOOR_Y - FLOOR_THICKNESS / 2.0),
    ));
    for (name, side) in [("Left Wall", -1.0), ("Right Wall", 1.0)] {
        commands.spawn(hazard(
            name,
            Vec2::new(WALL_THICKNESS, WALL_HEIGHT),
            Vec2::new(
                side * (ARENA_HALF_WIDTH + WALL_THICKNESS / 2.0),
                FLOOR_Y + WALL_HEIGHT / 2.0,
            ),
        ));
    }

    spawn_player(&mut commands, &registry, PLAYER_START);
    spawn_spawner(&mut commands, &registry, 0, Species::Grunt, GROUND_SPAWNER_POSITION);
    spawn_spawner(&mut commands, &registry, 1, Species::Bat, AIR_SPAWNER_POSITION);
    let brute = spawn_enemy(&mut commands, &registry, Species::Brute, BRUTE_START, None);
    spawn_mirror(&mut commands, &registry, MirrorShape::Square, MIRROR_START, brute);

    info!("Level ready");
}

/// Despawns removed combatants and spent attacks. A removed player restarts the level.
///
/// Runs in `GameSet::Death`.
fn sweep_removed(
    mut commands: Commands,
    combatants: Query<(Entity, &Combatant, &Species, Has<PlayerModel>)>,
    attacks: Query<(Entity, &Attack)>,
    mut buffers: ResMut<AttackBuffers>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    for (entity, attack) in &attacks {
        if !attack.active {
            buffers.retire(entity);
            commands.entity(entity).despawn();
        }
    }

    for (entity, combatant, species, is_player) in &combatants {
        if !combatant.removed {
            continue;
        }
        if is_player {
            info!("Player fell; restarting level");
            next_state.set(GameState::Loading);
        } else {
            debug!("Sweeping {} {entity}", species.display_name());
        }
        commands.entity(entity).despawn();
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), setup_level);

    app.add_systems(
        Update,
        sweep_removed
            .in_set(GameSet::Death)
            .run_if(gameplay_running),
    );
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::gameplay::attack::{AttackKind, AttackSpec};
    use crate::testing::{assert_entity_count, create_base_test_app, test_registry, transition_to_ingame};
    use pretty_assertions::assert_eq;

    fn create_level_test_app() -> App {
        let mut app = create_base_test_app();
        app.insert_resource(test_registry())
            .init_resource::<AttackBuffers>();
        plugin(&mut app);
        transition_to_ingame(&mut app);
        app
    }

    #[test]
    fn entering_game_builds_level() {
        let mut app = create_level_test_app();

        assert_entity_count::<With<PlayerModel>>(&mut app, 1);
        assert_entity_count::<With<Spawner>>(&mut app, 2);
        assert_entity_count::<With<Mirror>>(&mut app, 1);
        assert_entity_count::<(With<Combatant>, Without<Spawner>, Without<Mirror>, Without<PlayerModel>)>(
            &mut app, 1,
        );

        let mut hazards = app.world_mut().query::<&CombatBody>();
        let count = hazards
            .iter(app.world())
            .filter(|body| **body == CombatBody::Hazard)
            .count();
        assert_eq!(count, 3);
    }

    #[test]
    fn level_mirror_is_linked_to_brute() {
        let mut app = create_level_test_app();

        let mut mirrors = app.world_mut().query::<&Mirror>();
        let linked = mirrors.single(app.world()).unwrap().linked.unwrap();
        assert_eq!(app.world().get::<Species>(linked), Some(&Species::Brute));
    }

    #[test]
    fn sweep_despawns_removed_and_spent() {
        let mut app = create_level_test_app();
        let mut dead = Combatant::new(10, 1.0);
        dead.removed = true;
        app.world_mut().spawn((Species::Grunt, dead, Transform::default()));

        let mut spent = Attack::from_spec(&AttackSpec::new(AttackKind::Melee, Vec2::ZERO, 8.0, 0.2, 1));
        spent.deactivate();
        app.world_mut().spawn(spent);
        let live = app
            .world_mut()
            .spawn(Attack::from_spec(&AttackSpec::new(AttackKind::Melee, Vec2::ZERO, 8.0, 0.2, 1)))
            .id();

        app.update();

        // Player, brute, mirror and both spawners remain.
        assert_entity_count::<With<Combatant>>(&mut app, 5);
        assert_entity_count::<With<Attack>>(&mut app, 1);
        assert!(app.world().get::<Attack>(live).is_some());
    }

    #[test]
    fn removed_player_restarts_level() {
        let mut app = create_level_test_app();
        let mut players = app
            .world_mut()
            .query_filtered::<&mut Combatant, With<PlayerModel>>();
        players.single_mut(app.world_mut()).unwrap().removed = true;

        app.update();
        app.update();

        let state = app.world().resource::<State<GameState>>();
        assert_eq!(*state.get(), GameState::Loading);
        assert_entity_count::<With<Combatant>>(&mut app, 0);
    }
}
