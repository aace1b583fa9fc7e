//! Avian2d configuration for a side-view arena, and the bridge that turns
//! physics collision messages into combat contacts.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::gameplay::WORLD_SCALE;
use crate::gameplay::attack::AttackOwner;
use crate::gameplay::collision::{ContactBegan, ContactEnded, ContactSide, SensorTag, resolve_contacts};
use crate::{GameSet, gameplay_running};

/// Downward acceleration in world units per second squared.
const GRAVITY_UNITS: f32 = 60.0;

// === Collision Layers ===

/// Physics collision layers for the hitbox/hurtbox system.
///
/// Bodies only collide with terrain. Attacks are sensors on the hitbox
/// layers; each hurtbox layer only meets the opposing owner's hitboxes.
#[derive(PhysicsLayer, Clone, Copy, Debug, Default)]
pub enum CollisionLayer {
    /// Floors and walls.
    #[default]
    Terrain,
    /// Solid presence of a combatant.
    Body,
    PlayerHitbox,
    EnemyHitbox,
    /// Receives player attacks. Lives on enemies, spawners and mirror faces.
    PlayerHurtbox,
    /// Receives enemy attacks. Lives on the player and mirror backs.
    EnemyHurtbox,
}

#[must_use]
pub fn terrain_layers() -> CollisionLayers {
    CollisionLayers::new(
        CollisionLayer::Terrain,
        [
            CollisionLayer::Body,
            CollisionLayer::PlayerHitbox,
            CollisionLayer::EnemyHitbox,
        ],
    )
}

#[must_use]
pub fn body_layers() -> CollisionLayers {
    CollisionLayers::new(CollisionLayer::Body, CollisionLayer::Terrain)
}

/// Layers for an attack owned by `owner`. Opposing attacks meet so swings can clash.
#[must_use]
pub fn hitbox_layers(owner: AttackOwner) -> CollisionLayers {
    match owner {
        AttackOwner::Player => CollisionLayers::new(
            CollisionLayer::PlayerHitbox,
            [
                CollisionLayer::Terrain,
                CollisionLayer::EnemyHitbox,
                CollisionLayer::PlayerHurtbox,
            ],
        ),
        AttackOwner::Enemy => CollisionLayers::new(
            CollisionLayer::EnemyHitbox,
            [
                CollisionLayer::Terrain,
                CollisionLayer::PlayerHitbox,
                CollisionLayer::EnemyHurtbox,
            ],
        ),
    }
}

#[must_use]
pub fn hurtbox_layers(sensor: SensorTag) -> CollisionLayers {
    match sensor {
        SensorTag::PlayerAttackSensor => {
            CollisionLayers::new(CollisionLayer::PlayerHurtbox, CollisionLayer::PlayerHitbox)
        }
        SensorTag::EnemyAttackSensor => {
            CollisionLayers::new(CollisionLayer::EnemyHurtbox, CollisionLayer::EnemyHitbox)
        }
    }
}

// === Contact Bridge ===

/// Resolves a collider to the body it belongs to and the sensor it stands for.
fn contact_side(collider: Entity, body: Option<Entity>, tags: &Query<&SensorTag>) -> ContactSide {
    ContactSide {
        body: body.unwrap_or(collider),
        sensor: tags.get(collider).ok().copied(),
    }
}

fn forward_contact_begins(
    mut started: MessageReader<CollisionStart>,
    tags: Query<&SensorTag>,
    mut began: MessageWriter<ContactBegan>,
) {
    for event in started.read() {
        began.write(ContactBegan {
            first: contact_side(event.collider1, event.body1, &tags),
            second: contact_side(event.collider2, event.body2, &tags),
        });
    }
}

fn forward_contact_ends(
    mut finished: MessageReader<CollisionEnd>,
    tags: Query<&SensorTag>,
    mut ended: MessageWriter<ContactEnded>,
) {
    for event in finished.read() {
        ended.write(ContactEnded {
            first: contact_side(event.collider1, event.body1, &tags),
            second: contact_side(event.collider2, event.body2, &tags),
        });
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(PhysicsPlugins::default().with_length_unit(WORLD_SCALE));
    app.insert_resource(Gravity(Vec2::new(0.0, -GRAVITY_UNITS * WORLD_SCALE)));

    app.add_systems(
        Update,
        (forward_contact_begins, forward_contact_ends)
            .in_set(GameSet::Collision)
            .before(resolve_contacts)
            .run_if(gameplay_running),
    );
}
