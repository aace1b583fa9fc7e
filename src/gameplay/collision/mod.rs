//! Contact resolution: turns contact pairs into damage, cancellation,
//! detonation and mirror reflection.
//!
//! Every body that takes part in combat carries a [`CombatBody`] tag. A pair
//! is routed by matching on the two tags plus the sensor each side touched
//! with; no component probing decides what a body is.

mod mirror;

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::gameplay::WORLD_SCALE;
use crate::gameplay::attack::{Attack, AttackBuffers, AttackGroup, AttackKind, AttackOwner, AttackSpec};
use crate::gameplay::combatant::{Combatant, DamageOutcome, PlayerModel, SpawnedBy};
use crate::gameplay::spawn::Spawner;
use crate::gameplay::species::Species;
use crate::{GameSet, gameplay_running};

pub use mirror::{
    Mirror, MirrorMode, MirrorShape, burst_velocities, mirror_burst, radius_gain,
};

// === Constants ===

pub const EXPLOSION_RADIUS_UNITS: f32 = 3.0;
pub const EXPLOSION_LIFETIME_SECS: f32 = 0.2;
pub const EXPLOSION_DAMAGE: i32 = 6;

// === Components ===

/// What a physics body is, as far as combat is concerned.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
#[reflect(Component)]
pub enum CombatBody {
    Attack,
    Enemy,
    Mirror,
    Player,
    /// Walls and platforms.
    Hazard,
}

/// Which hit-detection region a collider represents.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
#[reflect(Component)]
pub enum SensorTag {
    /// Receives attacks owned by the player. Lives on enemies and mirrors.
    PlayerAttackSensor,
    /// Receives attacks owned by enemies. Lives on the player and mirrors.
    EnemyAttackSensor,
}

impl SensorTag {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlayerAttackSensor => "player_attack_sensor",
            Self::EnemyAttackSensor => "enemy_attack_sensor",
        }
    }
}

// === Messages ===

/// One side of a contact: the rigid body and the sensor it touched with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactSide {
    pub body: Entity,
    pub sensor: Option<SensorTag>,
}

impl ContactSide {
    #[must_use]
    pub const fn untagged(body: Entity) -> Self {
        Self { body, sensor: None }
    }

    #[must_use]
    pub const fn tagged(body: Entity, sensor: SensorTag) -> Self {
        Self {
            body,
            sensor: Some(sensor),
        }
    }
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactBegan {
    pub first: ContactSide,
    pub second: ContactSide,
}

/// Reserved for grounded and wall-sensor bookkeeping; resolves to nothing.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEnded {
    pub first: ContactSide,
    pub second: ContactSide,
}

/// A spawner's health reached zero.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnerKilled {
    pub spawner_index: u32,
}

/// An enemy produced by a spawner died; the spawner may replace it.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RespawnRequested {
    pub spawner_index: u32,
    pub species: Species,
}

// === Routing ===

/// Where a contact pair goes. At most one handler runs per contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactRoute {
    AttackVsAttack { first: Entity, second: Entity },
    AttackVsHazard { attack: Entity },
    AttackVsEnemy { attack: Entity, defender: Entity },
    AttackVsMirror { attack: Entity, mirror: Entity },
    /// An enemy shot reaching a mirror through its enemy-side sensor.
    MirrorChain { attack: Entity, mirror: Entity },
    AttackVsPlayer { attack: Entity, player: Entity },
    Ignored,
}

fn route_attack(attack: Entity, body: CombatBody, side: ContactSide) -> ContactRoute {
    match (body, side.sensor) {
        (CombatBody::Hazard, _) => ContactRoute::AttackVsHazard { attack },
        (CombatBody::Enemy, Some(SensorTag::PlayerAttackSensor)) => ContactRoute::AttackVsEnemy {
            attack,
            defender: side.body,
        },
        (CombatBody::Mirror, Some(SensorTag::PlayerAttackSensor)) => ContactRoute::AttackVsMirror {
            attack,
            mirror: side.body,
        },
        (CombatBody::Mirror, Some(SensorTag::EnemyAttackSensor)) => ContactRoute::MirrorChain {
            attack,
            mirror: side.body,
        },
        (CombatBody::Player, Some(SensorTag::EnemyAttackSensor)) => ContactRoute::AttackVsPlayer {
            attack,
            player: side.body,
        },
        _ => ContactRoute::Ignored,
    }
}

/// Routes a contact from the combat tags of both bodies. Attack tags are
/// checked first; untagged bodies are ignored.
#[must_use]
pub fn route_contact(
    first: Option<CombatBody>,
    first_side: ContactSide,
    second: Option<CombatBody>,
    second_side: ContactSide,
) -> ContactRoute {
    match (first, second) {
        (Some(CombatBody::Attack), Some(CombatBody::Attack)) => ContactRoute::AttackVsAttack {
            first: first_side.body,
            second: second_side.body,
        },
        (Some(CombatBody::Attack), Some(other)) => route_attack(first_side.body, other, second_side),
        (Some(other), Some(CombatBody::Attack)) => route_attack(second_side.body, other, first_side),
        _ => ContactRoute::Ignored,
    }
}

// === Handlers ===

/// Side effects the resolver hands back to the world.
#[derive(Debug, Default, PartialEq)]
pub struct Resolution {
    pub spawned: Vec<AttackSpec>,
    pub killed_spawners: Vec<SpawnerKilled>,
    pub respawns: Vec<RespawnRequested>,
}

/// Spawner links of the defender, read from the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefenderLinks {
    pub entity: Entity,
    pub species: Species,
    /// Set when the defender itself is a spawner.
    pub spawner_index: Option<u32>,
    /// Set when the defender came out of a spawner.
    pub spawned_by: Option<u32>,
}

/// Zero-velocity explosion that shares the package's group.
#[must_use]
pub fn explosion_spec(position: Vec2, group: AttackGroup) -> AttackSpec {
    AttackSpec::new(
        AttackKind::Explosion,
        position,
        EXPLOSION_RADIUS_UNITS * WORLD_SCALE,
        EXPLOSION_LIFETIME_SECS,
        EXPLOSION_DAMAGE,
    )
    .in_group(group)
}

/// Mutual cancel between a player swing and an enemy swing.
///
/// Player and enemy projectiles pass through each other.
pub fn resolve_attack_vs_attack(first: &mut Attack, second: &mut Attack) -> bool {
    if !first.active || !second.active {
        return false;
    }
    let swing_clash = |a: &Attack, b: &Attack| a.kind.is_close_range() && b.kind == AttackKind::EnemyMelee;
    if swing_clash(first, second) || swing_clash(second, first) {
        first.deactivate();
        second.deactivate();
        return true;
    }
    false
}

/// Detonates an active package at `position`. Other attacks are unaffected.
pub fn detonate_package(attack: &mut Attack, position: Vec2, out: &mut Resolution) -> bool {
    if !attack.active || attack.kind != AttackKind::RangedChargePackage {
        return false;
    }
    out.spawned.push(explosion_spec(position, attack.group));
    attack.deactivate();
    true
}

/// Player attack hitting an enemy's player-attack sensor.
pub fn resolve_attack_vs_enemy(
    attack: &mut Attack,
    position: Vec2,
    defender: &mut Combatant,
    links: DefenderLinks,
    out: &mut Resolution,
) -> Option<DamageOutcome> {
    if !attack.active || attack.owner() != AttackOwner::Player {
        return None;
    }
    if attack.has_hit_enemy(links.entity) {
        debug!("Same attack rejected on {}", links.entity);
        return None;
    }

    let outcome = defender.receive_damage(attack.damage, attack.kind.base_kind());
    match attack.kind {
        AttackKind::RangedChargePackage => {
            detonate_package(attack, position, out);
        }
        AttackKind::Ranged => attack.deactivate(),
        _ => attack.hit_enemy(links.entity),
    }

    if outcome == DamageOutcome::Killed {
        info!("{} {} destroyed", links.species.display_name(), links.entity);
        if let Some(spawner_index) = links.spawner_index {
            out.killed_spawners.push(SpawnerKilled { spawner_index });
        }
        if let Some(spawner_index) = links.spawned_by {
            out.respawns.push(RespawnRequested {
                spawner_index,
                species: links.species,
            });
        }
    }
    Some(outcome)
}

/// Player attack hitting a mirror's face.
///
/// Projectiles are turned into an enemy burst and never damage the mirror.
/// Swings and explosions damage it like any other enemy.
pub fn resolve_attack_vs_mirror(
    attack: &mut Attack,
    position: Vec2,
    velocity: Vec2,
    mirror: &mut Mirror,
    defender: &mut Combatant,
    links: DefenderLinks,
    out: &mut Resolution,
) -> Option<DamageOutcome> {
    if !attack.active || attack.owner() != AttackOwner::Player {
        return None;
    }
    if attack.kind.is_projectile() {
        attack.deactivate();
        mirror.attack_animation = true;
        out.spawned.extend(mirror_burst(
            mirror.shape,
            MirrorMode::Reflect,
            attack,
            position,
            velocity,
            links.entity,
        ));
        return None;
    }
    resolve_attack_vs_enemy(attack, position, defender, links, out)
}

/// Splitable enemy shot reaching a mirror from behind: split forward.
pub fn resolve_mirror_chain(
    attack: &mut Attack,
    position: Vec2,
    velocity: Vec2,
    mirror_entity: Entity,
    mirror: &mut Mirror,
    out: &mut Resolution,
) -> bool {
    if !attack.active
        || attack.kind != AttackKind::EnemyRanged
        || !attack.splitable
        || attack.has_hit_enemy(mirror_entity)
    {
        return false;
    }
    attack.deactivate();
    mirror.attack_animation = true;
    out.spawned.extend(mirror_burst(
        mirror.shape,
        MirrorMode::Forward,
        attack,
        position,
        velocity,
        mirror_entity,
    ));
    true
}

/// Enemy attack hitting the player. The attack is spent either way.
pub fn resolve_attack_vs_player(
    attack: &mut Attack,
    player: &mut Combatant,
    status: &mut PlayerModel,
) -> Option<DamageOutcome> {
    if !attack.active || attack.owner() != AttackOwner::Enemy {
        return None;
    }
    attack.deactivate();
    if status.invincible {
        return Some(DamageOutcome::Blocked);
    }
    let outcome = player.receive_damage(attack.damage, attack.kind.base_kind());
    if outcome != DamageOutcome::Blocked && attack.damage > 0 {
        status.invincible = true;
        status.stunned = true;
    }
    Some(outcome)
}

// === Systems ===

/// Resolves this tick's contact pairs.
///
/// Runs in `GameSet::Collision`.
pub(crate) fn resolve_contacts(
    mut contacts: MessageReader<ContactBegan>,
    bodies: Query<&CombatBody>,
    mut attacks: Query<(&mut Attack, &Transform, &LinearVelocity)>,
    mut combatants: Query<
        (
            &mut Combatant,
            &Species,
            Option<&SpawnedBy>,
            Option<&Spawner>,
            Option<&mut Mirror>,
            Option<&mut PlayerModel>,
        ),
        Without<Attack>,
    >,
    mut buffers: ResMut<AttackBuffers>,
    mut killed: MessageWriter<SpawnerKilled>,
    mut respawns: MessageWriter<RespawnRequested>,
) {
    for contact in contacts.read() {
        let route = route_contact(
            bodies.get(contact.first.body).ok().copied(),
            contact.first,
            bodies.get(contact.second.body).ok().copied(),
            contact.second,
        );
        let mut out = Resolution::default();

        match route {
            ContactRoute::AttackVsAttack { first, second } => {
                let Ok([(mut first, ..), (mut second, ..)]) = attacks.get_many_mut([first, second])
                else {
                    continue;
                };
                if resolve_attack_vs_attack(&mut first, &mut second) {
                    debug!("{:?} and {:?} cancelled", first.kind, second.kind);
                }
            }
            ContactRoute::AttackVsHazard { attack } => {
                let Ok((mut attack, transform, _)) = attacks.get_mut(attack) else {
                    continue;
                };
                if detonate_package(&mut attack, transform.translation.truncate(), &mut out) {
                    debug!("Package detonated on terrain");
                }
            }
            ContactRoute::AttackVsEnemy { attack, defender } => {
                let Ok((mut attack, transform, _)) = attacks.get_mut(attack) else {
                    continue;
                };
                let Ok((mut combatant, species, spawned_by, spawner, _, _)) =
                    combatants.get_mut(defender)
                else {
                    continue;
                };
                let links = DefenderLinks {
                    entity: defender,
                    species: *species,
                    spawner_index: spawner.map(|spawner| spawner.index),
                    spawned_by: spawned_by.map(|link| link.index),
                };
                if let Some(outcome) = resolve_attack_vs_enemy(
                    &mut attack,
                    transform.translation.truncate(),
                    &mut combatant,
                    links,
                    &mut out,
                ) {
                    debug!("{:?} hit {}: {outcome:?}", attack.kind, defender);
                }
            }
            ContactRoute::AttackVsMirror { attack, mirror } => {
                let Ok((mut attack, transform, velocity)) = attacks.get_mut(attack) else {
                    continue;
                };
                let Ok((mut combatant, species, spawned_by, spawner, Some(mut mirror_state), _)) =
                    combatants.get_mut(mirror)
                else {
                    continue;
                };
                let links = DefenderLinks {
                    entity: mirror,
                    species: *species,
                    spawner_index: spawner.map(|spawner| spawner.index),
                    spawned_by: spawned_by.map(|link| link.index),
                };
                resolve_attack_vs_mirror(
                    &mut attack,
                    transform.translation.truncate(),
                    velocity.0,
                    &mut mirror_state,
                    &mut combatant,
                    links,
                    &mut out,
                );
                if !out.spawned.is_empty() {
                    debug!("Mirror {} reflected {} shots", mirror, out.spawned.len());
                }
            }
            ContactRoute::MirrorChain { attack, mirror } => {
                let Ok((mut attack, transform, velocity)) = attacks.get_mut(attack) else {
                    continue;
                };
                let Ok((_, _, _, _, Some(mut mirror_state), _)) = combatants.get_mut(mirror) else {
                    continue;
                };
                if resolve_mirror_chain(
                    &mut attack,
                    transform.translation.truncate(),
                    velocity.0,
                    mirror,
                    &mut mirror_state,
                    &mut out,
                ) {
                    debug!("Mirror {} split {} shots forward", mirror, out.spawned.len());
                }
            }
            ContactRoute::AttackVsPlayer { attack, player } => {
                let Ok((mut attack, ..)) = attacks.get_mut(attack) else {
                    continue;
                };
                let Ok((mut combatant, _, _, _, _, Some(mut status))) = combatants.get_mut(player)
                else {
                    continue;
                };
                if let Some(outcome) = resolve_attack_vs_player(&mut attack, &mut combatant, &mut status) {
                    debug!("Player hit by {:?}: {outcome:?}", attack.kind);
                    if outcome == DamageOutcome::Killed {
                        info!("Player defeated");
                    }
                }
            }
            ContactRoute::Ignored => {}
        }

        for spec in out.spawned {
            buffers.create_attack(spec);
        }
        for message in out.killed_spawners {
            killed.write(message);
        }
        for message in out.respawns {
            respawns.write(message);
        }
    }
}

/// Contact ends carry no combat meaning yet.
fn observe_contact_ends(mut ended: MessageReader<ContactEnded>) {
    for contact in ended.read() {
        trace!("Contact ended: {:?} / {:?}", contact.first, contact.second);
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<CombatBody>()
        .register_type::<SensorTag>()
        .register_type::<Mirror>();

    app.add_message::<ContactBegan>()
        .add_message::<ContactEnded>()
        .add_message::<SpawnerKilled>()
        .add_message::<RespawnRequested>();

    app.add_systems(
        Update,
        (resolve_contacts, observe_contact_ends)
            .in_set(GameSet::Collision)
            .run_if(gameplay_running),
    );
}
