//! Attack lifecycle: hitboxes are requested into a pending buffer, enter the
//! world one tick later, age down while following their owner, and go inert
//! once spent.

mod enemy;
mod player;

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::gameplay::WORLD_SCALE;
use crate::gameplay::combatant::{BaseAttackKind, PlayerModel};
use crate::gameplay::gesture::SwipeDirection;
use crate::screens::GameState;
use crate::third_party::avian::hitbox_layers;
use crate::{GameSet, Z_ATTACK, gameplay_running};

pub use enemy::plan_enemy_attack;
pub use player::{AttackStyle, plan_player_attacks};

// === Constants ===

/// Attachment offsets in world units, scaled by [`WORLD_SCALE`].
const SIDE_OFFSET_UNITS: f32 = 1.5;
const UP_OFFSET_UNITS: f32 = 1.75;
const DOWN_OFFSET_UNITS: f32 = 1.25;

const PLAYER_ATTACK_COLOR: Color = Color::srgba(0.4, 0.8, 1.0, 0.6);
const ENEMY_ATTACK_COLOR: Color = Color::srgba(1.0, 0.35, 0.3, 0.6);
const EXPLOSION_COLOR: Color = Color::srgba(1.0, 0.75, 0.2, 0.6);

// === Types ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum AttackKind {
    Melee,
    Dash,
    Ranged,
    /// Slow charged projectile that detonates into an [`AttackKind::Explosion`].
    RangedChargePackage,
    Explosion,
    EnemyMelee,
    EnemyRanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum AttackOwner {
    Player,
    Enemy,
}

impl AttackKind {
    #[must_use]
    pub const fn owner(self) -> AttackOwner {
        match self {
            Self::EnemyMelee | Self::EnemyRanged => AttackOwner::Enemy,
            _ => AttackOwner::Player,
        }
    }

    /// Player swings that can only hit each defender once.
    #[must_use]
    pub const fn is_close_range(self) -> bool {
        matches!(self, Self::Melee | Self::Dash)
    }

    #[must_use]
    pub const fn is_projectile(self) -> bool {
        matches!(
            self,
            Self::Ranged | Self::RangedChargePackage | Self::EnemyRanged
        )
    }

    #[must_use]
    pub const fn base_kind(self) -> BaseAttackKind {
        match self {
            Self::Melee | Self::Dash | Self::EnemyMelee => BaseAttackKind::Melee,
            Self::Ranged | Self::RangedChargePackage | Self::EnemyRanged => {
                BaseAttackKind::Ranged
            }
            Self::Explosion => BaseAttackKind::Explosion,
        }
    }

    const fn color(self) -> Color {
        match (self, self.owner()) {
            (Self::Explosion, _) => EXPLOSION_COLOR,
            (_, AttackOwner::Player) => PLAYER_ATTACK_COLOR,
            (_, AttackOwner::Enemy) => ENEMY_ATTACK_COLOR,
        }
    }
}

/// Provenance shared by attacks created together (a package and its
/// explosion, a shot and its reflections).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub struct AttackGroup(pub u32);

/// Everything needed to put an attack into the world.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackSpec {
    pub kind: AttackKind,
    pub origin: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub damage: i32,
    pub lifetime: f32,
    /// Remaining seconds. Equal to `lifetime` unless inherited.
    pub age: f32,
    /// `None` asks [`AttackBuffers::create_attack`] for a fresh group.
    pub group: Option<AttackGroup>,
    pub splitable: bool,
    /// Offset from the player to follow while active.
    pub anchor: Option<Vec2>,
    pub already_hit: Vec<Entity>,
}

impl AttackSpec {
    #[must_use]
    pub const fn new(kind: AttackKind, origin: Vec2, radius: f32, lifetime: f32, damage: i32) -> Self {
        Self {
            kind,
            origin,
            velocity: Vec2::ZERO,
            radius,
            damage,
            lifetime,
            age: lifetime,
            group: None,
            splitable: false,
            anchor: None,
            already_hit: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    #[must_use]
    pub fn with_age(mut self, age: f32) -> Self {
        self.age = age;
        self
    }

    #[must_use]
    pub fn in_group(mut self, group: AttackGroup) -> Self {
        self.group = Some(group);
        self
    }

    #[must_use]
    pub fn splitable(mut self) -> Self {
        self.splitable = true;
        self
    }

    /// Follows the player at `offset` until spent.
    #[must_use]
    pub fn tracking(mut self, offset: Vec2) -> Self {
        self.anchor = Some(offset);
        self
    }

    #[must_use]
    pub fn already_hit(mut self, defender: Entity) -> Self {
        if !self.already_hit.contains(&defender) {
            self.already_hit.push(defender);
        }
        self
    }

    /// Inherits every defender a parent attack has already touched.
    #[must_use]
    pub fn already_hit_all(self, defenders: &[Entity]) -> Self {
        defenders
            .iter()
            .fold(self, |spec, defender| spec.already_hit(*defender))
    }
}

// === Components ===

/// A live hitbox.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Attack {
    pub kind: AttackKind,
    pub damage: i32,
    pub radius: f32,
    pub lifetime: f32,
    /// Seconds left before the attack goes inert.
    pub age: f32,
    pub active: bool,
    pub group: AttackGroup,
    pub splitable: bool,
    pub anchor: Option<Vec2>,
    hit: Vec<Entity>,
}

impl Attack {
    #[must_use]
    pub fn from_spec(spec: &AttackSpec) -> Self {
        Self {
            kind: spec.kind,
            damage: spec.damage,
            radius: spec.radius,
            lifetime: spec.lifetime,
            age: spec.age,
            active: true,
            group: spec.group.unwrap_or_default(),
            splitable: spec.splitable,
            anchor: spec.anchor,
            hit: spec.already_hit.clone(),
        }
    }

    #[must_use]
    pub const fn owner(&self) -> AttackOwner {
        self.kind.owner()
    }

    pub fn hit_enemy(&mut self, defender: Entity) {
        if !self.hit.contains(&defender) {
            self.hit.push(defender);
        }
    }

    #[must_use]
    pub fn has_hit_enemy(&self, defender: Entity) -> bool {
        self.hit.contains(&defender)
    }

    #[must_use]
    pub fn hits(&self) -> &[Entity] {
        &self.hit
    }

    pub const fn deactivate(&mut self) {
        self.active = false;
    }

    /// Counts the age down. Returns `true` on the tick it runs out.
    pub fn age_by(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }
        self.age -= dt;
        if self.age <= 0.0 {
            self.age = 0.0;
            self.active = false;
            return true;
        }
        false
    }
}

// === Resources ===

/// Double buffer of attacks: `pending` becomes `current` once per tick.
#[derive(Resource, Debug, Default)]
pub struct AttackBuffers {
    pending: Vec<AttackSpec>,
    current: Vec<Entity>,
    next_group: u32,
}

impl AttackBuffers {
    /// Queues an attack. It becomes collidable on the next promotion.
    pub fn create_attack(&mut self, mut spec: AttackSpec) -> AttackGroup {
        let group = match spec.group {
            Some(group) => group,
            None => self.allocate_group(),
        };
        spec.group = Some(group);
        self.pending.push(spec);
        group
    }

    pub const fn allocate_group(&mut self) -> AttackGroup {
        self.next_group = self.next_group.wrapping_add(1);
        AttackGroup(self.next_group)
    }

    #[must_use]
    pub fn pending(&self) -> &[AttackSpec] {
        &self.pending
    }

    #[must_use]
    pub fn current(&self) -> &[Entity] {
        &self.current
    }

    /// Forgets a despawned attack.
    pub fn retire(&mut self, attack: Entity) {
        self.current.retain(|entity| *entity != attack);
    }
}

// === Helpers ===

/// Where a hitbox sits relative to its owner for a swing in `direction`.
#[must_use]
pub fn attachment_offset(direction: SwipeDirection) -> Vec2 {
    let units = match direction {
        SwipeDirection::Left => Vec2::new(-SIDE_OFFSET_UNITS, 0.0),
        SwipeDirection::Right => Vec2::new(SIDE_OFFSET_UNITS, 0.0),
        SwipeDirection::Up => Vec2::new(0.0, UP_OFFSET_UNITS),
        SwipeDirection::Down => Vec2::new(0.0, -DOWN_OFFSET_UNITS),
    };
    units * WORLD_SCALE
}

fn attack_bundle(spec: &AttackSpec) -> impl Bundle {
    (
        Name::new(format!("{:?}", spec.kind)),
        crate::gameplay::collision::CombatBody::Attack,
        Attack::from_spec(spec),
        Sprite::from_color(spec.kind.color(), Vec2::splat(spec.radius * 2.0)),
        Transform::from_xyz(spec.origin.x, spec.origin.y, Z_ATTACK),
        DespawnOnExit(GameState::InGame),
        RigidBody::Kinematic,
        Collider::circle(spec.radius),
        Sensor,
        hitbox_layers(spec.kind.owner()),
        CollisionEventsEnabled,
        LinearVelocity(spec.velocity),
    )
}

// === Systems ===

fn reset_attack_buffers(mut commands: Commands) {
    commands.insert_resource(AttackBuffers::default());
}

/// Moves tracking attacks with the player and counts every active attack down.
///
/// Runs in `GameSet::Lifecycle`, before promotion.
fn age_attacks(
    time: Res<Time>,
    player: Query<(&Transform, &LinearVelocity), (With<PlayerModel>, Without<Attack>)>,
    mut attacks: Query<(&mut Attack, &mut Transform, &mut LinearVelocity)>,
) {
    let dt = time.delta_secs();
    let owner = player
        .single()
        .ok()
        .map(|(transform, velocity)| (transform.translation.truncate(), velocity.0));

    for (mut attack, mut transform, mut velocity) in &mut attacks {
        if !attack.active {
            continue;
        }
        if let (Some(offset), Some((position, owner_velocity))) = (attack.anchor, owner) {
            let target = position + offset;
            transform.translation.x = target.x;
            transform.translation.y = target.y;
            velocity.0 = owner_velocity;
        }
        if attack.age_by(dt) {
            debug!("{:?} attack expired", attack.kind);
        }
    }
}

/// Drains `pending` into the world. Attacks requested this tick collide next tick.
///
/// Runs in `GameSet::Lifecycle`.
fn promote_pending_attacks(mut commands: Commands, mut buffers: ResMut<AttackBuffers>) {
    let pending = std::mem::take(&mut buffers.pending);
    if pending.is_empty() {
        return;
    }
    debug!("Promoting {} pending attacks", pending.len());
    for spec in &pending {
        let entity = commands.spawn(attack_bundle(spec)).id();
        buffers.current.push(entity);
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Attack>();
    app.init_resource::<AttackBuffers>();
    app.add_systems(OnEnter(GameState::InGame), reset_attack_buffers);

    app.add_systems(
        Update,
        (age_attacks, promote_pending_attacks)
            .chain()
            .in_set(GameSet::Lifecycle)
            .run_if(gameplay_running),
    );

    app.add_plugins((player::plugin, enemy::plugin));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn melee(damage: i32) -> Attack {
        Attack::from_spec(&AttackSpec::new(AttackKind::Melee, Vec2::ZERO, 8.0, 0.2, damage))
    }

    #[test]
    fn owner_follows_kind() {
        assert_eq!(AttackKind::Dash.owner(), AttackOwner::Player);
        assert_eq!(AttackKind::Explosion.owner(), AttackOwner::Player);
        assert_eq!(AttackKind::EnemyRanged.owner(), AttackOwner::Enemy);
    }

    #[test]
    fn base_kinds() {
        assert_eq!(AttackKind::Dash.base_kind(), BaseAttackKind::Melee);
        assert_eq!(
            AttackKind::RangedChargePackage.base_kind(),
            BaseAttackKind::Ranged
        );
        assert_eq!(
            AttackKind::Explosion.base_kind(),
            BaseAttackKind::Explosion
        );
    }

    #[test]
    fn hit_set_records_each_defender_once() {
        let mut attack = melee(3);
        let defender = World::new().spawn_empty().id();
        assert!(!attack.has_hit_enemy(defender));
        attack.hit_enemy(defender);
        attack.hit_enemy(defender);
        assert!(attack.has_hit_enemy(defender));
        assert_eq!(attack.hit.len(), 1);
    }

    #[test]
    fn aging_deactivates_at_zero() {
        let mut attack = melee(3);
        assert!(!attack.age_by(0.1));
        assert!(attack.active);
        assert!(attack.age_by(0.15));
        assert!(!attack.active);
        assert_eq!(attack.age, 0.0);
        // Already inert: no second expiry.
        assert!(!attack.age_by(0.1));
    }

    #[test]
    fn create_attack_allocates_distinct_groups() {
        let mut buffers = AttackBuffers::default();
        let first = buffers.create_attack(AttackSpec::new(
            AttackKind::Ranged,
            Vec2::ZERO,
            4.0,
            1.0,
            1,
        ));
        let second = buffers.create_attack(AttackSpec::new(
            AttackKind::Ranged,
            Vec2::ZERO,
            4.0,
            1.0,
            1,
        ));
        assert_ne!(first, second);
        assert_eq!(buffers.pending().len(), 2);
        assert!(buffers.current().is_empty());
    }

    #[test]
    fn create_attack_keeps_supplied_group() {
        let mut buffers = AttackBuffers::default();
        let group = buffers.create_attack(
            AttackSpec::new(AttackKind::Explosion, Vec2::ZERO, 48.0, 0.2, 5).in_group(AttackGroup(42)),
        );
        assert_eq!(group, AttackGroup(42));
        assert_eq!(buffers.pending()[0].group, Some(AttackGroup(42)));
    }

    #[test]
    fn attachment_offsets_scale_with_world() {
        assert_eq!(
            attachment_offset(SwipeDirection::Right),
            Vec2::new(SIDE_OFFSET_UNITS * WORLD_SCALE, 0.0)
        );
        assert_eq!(
            attachment_offset(SwipeDirection::Down),
            Vec2::new(0.0, -DOWN_OFFSET_UNITS * WORLD_SCALE)
        );
        assert_eq!(
            attachment_offset(SwipeDirection::Left).x,
            -attachment_offset(SwipeDirection::Right).x
        );
    }
}
