//! Mirror enemies and the shot patterns they turn incoming projectiles into.

use bevy::prelude::*;

use crate::gameplay::attack::{Attack, AttackKind, AttackSpec};

// === Constants ===

/// Square mirrors scale radius and speed of the shot they return.
pub const SQUARE_GAIN: f32 = 1.5;

/// Triangle fan: base rotation when reflecting, spacing, and speed factor.
pub const TRIANGLE_REFLECT_DEGREES: f32 = 120.0;
pub const TRIANGLE_SPREAD_DEGREES: f32 = 30.0;
pub const TRIANGLE_REFLECT_SPEED: f32 = 0.66;

/// Circle burst: shot count, spacing, and speed factor when reflecting.
pub const CIRCLE_SHOTS: u16 = 8;
pub const CIRCLE_STEP_DEGREES: f32 = 45.0;
pub const CIRCLE_REFLECT_SPEED: f32 = 0.5;

// === Types ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum MirrorShape {
    /// One amplified shot.
    Square,
    /// Three shots fanned 30 degrees apart.
    Triangle,
    /// Eight shots around the full circle.
    Circle,
}

/// Whether a shot is bounced back at the shooter or carried onward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorMode {
    /// Player shot hitting the mirror face: turned around.
    Reflect,
    /// Reflected shot reaching another mirror: split along its path.
    Forward,
}

/// A mirror enemy. Its link is a non-owning handle checked every tick.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Mirror {
    pub shape: MirrorShape,
    pub linked: Option<Entity>,
    /// Set whenever the mirror transforms a shot; cleared by presentation.
    pub attack_animation: bool,
}

impl Mirror {
    #[must_use]
    pub const fn new(shape: MirrorShape) -> Self {
        Self {
            shape,
            linked: None,
            attack_animation: false,
        }
    }

    #[must_use]
    pub const fn linked_to(shape: MirrorShape, target: Entity) -> Self {
        Self {
            shape,
            linked: Some(target),
            attack_animation: false,
        }
    }
}

// === Pure Functions ===

fn rotate_degrees(vector: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(vector)
}

/// Outgoing velocities for one incoming shot.
#[must_use]
pub fn burst_velocities(shape: MirrorShape, mode: MirrorMode, incoming: Vec2) -> Vec<Vec2> {
    let base = match mode {
        MirrorMode::Reflect => 180.0,
        MirrorMode::Forward => 0.0,
    };
    match shape {
        MirrorShape::Square => vec![rotate_degrees(incoming, base) * SQUARE_GAIN],
        MirrorShape::Triangle => {
            let (center, speed) = match mode {
                MirrorMode::Reflect => (TRIANGLE_REFLECT_DEGREES, TRIANGLE_REFLECT_SPEED),
                MirrorMode::Forward => (0.0, 1.0),
            };
            [-1.0, 0.0, 1.0]
                .into_iter()
                .map(|step: f32| {
                    rotate_degrees(incoming, step.mul_add(TRIANGLE_SPREAD_DEGREES, center)) * speed
                })
                .collect()
        }
        MirrorShape::Circle => {
            let speed = match mode {
                MirrorMode::Reflect => CIRCLE_REFLECT_SPEED,
                MirrorMode::Forward => 1.0,
            };
            (0..CIRCLE_SHOTS)
                .map(|i| {
                    let angle = f32::from(i).mul_add(CIRCLE_STEP_DEGREES, base);
                    rotate_degrees(incoming, angle) * speed
                })
                .collect()
        }
    }
}

#[must_use]
pub const fn radius_gain(shape: MirrorShape) -> f32 {
    match shape {
        MirrorShape::Square => SQUARE_GAIN,
        MirrorShape::Triangle | MirrorShape::Circle => 1.0,
    }
}

/// New enemy shots a mirror emits for `attack` arriving at `origin` with `incoming` velocity.
///
/// Every shot keeps the source shot's damage, remaining age, lifetime and group.
/// Each shot inherits the source's hit set plus the mirror itself, so a
/// chain never splits twice on the same mirror.
#[must_use]
pub fn mirror_burst(
    shape: MirrorShape,
    mode: MirrorMode,
    attack: &Attack,
    origin: Vec2,
    incoming: Vec2,
    mirror: Entity,
) -> Vec<AttackSpec> {
    burst_velocities(shape, mode, incoming)
        .into_iter()
        .map(|velocity| {
            AttackSpec::new(
                AttackKind::EnemyRanged,
                origin,
                attack.radius * radius_gain(shape),
                attack.lifetime,
                attack.damage,
            )
            .with_age(attack.age)
            .with_velocity(velocity)
            .in_group(attack.group)
            .splitable()
            .already_hit_all(attack.hits())
            .already_hit(mirror)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::attack::AttackGroup;
    use pretty_assertions::assert_eq;

    const EPSILON: f32 = 1e-3;

    fn assert_close(actual: Vec2, expected: Vec2) {
        assert!(
            actual.abs_diff_eq(expected, EPSILON),
            "{actual} != {expected}"
        );
    }

    fn angle_between(a: Vec2, b: Vec2) -> f32 {
        a.angle_to(b).to_degrees().abs()
    }

    #[test]
    fn square_reflect_turns_around_and_amplifies() {
        let out = burst_velocities(MirrorShape::Square, MirrorMode::Reflect, Vec2::new(100.0, 0.0));
        assert_eq!(out.len(), 1);
        assert_close(out[0], Vec2::new(-150.0, 0.0));
    }

    #[test]
    fn square_forward_keeps_heading() {
        let out = burst_velocities(MirrorShape::Square, MirrorMode::Forward, Vec2::new(0.0, 40.0));
        assert_close(out[0], Vec2::new(0.0, 60.0));
    }

    #[test]
    fn triangle_reflect_fans_three_at_reduced_speed() {
        let incoming = Vec2::new(100.0, 0.0);
        let out = burst_velocities(MirrorShape::Triangle, MirrorMode::Reflect, incoming);
        assert_eq!(out.len(), 3);
        for velocity in &out {
            assert!((velocity.length() - 66.0).abs() < EPSILON);
        }
        assert!((angle_between(out[0], out[1]) - 30.0).abs() < EPSILON);
        assert!((angle_between(out[1], out[2]) - 30.0).abs() < EPSILON);
        assert!((angle_between(incoming, out[1]) - 120.0).abs() < EPSILON);
    }

    #[test]
    fn triangle_forward_fans_around_heading_at_full_speed() {
        let incoming = Vec2::new(0.0, -80.0);
        let out = burst_velocities(MirrorShape::Triangle, MirrorMode::Forward, incoming);
        assert_eq!(out.len(), 3);
        for velocity in &out {
            assert!((velocity.length() - 80.0).abs() < EPSILON);
        }
        assert_close(out[1], incoming);
        assert!((angle_between(out[0], out[2]) - 60.0).abs() < EPSILON);
    }

    #[test]
    fn circle_reflect_bursts_eight_at_half_speed() {
        let incoming = Vec2::new(60.0, 0.0);
        let out = burst_velocities(MirrorShape::Circle, MirrorMode::Reflect, incoming);
        assert_eq!(out.len(), 8);
        for pair in out.windows(2) {
            assert!((pair[0].length() - 30.0).abs() < EPSILON);
            assert!((angle_between(pair[0], pair[1]) - 45.0).abs() < EPSILON);
        }
        assert_close(out[0], Vec2::new(-30.0, 0.0));
    }

    #[test]
    fn circle_forward_starts_on_heading() {
        let incoming = Vec2::new(60.0, 0.0);
        let out = burst_velocities(MirrorShape::Circle, MirrorMode::Forward, incoming);
        assert_eq!(out.len(), 8);
        assert_close(out[0], incoming);
    }

    #[test]
    fn burst_preserves_damage_age_and_group() {
        let mut source = Attack::from_spec(
            &AttackSpec::new(AttackKind::Ranged, Vec2::ZERO, 6.0, 1.2, 4).in_group(AttackGroup(9)),
        );
        source.age = 0.7;
        let mirror = World::new().spawn_empty().id();

        let shots = mirror_burst(
            MirrorShape::Triangle,
            MirrorMode::Reflect,
            &source,
            Vec2::new(5.0, 5.0),
            Vec2::new(100.0, 0.0),
            mirror,
        );
        assert_eq!(shots.len(), 3);
        for shot in &shots {
            assert_eq!(shot.kind, AttackKind::EnemyRanged);
            assert_eq!(shot.damage, 4);
            assert_eq!(shot.age, 0.7);
            assert_eq!(shot.lifetime, 1.2);
            assert_eq!(shot.group, Some(AttackGroup(9)));
            assert_eq!(shot.radius, 6.0);
            assert!(shot.splitable);
            assert_eq!(shot.already_hit, vec![mirror]);
        }
    }

    #[test]
    fn burst_inherits_source_hit_set() {
        let [earlier, mirror] = {
            let mut world = World::new();
            [world.spawn_empty().id(), world.spawn_empty().id()]
        };
        let source = Attack::from_spec(
            &AttackSpec::new(AttackKind::EnemyRanged, Vec2::ZERO, 6.0, 1.0, 2).already_hit(earlier),
        );

        let shots = mirror_burst(
            MirrorShape::Square,
            MirrorMode::Forward,
            &source,
            Vec2::ZERO,
            Vec2::X,
            mirror,
        );
        assert_eq!(shots[0].already_hit, vec![earlier, mirror]);
    }

    #[test]
    fn square_burst_grows_radius() {
        let source = Attack::from_spec(&AttackSpec::new(AttackKind::Ranged, Vec2::ZERO, 6.0, 1.0, 2));
        let mirror = World::new().spawn_empty().id();
        let shots = mirror_burst(
            MirrorShape::Square,
            MirrorMode::Reflect,
            &source,
            Vec2::ZERO,
            Vec2::X,
            mirror,
        );
        assert_eq!(shots[0].radius, 9.0);
    }
}
