//! Enemy spawners: timer-driven waves capped by a live count.

use bevy::prelude::*;
use rand::Rng;

use crate::gameplay::collision::{RespawnRequested, SpawnerKilled};
use crate::gameplay::combatant::{Combatant, SpawnedBy};
use crate::gameplay::level::spawn_enemy;
use crate::gameplay::species::{Species, SpeciesRegistry};
use crate::{GameSet, gameplay_running};

// === Constants ===

/// Seconds between spawn attempts.
pub const SPAWN_INTERVAL_SECS: f32 = 4.0;

/// Enemies a spawner keeps alive at once unless configured otherwise.
pub const DEFAULT_MAX_ALIVE: u32 = 3;

/// Horizontal spread (pixels) applied to each spawn position.
pub const SPAWN_JITTER: f32 = 24.0;

// === Components ===

/// Produces `species` on a repeating timer until `max_alive` are out.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Spawner {
    pub index: u32,
    pub species: Species,
    pub timer: Timer,
    pub max_alive: u32,
    pub alive: u32,
}

impl Spawner {
    #[must_use]
    pub fn new(index: u32, species: Species) -> Self {
        Self {
            index,
            species,
            timer: Timer::from_seconds(SPAWN_INTERVAL_SECS, TimerMode::Repeating),
            max_alive: DEFAULT_MAX_ALIVE,
            alive: 0,
        }
    }

    #[must_use]
    pub fn with_max_alive(mut self, max_alive: u32) -> Self {
        self.max_alive = max_alive;
        self
    }

    #[must_use]
    pub const fn has_room(&self) -> bool {
        self.alive < self.max_alive
    }
}

// === Pure Functions ===

/// Spawn point for a new enemy, shifted sideways by `jitter`.
#[must_use]
pub fn spawn_position(spawner: Vec2, jitter: f32) -> Vec2 {
    spawner + Vec2::new(jitter.clamp(-SPAWN_JITTER, SPAWN_JITTER), 0.0)
}

// === Systems ===

/// Frees a slot on the spawner that produced a dead enemy.
fn apply_respawn_requests(
    mut requests: MessageReader<RespawnRequested>,
    mut spawners: Query<&mut Spawner>,
) {
    for request in requests.read() {
        let Some(mut spawner) = spawners
            .iter_mut()
            .find(|spawner| spawner.index == request.spawner_index)
        else {
            continue;
        };
        spawner.alive = spawner.alive.saturating_sub(1);
        debug!(
            "Spawner {} lost a {} ({} alive)",
            spawner.index,
            request.species.display_name(),
            spawner.alive
        );
    }
}

fn log_killed_spawners(mut killed: MessageReader<SpawnerKilled>) {
    for message in killed.read() {
        info!("Spawner {} destroyed", message.spawner_index);
    }
}

/// Ticks every live spawner and spawns when its timer fires and it has room.
fn tick_spawners(
    time: Res<Time>,
    registry: Res<SpeciesRegistry>,
    mut spawners: Query<(Entity, &mut Spawner, &Combatant, &Transform)>,
    mut commands: Commands,
) {
    let mut rng = rand::rng();
    for (entity, mut spawner, combatant, transform) in &mut spawners {
        if combatant.removed {
            continue;
        }
        spawner.timer.tick(time.delta());
        if !spawner.timer.just_finished() || !spawner.has_room() {
            continue;
        }

        let jitter = rng.random_range(-SPAWN_JITTER..=SPAWN_JITTER);
        let position = spawn_position(transform.translation.truncate(), jitter);
        let link = SpawnedBy {
            spawner: entity,
            index: spawner.index,
        };
        if spawn_enemy(&mut commands, &registry, spawner.species, position, Some(link)).is_some() {
            spawner.alive += 1;
            debug!(
                "Spawner {} produced a {} ({} alive)",
                spawner.index,
                spawner.species.display_name(),
                spawner.alive
            );
        }
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Spawner>();

    app.add_systems(
        Update,
        (apply_respawn_requests, log_killed_spawners, tick_spawners)
            .chain()
            .in_set(GameSet::Lifecycle)
            .run_if(gameplay_running),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_spawner_starts_empty() {
        let spawner = Spawner::new(2, Species::Bat);
        assert_eq!(spawner.alive, 0);
        assert_eq!(spawner.max_alive, DEFAULT_MAX_ALIVE);
        assert_eq!(spawner.timer.duration().as_secs_f32(), SPAWN_INTERVAL_SECS);
        assert!(spawner.has_room());
    }

    #[test]
    fn full_spawner_has_no_room() {
        let mut spawner = Spawner::new(0, Species::Grunt).with_max_alive(1);
        spawner.alive = 1;
        assert!(!spawner.has_room());
    }

    #[test]
    fn spawn_position_is_clamped_sideways() {
        let origin = Vec2::new(100.0, -50.0);
        assert_eq!(spawn_position(origin, 10.0), Vec2::new(110.0, -50.0));
        assert_eq!(
            spawn_position(origin, -500.0),
            Vec2::new(100.0 - SPAWN_JITTER, -50.0)
        );
    }
}
