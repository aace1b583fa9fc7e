//! Gameplay domain plugins: gestures, species, combatants, AI, attacks,
//! contact resolution, spawners and the level that ties them together.

pub mod ai;
pub mod attack;
pub mod collision;
pub mod combatant;
pub mod gesture;
pub mod level;
pub mod spawn;
pub mod species;

use bevy::prelude::*;

/// Pixels per world unit. Offsets and radii in the combat core are written
/// in units and scaled by this.
pub const WORLD_SCALE: f32 = 16.0;

pub fn plugin(app: &mut App) {
    app.add_plugins((
        species::plugin,
        combatant::plugin,
        gesture::plugin,
        ai::plugin,
        attack::plugin,
        collision::plugin,
        spawn::plugin,
        level::plugin,
    ));
}
