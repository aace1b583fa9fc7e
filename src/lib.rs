//! Swipe Brawler: a side-view action platformer driven by two-thumb swipe combat.
//!
//! The library exposes the combat core (gesture classification, enemy behavior,
//! attack lifecycle and contact resolution) as Bevy plugins. `main.rs` adds the
//! window and camera on top.

#[cfg(feature = "dev")]
mod dev_tools;
pub mod gameplay;
pub mod screens;
#[cfg(test)]
pub mod testing;
pub mod third_party;

use bevy::prelude::*;

pub use screens::GameState;

// === Z layers ===

/// Terrain, walls and hazards.
pub const Z_TERRAIN: f32 = 0.0;
/// Player, enemies, mirrors and spawners.
pub const Z_COMBATANT: f32 = 10.0;
/// Attack hitboxes draw above everything they can hit.
pub const Z_ATTACK: f32 = 20.0;

// === System ordering ===

/// One combat tick, in order. Configured as a chain on `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameSet {
    /// Pointer and key input become swipe intents.
    Input,
    /// Enemy behavior selection and mirror steering.
    Ai,
    /// Swipe intents and AI triggers become pending attacks.
    Attack,
    /// Physics contacts are translated and resolved.
    Collision,
    /// Attacks age and follow the player; pending attacks enter the world.
    Lifecycle,
    /// Removed combatants and spent attacks leave the world.
    Death,
}

/// Run condition: the level is live and virtual time is not paused.
pub fn gameplay_running(state: Option<Res<State<GameState>>>, time: Res<Time<Virtual>>) -> bool {
    state.is_some_and(|state| *state.get() == GameState::InGame) && !time.is_paused()
}

/// Configures the combat tick ordering on `Update`.
pub fn configure_sets(app: &mut App) {
    app.configure_sets(
        Update,
        (
            GameSet::Input,
            GameSet::Ai,
            GameSet::Attack,
            GameSet::Collision,
            GameSet::Lifecycle,
            GameSet::Death,
        )
            .chain(),
    );
}

/// Full game plugin: physics, states and gameplay.
pub fn plugin(app: &mut App) {
    configure_sets(app);
    app.add_plugins((third_party::plugin, screens::plugin, gameplay::plugin));

    #[cfg(feature = "dev")]
    app.add_plugins(dev_tools::plugin);
}
