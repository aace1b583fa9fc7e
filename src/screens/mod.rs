//! Game states and the screens that move between them.

mod in_game;
mod loading;

use bevy::prelude::*;

/// Primary game states.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
#[states(scoped_entities)]
pub enum GameState {
    /// Species table is being read. Re-entered to restart the level.
    #[default]
    Loading,
    /// The level is live.
    InGame,
}

pub fn plugin(app: &mut App) {
    app.init_state::<GameState>();
    app.register_type::<GameState>();
    app.add_plugins((loading::plugin, in_game::plugin));
}
