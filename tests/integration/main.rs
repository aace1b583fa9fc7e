//! Crate-level tests driving the public plugins without physics.
//!
//! Contacts are written straight into the `ContactBegan` stream, standing in
//! for the avian bridge.

mod combat_flow;
mod state_transitions;

use bevy::input::InputPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use swipe_brawler::GameState;

/// Headless game: states, input and every gameplay plugin.
pub fn create_game_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin, InputPlugin));
    swipe_brawler::configure_sets(&mut app);
    app.add_plugins((swipe_brawler::screens::plugin, swipe_brawler::gameplay::plugin));
    app
}

/// Runs the loading frame and the frame that enters the level.
pub fn boot_level(app: &mut App) {
    app.update();
    app.update();
    assert_eq!(
        *app.world().resource::<State<GameState>>().get(),
        GameState::InGame
    );
}
