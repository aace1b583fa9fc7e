//! Loading screen: waits for the species table, then starts the level.

use bevy::prelude::*;

use super::GameState;
use crate::gameplay::species::SpeciesRegistry;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::Loading), announce_loading)
        .add_systems(
            Update,
            check_loading_complete.run_if(in_state(GameState::Loading)),
        );
}

fn announce_loading() {
    info!("Loading level");
}

fn check_loading_complete(
    registry: Option<Res<SpeciesRegistry>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if registry.is_some() {
        next_state.set(GameState::InGame);
    }
}
