//! Testing utilities for Bevy systems.

#![cfg(test)]

use std::time::Duration;

use bevy::ecs::query::QueryFilter;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use crate::gameplay::species::{SPECIES_TABLE, SpeciesRegistry};
use crate::screens::GameState;

/// Creates a minimal app for testing with essential plugins.
pub fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app
}

/// Minimal app with `GameState` installed, still in `Loading`.
pub fn create_base_test_app() -> App {
    let mut app = create_test_app();
    app.add_plugins(StatesPlugin);
    app.init_state::<GameState>();
    app
}

/// Moves to `InGame` and runs the frame that applies the transition.
pub fn transition_to_ingame(app: &mut App) {
    app.world_mut()
        .resource_mut::<NextState<GameState>>()
        .set(GameState::InGame);
    app.update();
}

/// Asserts how many entities match the filter `F`.
pub fn assert_entity_count<F: QueryFilter>(app: &mut App, expected: usize) {
    let mut query = app.world_mut().query_filtered::<Entity, F>();
    let actual = query.iter(app.world()).count();
    assert_eq!(
        actual, expected,
        "expected {expected} entities, found {actual}"
    );
}

/// The species table shipped with the game.
pub fn test_registry() -> SpeciesRegistry {
    SpeciesRegistry::from_ron(SPECIES_TABLE).expect("embedded species table should parse")
}

/// Every update advances time by exactly `step` (after the first, which starts the clock).
pub fn use_fixed_delta(app: &mut App, step: Duration) {
    app.insert_resource(TimeUpdateStrategy::ManualDuration(step));
}
