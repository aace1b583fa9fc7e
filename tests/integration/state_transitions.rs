//! Tests for game state transitions.

use bevy::prelude::*;
use pretty_assertions::assert_eq;
use swipe_brawler::GameState;
use swipe_brawler::gameplay::combatant::PlayerModel;
use swipe_brawler::gameplay::species::{Species, SpeciesRegistry};

use crate::{boot_level, create_game_app};

fn current_state(app: &App) -> GameState {
    *app.world().resource::<State<GameState>>().get()
}

#[test]
fn game_initializes_in_loading_state() {
    let app = create_game_app();
    let state = app.world().resource::<State<GameState>>();
    assert_eq!(*state.get(), GameState::Loading);
}

#[test]
fn loading_reads_species_table() {
    let mut app = create_game_app();
    app.update();

    let registry = app.world().resource::<SpeciesRegistry>();
    assert_eq!(registry.len(), Species::ALL.len());
}

#[test]
fn loading_hands_over_to_level() {
    let mut app = create_game_app();
    boot_level(&mut app);

    let mut players = app.world_mut().query_filtered::<Entity, With<PlayerModel>>();
    assert_eq!(players.iter(app.world()).count(), 1);
}

#[test]
fn returning_to_loading_clears_level() {
    let mut app = create_game_app();
    boot_level(&mut app);

    app.world_mut()
        .resource_mut::<NextState<GameState>>()
        .set(GameState::Loading);
    app.update();

    assert_eq!(current_state(&app), GameState::Loading);
    let mut species = app.world_mut().query::<&Species>();
    assert_eq!(species.iter(app.world()).count(), 0);
}
