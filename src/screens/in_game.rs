//! In-game screen: Escape pauses and resumes virtual time.
//!
//! Avian steps in the fixed schedule, which accumulates from `Time<Virtual>`,
//! so pausing it halts physics as well as every gameplay system.

use bevy::prelude::*;

use super::GameState;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        toggle_pause.run_if(in_state(GameState::InGame)),
    );
    app.add_systems(OnExit(GameState::InGame), unpause_virtual_time);
}

fn toggle_pause(keyboard: Res<ButtonInput<KeyCode>>, mut time: ResMut<Time<Virtual>>) {
    if !keyboard.just_pressed(KeyCode::Escape) {
        return;
    }
    if time.is_paused() {
        time.unpause();
        info!("Resumed");
    } else {
        time.pause();
        info!("Paused");
    }
}

/// Leaving the level never strands the next one in pause.
fn unpause_virtual_time(mut time: ResMut<Time<Virtual>>) {
    time.unpause();
}
