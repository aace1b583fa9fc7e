//! Development tools, only included with `cargo run --features dev`.
//!
//! World inspector, physics debug overlay, and digit-key spawners.
//! This module is stripped from release builds.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy_inspector_egui::bevy_egui::EguiPlugin;
use bevy_inspector_egui::quick::WorldInspectorPlugin;

use crate::gameplay::collision::MirrorShape;
use crate::gameplay::combatant::PlayerModel;
use crate::gameplay::level::{spawn_enemy, spawn_mirror};
use crate::gameplay::species::{Species, SpeciesRegistry};
use crate::{GameSet, gameplay_running};

/// Debug spawns appear this far (pixels) in front of the player.
const DEBUG_SPAWN_OFFSET: Vec2 = Vec2::new(160.0, 48.0);

const DEBUG_ENEMY_KEYS: [(KeyCode, Species); 5] = [
    (KeyCode::Digit1, Species::Grunt),
    (KeyCode::Digit2, Species::Brute),
    (KeyCode::Digit3, Species::Archer),
    (KeyCode::Digit4, Species::Bat),
    (KeyCode::Digit5, Species::Wisp),
];

const DEBUG_MIRROR_KEYS: [(KeyCode, MirrorShape); 3] = [
    (KeyCode::Digit7, MirrorShape::Square),
    (KeyCode::Digit8, MirrorShape::Triangle),
    (KeyCode::Digit9, MirrorShape::Circle),
];

fn debug_spawn_combatants(
    keyboard: Res<ButtonInput<KeyCode>>,
    registry: Res<SpeciesRegistry>,
    player: Query<&Transform, With<PlayerModel>>,
    mut commands: Commands,
) {
    let origin = player
        .single()
        .map_or(Vec2::ZERO, |transform| transform.translation.truncate());
    let position = origin + DEBUG_SPAWN_OFFSET;

    for (key, species) in DEBUG_ENEMY_KEYS {
        if keyboard.just_pressed(key) {
            spawn_enemy(&mut commands, &registry, species, position, None);
        }
    }
    for (key, shape) in DEBUG_MIRROR_KEYS {
        if keyboard.just_pressed(key) {
            spawn_mirror(&mut commands, &registry, shape, position, None);
        }
    }
}

pub(super) fn plugin(app: &mut App) {
    if !app.is_plugin_added::<EguiPlugin>() {
        app.add_plugins(EguiPlugin::default());
    }
    app.add_plugins((WorldInspectorPlugin::new(), PhysicsDebugPlugin::default()));

    app.add_systems(
        Update,
        debug_spawn_combatants
            .in_set(GameSet::Input)
            .run_if(gameplay_running),
    );
}
