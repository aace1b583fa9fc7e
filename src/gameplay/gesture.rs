//! Swipe gesture classification for the two thumb zones.
//!
//! Each screen half owns a [`GestureTracker`]. A press starts a gesture,
//! holding past [`CHARGE_THRESHOLD_SECS`] charges it, and the release point
//! picks one of four directions. The classified [`SwipeAttack`] is published
//! in [`SwipeIntents`] for exactly one tick.

use std::collections::HashMap;

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::screens::GameState;
use crate::{GameSet, gameplay_running};

// === Constants ===

/// Swipes shorter than this on both axes are taps, not attacks.
pub const SWIPE_DEAD_ZONE: f32 = 20.0;

/// Seconds a press must be held before the swipe counts as charged.
pub const CHARGE_THRESHOLD_SECS: f32 = 0.5;

/// Swipe angles snap to multiples of this before bucketing.
pub const ANGLE_STEP_DEGREES: f32 = 22.5;

/// Key bindings that stand in for a swipe when no pointer is available.
const LEFT_SIDE_KEYS: [(KeyCode, SwipeDirection); 4] = [
    (KeyCode::KeyW, SwipeDirection::Up),
    (KeyCode::KeyS, SwipeDirection::Down),
    (KeyCode::KeyA, SwipeDirection::Left),
    (KeyCode::KeyD, SwipeDirection::Right),
];

const RIGHT_SIDE_KEYS: [(KeyCode, SwipeDirection); 4] = [
    (KeyCode::ArrowUp, SwipeDirection::Up),
    (KeyCode::ArrowDown, SwipeDirection::Down),
    (KeyCode::ArrowLeft, SwipeDirection::Left),
    (KeyCode::ArrowRight, SwipeDirection::Right),
];

// === Types ===

/// Screen half a gesture started on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum InputSide {
    Left,
    Right,
}

impl InputSide {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum SwipeDirection {
    Up,
    Down,
    Left,
    Right,
}

impl SwipeDirection {
    /// Unit vector in world space (y up).
    #[must_use]
    pub const fn unit(self) -> Vec2 {
        match self {
            Self::Up => Vec2::Y,
            Self::Down => Vec2::NEG_Y,
            Self::Left => Vec2::NEG_X,
            Self::Right => Vec2::X,
        }
    }
}

/// Classified swipe: four directions, each plain or charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum SwipeAttack {
    #[default]
    NoAttack,
    Up,
    Down,
    Left,
    Right,
    ChargedUp,
    ChargedDown,
    ChargedLeft,
    ChargedRight,
}

impl SwipeAttack {
    #[must_use]
    pub const fn from_parts(direction: Option<SwipeDirection>, charged: bool) -> Self {
        match (direction, charged) {
            (None, _) => Self::NoAttack,
            (Some(SwipeDirection::Up), false) => Self::Up,
            (Some(SwipeDirection::Down), false) => Self::Down,
            (Some(SwipeDirection::Left), false) => Self::Left,
            (Some(SwipeDirection::Right), false) => Self::Right,
            (Some(SwipeDirection::Up), true) => Self::ChargedUp,
            (Some(SwipeDirection::Down), true) => Self::ChargedDown,
            (Some(SwipeDirection::Left), true) => Self::ChargedLeft,
            (Some(SwipeDirection::Right), true) => Self::ChargedRight,
        }
    }

    #[must_use]
    pub const fn direction(self) -> Option<SwipeDirection> {
        match self {
            Self::NoAttack => None,
            Self::Up | Self::ChargedUp => Some(SwipeDirection::Up),
            Self::Down | Self::ChargedDown => Some(SwipeDirection::Down),
            Self::Left | Self::ChargedLeft => Some(SwipeDirection::Left),
            Self::Right | Self::ChargedRight => Some(SwipeDirection::Right),
        }
    }

    #[must_use]
    pub const fn is_charged(self) -> bool {
        matches!(
            self,
            Self::ChargedUp | Self::ChargedDown | Self::ChargedLeft | Self::ChargedRight
        )
    }
}

// === Pure Functions ===

/// Direction of a swipe from `start` to `end` (y up), or `None` inside the dead zone.
///
/// The angle is snapped to [`ANGLE_STEP_DEGREES`] first, then bucketed:
/// right covers (315, 45], up (45, 135], left (135, 225], down the rest.
#[must_use]
pub fn swipe_direction(start: Vec2, end: Vec2) -> Option<SwipeDirection> {
    let delta = end - start;
    if delta.x.abs() <= SWIPE_DEAD_ZONE && delta.y.abs() <= SWIPE_DEAD_ZONE {
        return None;
    }

    let angle = delta.y.atan2(delta.x).to_degrees().rem_euclid(360.0);
    let snapped = ((angle / ANGLE_STEP_DEGREES).round() * ANGLE_STEP_DEGREES).rem_euclid(360.0);

    Some(if snapped > 315.0 || snapped <= 45.0 {
        SwipeDirection::Right
    } else if snapped <= 135.0 {
        SwipeDirection::Up
    } else if snapped <= 225.0 {
        SwipeDirection::Left
    } else {
        SwipeDirection::Down
    })
}

/// Classifies a completed swipe.
#[must_use]
pub fn classify(start: Vec2, end: Vec2, charged: bool) -> SwipeAttack {
    SwipeAttack::from_parts(swipe_direction(start, end), charged)
}

/// Drops a charged-up swipe on the melee side while the player is airborne.
#[must_use]
pub fn gate_airborne(
    attack: SwipeAttack,
    side: InputSide,
    bindings: &InputBindings,
    grounded: bool,
) -> SwipeAttack {
    if side == bindings.melee_side && attack == SwipeAttack::ChargedUp && !grounded {
        SwipeAttack::NoAttack
    } else {
        attack
    }
}

// === Tracker ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum GesturePhase {
    #[default]
    Idle,
    Pressing,
    Charged,
    /// A result is waiting to be taken.
    Released,
}

/// State machine for one screen half.
#[derive(Debug, Clone, Default, Reflect)]
pub struct GestureTracker {
    phase: GesturePhase,
    start: Vec2,
    held_secs: f32,
    result: SwipeAttack,
}

impl GestureTracker {
    #[must_use]
    pub const fn phase(&self) -> GesturePhase {
        self.phase
    }

    #[must_use]
    pub const fn is_held(&self) -> bool {
        matches!(self.phase, GesturePhase::Pressing | GesturePhase::Charged)
    }

    /// Starts a gesture at `at`, discarding any untaken result.
    pub const fn press(&mut self, at: Vec2) {
        self.phase = GesturePhase::Pressing;
        self.start = at;
        self.held_secs = 0.0;
        self.result = SwipeAttack::NoAttack;
    }

    /// Accumulates hold time. Once charged, stays charged until release.
    pub fn hold(&mut self, dt: f32) {
        if !self.is_held() {
            return;
        }
        self.held_secs += dt;
        if self.held_secs >= CHARGE_THRESHOLD_SECS {
            self.phase = GesturePhase::Charged;
        }
    }

    /// Ends the gesture at `at` and classifies it.
    pub fn release(&mut self, at: Vec2) {
        if !self.is_held() {
            return;
        }
        self.result = classify(self.start, at, self.phase == GesturePhase::Charged);
        self.phase = GesturePhase::Released;
    }

    /// Ends the gesture with an explicit direction (key fallback).
    pub const fn release_toward(&mut self, direction: SwipeDirection) {
        if !self.is_held() {
            return;
        }
        self.result =
            SwipeAttack::from_parts(Some(direction), matches!(self.phase, GesturePhase::Charged));
        self.phase = GesturePhase::Released;
    }

    /// Hands out a released result once and returns to idle.
    pub fn take(&mut self) -> SwipeAttack {
        if self.phase != GesturePhase::Released {
            return SwipeAttack::NoAttack;
        }
        self.phase = GesturePhase::Idle;
        std::mem::take(&mut self.result)
    }
}

// === Resources ===

/// Which screen half swings the melee weapon. The other half shoots.
#[derive(Resource, Debug, Clone, Reflect)]
#[reflect(Resource)]
pub struct InputBindings {
    pub melee_side: InputSide,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self {
            melee_side: InputSide::Left,
        }
    }
}

impl InputBindings {
    #[must_use]
    pub const fn ranged_side(&self) -> InputSide {
        self.melee_side.opposite()
    }
}

/// Live gesture trackers plus the pointers currently driving them.
#[derive(Resource, Debug, Default)]
pub struct GestureState {
    pub left: GestureTracker,
    pub right: GestureTracker,
    touch_sides: HashMap<u64, InputSide>,
    mouse_side: Option<InputSide>,
}

impl GestureState {
    pub const fn tracker_mut(&mut self, side: InputSide) -> &mut GestureTracker {
        match side {
            InputSide::Left => &mut self.left,
            InputSide::Right => &mut self.right,
        }
    }
}

/// Swipe results for the current tick. Reset every tick.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SwipeIntents {
    pub left: SwipeAttack,
    pub right: SwipeAttack,
}

impl SwipeIntents {
    #[must_use]
    pub const fn get(&self, side: InputSide) -> SwipeAttack {
        match side {
            InputSide::Left => self.left,
            InputSide::Right => self.right,
        }
    }
}

// === Systems ===

/// Converts window coordinates (y down) to gesture space (y up).
fn to_gesture_space(position: Vec2) -> Vec2 {
    Vec2::new(position.x, -position.y)
}

fn side_of(x: f32, window_width: f32) -> InputSide {
    if x < window_width / 2.0 {
        InputSide::Left
    } else {
        InputSide::Right
    }
}

/// Drops presses held across a level restart.
fn reset_gestures(mut commands: Commands) {
    commands.insert_resource(GestureState::default());
    commands.insert_resource(SwipeIntents::default());
}

fn advance_gesture_holds(time: Res<Time>, mut gestures: ResMut<GestureState>) {
    let dt = time.delta_secs();
    gestures.left.hold(dt);
    gestures.right.hold(dt);
}

/// Feeds mouse and touch presses into the trackers for the half they started on.
fn track_pointer_gestures(
    windows: Query<&Window, With<PrimaryWindow>>,
    mouse: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    mut gestures: ResMut<GestureState>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let width = window.width();

    if mouse.just_pressed(MouseButton::Left) {
        if let Some(cursor) = window.cursor_position() {
            let side = side_of(cursor.x, width);
            gestures.mouse_side = Some(side);
            gestures.tracker_mut(side).press(to_gesture_space(cursor));
        }
    }
    if mouse.just_released(MouseButton::Left) {
        if let Some(side) = gestures.mouse_side.take() {
            let tracker = gestures.tracker_mut(side);
            match window.cursor_position() {
                Some(cursor) => tracker.release(to_gesture_space(cursor)),
                // Cursor left the window mid-swipe; treat it as a tap.
                None => tracker.release(tracker.start),
            }
        }
    }

    for touch in touches.iter_just_pressed() {
        let side = side_of(touch.start_position().x, width);
        gestures.touch_sides.insert(touch.id(), side);
        gestures
            .tracker_mut(side)
            .press(to_gesture_space(touch.start_position()));
    }
    for touch in touches.iter_just_released() {
        if let Some(side) = gestures.touch_sides.remove(&touch.id()) {
            gestures
                .tracker_mut(side)
                .release(to_gesture_space(touch.position()));
        }
    }
}

/// WASD swipes on the left half, arrow keys on the right.
fn track_key_gestures(keys: Res<ButtonInput<KeyCode>>, mut gestures: ResMut<GestureState>) {
    for (side, bindings) in [
        (InputSide::Left, LEFT_SIDE_KEYS),
        (InputSide::Right, RIGHT_SIDE_KEYS),
    ] {
        for (key, direction) in bindings {
            let tracker = gestures.tracker_mut(side);
            if keys.just_pressed(key) {
                tracker.press(Vec2::ZERO);
            }
            if keys.just_released(key) {
                tracker.release_toward(direction);
            }
        }
    }
}

fn publish_swipe_intents(mut gestures: ResMut<GestureState>, mut intents: ResMut<SwipeIntents>) {
    *intents = SwipeIntents {
        left: gestures.left.take(),
        right: gestures.right.take(),
    };
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<InputBindings>();
    app.init_resource::<InputBindings>()
        .init_resource::<GestureState>()
        .init_resource::<SwipeIntents>();
    app.add_systems(OnEnter(GameState::InGame), reset_gestures);

    app.add_systems(
        Update,
        (
            advance_gesture_holds,
            track_pointer_gestures,
            track_key_gestures,
            publish_swipe_intents,
        )
            .chain()
            .in_set(GameSet::Input)
            .run_if(gameplay_running),
    );
}
