//! Third-party plugin isolation.

pub mod avian;

pub use avian::CollisionLayer;

pub fn plugin(app: &mut bevy::prelude::App) {
    app.add_plugins(avian::plugin);
}
