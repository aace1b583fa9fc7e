//! Static per-species combat attributes, loaded once from a RON table.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::Deserialize;
use thiserror::Error;

use crate::gameplay::attack::AttackKind;
use crate::screens::GameState;

// === Constants ===

/// Species table compiled into the binary.
pub const SPECIES_TABLE: &str = include_str!("../../assets/data/species.ron");

/// Lifetime used when a table entry does not set one.
pub const DEFAULT_ATTACK_LIFETIME: f32 = 0.25;

// === Types ===

/// Which kind of combatant an entity is. Keys the [`SpeciesRegistry`].
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Deserialize)]
#[reflect(Component)]
pub enum Species {
    Player,
    Grunt,
    Brute,
    Archer,
    Bat,
    Wisp,
    Mirror,
    Spawner,
}

impl Species {
    pub const ALL: [Self; 8] = [
        Self::Player,
        Self::Grunt,
        Self::Brute,
        Self::Archer,
        Self::Bat,
        Self::Wisp,
        Self::Mirror,
        Self::Spawner,
    ];

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Player => "Player",
            Self::Grunt => "Grunt",
            Self::Brute => "Brute",
            Self::Archer => "Archer",
            Self::Bat => "Bat",
            Self::Wisp => "Wisp",
            Self::Mirror => "Mirror",
            Self::Spawner => "Spawner",
        }
    }
}

/// How a species moves and attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Deserialize)]
pub enum CombatStyle {
    GroundMelee,
    GroundRanged,
    FlyingMelee,
    FlyingRanged,
    /// Never moves on its own and never attacks.
    Stationary,
}

impl CombatStyle {
    #[must_use]
    pub const fn is_flying(self) -> bool {
        matches!(self, Self::FlyingMelee | Self::FlyingRanged)
    }

    #[must_use]
    pub const fn is_ranged(self) -> bool {
        matches!(self, Self::GroundRanged | Self::FlyingRanged)
    }

    /// Attack kind produced when a combatant of this style attacks.
    #[must_use]
    pub const fn attack_kind(self) -> Option<AttackKind> {
        match self {
            Self::GroundMelee | Self::FlyingMelee => Some(AttackKind::EnemyMelee),
            Self::GroundRanged | Self::FlyingRanged => Some(AttackKind::EnemyRanged),
            Self::Stationary => None,
        }
    }
}

/// Immutable combat attributes for one species. Distances in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SpeciesProps {
    pub max_health: i32,
    pub horizontal_speed: f32,
    pub vertical_speed: f32,
    pub attack_cooldown: f32,
    pub attack_radius: f32,
    pub damage: i32,
    pub style: CombatStyle,
    #[serde(default)]
    pub projectile_speed: f32,
    #[serde(default = "default_attack_lifetime")]
    pub attack_lifetime: f32,
    pub body_radius: f32,
}

const fn default_attack_lifetime() -> f32 {
    DEFAULT_ATTACK_LIFETIME
}

impl SpeciesProps {
    /// Half-extents of the box the player must be inside to be attacked.
    ///
    /// Ground melee species only swing at targets roughly level with them,
    /// so their box is half the radius wide and a quarter tall.
    #[must_use]
    pub fn attack_range(&self) -> Vec2 {
        match self.style {
            CombatStyle::GroundMelee => {
                Vec2::new(self.attack_radius / 2.0, self.attack_radius / 4.0)
            }
            _ => Vec2::splat(self.attack_radius),
        }
    }

    fn validate(&self, species: Species) -> Result<(), RegistryError> {
        let invalid = |field: &'static str, value: f32| RegistryError::InvalidValue {
            species,
            field,
            value,
        };
        if self.max_health <= 0 {
            #[allow(clippy::cast_precision_loss)]
            return Err(invalid("max_health", self.max_health as f32));
        }
        if self.damage < 0 {
            #[allow(clippy::cast_precision_loss)]
            return Err(invalid("damage", self.damage as f32));
        }
        let non_negative = [
            ("horizontal_speed", self.horizontal_speed),
            ("vertical_speed", self.vertical_speed),
            ("attack_cooldown", self.attack_cooldown),
            ("attack_radius", self.attack_radius),
            ("projectile_speed", self.projectile_speed),
            ("attack_lifetime", self.attack_lifetime),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, value));
            }
        }
        if !self.body_radius.is_finite() || self.body_radius <= 0.0 {
            return Err(invalid("body_radius", self.body_radius));
        }
        Ok(())
    }
}

/// Errors raised while building the species registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to parse species table: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("species {0:?} is listed more than once")]
    Duplicate(Species),
    #[error("species {species:?} has invalid {field}: {value}")]
    InvalidValue {
        species: Species,
        field: &'static str,
        value: f32,
    },
}

#[derive(Debug, Deserialize)]
struct SpeciesEntry {
    species: Species,
    props: SpeciesProps,
}

// === Resources ===

/// Lookup from species to its static attributes.
///
/// Populated when loading first begins and read-only afterwards. A species with no
/// entry is treated as inert: it never moves and never attacks.
#[derive(Resource, Debug, Default, Clone)]
pub struct SpeciesRegistry {
    props: HashMap<Species, SpeciesProps>,
}

impl SpeciesRegistry {
    /// Parses and validates a RON species table.
    pub fn from_ron(source: &str) -> Result<Self, RegistryError> {
        let entries: Vec<SpeciesEntry> = ron::from_str(source)?;
        let mut props = HashMap::with_capacity(entries.len());
        for entry in entries {
            entry.props.validate(entry.species)?;
            if props.insert(entry.species, entry.props).is_some() {
                return Err(RegistryError::Duplicate(entry.species));
            }
        }
        Ok(Self { props })
    }

    /// Adds or replaces one entry.
    #[must_use]
    pub fn with(mut self, species: Species, props: SpeciesProps) -> Self {
        self.props.insert(species, props);
        self
    }

    #[must_use]
    pub fn get(&self, species: Species) -> Option<&SpeciesProps> {
        self.props.get(&species)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.props.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

// === Systems ===

fn load_species_registry(mut commands: Commands) {
    match SpeciesRegistry::from_ron(SPECIES_TABLE) {
        Ok(registry) => {
            info!("Loaded {} species definitions", registry.len());
            for species in Species::ALL {
                if registry.get(species).is_none() {
                    warn!(
                        "No definition for {}; it will stay inert",
                        species.display_name()
                    );
                }
            }
            commands.insert_resource(registry);
        }
        Err(err) => {
            error!("Species table rejected: {err}");
            commands.insert_resource(SpeciesRegistry::default());
        }
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Species>();
    app.add_systems(
        OnEnter(GameState::Loading),
        load_species_registry.run_if(not(resource_exists::<SpeciesRegistry>)),
    );
}
