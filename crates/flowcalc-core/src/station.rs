//! Station types: the capability objects behind station groups.
//!
//! The analysis engine never looks inside a station. It only asks a
//! [`StationType`] for the material it consumes and produces per unit of
//! group throughput, plus a couple of human-readable descriptions used when
//! rendering results. [`RecipeStation`] is a data-driven implementation that
//! covers the common "fixed recipe with speed modifiers" case.

use std::collections::BTreeMap;

/// Material name to rate per unit of station-group throughput.
pub type RateTable = BTreeMap<String, f64>;

// ---------------------------------------------------------------------------
// StationType trait
// ---------------------------------------------------------------------------

/// Capability object describing what one unit of a station group does.
pub trait StationType: std::fmt::Debug + Send + Sync {
    /// Materials consumed per unit of throughput.
    fn input_rates(&self) -> RateTable;

    /// Materials produced per unit of throughput.
    fn output_rates(&self) -> RateTable;

    /// Describe what is needed to sustain `rate` units of throughput,
    /// e.g. "3 gear stations".
    fn describe_throughput(&self, rate: f64) -> String;

    /// Describe the throughput cap of the group, used for bottleneck reports.
    fn cap_description(&self) -> String {
        "[no description]".to_string()
    }
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

/// What a modifier does to a recipe station.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ModifierKind {
    /// Multiplies crafting speed. 1.5 = 50% faster.
    Speed(f64),
    /// Multiplies output only. 1.1 = +10% extra output.
    Productivity(f64),
    /// Multiplies input consumption only. 0.8 = uses 80% inputs.
    Efficiency(f64),
}

/// Modifier multipliers folded into one value per category.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ResolvedModifiers {
    speed: f64,
    productivity: f64,
    efficiency: f64,
}

impl ResolvedModifiers {
    fn resolve(modifiers: &[ModifierKind]) -> Self {
        let mut resolved = Self {
            speed: 1.0,
            productivity: 1.0,
            efficiency: 1.0,
        };
        for modifier in modifiers {
            match *modifier {
                ModifierKind::Speed(v) => resolved.speed *= v,
                ModifierKind::Productivity(v) => resolved.productivity *= v,
                ModifierKind::Efficiency(v) => resolved.efficiency *= v,
            }
        }
        resolved
    }
}

// ---------------------------------------------------------------------------
// RecipeStation
// ---------------------------------------------------------------------------

/// Errors raised while building a recipe station.
#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error("craft time must be positive and finite, got {0}")]
    InvalidCraftTime(f64),
    #[error("station speed must be positive and finite, got {0}")]
    InvalidSpeed(f64),
    #[error("amount of {material} must be non-negative and finite, got {amount}")]
    InvalidAmount { material: String, amount: f64 },
    #[error("recipe {0} produces nothing")]
    NoOutputs(String),
}

/// A station running a single fixed recipe.
///
/// One unit of group throughput is one station running continuously, so the
/// throughput variable reads as "number of stations' worth".
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeStation {
    name: String,
    inputs: Vec<(String, f64)>,
    outputs: Vec<(String, f64)>,
    /// Seconds per craft at speed 1.
    craft_time: f64,
    /// Base crafting speed of the station (before modifiers).
    speed: f64,
    modifiers: Vec<ModifierKind>,
}

fn check_amounts(entries: &[(String, f64)]) -> Result<(), RecipeError> {
    for (material, amount) in entries {
        if !amount.is_finite() || *amount < 0.0 {
            return Err(RecipeError::InvalidAmount {
                material: material.clone(),
                amount: *amount,
            });
        }
    }
    Ok(())
}

impl RecipeStation {
    /// Create a station with base speed 1 and no modifiers.
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<(String, f64)>,
        outputs: Vec<(String, f64)>,
        craft_time: f64,
    ) -> Result<Self, RecipeError> {
        let name = name.into();
        if !craft_time.is_finite() || craft_time <= 0.0 {
            return Err(RecipeError::InvalidCraftTime(craft_time));
        }
        check_amounts(&inputs)?;
        check_amounts(&outputs)?;
        if outputs.is_empty() {
            return Err(RecipeError::NoOutputs(name));
        }
        Ok(Self {
            name,
            inputs,
            outputs,
            craft_time,
            speed: 1.0,
            modifiers: Vec::new(),
        })
    }

    /// Set the base crafting speed.
    pub fn with_speed(mut self, speed: f64) -> Result<Self, RecipeError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(RecipeError::InvalidSpeed(speed));
        }
        self.speed = speed;
        Ok(self)
    }

    /// Add a modifier (module, beacon effect, ...).
    pub fn with_modifier(mut self, modifier: ModifierKind) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Crafts per second for one station, modifiers included.
    fn crafts_per_second(&self, resolved: &ResolvedModifiers) -> f64 {
        self.speed * resolved.speed / self.craft_time
    }
}

impl StationType for RecipeStation {
    fn input_rates(&self) -> RateTable {
        let resolved = ResolvedModifiers::resolve(&self.modifiers);
        let per_second = self.crafts_per_second(&resolved) * resolved.efficiency;
        self.inputs
            .iter()
            .map(|(material, amount)| (material.clone(), amount * per_second))
            .collect()
    }

    fn output_rates(&self) -> RateTable {
        let resolved = ResolvedModifiers::resolve(&self.modifiers);
        let per_second = self.crafts_per_second(&resolved) * resolved.productivity;
        self.outputs
            .iter()
            .map(|(material, amount)| (material.clone(), amount * per_second))
            .collect()
    }

    fn describe_throughput(&self, rate: f64) -> String {
        if rate.is_infinite() {
            return format!("infinitely many {} stations", self.name);
        }
        format!("{} {} stations", rate.ceil(), self.name)
    }

    fn cap_description(&self) -> String {
        format!("{} station cap", self.name)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
