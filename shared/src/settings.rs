//! Player-tunable settings.
//!
//! Values come from sliders or a JSON file and are never rejected; every consumer
//! reads them through [`Settings::clamped`].

use crate::constants::{JUMP_FORCE, MAX_GRAB_DISTANCE, PLAYER_GRAVITY, SPRINT_SPEED, WALK_SPEED};
use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

const FOV_RANGE: RangeInclusive<f32> = 30.0..=120.0;
const RENDER_DISTANCE_RANGE: RangeInclusive<f32> = 10.0..=500.0;
const SENSITIVITY_RANGE: RangeInclusive<f32> = 1.0..=100.0;
const GRAVITY_RANGE: RangeInclusive<f32> = 0.0..=100.0;
const JUMP_RANGE: RangeInclusive<f32> = 0.0..=50.0;
const WALK_RANGE: RangeInclusive<f32> = 1.0..=50.0;
const SPRINT_RANGE: RangeInclusive<f32> = 1.0..=100.0;
const GRAB_RANGE: RangeInclusive<f32> = 1.0..=200.0;

/// Slider units per radian-per-pixel of look sensitivity.
const SENSITIVITY_SCALE: f32 = 10_000.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cheats {
    pub fly: bool,
    pub noclip: bool,
    pub freecam: bool,
    pub freecam_move: bool,
    pub god: bool,
    pub infinite_stamina: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Far plane / fog distance in meters.
    pub render_distance: f32,
    /// Slider units; see [`Settings::look_sensitivity`].
    pub sensitivity: f32,
    pub gravity: f32,
    pub jump_force: f32,
    pub walk_speed: f32,
    pub sprint_speed: f32,
    pub grab_distance: f32,
    pub cheats: Cheats,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fov: 75.0,
            render_distance: 60.0,
            sensitivity: 20.0,
            gravity: PLAYER_GRAVITY,
            jump_force: JUMP_FORCE,
            walk_speed: WALK_SPEED,
            sprint_speed: SPRINT_SPEED,
            grab_distance: MAX_GRAB_DISTANCE,
            cheats: Cheats::default(),
        }
    }
}

fn clamp(value: f32, range: RangeInclusive<f32>, fallback: f32) -> f32 {
    if value.is_nan() {
        return fallback;
    }
    value.clamp(*range.start(), *range.end())
}

impl Settings {
    /// Copy with every value forced into its valid range. NaN falls back to the default.
    pub fn clamped(&self) -> Self {
        let d = Self::default();
        Self {
            fov: clamp(self.fov, FOV_RANGE, d.fov),
            render_distance: clamp(self.render_distance, RENDER_DISTANCE_RANGE, d.render_distance),
            sensitivity: clamp(self.sensitivity, SENSITIVITY_RANGE, d.sensitivity),
            gravity: clamp(self.gravity, GRAVITY_RANGE, d.gravity),
            jump_force: clamp(self.jump_force, JUMP_RANGE, d.jump_force),
            walk_speed: clamp(self.walk_speed, WALK_RANGE, d.walk_speed),
            sprint_speed: clamp(self.sprint_speed, SPRINT_RANGE, d.sprint_speed),
            grab_distance: clamp(self.grab_distance, GRAB_RANGE, d.grab_distance),
            cheats: self.cheats,
        }
    }

    /// Look sensitivity in radians per pixel.
    pub fn look_sensitivity(&self) -> f32 {
        clamp(self.sensitivity, SENSITIVITY_RANGE, 20.0) / SENSITIVITY_SCALE
    }

    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_sliders() {
        let s = Settings::default();
        assert_eq!(s.fov, 75.0);
        assert_eq!(s.render_distance, 60.0);
        assert!((s.look_sensitivity() - 0.002).abs() < 1e-6);
        assert_eq!(s.grab_distance, 30.0);
    }

    #[test]
    fn out_of_range_values_are_clamped_not_rejected() {
        let s = Settings {
            fov: 400.0,
            gravity: -5.0,
            walk_speed: f32::NAN,
            ..Settings::default()
        };
        let c = s.clamped();
        assert_eq!(c.fov, 120.0);
        assert_eq!(c.gravity, 0.0);
        assert_eq!(c.walk_speed, WALK_SPEED);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s = Settings::from_json(r#"{ "fov": 90, "cheats": { "fly": true } }"#).unwrap();
        assert_eq!(s.fov, 90.0);
        assert!(s.cheats.fly);
        assert!(!s.cheats.noclip);
        assert_eq!(s.sprint_speed, SPRINT_SPEED);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            Settings::from_json("{ fov: "),
            Err(SettingsError::Parse(_))
        ));
    }
}
