//! Tunable analysis and animation settings, loadable from JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::conditions::PANEL_SIZE;
use crate::errors::ConfigError;
use crate::stiffness::DEFAULT_PIVOT_TOLERANCE;

/// Settings for the structural analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Relative pivot tolerance for instability detection. Default: 1e-10.
    pub pivot_tolerance: f64,
    /// Share of axial stiffness a failed member keeps in the collapse analysis.
    /// 0 removes failed members entirely; removing any member of a statically
    /// determinate truss leaves an unstable structure, and the collapse is then
    /// shown in place. Default: 1/50.
    pub failed_member_degradation: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pivot_tolerance: DEFAULT_PIVOT_TOLERANCE,
            failed_member_degradation: 1.0 / 50.0,
        }
    }
}

impl AnalysisConfig {
    /// Set the relative pivot tolerance.
    #[must_use]
    pub fn with_pivot_tolerance(mut self, pivot_tolerance: f64) -> Self {
        self.pivot_tolerance = pivot_tolerance;
        self
    }

    /// Set the stiffness share kept by failed members.
    #[must_use]
    pub fn with_failed_member_degradation(mut self, degradation: f64) -> Self {
        self.failed_member_degradation = degradation;
        self
    }
}

/// Timing and presentation settings for the load test animation.
///
/// # Builder Pattern
/// ```
/// use trussim::config::AnimationConfig;
///
/// let config = AnimationConfig::default()
///     .with_truck_speed(40.0)
///     .with_displacement_exaggeration(10.0);
/// assert_eq!(config.truck_speed, 40.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Multiplier applied to displacements before display. Default: 30.
    pub displacement_exaggeration: f64,
    /// Truck speed in km/h. Default: 25.
    pub truck_speed: f64,
    /// Speed multiplier while the truck is off the deck. Default: 3.
    pub off_deck_speed_factor: f64,
    /// Distance in panels the truck starts before the left abutment. Default: 3.
    pub runup: f64,
    /// Seconds the unloaded bridge is shown before loading. Default: 0.5.
    pub initial_pause_duration: f64,
    /// Seconds taken to ramp in the dead load. Default: 1.2.
    pub dead_loading_duration: f64,
    /// Seconds taken to play a collapse. Default: 1.2.
    pub failure_duration: f64,
    /// Load location in panels where a truck on a failed bridge stops. Default: -0.5.
    pub emergency_stop_location: f64,
    /// Hold the truck where it is. Loading and collapse still play. Default: false.
    pub paused: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            displacement_exaggeration: 30.0,
            truck_speed: 25.0,
            off_deck_speed_factor: 3.0,
            runup: 3.0,
            initial_pause_duration: 0.5,
            dead_loading_duration: 1.2,
            failure_duration: 1.2,
            emergency_stop_location: -0.5,
            paused: false,
        }
    }
}

impl AnimationConfig {
    /// Set the displacement exaggeration.
    #[must_use]
    pub fn with_displacement_exaggeration(mut self, exaggeration: f64) -> Self {
        self.displacement_exaggeration = exaggeration;
        self
    }

    /// Set the truck speed in km/h.
    #[must_use]
    pub fn with_truck_speed(mut self, speed: f64) -> Self {
        self.truck_speed = speed;
        self
    }

    /// Set the run-up distance in panels.
    #[must_use]
    pub fn with_runup(mut self, runup: f64) -> Self {
        self.runup = runup;
        self
    }

    /// Set the pause before loading, in seconds.
    #[must_use]
    pub fn with_initial_pause_duration(mut self, seconds: f64) -> Self {
        self.initial_pause_duration = seconds;
        self
    }

    /// Set the dead load ramp duration, in seconds.
    #[must_use]
    pub fn with_dead_loading_duration(mut self, seconds: f64) -> Self {
        self.dead_loading_duration = seconds;
        self
    }

    /// Set the collapse duration, in seconds.
    #[must_use]
    pub fn with_failure_duration(mut self, seconds: f64) -> Self {
        self.failure_duration = seconds;
        self
    }

    /// Start with the truck held in place.
    #[must_use]
    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    /// Truck speed on the deck converted to panels per second.
    #[must_use]
    pub fn truck_speed_panels_per_second(&self) -> f64 {
        self.truck_speed * 1000.0 / PANEL_SIZE / 3600.0
    }
}

/// Complete simulation configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Structural analysis settings.
    pub analysis: AnalysisConfig,
    /// Animation settings.
    pub animation: AnimationConfig,
}

impl SimulationConfig {
    /// Parse and validate a JSON configuration. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and [`ConfigError::Invalid`]
    /// for out-of-range values.
    ///
    /// # Examples
    /// ```
    /// use trussim::config::SimulationConfig;
    ///
    /// let config = SimulationConfig::from_json_str(r#"{ "animation": { "truck_speed": 50.0 } }"#)
    ///     .expect("valid configuration");
    /// assert_eq!(config.animation.truck_speed, 50.0);
    /// assert_eq!(config.animation.runup, 3.0);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`SimulationConfig::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });
        // Written so that NaN fails every check.
        let positive = |v: f64| v > 0.0;
        let non_negative = |v: f64| v >= 0.0;
        let analysis = &self.analysis;
        let animation = &self.animation;
        if !(positive(analysis.pivot_tolerance) && analysis.pivot_tolerance < 1.0) {
            return invalid("analysis.pivot_tolerance", "must lie strictly between 0 and 1");
        }
        if !(0.0..=1.0).contains(&analysis.failed_member_degradation) {
            return invalid("analysis.failed_member_degradation", "must lie between 0 and 1");
        }
        if !non_negative(animation.displacement_exaggeration) {
            return invalid("animation.displacement_exaggeration", "must not be negative");
        }
        if !positive(animation.truck_speed) {
            return invalid("animation.truck_speed", "must be positive");
        }
        if !positive(animation.off_deck_speed_factor) {
            return invalid("animation.off_deck_speed_factor", "must be positive");
        }
        if !non_negative(animation.runup) {
            return invalid("animation.runup", "must not be negative");
        }
        for (field, seconds) in [
            ("animation.initial_pause_duration", animation.initial_pause_duration),
            ("animation.dead_loading_duration", animation.dead_loading_duration),
            ("animation.failure_duration", animation.failure_duration),
        ] {
            if !positive(seconds) {
                return invalid(field, "must be positive");
            }
        }
        if !(-animation.runup..=0.0).contains(&animation.emergency_stop_location) {
            return invalid("animation.emergency_stop_location", "must lie within the run-up");
        }
        Ok(())
    }
}
