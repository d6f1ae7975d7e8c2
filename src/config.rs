use std::path::Path;

use serde_derive::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::{AngleUnit, Bounds};

/// Where the per-step turn angle is estimated from
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnSource {
    /// difference of the last two heading samples
    Heading,
    /// angle between the last two displacement vectors
    Positions,
    /// recorded angular velocity times the last time step
    AngularVelocity,
}

/// Rotation sense of recorded headings and angular velocities
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HeadingConvention {
    CounterClockwise,
    /// compass-like, as written by the simulator recorder
    Clockwise,
}

impl HeadingConvention {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            HeadingConvention::CounterClockwise => 1.0,
            HeadingConvention::Clockwise => -1.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TurnConfig {
    pub source: TurnSource,
    pub average: bool,
    pub damping: f32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            source: TurnSource::Positions,
            average: false,
            damping: 1.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PredictorConfig {
    /// `None` keeps the prediction straight
    pub turn: Option<TurnConfig>,
    pub sample: bool,
    // in degrees
    pub sample_angle_std: f32,
    // distance units per second
    pub min_turn_speed: f32,
    pub heading_unit: AngleUnit,
    pub heading_convention: HeadingConvention,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            turn: None,
            sample: false,
            sample_angle_std: 25.0,
            min_turn_speed: 1.0,
            heading_unit: AngleUnit::Degrees,
            heading_convention: HeadingConvention::Clockwise,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EvalConfig {
    pub observed_history: usize,
    pub prediction_horizon: usize,
    pub min_sequence_length: usize,
    pub num_samples: usize,
    pub predictor: PredictorConfig,
    pub bounds: Option<Bounds>,
    pub keep_trajectories: bool,
    pub seed: u64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            observed_history: 8,
            prediction_horizon: 9,
            min_sequence_length: 10,
            num_samples: 20,
            predictor: PredictorConfig::default(),
            bounds: None,
            keep_trajectories: false,
            seed: 0,
        }
    }
}

impl EvalConfig {
    pub fn from_json_str(src: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(src)?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let src = std::fs::read_to_string(path)?;

        Self::from_json_str(&src)
    }

    #[inline]
    pub fn sequence_length(&self) -> usize {
        self.observed_history + self.prediction_horizon
    }

    /// Hypotheses drawn per window: one unless sampling is on.
    #[inline]
    pub fn samples_per_window(&self) -> usize {
        if self.predictor.sample {
            self.num_samples
        } else {
            1
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));

        if self.observed_history < 2 {
            return invalid(format!(
                "observed_history must be at least 2, got {}",
                self.observed_history
            ));
        }

        if self.prediction_horizon < 1 {
            return invalid("prediction_horizon must be at least 1".into());
        }

        if self.min_sequence_length <= self.observed_history
            || self.min_sequence_length > self.sequence_length()
        {
            return invalid(format!(
                "min_sequence_length must be in ({}, {}], got {}",
                self.observed_history,
                self.sequence_length(),
                self.min_sequence_length
            ));
        }

        if self.num_samples < 1 {
            return invalid("num_samples must be at least 1".into());
        }

        let predictor = &self.predictor;
        if !(predictor.sample_angle_std.is_finite() && predictor.sample_angle_std >= 0.0) {
            return invalid(format!(
                "sample_angle_std must be finite and non-negative, got {}",
                predictor.sample_angle_std
            ));
        }

        if !(predictor.min_turn_speed.is_finite() && predictor.min_turn_speed >= 0.0) {
            return invalid(format!(
                "min_turn_speed must be finite and non-negative, got {}",
                predictor.min_turn_speed
            ));
        }

        if let Some(turn) = &predictor.turn {
            if !(turn.damping > 0.0 && turn.damping <= 1.0) {
                return invalid(format!("damping must be in (0, 1], got {}", turn.damping));
            }
        }

        match &self.bounds {
            Some(Bounds::Rect([x_min, x_max, y_min, y_max])) if x_min >= x_max || y_min >= y_max => {
                invalid("geofence rectangle is empty".into())
            }
            Some(Bounds::Polygon(poly)) if poly.len() < 3 => {
                invalid("geofence polygon needs at least 3 vertices".into())
            }
            _ => Ok(()),
        }
    }
}
