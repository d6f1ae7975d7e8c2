use nalgebra as na;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::trace;

use crate::config::{EvalConfig, PredictorConfig, TurnConfig, TurnSource};
use crate::error::{Error, Result};
use crate::math::{normalize_angle, rotate, turn_between};
use crate::track::Observation;

/// One candidate future, as per-step displacements
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    displacements: Vec<na::Vector2<f32>>,
}

impl Hypothesis {
    #[inline]
    pub fn new(displacements: Vec<na::Vector2<f32>>) -> Self {
        Self { displacements }
    }

    #[inline]
    pub fn displacements(&self) -> &[na::Vector2<f32>] {
        &self.displacements
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.displacements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.displacements.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Step {
    delta: na::Vector2<f32>,
    dt: f32,
}

impl Step {
    #[inline]
    fn between(from: &Observation, to: &Observation) -> Self {
        Self {
            delta: to.position - from.position,
            dt: to.timestamp - from.timestamp,
        }
    }

    #[inline]
    fn speed(&self) -> f32 {
        let dist = self.delta.norm();

        if self.dt > 0.0 {
            dist / self.dt
        } else {
            dist
        }
    }
}

/// Constant velocity extrapolation with optional turning and heading noise.
#[derive(Debug, Clone)]
pub struct Predictor {
    config: PredictorConfig,
    horizon: usize,
    noise: Option<Normal<f32>>,
}

impl Predictor {
    pub fn new(config: PredictorConfig, horizon: usize) -> Result<Self> {
        let noise = if config.sample {
            let normal = Normal::new(0.0, config.sample_angle_std)
                .map_err(|err| Error::InvalidConfig(format!("sample_angle_std: {}", err)))?;

            Some(normal)
        } else {
            None
        };

        Ok(Self {
            config,
            horizon,
            noise,
        })
    }

    pub fn from_config(config: &EvalConfig) -> Result<Self> {
        Self::new(config.predictor.clone(), config.prediction_horizon)
    }

    #[inline]
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    #[inline]
    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Predicts `horizon` displacements following the last observed step.
    ///
    /// With sampling enabled every call draws a fresh heading perturbation
    /// from `rng`.
    pub fn predict<R: Rng + ?Sized>(
        &self,
        history: &[Observation],
        rng: &mut R,
    ) -> Result<Hypothesis> {
        let n = history.len();
        if n < 2 {
            return Err(Error::InsufficientHistory(n));
        }

        let last = Step::between(&history[n - 2], &history[n - 1]);
        let mut seed = last.delta;

        if let Some(noise) = &self.noise {
            let angle = noise.sample(rng).to_radians();
            seed = rotate(&seed, angle);
        }

        let turn = match &self.config.turn {
            Some(turn) if last.speed() > self.config.min_turn_speed => self
                .turn_rate(turn, history)
                .map(|theta| (theta, turn.damping)),
            Some(_) => {
                trace!(speed = last.speed(), "too slow to extrapolate turning");
                None
            }
            None => None,
        };

        let displacements = (1..=self.horizon)
            .map(|i| match turn {
                Some((theta, damping)) => {
                    let i = i as f32;
                    rotate(&seed, theta * i * damping.powf(i))
                }
                None => seed,
            })
            .collect();

        Ok(Hypothesis { displacements })
    }

    /// Per-step turn in radians, `None` when the history can't tell.
    fn turn_rate(&self, turn: &TurnConfig, history: &[Observation]) -> Option<f32> {
        let n = history.len();
        let latest = self.turn_at(turn.source, history, n - 1)?;

        let theta = if turn.average && n >= 3 {
            match self.turn_at(turn.source, history, n - 2) {
                // halfway along the shorter arc between the two
                Some(prev) => prev + normalize_angle(latest - prev) * 0.5,
                None => latest,
            }
        } else {
            latest
        };

        Some(normalize_angle(theta))
    }

    // turn over the step that ends at `history[k]`, k >= 1
    fn turn_at(&self, source: TurnSource, history: &[Observation], k: usize) -> Option<f32> {
        let sign = self.config.heading_convention.sign();
        let unit = self.config.heading_unit;

        let theta = match source {
            TurnSource::Heading => {
                let (prev, curr) = (history[k - 1].heading?, history[k].heading?);

                sign * unit.to_radians(curr - prev)
            }

            TurnSource::Positions => {
                if k < 2 {
                    return None;
                }

                let prev = Step::between(&history[k - 2], &history[k - 1]);
                let curr = Step::between(&history[k - 1], &history[k]);

                if prev.speed() <= self.config.min_turn_speed
                    || curr.speed() <= self.config.min_turn_speed
                {
                    return None;
                }

                turn_between(&prev.delta, &curr.delta)
            }

            TurnSource::AngularVelocity => {
                let omega = history[k].angular_velocity?;
                let dt = history[k].timestamp - history[k - 1].timestamp;

                sign * unit.to_radians(omega) * dt
            }
        };

        Some(normalize_angle(theta))
    }
}
