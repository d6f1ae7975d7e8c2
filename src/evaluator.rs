use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nalgebra as na;
use ndarray::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::EvalConfig;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::metrics::{summarize, DatasetReport, MetricRecord, Summary, TrajectoryBundle};
use crate::predictor::{Hypothesis, Predictor};
use crate::sampler::{Window, WindowSampler};
use crate::track::Track;

/// Cumulative sum of displacements starting at `origin`, one row per step.
pub fn to_absolute(origin: &na::Point2<f32>, displacements: &[na::Vector2<f32>]) -> Array2<f32> {
    let mut abs = Array2::from_shape_fn((displacements.len(), 2), |(i, j)| displacements[i][j]);
    let mut prev = arr1(&[origin.x, origin.y]);

    for mut row in abs.rows_mut() {
        row += &prev;
        prev.assign(&row);
    }

    abs
}

/// Average and final displacement over the valid steps, `None` if there are none.
///
/// Steps past the end of either trajectory are not scored.
pub fn displacement_errors(
    predicted: &Array2<f32>,
    truth: &Array2<f32>,
    mask: &Array1<bool>,
) -> Option<(f32, f32)> {
    let steps = predicted.nrows().min(truth.nrows()).min(mask.len());
    let diff = &predicted.slice(s![..steps, ..]) - &truth.slice(s![..steps, ..]);
    let dist = diff.map_axis(Axis(1), |d| d.dot(&d).sqrt());

    let valid: Vec<f32> = dist
        .iter()
        .zip(mask.iter())
        .filter_map(|(&d, &ok)| if ok { Some(d) } else { None })
        .collect();

    let fde = *valid.last()?;
    let ade = valid.iter().sum::<f32>() / valid.len() as f32;

    Some((ade, fde))
}

#[inline]
fn point_rows(arr: &Array2<f32>) -> Vec<[f32; 2]> {
    arr.rows().into_iter().map(|r| [r[0], r[1]]).collect()
}

/// Lets another thread stop a running evaluation between windows
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct Evaluator {
    config: EvalConfig,
    sampler: WindowSampler,
    predictor: Predictor,
    abort: AbortHandle,
}

impl Evaluator {
    pub fn new(config: EvalConfig) -> Result<Self> {
        config.validate()?;

        let sampler = WindowSampler::from_config(&config)?;
        let predictor = Predictor::from_config(&config)?;

        Ok(Self {
            config,
            sampler,
            predictor,
            abort: AbortHandle::default(),
        })
    }

    #[inline]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    #[inline]
    pub fn sampler(&self) -> &WindowSampler {
        &self.sampler
    }

    #[inline]
    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    fn validity_mask(&self, truth: &Array2<f32>) -> Array1<bool> {
        Array1::from_shape_fn(self.config.prediction_horizon, |i| {
            i < truth.nrows()
                && self.config.bounds.as_ref().map_or(true, |bounds| {
                    bounds.contains(&na::Point2::new(truth[[i, 0]], truth[[i, 1]]))
                })
        })
    }

    /// Scores hypotheses against the window's ground truth.
    ///
    /// ADE and FDE are minimized independently over the hypotheses; the
    /// bundle (if kept) shows the one with the lowest ADE.
    pub fn score(&self, hypotheses: &[Hypothesis], window: &Window) -> Result<MetricRecord> {
        let no_future = || Error::NoValidFuture {
            agent: window.agent(),
            detection_id: window.detection_id(),
        };

        let horizon = self.config.prediction_horizon;
        if let Some(hyp) = hypotheses.iter().find(|h| h.len() != horizon) {
            return Err(Error::HorizonMismatch {
                expected: horizon,
                got: hyp.len(),
            });
        }

        let origin = window.last_observed().position;
        let truth = to_absolute(&origin, &window.true_displacements());
        let mask = self.validity_mask(&truth);

        let valid_steps = mask.iter().filter(|&&ok| ok).count();
        if valid_steps == 0 {
            return Err(no_future());
        }

        let mut best: Option<(Array2<f32>, f32)> = None;
        let mut min_fde = f32::INFINITY;

        for hyp in hypotheses {
            let predicted = to_absolute(&origin, hyp.displacements());
            let (ade, fde) = displacement_errors(&predicted, &truth, &mask).ok_or_else(no_future)?;

            min_fde = min_fde.min(fde);

            if best.as_ref().map_or(true, |(_, best_ade)| ade < *best_ade) {
                best = Some((predicted, ade));
            }
        }

        let (predicted, ade) = best.ok_or(Error::NoHypotheses)?;

        let trajectories = if self.config.keep_trajectories {
            let observed = window
                .history()
                .iter()
                .map(|o| [o.position.x, o.position.y])
                .collect();

            let truth = point_rows(&truth)
                .into_iter()
                .chain(std::iter::repeat([0.0; 2]))
                .zip(mask.iter())
                .map(|(p, &ok)| if ok { Some(p) } else { None })
                .collect();

            Some(TrajectoryBundle {
                agent: window.agent(),
                detection_id: window.detection_id(),
                observed,
                predicted: point_rows(&predicted),
                truth,
                ts: window.timestamp(),
            })
        } else {
            None
        };

        Ok(MetricRecord {
            agent: window.agent(),
            detection_id: window.detection_id(),
            timestamp: window.timestamp(),
            ade,
            fde: min_fde,
            valid_steps,
            trajectories,
        })
    }

    /// Draws the configured number of hypotheses and scores them.
    pub fn evaluate_window<R: Rng + ?Sized>(
        &self,
        window: &Window,
        rng: &mut R,
    ) -> Result<MetricRecord> {
        let count = self.config.samples_per_window();
        let mut hypotheses = Vec::with_capacity(count);

        for _ in 0..count {
            hypotheses.push(self.predictor.predict(window.history(), &mut *rng)?);
        }

        self.score(&hypotheses, window)
    }

    /// Scores every window in parallel.
    ///
    /// Window `i` samples from a generator seeded with `seed + i`, so the
    /// result doesn't depend on scheduling. Windows that can't be scored are
    /// skipped.
    pub fn evaluate_dataset(&self, name: &str, windows: &[Window]) -> Result<DatasetReport> {
        info!(dataset = name, windows = windows.len(), "evaluating");

        let outcomes = windows
            .par_iter()
            .enumerate()
            .map(|(idx, window)| {
                if self.abort.is_aborted() {
                    return Err(Error::Aborted);
                }

                let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(idx as u64));

                match self.evaluate_window(window, &mut rng) {
                    Ok(record) => Ok(Some(record)),
                    Err(err @ (Error::NoValidFuture { .. } | Error::InsufficientHistory(_))) => {
                        debug!(agent = window.agent(), "skipping window: {}", err);
                        Ok(None)
                    }
                    Err(err) => Err(err),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let total = outcomes.len();
        let records: Vec<MetricRecord> = outcomes.into_iter().flatten().collect();
        let skipped = total - records.len();

        if skipped > 0 {
            warn!(dataset = name, skipped, "windows without valid ground truth");
        }

        let report = DatasetReport::from_records(name, records, skipped)?;
        info!(dataset = name, ade = report.ade, fde = report.fde, "done");

        Ok(report)
    }

    pub fn evaluate_tracks(&self, name: &str, tracks: &[Track]) -> Result<DatasetReport> {
        let windows = self.sampler.slice_all(tracks);
        debug!(dataset = name, tracks = tracks.len(), windows = windows.len(), "sliced");

        self.evaluate_dataset(name, &windows)
    }

    /// Evaluates every dataset and averages the per-dataset scores.
    pub fn evaluate_run(&self, datasets: &[Dataset]) -> Result<Summary> {
        let summary = summarize(
            datasets
                .iter()
                .map(|ds| self.evaluate_tracks(ds.name(), &ds.tracks())),
        )?;

        info!(
            datasets = summary.reports.len(),
            excluded = summary.excluded.len(),
            ade = summary.ade,
            fde = summary.fde,
            "run finished"
        );

        Ok(summary)
    }
}
