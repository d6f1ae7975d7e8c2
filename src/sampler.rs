use nalgebra as na;

use crate::config::EvalConfig;
use crate::error::{Error, Result};
use crate::track::{Observation, Track};
use crate::{AgentId, DetectionId};

/// History plus (possibly clipped) future slice of one track.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    agent: AgentId,
    detection_id: DetectionId,
    start_time: f32,
    history: Vec<Observation>,
    future: Vec<Observation>,
}

impl Window {
    /// `detection_id` is taken from the last history observation.
    pub fn new(agent: AgentId, history: Vec<Observation>, future: Vec<Observation>) -> Result<Self> {
        let (start_time, detection_id) = match (history.first(), history.last()) {
            (Some(first), Some(last)) if history.len() >= 2 => (first.timestamp, last.detection_id),
            _ => return Err(Error::InsufficientHistory(history.len())),
        };

        if future.is_empty() {
            return Err(Error::NoValidFuture {
                agent,
                detection_id,
            });
        }

        Ok(Self {
            agent,
            detection_id,
            start_time,
            history,
            future,
        })
    }

    #[inline]
    pub fn agent(&self) -> AgentId {
        self.agent
    }

    #[inline]
    pub fn detection_id(&self) -> DetectionId {
        self.detection_id
    }

    #[inline]
    pub fn start_time(&self) -> f32 {
        self.start_time
    }

    #[inline]
    pub fn history(&self) -> &[Observation] {
        &self.history
    }

    #[inline]
    pub fn future(&self) -> &[Observation] {
        &self.future
    }

    #[inline]
    pub fn last_observed(&self) -> &Observation {
        &self.history[self.history.len() - 1]
    }

    /// Timestamp at which the history ends.
    #[inline]
    pub fn timestamp(&self) -> f32 {
        self.last_observed().timestamp
    }

    /// Observed plus future observations.
    #[inline]
    pub fn sequence_len(&self) -> usize {
        self.history.len() + self.future.len()
    }

    /// Step-by-step ground truth displacements, starting from the last observed position.
    pub fn true_displacements(&self) -> Vec<na::Vector2<f32>> {
        let mut prev = self.last_observed().position;

        self.future
            .iter()
            .map(|obs| {
                let delta = obs.position - prev;
                prev = obs.position;
                delta
            })
            .collect()
    }
}

/// Slices tracks into overlapping windows with stride 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSampler {
    sequence_length: usize,
    observed_history: usize,
    min_length: usize,
}

impl WindowSampler {
    pub fn new(sequence_length: usize, observed_history: usize, min_length: usize) -> Result<Self> {
        if observed_history < 2 || min_length <= observed_history || min_length > sequence_length {
            return Err(Error::InvalidConfig(format!(
                "window lengths must satisfy 2 <= history ({}) < min ({}) <= sequence ({})",
                observed_history, min_length, sequence_length
            )));
        }

        Ok(Self {
            sequence_length,
            observed_history,
            min_length,
        })
    }

    pub fn from_config(config: &EvalConfig) -> Result<Self> {
        Self::new(
            config.sequence_length(),
            config.observed_history,
            config.min_sequence_length,
        )
    }

    pub fn slice(&self, track: &Track) -> Vec<Window> {
        let obs = track.observations();
        let len = obs.len();

        if len < self.min_length {
            return Vec::new();
        }

        // clipped lengths only shrink as the start moves forward
        (0..len)
            .map(|start| (start, (start + self.sequence_length).min(len)))
            .take_while(|&(start, end)| end - start >= self.min_length)
            .map(|(start, end)| {
                let split = start + self.observed_history;

                Window {
                    agent: track.agent(),
                    detection_id: obs[split - 1].detection_id,
                    start_time: obs[start].timestamp,
                    history: obs[start..split].to_vec(),
                    future: obs[split..end].to_vec(),
                }
            })
            .collect()
    }

    pub fn slice_all(&self, tracks: &[Track]) -> Vec<Window> {
        tracks.iter().flat_map(|t| self.slice(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(agent: AgentId, len: usize, first_id: DetectionId) -> Track {
        Track::from_observations(
            agent,
            (0..len).map(|i| {
                Observation::new(
                    first_id + i as u64,
                    i as f32 * 0.5,
                    na::Point2::new(i as f32, 0.0),
                )
            }),
        )
        .unwrap()
    }

    #[test]
    fn counts_windows() {
        let sampler = WindowSampler::new(10, 8, 10).unwrap();

        let windows = sampler.slice(&track(1, 12, 0));
        assert_eq!(windows.len(), 3);
        assert!(windows.iter().all(|w| w.sequence_len() >= 10));
        assert!(windows.iter().all(|w| w.history().len() == 8));

        assert_eq!(sampler.slice(&track(1, 9, 0)).len(), 0);
        assert_eq!(sampler.slice(&track(1, 10, 0)).len(), 1);
    }

    #[test]
    fn keeps_clipped_windows() {
        let sampler = WindowSampler::new(10, 8, 9).unwrap();
        let windows = sampler.slice(&track(1, 12, 0));

        let futures: Vec<usize> = windows.iter().map(|w| w.future().len()).collect();
        assert_eq!(futures, vec![2, 2, 2, 1]);
    }

    #[test]
    fn provenance_increments_by_one() {
        let sampler = WindowSampler::new(17, 8, 10).unwrap();
        let windows = sampler.slice(&track(4, 30, 100));

        assert_eq!(windows[0].detection_id(), 107);
        for pair in windows.windows(2) {
            assert_eq!(pair[1].detection_id(), pair[0].detection_id() + 1);
        }
        assert!(windows.iter().all(|w| w.agent() == 4));
        assert_eq!(windows[1].start_time(), 0.5);
        assert_eq!(windows[1].timestamp(), 4.0);
    }

    #[test]
    fn true_displacements_are_relative() {
        let sampler = WindowSampler::new(10, 8, 10).unwrap();
        let windows = sampler.slice(&track(1, 10, 0));

        let deltas = windows[0].true_displacements();
        assert_eq!(deltas, vec![na::Vector2::new(1.0, 0.0), na::Vector2::new(1.0, 0.0)]);
    }

    #[test]
    fn rejects_bad_lengths() {
        assert!(WindowSampler::new(10, 8, 8).is_err());
        assert!(WindowSampler::new(10, 8, 11).is_err());
        assert!(WindowSampler::new(10, 1, 5).is_err());
    }

    #[test]
    fn window_new_checks_history() {
        let o = Observation::new(0, 0.0, na::Point2::new(0.0, 0.0));

        assert!(matches!(
            Window::new(1, vec![o], vec![o]),
            Err(Error::InsufficientHistory(1))
        ));
    }
}
