use nalgebra as na;

use crate::detection::Detection;
use crate::error::{Error, Result};
use crate::{AgentId, DetectionId};

/// State of one agent in one detection frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub detection_id: DetectionId,
    pub timestamp: f32, // in seconds
    pub position: na::Point2<f32>,

    // in the source's angle unit
    pub heading: Option<f32>,
    pub angular_velocity: Option<f32>,
}

impl Observation {
    #[inline]
    pub fn new(detection_id: DetectionId, timestamp: f32, position: na::Point2<f32>) -> Self {
        Self {
            detection_id,
            timestamp,
            position,
            heading: None,
            angular_velocity: None,
        }
    }

    #[inline]
    pub fn from_detection(detection_id: DetectionId, timestamp: f32, det: &Detection) -> Self {
        Self {
            detection_id,
            timestamp,
            position: det.point(),
            heading: det.heading,
            angular_velocity: det.angular_velocity,
        }
    }

    #[inline]
    pub fn with_heading(mut self, heading: f32) -> Self {
        self.heading = Some(heading);
        self
    }

    #[inline]
    pub fn with_angular_velocity(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = Some(angular_velocity);
        self
    }
}

/// Contiguous observations of one agent.
///
/// Timestamps are strictly increasing and detection ids are consecutive;
/// `push` rejects anything else, so a stored track never violates either.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    agent: AgentId,
    observations: Vec<Observation>,
}

impl Track {
    pub fn new(agent: AgentId) -> Self {
        Self {
            agent,
            observations: Vec::new(),
        }
    }

    pub fn from_observations<I>(agent: AgentId, observations: I) -> Result<Self>
    where
        I: IntoIterator<Item = Observation>,
    {
        let mut track = Self::new(agent);
        for obs in observations {
            track.push(obs)?;
        }

        Ok(track)
    }

    pub fn push(&mut self, obs: Observation) -> Result<()> {
        if let Some(last) = self.observations.last() {
            let expected = last.detection_id + 1;

            if obs.detection_id != expected {
                return Err(Error::DetectionGap {
                    agent: self.agent,
                    expected,
                    got: obs.detection_id,
                });
            }

            if obs.timestamp <= last.timestamp {
                return Err(Error::NonMonotonicTimestamp {
                    agent: self.agent,
                    timestamp: obs.timestamp,
                    last: last.timestamp,
                });
            }
        }

        self.observations.push(obs);

        Ok(())
    }

    #[inline]
    pub fn agent(&self) -> AgentId {
        self.agent
    }

    #[inline]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    #[inline]
    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    #[inline]
    pub fn first_detection(&self) -> Option<DetectionId> {
        self.observations.first().map(|o| o.detection_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(id: DetectionId, ts: f32) -> Observation {
        Observation::new(id, ts, na::Point2::new(ts, 0.0))
    }

    #[test]
    fn accepts_contiguous_observations() {
        let track = Track::from_observations(5, (0..4).map(|i| obs(10 + i, i as f32 * 0.4))).unwrap();

        assert_eq!(track.agent(), 5);
        assert_eq!(track.len(), 4);
        assert_eq!(track.first_detection(), Some(10));
        assert_eq!(track.last().map(|o| o.detection_id), Some(13));
    }

    #[test]
    fn rejects_detection_gap() {
        let mut track = Track::new(1);
        track.push(obs(0, 0.0)).unwrap();

        match track.push(obs(2, 1.0)) {
            Err(Error::DetectionGap { expected, got, .. }) => {
                assert_eq!(expected, 1);
                assert_eq!(got, 2);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(track.len(), 1);
    }

    #[test]
    fn rejects_non_increasing_timestamp() {
        let mut track = Track::new(1);
        track.push(obs(0, 1.0)).unwrap();

        assert!(matches!(
            track.push(obs(1, 1.0)),
            Err(Error::NonMonotonicTimestamp { .. })
        ));
        assert!(matches!(
            track.push(obs(1, 0.5)),
            Err(Error::NonMonotonicTimestamp { .. })
        ));
        assert_eq!(track.len(), 1);
    }

    #[test]
    fn copies_detection_fields() {
        let det = Detection::new(9, 1.0, 2.0)
            .with_heading(45.0)
            .with_angular_velocity(3.0);
        let o = Observation::from_detection(4, 0.2, &det);

        assert_eq!(o.position, na::Point2::new(1.0, 2.0));
        assert_eq!(o.heading, Some(45.0));
        assert_eq!(o.angular_velocity, Some(3.0));
        assert_eq!(o.detection_id, 4);
    }
}
