use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::frame::Frame;
use crate::track::{Observation, Track};
use crate::{AgentId, DetectionId};

/// Builds per-agent tracks from consecutive detection frames.
///
/// An agent missing from a frame has its track closed; when it shows up
/// again it starts a new track.
#[derive(Debug, Default)]
pub struct TrackStore {
    active: HashMap<AgentId, Track>,
    finished: Vec<Track>,
    dropped: usize,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frames<'a, I>(frames: I) -> Vec<Track>
    where
        I: IntoIterator<Item = (DetectionId, &'a Frame)>,
    {
        let mut store = Self::new();
        for (detection_id, frame) in frames {
            store.push_frame(detection_id, frame);
        }

        store.finish()
    }

    pub fn push_frame(&mut self, detection_id: DetectionId, frame: &Frame) {
        let mut seen = HashSet::with_capacity(frame.len());

        for det in frame.iter() {
            if !seen.insert(det.id) {
                warn!(agent = det.id, detection_id, "duplicate agent in frame, dropping");
                self.dropped += 1;
                continue;
            }

            let continues = self
                .active
                .get(&det.id)
                .and_then(Track::last)
                .map_or(false, |last| last.detection_id + 1 == detection_id);

            if !continues {
                self.close(det.id);
            }

            let obs = Observation::from_detection(detection_id, frame.timestamp, det);
            let track = self
                .active
                .entry(det.id)
                .or_insert_with(|| Track::new(det.id));

            if let Err(err) = track.push(obs) {
                warn!(agent = det.id, detection_id, "dropping observation: {}", err);
                self.dropped += 1;
            }
        }

        let gone: Vec<AgentId> = self
            .active
            .keys()
            .filter(|id| !seen.contains(id))
            .copied()
            .collect();

        for id in gone {
            self.close(id);
        }
    }

    fn close(&mut self, agent: AgentId) {
        if let Some(track) = self.active.remove(&agent) {
            if !track.is_empty() {
                debug!(agent, len = track.len(), "track closed");
                self.finished.push(track);
            }
        }
    }

    /// Closes every open track; tracks come out ordered by agent, then start.
    pub fn finish(mut self) -> Vec<Track> {
        let open: Vec<AgentId> = self.active.keys().copied().collect();
        for id in open {
            self.close(id);
        }

        self.finished
            .sort_by_key(|t| (t.agent(), t.first_detection().unwrap_or_default()));

        self.finished
    }

    #[inline]
    pub fn num_active(&self) -> usize {
        self.active.len()
    }

    #[inline]
    pub fn num_dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Detection;

    fn frame(ts: f32, dets: &[(AgentId, f32)]) -> Frame {
        Frame::new(
            ts,
            dets.iter().map(|&(id, x)| Detection::new(id, x, 0.0)).collect(),
        )
    }

    #[test]
    fn groups_agents_into_tracks() {
        let frames = vec![
            frame(0.0, &[(1, 0.0), (2, 10.0)]),
            frame(0.4, &[(1, 1.0), (2, 11.0)]),
            frame(0.8, &[(2, 12.0), (1, 2.0)]),
        ];

        let tracks = TrackStore::from_frames(frames.iter().enumerate().map(|(i, f)| (i as u64, f)));

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].agent(), 1);
        assert_eq!(tracks[1].agent(), 2);
        assert_eq!(tracks[0].len(), 3);

        let xs: Vec<f32> = tracks[1].observations().iter().map(|o| o.position.x).collect();
        assert_eq!(xs, vec![10.0, 11.0, 12.0]);
    }

    #[test]
    fn absence_splits_track() {
        let frames = vec![
            frame(0.0, &[(1, 0.0)]),
            frame(0.4, &[(1, 1.0)]),
            frame(0.8, &[]),
            frame(1.2, &[(1, 3.0)]),
            frame(1.6, &[(1, 4.0)]),
        ];

        let mut store = TrackStore::new();
        for (i, f) in frames.iter().enumerate() {
            store.push_frame(i as u64, f);
        }
        let tracks = store.finish();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].first_detection(), Some(0));
        assert_eq!(tracks[0].len(), 2);
        assert_eq!(tracks[1].first_detection(), Some(3));
        assert_eq!(tracks[1].len(), 2);
    }

    #[test]
    fn skipped_detection_id_splits_track() {
        let a = frame(0.0, &[(1, 0.0)]);
        let b = frame(0.4, &[(1, 1.0)]);

        let tracks = TrackStore::from_frames(vec![(1, &a), (3, &b)]);

        assert_eq!(tracks.len(), 2);
    }

    #[test]
    fn drops_duplicates_and_time_reversals() {
        let mut store = TrackStore::new();
        store.push_frame(0, &frame(1.0, &[(1, 0.0), (1, 5.0)]));
        store.push_frame(1, &frame(0.5, &[(1, 1.0)]));

        assert_eq!(store.num_dropped(), 2);
        assert_eq!(store.num_active(), 1);

        let tracks = store.finish();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].len(), 1);
        assert_eq!(tracks[0].observations()[0].position.x, 0.0);
    }
}
