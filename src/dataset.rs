use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::store::TrackStore;
use crate::track::Track;
use crate::DetectionId;

/// Detection frames of one recording, ordered by detection id
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    frames: Vec<(DetectionId, Frame)>,
}

impl Dataset {
    /// Frames numbered in the given order, starting at 0.
    pub fn new(name: &str, frames: Vec<Frame>) -> Self {
        Self::with_ids(
            name,
            frames
                .into_iter()
                .enumerate()
                .map(|(i, f)| (i as DetectionId, f))
                .collect(),
        )
    }

    pub fn with_ids(name: &str, mut frames: Vec<(DetectionId, Frame)>) -> Self {
        frames.sort_by_key(|(id, _)| *id);

        Self {
            name: name.to_string(),
            frames,
        }
    }

    /// Loads `<n>.json` detection records from a directory; `n` becomes the detection id.
    pub fn load_dir<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut frames = Vec::new();

        for entry in std::fs::read_dir(path)? {
            let file = entry?.path();

            if file.extension().map_or(true, |ext| ext != "json") {
                continue;
            }

            let id = match file
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<DetectionId>().ok())
            {
                Some(id) => id,
                None => {
                    warn!(file = %file.display(), "file name is not a detection number, skipping");
                    continue;
                }
            };

            match Frame::from_reader(BufReader::new(File::open(&file)?)) {
                Ok(frame) => frames.push((id, frame)),
                Err(Error::JsonError(err)) => {
                    warn!(file = %file.display(), "malformed detection record: {}", err);
                }
                Err(err) => return Err(err),
            }
        }

        info!(dataset = %name, frames = frames.len(), "loaded");

        Ok(Self::with_ids(&name, frames))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn frames(&self) -> &[(DetectionId, Frame)] {
        &self.frames
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn tracks(&self) -> Vec<Track> {
        TrackStore::from_frames(self.frames.iter().map(|(id, frame)| (*id, frame)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    fn record(ts: f32, x: f32) -> String {
        format!(
            r#"{{"timestamp": {}, "frame": 0, "size": 1, "object_list": [{{"id": 0, "position": [{}, 0.0]}}]}}"#,
            ts, x
        )
    }

    #[test]
    fn loads_numbered_records_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "10.json", &record(4.0, 9.0));
        write(dir.path(), "2.json", &record(0.4, 1.0));
        write(dir.path(), "1.json", &record(0.0, 0.0));
        write(dir.path(), "3.json", &record(0.8, 2.0));
        write(dir.path(), "notes.txt", "ignored");
        write(dir.path(), "summary.json", "{}");
        write(dir.path(), "4.json", "{ not json");

        let dataset = Dataset::load_dir(dir.path()).unwrap();

        let ids: Vec<DetectionId> = dataset.frames().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2, 3, 10]);

        let tracks = dataset.tracks();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].len(), 3);
        assert_eq!(tracks[1].first_detection(), Some(10));
    }

    #[test]
    fn in_memory_frames_are_numbered() {
        let frames = vec![
            Frame::from_json_str(&record(0.0, 0.0)).unwrap(),
            Frame::from_json_str(&record(0.4, 1.0)).unwrap(),
        ];
        let dataset = Dataset::new("mem", frames);

        assert_eq!(dataset.name(), "mem");
        assert_eq!(dataset.frames()[1].0, 1);
        assert_eq!(dataset.tracks().len(), 1);
    }

    #[test]
    fn missing_dir_is_io_error() {
        assert!(matches!(
            Dataset::load_dir("/definitely/not/here"),
            Err(Error::IoError(_))
        ));
    }
}
