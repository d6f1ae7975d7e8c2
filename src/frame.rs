use std::io;

use serde_derive::{Deserialize, Serialize};
use tracing::warn;

use crate::detection::Detection;
use crate::error::Result;

/// One detection record: every agent seen at a single timestamp
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Frame {
    pub timestamp: f32, // in seconds
    pub frame: i64,
    pub size: usize,
    #[serde(rename = "object_list")]
    pub detections: Vec<Detection>,
}

#[derive(Deserialize)]
struct RawFrame {
    timestamp: f32,
    #[serde(default)]
    frame: i64,
    #[serde(default)]
    size: Option<usize>,
    object_list: Vec<serde_json::Value>,
}

impl Frame {
    pub fn new(timestamp: f32, detections: Vec<Detection>) -> Self {
        Self {
            timestamp,
            frame: 0,
            size: detections.len(),
            detections,
        }
    }

    /// Parses a detection record; objects that fail to parse are dropped.
    pub fn from_json_str(src: &str) -> Result<Self> {
        let raw: RawFrame = serde_json::from_str(src)?;

        Ok(Self::from_raw(raw))
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let raw: RawFrame = serde_json::from_reader(reader)?;

        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawFrame) -> Self {
        let size = raw.size.unwrap_or(raw.object_list.len());
        let frame = raw.frame;

        let detections = raw
            .object_list
            .into_iter()
            .enumerate()
            .filter_map(
                |(idx, value)| match serde_json::from_value::<Detection>(value) {
                    Ok(det) => Some(det),
                    Err(err) => {
                        warn!(frame, index = idx, "dropping malformed object: {}", err);
                        None
                    }
                },
            )
            .collect();

        Self {
            timestamp: raw.timestamp,
            frame,
            size,
            detections,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_record() {
        let frame = Frame::from_json_str(
            r#"{"timestamp": 12.5, "frame": 40, "size": 2, "object_list": [
                {"id": 0, "position": [1.0, 2.0]},
                {"id": 7, "position": [3.0, 4.0], "heading": 180.0}
            ]}"#,
        )
        .unwrap();

        assert_eq!(frame.timestamp, 12.5);
        assert_eq!(frame.frame, 40);
        assert_eq!(frame.size, 2);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.detections[1].heading, Some(180.0));
    }

    #[test]
    fn drops_malformed_objects() {
        let frame = Frame::from_json_str(
            r#"{"timestamp": 1.0, "object_list": [
                {"id": 0},
                {"id": 1, "position": [0.5, 0.5]},
                {"position": [1.0, 1.0]}
            ]}"#,
        )
        .unwrap();

        assert_eq!(frame.size, 3);
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.detections[0].id, 1);
    }

    #[test]
    fn rejects_missing_envelope() {
        assert!(Frame::from_json_str(r#"{"object_list": []}"#).is_err());
        assert!(Frame::from_json_str(r#"{"timestamp": 1.0}"#).is_err());
    }
}
