use nalgebra as na;
use serde::Deserializer;
use serde_derive::{Deserialize, Serialize};

use crate::AgentId;

/// One detected agent inside a detection frame
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub id: AgentId,

    // (x,y); recorders may append z, which is ignored
    #[serde(deserialize_with = "planar")]
    pub position: [f32; 2],

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f32>,

    #[serde(
        rename = "angular velocity",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub angular_velocity: Option<f32>,
}

impl Detection {
    #[inline]
    pub fn new(id: AgentId, x: f32, y: f32) -> Self {
        Self {
            id,
            position: [x, y],
            heading: None,
            angular_velocity: None,
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

    #[inline(always)]
    pub fn point(&self) -> na::Point2<f32> {
        na::Point2::new(self.position[0], self.position[1])
    }
}

fn planar<'de, D: Deserializer<'de>>(de: D) -> Result<[f32; 2], D::Error> {
    use serde::de::Error;

    let coords = <Vec<f32> as serde::Deserialize>::deserialize(de)?;

    match coords[..] {
        [x, y, ..] => Ok([x, y]),
        _ => Err(D::Error::invalid_length(
            coords.len(),
            &"at least 2 coordinates",
        )),
    }
}
