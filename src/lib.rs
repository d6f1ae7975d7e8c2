pub mod config;
pub mod dataset;
pub mod detection;
pub mod error;
pub mod evaluator;
pub mod frame;
pub mod math;
pub mod metrics;
pub mod predictor;
pub mod sampler;
pub mod store;
pub mod track;

pub use config::{EvalConfig, PredictorConfig, TurnConfig};
pub use dataset::Dataset;
pub use detection::Detection;
pub use error::{Error, Result};
pub use evaluator::{AbortHandle, Evaluator};
pub use frame::Frame;
pub use metrics::{summarize, DatasetReport, MetricRecord, Summary, TrajectoryBundle};
pub use predictor::{Hypothesis, Predictor};
pub use sampler::{Window, WindowSampler};
pub use store::TrackStore;
pub use track::{Observation, Track};

use nalgebra as na;
use std::fmt;

pub type AgentId = u32;
pub type DetectionId = u64;

pub trait Float:
    num_traits::FromPrimitive + na::RealField + Copy + fmt::Debug + PartialEq + 'static
{
}

impl<T> Float for T where
    T: num_traits::FromPrimitive + na::RealField + Copy + fmt::Debug + PartialEq + 'static
{
}
