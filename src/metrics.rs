use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_derive::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::{AgentId, DetectionId};

/// Absolute positions of one scored window, for external rendering
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrajectoryBundle {
    pub agent: AgentId,
    pub detection_id: DetectionId,
    pub observed: Vec<[f32; 2]>,
    pub predicted: Vec<[f32; 2]>,

    // masked steps are `None`
    #[serde(rename = "true")]
    pub truth: Vec<Option<[f32; 2]>>,

    pub ts: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub agent: AgentId,
    pub detection_id: DetectionId,
    pub timestamp: f32,
    pub ade: f32,
    pub fde: f32,
    pub valid_steps: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trajectories: Option<TrajectoryBundle>,
}

/// Timestamp usable as an ordered map key
#[derive(Debug, Clone, Copy)]
pub struct TimeKey(pub f32);

impl PartialEq for TimeKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimeKey {}

impl PartialOrd for TimeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatasetReport {
    pub name: String,
    pub ade: f32,
    pub fde: f32,
    pub windows: usize,
    pub skipped: usize,
    pub records: Vec<MetricRecord>,
}

impl DatasetReport {
    /// Averages per-window scores; a dataset without any is `EmptyDataset`.
    pub fn from_records(name: &str, records: Vec<MetricRecord>, skipped: usize) -> Result<Self> {
        if records.is_empty() {
            return Err(Error::EmptyDataset(name.to_string()));
        }

        let count = records.len() as f32;
        let (ade_sum, fde_sum) = records
            .iter()
            .fold((0.0, 0.0), |(a, f), r| (a + r.ade, f + r.fde));

        Ok(Self {
            name: name.to_string(),
            ade: ade_sum / count,
            fde: fde_sum / count,
            windows: records.len(),
            skipped,
            records,
        })
    }

    pub fn bundles(&self) -> impl Iterator<Item = &TrajectoryBundle> {
        self.records.iter().filter_map(|r| r.trajectories.as_ref())
    }

    pub fn by_timestamp(&self) -> BTreeMap<TimeKey, Vec<&TrajectoryBundle>> {
        let mut map: BTreeMap<_, Vec<_>> = BTreeMap::new();
        for bundle in self.bundles() {
            map.entry(TimeKey(bundle.ts)).or_default().push(bundle);
        }

        map
    }

    pub fn by_detection(&self) -> BTreeMap<DetectionId, Vec<&TrajectoryBundle>> {
        let mut map: BTreeMap<_, Vec<_>> = BTreeMap::new();
        for bundle in self.bundles() {
            map.entry(bundle.detection_id).or_default().push(bundle);
        }

        map
    }
}

/// Results of a run over several datasets
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Summary {
    pub reports: Vec<DatasetReport>,
    pub excluded: Vec<String>,
    pub ade: f32,
    pub fde: f32,
}

impl Summary {
    /// Empty datasets are excluded from the average; any other error is returned.
    pub fn from_results<I>(results: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<DatasetReport>>,
    {
        let mut reports = Vec::new();
        let mut excluded = Vec::new();

        for result in results {
            match result {
                Ok(report) => reports.push(report),
                Err(Error::EmptyDataset(name)) => {
                    warn!(dataset = %name, "no qualifying windows, excluded from average");
                    excluded.push(name);
                }
                Err(err) => return Err(err),
            }
        }

        if reports.is_empty() {
            return Err(Error::EmptyRun);
        }

        let count = reports.len() as f32;
        let ade = reports.iter().map(|r| r.ade).sum::<f32>() / count;
        let fde = reports.iter().map(|r| r.fde).sum::<f32>() / count;

        Ok(Self {
            reports,
            excluded,
            ade,
            fde,
        })
    }
}

/// Cross-dataset summary, see [`Summary::from_results`].
#[inline]
pub fn summarize<I>(results: I) -> Result<Summary>
where
    I: IntoIterator<Item = Result<DatasetReport>>,
{
    Summary::from_results(results)
}
