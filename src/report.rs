use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::summary::{StormSummary, Summary};

/// Results of one run, as written with `--json`
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Report {
    /// Dataset file the storms were read from
    pub dataset: String,
    pub storms: Vec<StormSummary>,
    pub summary: Summary,
    /// Only present when at least one pair was counted
    pub accuracy_ratio: Option<f64>,
}

impl Report {
    pub fn new(dataset: impl Into<String>, storms: Vec<StormSummary>, summary: Summary) -> Self {
        Self {
            dataset: dataset.into(),
            accuracy_ratio: summary.accuracy.ratio(),
            storms,
            summary,
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("could not open {}", path.display()))?;
        let reader = io::BufReader::new(file);
        let report = serde_json::from_reader(reader).context("could not deserialize report")?;
        Ok(report)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("could not create {}", path.display()))?;
        let writer = io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).context("could not serialize report")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accuracy::Accuracy;

    #[test]
    fn ratio_is_left_out_without_cases() {
        let report = Report::new("a.txt", Vec::new(), Summary::default());
        assert_eq!(report.accuracy_ratio, None);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["accuracy_ratio"].is_null());

        let summary = Summary {
            accuracy: Accuracy {
                accurate: 1,
                cases: 4,
            },
            ..Default::default()
        };
        assert_eq!(Report::new("a.txt", Vec::new(), summary).accuracy_ratio, Some(0.25));
    }
}
