//! Per-storm results and per-year bookkeeping

use std::collections::BTreeMap;
use std::fmt;
use std::io::BufRead;

use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use common::constants::HURRICANE_THRESHOLD_KT;
use common::hurdat::{display_name, Basin, HurdatReader, ParseError, StormTrack};
use common::structs::{Geodesy, Vincenty};

use crate::accuracy::{Accuracy, Classifier, HypothesisWindow};
use crate::track::{landfall_count, max_wind, PeakWind, TrackSpeed};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Everything reported about a single storm
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StormSummary {
    pub id: String,
    pub name: String,
    pub basin: Basin,
    pub year: Option<i32>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub landfall_count: usize,
    pub max_wind: Option<PeakWind>,
    /// Nautical miles
    pub distance: f64,
    pub speed: TrackSpeed,
    pub accuracy: Accuracy,
    pub hurricane: bool,
}

impl fmt::Display for StormSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Storm {}", self.id)?;
        if let Some(name) = display_name(&self.name) {
            write!(f, " ({name})")?;
        }
        writeln!(f)?;
        if let (Some(start), Some(end)) = (self.start, self.end) {
            writeln!(
                f,
                "  Dates: {} to {}",
                start.format(TIME_FORMAT),
                end.format(TIME_FORMAT)
            )?;
        }
        writeln!(f, "  Landfalls: {}", self.landfall_count)?;
        match self.max_wind {
            Some(peak) => writeln!(
                f,
                "  Highest wind: {} kt at {}",
                peak.knots,
                peak.time.format(TIME_FORMAT)
            )?,
            None => writeln!(f, "  Highest wind: not recorded")?,
        }
        write!(
            f,
            "  Speed: max {:.2} kt, mean {:.2} kt",
            self.speed.max, self.speed.mean
        )
    }
}

/// Computes a [`StormSummary`] for each track
#[derive(Debug, Clone, Copy)]
pub struct Analyzer<G = Vincenty> {
    classifier: Classifier<G>,
    hurricane_threshold_kt: u16,
}

impl Default for Analyzer<Vincenty> {
    fn default() -> Self {
        Self::new(
            Classifier::wgs84(HypothesisWindow::default()),
            HURRICANE_THRESHOLD_KT,
        )
    }
}

impl<G: Geodesy> Analyzer<G> {
    pub fn new(classifier: Classifier<G>, hurricane_threshold_kt: u16) -> Self {
        Self {
            classifier,
            hurricane_threshold_kt,
        }
    }

    pub fn analyze(&self, track: &StormTrack) -> StormSummary {
        let geometry = self.classifier.geometry();
        let range = track.date_range();
        StormSummary {
            id: track.id.clone(),
            name: track.name.clone(),
            basin: track.basin(),
            year: track.year(),
            start: range.map(|r| r.0),
            end: range.map(|r| r.1),
            landfall_count: landfall_count(track),
            max_wind: max_wind(track),
            distance: geometry.track_distance(track),
            speed: geometry.track_speed(track),
            accuracy: self.classifier.accuracy(track),
            hurricane: track.reaches_wind(self.hurricane_threshold_kt),
        }
    }
}

impl<G: Geodesy + Sync> Analyzer<G> {
    /// Analyze every track, in parallel; the output keeps the input order
    pub fn analyze_all(&self, tracks: &[StormTrack]) -> Vec<StormSummary> {
        tracks.par_iter().map(|t| self.analyze(t)).collect()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YearSummary {
    pub storm_count: u32,
    pub hurricane_count: u32,
}

impl fmt::Display for YearSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} storms, {} hurricanes",
            self.storm_count, self.hurricane_count
        )
    }
}

/// Totals over a set of storms
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub years: BTreeMap<i32, YearSummary>,
    pub accuracy: Accuracy,
    /// Ids of storms discarded for format errors
    pub skipped: Vec<String>,
    /// Discarded entries whose header could not be read
    pub unidentified: u32,
}

impl Summary {
    pub fn record(&mut self, storm: &StormSummary) {
        if let Some(year) = storm.year {
            let entry = self.years.entry(year).or_default();
            entry.storm_count += 1;
            if storm.hurricane {
                entry.hurricane_count += 1;
            }
        }
        self.accuracy += storm.accuracy;
    }

    pub fn skip(&mut self, error: &ParseError) {
        match error.storm_id() {
            Some(id) => self.skipped.push(id.to_owned()),
            None => self.unidentified += 1,
        }
    }

    pub fn merge(&mut self, other: Summary) {
        for (year, counts) in other.years {
            let entry = self.years.entry(year).or_default();
            entry.storm_count += counts.storm_count;
            entry.hurricane_count += counts.hurricane_count;
        }
        self.accuracy += other.accuracy;
        self.skipped.extend(other.skipped);
        self.unidentified += other.unidentified;
    }

    pub fn storm_count(&self) -> u32 {
        self.years.values().map(|y| y.storm_count).sum()
    }
}

impl<'a> FromIterator<&'a StormSummary> for Summary {
    fn from_iter<T: IntoIterator<Item = &'a StormSummary>>(iter: T) -> Self {
        let mut summary = Self::default();
        for storm in iter {
            summary.record(storm);
        }
        summary
    }
}

/// Read every storm from `reader`. Malformed storms are noted in `summary` and skipped;
/// only an I/O failure stops the scan.
pub fn read_tracks<R: BufRead>(
    reader: &mut HurdatReader<R>,
    summary: &mut Summary,
) -> Result<Vec<StormTrack>, ParseError> {
    let mut tracks = Vec::new();
    for result in reader.storms() {
        match result {
            Ok(track) => tracks.push(track),
            Err(e @ ParseError::Io(_)) => return Err(e),
            Err(e) => summary.skip(&e),
        }
    }
    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::tests::{fix, t0};
    use crate::track::TrackGeometry;
    use chrono::Duration;
    use common::hurdat::{RecordIdentifier, WindExtents};
    use std::io::Cursor;

    fn otto() -> StormTrack {
        let mut extents = [0; 12];
        extents[8..].copy_from_slice(&[20, 40, 20, 10]);
        StormTrack::new(
            "AL172010",
            "OTTO",
            vec![
                fix(0, 21.6, -64.4)
                    .with_wind(45)
                    .with_extents(WindExtents::from_raw(extents).unwrap()),
                fix(6, 22.6, -64.4)
                    .with_wind(65)
                    .with_record_identifier(RecordIdentifier::Landfall),
                fix(12, 23.6, -64.4).with_wind(60),
            ],
        )
    }

    #[test]
    fn analyze_storm() {
        let s = Analyzer::default().analyze(&otto());
        assert_eq!(s.basin, Basin::Atlantic);
        assert_eq!(s.year, Some(2010));
        assert_eq!(s.start, Some(t0()));
        assert_eq!(s.end, Some(t0() + Duration::hours(12)));
        assert_eq!(s.landfall_count, 1);
        assert_eq!(
            s.max_wind,
            Some(PeakWind {
                knots: 65,
                time: t0() + Duration::hours(6)
            })
        );
        assert!(s.hurricane);
        // Heading north: window 45..90, SE is outside it
        assert_eq!(s.accuracy, Accuracy { accurate: 0, cases: 1 });
        assert!(s.speed.mean > 9.0 && s.speed.mean < 11.0);
    }

    #[test]
    fn threshold_is_configurable() {
        let analyzer = Analyzer::new(
            Classifier::new(TrackGeometry::wgs84(), HypothesisWindow::default()),
            70,
        );
        assert!(!analyzer.analyze(&otto()).hurricane);
    }

    #[test]
    fn parallel_analysis_keeps_order() {
        let tracks: Vec<_> = (0..20)
            .map(|i| {
                let mut t = otto();
                t.id = format!("AL{:02}2010", i + 1);
                t
            })
            .collect();
        let analyzer = Analyzer::default();
        let all = analyzer.analyze_all(&tracks);
        assert_eq!(all.len(), 20);
        for (t, s) in tracks.iter().zip(&all) {
            assert_eq!(*s, analyzer.analyze(t));
        }
    }

    #[test]
    fn years_are_counted() {
        let mut weak = otto();
        weak.id = "AL182010".into();
        for f in &mut weak.fixes {
            f.max_wind = Some(30);
        }
        let mut old = otto();
        old.id = "AL011851".into();

        let analyzer = Analyzer::default();
        let storms: Vec<_> = [otto(), weak, old].iter().map(|t| analyzer.analyze(t)).collect();
        let summary: Summary = storms.iter().collect();

        assert_eq!(
            summary.years[&2010],
            YearSummary {
                storm_count: 2,
                hurricane_count: 1
            }
        );
        assert_eq!(summary.years[&1851].hurricane_count, 1);
        assert_eq!(summary.storm_count(), 3);
        assert_eq!(summary.accuracy.cases, 3);
        assert_eq!(summary.years.keys().copied().collect::<Vec<_>>(), vec![1851, 2010]);
    }

    #[test]
    fn merge_is_order_independent() {
        let analyzer = Analyzer::default();
        let a: Summary = [analyzer.analyze(&otto())].iter().collect();
        let mut old = otto();
        old.id = "AL011851".into();
        let b: Summary = [analyzer.analyze(&old)].iter().collect();

        let mut ab = a.clone();
        ab.merge(b.clone());
        let mut ba = b;
        ba.merge(a);
        assert_eq!(ab, ba);
    }

    #[test]
    fn malformed_storms_are_skipped() {
        let text = "\
AL011851,            UNNAMED,      1,
18510625, 0000,  , HU, 28.0N,  94.8W,  80, -999, -999, -999, -999, -999, -999, -999, -999, -999, -999, -999, -999, -999,
AL021851,            UNNAMED,      1,
18510705, 0000,  , HU, 22.2N,  XX.XW,  80, -999, -999, -999, -999, -999, -999, -999, -999, -999, -999, -999, -999, -999,
bad header
AL031851,            UNNAMED,      1,
18510710, 1200,  , TS, 12.0N,  60.0W,  50, -999, -999, -999, -999, -999, -999, -999, -999, -999, -999, -999, -999, -999,
";
        let mut reader = HurdatReader::new(Cursor::new(text));
        let mut summary = Summary::default();
        let tracks = read_tracks(&mut reader, &mut summary).unwrap();
        let ids: Vec<_> = tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["AL011851", "AL031851"]);
        assert_eq!(summary.skipped, ["AL021851"]);
        assert_eq!(summary.unidentified, 1);
    }

    #[test]
    fn display_hides_unnamed() {
        let mut track = otto();
        track.name = "UNNAMED".into();
        let text = Analyzer::default().analyze(&track).to_string();
        assert!(text.starts_with("Storm AL172010\n"));
        assert!(text.contains("Highest wind: 65 kt at 2010-10-06 18:00"));
        assert!(text.contains("Landfalls: 1"));

        track.name.clear();
        let text = Analyzer::default().analyze(&track).to_string();
        assert!(text.starts_with("Storm AL172010\n"));

        let text = Analyzer::default().analyze(&otto()).to_string();
        assert!(text.starts_with("Storm AL172010 (OTTO)\n"));
    }
}
