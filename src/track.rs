//! Distances, bearings and speeds along a storm track

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use common::constants::METERS_PER_NAUTICAL_MILE;
use common::hurdat::{Fix, StormTrack};
use common::structs::{Geodesy, Vincenty};

/// Absolute time between two fixes in hours
pub fn elapsed_hours(a: &Fix, b: &Fix) -> f64 {
    (b.timestamp - a.timestamp).num_seconds().abs() as f64 / 3600.0
}

/// Highest recorded sustained wind and the first time it was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakWind {
    pub knots: u16,
    pub time: NaiveDateTime,
}

/// Scan the fixes in order; later fixes only replace the peak if strictly stronger.
/// Fixes without a recorded wind are ignored.
pub fn max_wind(track: &StormTrack) -> Option<PeakWind> {
    let mut peak: Option<PeakWind> = None;
    for fix in &track.fixes {
        let Some(knots) = fix.max_wind else { continue };
        if peak.map_or(true, |p| knots > p.knots) {
            peak = Some(PeakWind {
                knots,
                time: fix.timestamp,
            });
        }
    }
    peak
}

pub fn landfall_count(track: &StormTrack) -> usize {
    track.fixes.iter().filter(|f| f.is_landfall()).count()
}

/// Mean and maximum translation speed in knots
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackSpeed {
    pub mean: f64,
    pub max: f64,
}

/// Per-segment geometry between consecutive fixes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Nautical miles
    pub distance: f64,
    /// Degrees clockwise from north
    pub bearing: f64,
    pub hours: f64,
}

impl Segment {
    /// `None` for segments of zero duration
    pub fn speed(&self) -> Option<f64> {
        (self.hours > 0.0).then(|| self.distance / self.hours)
    }
}

/// Track geometry on top of a [`Geodesy`] provider
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackGeometry<G = Vincenty> {
    geodesy: G,
}

impl TrackGeometry<Vincenty> {
    /// Ellipsoidal geometry on WGS-84
    pub fn wgs84() -> Self {
        Self {
            geodesy: Vincenty::WGS84,
        }
    }
}

impl<G: Geodesy> TrackGeometry<G> {
    pub fn new(geodesy: G) -> Self {
        Self { geodesy }
    }

    /// Distance in nautical miles; exactly zero when the positions are equal
    pub fn segment_distance(&self, a: &Fix, b: &Fix) -> f64 {
        if a.position == b.position {
            0.0
        } else {
            self.geodesy.distance(&a.position, &b.position) / METERS_PER_NAUTICAL_MILE
        }
    }

    /// Initial bearing from `a` to `b` in `[0, 360)`; exactly zero when the positions are equal
    pub fn segment_bearing(&self, a: &Fix, b: &Fix) -> f64 {
        if a.position == b.position {
            0.0
        } else {
            self.geodesy.initial_bearing(&a.position, &b.position)
        }
    }

    pub fn segment(&self, a: &Fix, b: &Fix) -> Segment {
        Segment {
            distance: self.segment_distance(a, b),
            bearing: self.segment_bearing(a, b),
            hours: elapsed_hours(a, b),
        }
    }

    /// Segments between each pair of consecutive fixes
    pub fn segments<'a>(&'a self, track: &'a StormTrack) -> impl Iterator<Item = Segment> + 'a {
        track
            .fixes
            .windows(2)
            .map(move |pair| self.segment(&pair[0], &pair[1]))
    }

    /// Sum of all segment distances in nautical miles
    pub fn track_distance(&self, track: &StormTrack) -> f64 {
        track
            .fixes
            .windows(2)
            .map(|pair| self.segment_distance(&pair[0], &pair[1]))
            .sum()
    }

    /// Mean speed is total distance over the time from first to last fix; max speed is the
    /// fastest single segment. Both are zero for tracks without elapsed time.
    pub fn track_speed(&self, track: &StormTrack) -> TrackSpeed {
        let total_hours = match (track.fixes.first(), track.fixes.last()) {
            (Some(first), Some(last)) => elapsed_hours(first, last),
            _ => 0.0,
        };
        if total_hours == 0.0 {
            return TrackSpeed::default();
        }

        let mut distance = 0.0;
        let mut max = 0.0_f64;
        for pair in track.fixes.windows(2) {
            let d = self.segment_distance(&pair[0], &pair[1]);
            let hours = elapsed_hours(&pair[0], &pair[1]);
            distance += d;
            // A repeated timestamp has no defined speed
            if hours > 0.0 {
                max = max.max(d / hours);
            }
        }

        TrackSpeed {
            mean: distance / total_hours,
            max,
        }
    }
}
