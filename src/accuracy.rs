//! Directional accuracy of the wind-extent hypothesis
//!
//! The hypothesis: the quadrant with the largest wind radius lies 45 to 90 degrees
//! clockwise of the heading the storm takes from that fix.
//!
//! For each pair of consecutive fixes, the extents of the earlier fix are searched for a
//! dominant quadrant. The 64 kt radii (the last four in a row) are tried first, then 50 kt,
//! then 34 kt. A group whose four values are identical carries no direction and is skipped.
//! If every group is skipped the pair is indeterminate and left out of the statistic.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use common::hurdat::{Fix, Quadrant, RadiiClass, StormTrack, WindExtents};
use common::maths::wrap_degrees;
use common::structs::{Geodesy, Vincenty};

use crate::track::TrackGeometry;

/// Order in which extent groups are searched for a dominant quadrant
pub const GROUP_PRIORITY: [RadiiClass; 3] = [RadiiClass::Kt64, RadiiClass::Kt50, RadiiClass::Kt34];

/// Offsets (degrees clockwise from the heading) of the expected quadrant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HypothesisWindow {
    pub low_offset_deg: f64,
    pub high_offset_deg: f64,
}

impl Default for HypothesisWindow {
    fn default() -> Self {
        Self {
            low_offset_deg: 45.0,
            high_offset_deg: 90.0,
        }
    }
}

impl HypothesisWindow {
    /// `(low, high)` for a given heading, both in `[0, 360)`
    pub fn bounds(&self, bearing: f64) -> (f64, f64) {
        (
            wrap_degrees(bearing + self.low_offset_deg),
            wrap_degrees(bearing + self.high_offset_deg),
        )
    }
}

/// A small set of quadrants, iterated in index order
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct QuadrantSet(u8);

impl QuadrantSet {
    pub const EMPTY: Self = Self(0);

    pub fn insert(&mut self, quadrant: Quadrant) {
        self.0 |= 1 << quadrant.index();
    }

    pub fn contains(&self, quadrant: Quadrant) -> bool {
        self.0 & (1 << quadrant.index()) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Quadrant> + '_ {
        Quadrant::ALL.into_iter().filter(|q| self.contains(*q))
    }
}

impl FromIterator<Quadrant> for QuadrantSet {
    fn from_iter<T: IntoIterator<Item = Quadrant>>(iter: T) -> Self {
        let mut set = Self::EMPTY;
        for q in iter {
            set.insert(q);
        }
        set
    }
}

impl fmt::Debug for QuadrantSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

fn is_uniform(group: &[Option<u16>; 4]) -> bool {
    group.iter().all(|v| *v == group[0])
}

/// The first non-uniform group in [`GROUP_PRIORITY`] and every quadrant tied at its maximum.
///
/// Unrecorded radii never take part in the maximum. Returns `None` when all groups are uniform.
pub fn dominant_quadrants(extents: &WindExtents) -> Option<(RadiiClass, QuadrantSet)> {
    GROUP_PRIORITY.into_iter().find_map(|class| {
        let group = extents.group(class);
        if is_uniform(group) {
            return None;
        }
        let max = group.iter().flatten().max()?;
        let candidates = Quadrant::ALL
            .into_iter()
            .filter(|q| group[q.index()] == Some(*max))
            .collect();
        Some((class, candidates))
    })
}

/// Strictly inside the quadrant; the boundaries belong to neither side
fn within(quadrant: Quadrant, angle: f64) -> bool {
    quadrant.start_bearing() < angle && angle < quadrant.end_bearing()
}

/// Outcome for one pair of consecutive fixes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairCase {
    /// Every extent group is uniform; the pair is not counted
    Indeterminate,
    Evaluated {
        class: RadiiClass,
        candidates: QuadrantSet,
        bearing: f64,
        /// First candidate (in index order) inside the expected window
        matched: Option<Quadrant>,
    },
}

impl PairCase {
    pub fn is_case(&self) -> bool {
        matches!(self, Self::Evaluated { .. })
    }

    pub fn is_accurate(&self) -> bool {
        matches!(self, Self::Evaluated { matched: Some(_), .. })
    }
}

/// Accurate pairs out of all counted pairs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accuracy {
    pub accurate: u32,
    pub cases: u32,
}

impl Accuracy {
    /// `None` when there are no cases
    pub fn ratio(&self) -> Option<f64> {
        (self.cases > 0).then(|| self.accurate as f64 / self.cases as f64)
    }

    pub fn record(&mut self, case: &PairCase) {
        if case.is_case() {
            self.cases += 1;
        }
        if case.is_accurate() {
            self.accurate += 1;
        }
    }
}

impl Add for Accuracy {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            accurate: self.accurate + rhs.accurate,
            cases: self.cases + rhs.cases,
        }
    }
}

impl AddAssign for Accuracy {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Accuracy {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ratio() {
            Some(r) => write!(f, "{}/{} ({:.1}%)", self.accurate, self.cases, r * 100.0),
            None => write!(f, "no cases"),
        }
    }
}

/// Tests the hypothesis against a track
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier<G = Vincenty> {
    geometry: TrackGeometry<G>,
    window: HypothesisWindow,
}

impl Classifier<Vincenty> {
    pub fn wgs84(window: HypothesisWindow) -> Self {
        Self {
            geometry: TrackGeometry::wgs84(),
            window,
        }
    }
}

impl<G: Geodesy> Classifier<G> {
    pub fn new(geometry: TrackGeometry<G>, window: HypothesisWindow) -> Self {
        Self { geometry, window }
    }

    pub fn geometry(&self) -> &TrackGeometry<G> {
        &self.geometry
    }

    pub fn window(&self) -> HypothesisWindow {
        self.window
    }

    pub fn classify_pair(&self, from: &Fix, to: &Fix) -> PairCase {
        let Some((class, candidates)) = dominant_quadrants(&from.wind_extents) else {
            return PairCase::Indeterminate;
        };
        let bearing = self.geometry.segment_bearing(from, to);
        let (low, high) = self.window.bounds(bearing);
        let matched = candidates
            .iter()
            .find(|&q| within(q, low) || within(q, high));
        PairCase::Evaluated {
            class,
            candidates,
            bearing,
            matched,
        }
    }

    /// One case per pair of consecutive fixes
    pub fn cases<'a>(&'a self, track: &'a StormTrack) -> impl Iterator<Item = PairCase> + 'a {
        track
            .fixes
            .windows(2)
            .map(move |pair| self.classify_pair(&pair[0], &pair[1]))
    }

    pub fn accuracy(&self, track: &StormTrack) -> Accuracy {
        let mut acc = Accuracy::default();
        for case in self.cases(track) {
            acc.record(&case);
        }
        acc
    }
}
