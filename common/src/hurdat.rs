//! HURDAT2 best-track records and the reader that produces them.
//!
//! A HURDAT2 file is a sequence of storms. Each storm is a header line
//! `ID, NAME, ROWS,` followed by exactly `ROWS` detail lines:
//!
//! ```text
//! AL172010,               OTTO,     47,
//! 20101006, 1200,  , LO, 21.6N,  64.4W,  25, 1009,    0,    0,    0,    0,    0,    0,    0,    0,    0,    0,    0,    0,
//! ```
//!
//! Numeric fields use `-999` for "not recorded"; the reader turns those into `None`.

use std::fmt;
use std::io::{self, BufRead, Seek, SeekFrom};

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{SENTINEL, UNNAMED};
use crate::structs::{CoordinateError, Position};

/// Special-entry marker in the third column of a detail line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordIdentifier {
    ClosestApproach,
    Genesis,
    IntensityPeak,
    Landfall,
    MinimumPressure,
    RapidChange,
    StatusChange,
    TrackDetail,
    MaximumWind,
    Other(char),
}

impl RecordIdentifier {
    /// Blank fields mean "no marker"
    pub fn from_field(field: &str) -> Option<Self> {
        let mut chars = field.trim().chars();
        let letter = chars.next()?;
        if chars.next().is_some() {
            return Some(Self::Other(letter));
        }
        Some(match letter {
            'C' => Self::ClosestApproach,
            'G' => Self::Genesis,
            'I' => Self::IntensityPeak,
            'L' => Self::Landfall,
            'P' => Self::MinimumPressure,
            'R' => Self::RapidChange,
            'S' => Self::StatusChange,
            'T' => Self::TrackDetail,
            'W' => Self::MaximumWind,
            other => Self::Other(other),
        })
    }

    pub fn letter(self) -> char {
        match self {
            Self::ClosestApproach => 'C',
            Self::Genesis => 'G',
            Self::IntensityPeak => 'I',
            Self::Landfall => 'L',
            Self::MinimumPressure => 'P',
            Self::RapidChange => 'R',
            Self::StatusChange => 'S',
            Self::TrackDetail => 'T',
            Self::MaximumWind => 'W',
            Self::Other(c) => c,
        }
    }
}

/// Status of the system at a fix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    TropicalDepression,
    TropicalStorm,
    Hurricane,
    Extratropical,
    SubtropicalDepression,
    SubtropicalStorm,
    Low,
    TropicalWave,
    Disturbance,
    Other(String),
}

impl Status {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "TD" => Self::TropicalDepression,
            "TS" => Self::TropicalStorm,
            "HU" => Self::Hurricane,
            "EX" => Self::Extratropical,
            "SD" => Self::SubtropicalDepression,
            "SS" => Self::SubtropicalStorm,
            "LO" => Self::Low,
            "WV" => Self::TropicalWave,
            "DB" => Self::Disturbance,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::TropicalDepression => "TD",
            Self::TropicalStorm => "TS",
            Self::Hurricane => "HU",
            Self::Extratropical => "EX",
            Self::SubtropicalDepression => "SD",
            Self::SubtropicalStorm => "SS",
            Self::Low => "LO",
            Self::TropicalWave => "WV",
            Self::Disturbance => "DB",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Wind speed threshold of a group of extent radii
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadiiClass {
    Kt34,
    Kt50,
    Kt64,
}

impl RadiiClass {
    /// In file order
    pub const ALL: [Self; 3] = [Self::Kt34, Self::Kt50, Self::Kt64];

    fn index(self) -> usize {
        self as usize
    }
}

/// Compass quadrant of a wind extent radius
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quadrant {
    NorthEast = 0,
    SouthEast = 1,
    SouthWest = 2,
    NorthWest = 3,
}

impl Quadrant {
    pub const ALL: [Self; 4] = [
        Self::NorthEast,
        Self::SouthEast,
        Self::SouthWest,
        Self::NorthWest,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Bearing (degrees clockwise from north) where the quadrant starts
    pub fn start_bearing(self) -> f64 {
        self.index() as f64 * 90.0
    }

    /// Bearing where the quadrant ends
    pub fn end_bearing(self) -> f64 {
        (self.index() + 1) as f64 * 90.0
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NorthEast => "NE",
            Self::SouthEast => "SE",
            Self::SouthWest => "SW",
            Self::NorthWest => "NW",
        })
    }
}

/// The twelve wind radii of a fix (nautical miles), in file order:
/// 34 kt, 50 kt and 64 kt groups, each as NE, SE, SW, NW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindExtents(pub [[Option<u16>; 4]; 3]);

impl WindExtents {
    pub fn group(&self, class: RadiiClass) -> &[Option<u16>; 4] {
        &self.0[class.index()]
    }

    /// Build from raw HURDAT2 values, where `-999` is "not recorded".
    /// Values are checked the same way as the extent columns of a detail line.
    pub fn from_raw(values: [i32; 12]) -> Result<Self, RowError> {
        let mut groups = [[None; 4]; 3];
        for (i, v) in values.into_iter().enumerate() {
            groups[i / 4][i % 4] = measurement(FIRST_EXTENT_COLUMN + i, v as i64)?;
        }
        Ok(Self(groups))
    }
}

/// One timestamped observation of a storm
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub timestamp: NaiveDateTime,
    pub record_identifier: Option<RecordIdentifier>,
    pub status: Status,
    pub position: Position,
    /// Knots
    pub max_wind: Option<u16>,
    /// Millibars
    pub min_pressure: Option<u16>,
    pub wind_extents: WindExtents,
    /// Nautical miles, only present in newer releases
    pub max_wind_radius: Option<u16>,
}

impl Fix {
    /// A fix with nothing recorded besides time and place
    pub fn new(timestamp: NaiveDateTime, position: Position) -> Self {
        Self {
            timestamp,
            record_identifier: None,
            status: Status::Other(String::new()),
            position,
            max_wind: None,
            min_pressure: None,
            wind_extents: WindExtents::default(),
            max_wind_radius: None,
        }
    }

    pub fn with_wind(mut self, knots: u16) -> Self {
        self.max_wind = Some(knots);
        self
    }

    pub fn with_extents(mut self, extents: WindExtents) -> Self {
        self.wind_extents = extents;
        self
    }

    pub fn with_record_identifier(mut self, record_identifier: RecordIdentifier) -> Self {
        self.record_identifier = Some(record_identifier);
        self
    }

    pub fn is_landfall(&self) -> bool {
        self.record_identifier == Some(RecordIdentifier::Landfall)
    }
}

/// Ocean basin encoded in the first two letters of a storm id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Basin {
    Atlantic,
    EasternPacific,
    CentralPacific,
    Unknown,
}

/// All fixes of one storm, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct StormTrack {
    /// Basin code + sequence number + year, e.g. `AL172010`
    pub id: String,
    pub name: String,
    pub fix_count: usize,
    pub fixes: Vec<Fix>,
}

impl StormTrack {
    pub fn new(id: impl Into<String>, name: impl Into<String>, fixes: Vec<Fix>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fix_count: fixes.len(),
            fixes,
        }
    }

    pub fn basin(&self) -> Basin {
        match self.id.get(..2) {
            Some("AL") => Basin::Atlantic,
            Some("EP") => Basin::EasternPacific,
            Some("CP") => Basin::CentralPacific,
            _ => Basin::Unknown,
        }
    }

    /// Year from the last four digits of the id, or of the first fix if the id has none
    pub fn year(&self) -> Option<i32> {
        self.id
            .get(self.id.len().saturating_sub(4)..)
            .filter(|y| y.len() == 4)
            .and_then(|y| y.parse().ok())
            .or_else(|| self.fixes.first().map(|f| f.timestamp.year()))
    }

    /// `None` for systems HURDAT2 lists as `UNNAMED`
    pub fn display_name(&self) -> Option<&str> {
        display_name(&self.name)
    }

    /// First and last fix times
    pub fn date_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.fixes.first()?.timestamp, self.fixes.last()?.timestamp))
    }

    /// Whether any fix reaches `threshold_kt`
    pub fn reaches_wind(&self, threshold_kt: u16) -> bool {
        self.fixes
            .iter()
            .filter_map(|f| f.max_wind)
            .any(|w| w >= threshold_kt)
    }
}

/// A storm name as shown to users; `None` for blank and `UNNAMED` names
pub fn display_name(name: &str) -> Option<&str> {
    (!name.is_empty() && name != UNNAMED).then_some(name)
}

/// What is wrong with a single detail line
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("expected 20 or 21 fields, found {0}")]
    FieldCount(usize),
    #[error("field {column} ({value:?}) is not an integer")]
    NotAnInteger { column: usize, value: String },
    #[error("field {column} ({value}) is out of range")]
    OutOfRange { column: usize, value: i64 },
    #[error("invalid date/time {date:?} {time:?}")]
    Timestamp { date: String, time: String },
    #[error(transparent)]
    Position(#[from] CoordinateError),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("could not read HURDAT2 input")]
    Io(#[from] io::Error),
    #[error("line {line}: malformed header, expected 3 fields but found {found}")]
    MalformedHeader { line: usize, found: usize },
    #[error("line {line}: storm {storm_id} has invalid row count {value:?}")]
    InvalidFixCount {
        line: usize,
        storm_id: String,
        value: String,
    },
    #[error("line {line}: storm {storm_id}: {kind}")]
    MalformedRow {
        line: usize,
        storm_id: String,
        kind: RowError,
    },
    #[error("storm {storm_id} ended after {found} of {expected} rows")]
    Truncated {
        storm_id: String,
        expected: usize,
        found: usize,
    },
}

impl ParseError {
    /// Id of the storm that was discarded, if the header could be read
    pub fn storm_id(&self) -> Option<&str> {
        match self {
            Self::InvalidFixCount { storm_id, .. }
            | Self::MalformedRow { storm_id, .. }
            | Self::Truncated { storm_id, .. } => Some(storm_id),
            Self::Io(_) | Self::MalformedHeader { .. } => None,
        }
    }
}

/// Reads storms one at a time from a HURDAT2 source.
///
/// The reader owns the read cursor. Sequential reads continue from wherever the previous
/// read stopped; a lookup by id rewinds to the start first. A single reader must not be
/// shared between concurrent parses.
pub struct HurdatReader<R> {
    inner: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> HurdatReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: 0,
            buf: String::new(),
        }
    }

    /// Number of lines consumed so far
    pub fn line_number(&self) -> usize {
        self.line
    }

    /// Read the next storm after the cursor. `Ok(None)` means the input is exhausted.
    ///
    /// On a bad detail line the remaining rows of that storm are still consumed, so the
    /// cursor ends up on the next header and reading can continue.
    pub fn next_storm(&mut self) -> Result<Option<StormTrack>, ParseError> {
        loop {
            match self.read_line()? {
                None => return Ok(None),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return self.read_storm(&line).map(Some),
            }
        }
    }

    /// Iterate over the remaining storms
    pub fn storms(&mut self) -> Storms<'_, R> {
        Storms {
            reader: self,
            done: false,
        }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        if self.inner.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line += 1;
        Ok(Some(self.buf.trim_end_matches(['\n', '\r']).to_owned()))
    }

    fn read_storm(&mut self, header: &str) -> Result<StormTrack, ParseError> {
        let result = self.read_storm_inner(header);
        if let Err(e) = &result {
            match e.storm_id() {
                Some(id) => tracing::warn!(storm = id, "discarding storm: {e}"),
                None => tracing::warn!("skipping line: {e}"),
            }
        }
        result
    }

    fn read_storm_inner(&mut self, header: &str) -> Result<StormTrack, ParseError> {
        let (id, name, count) = parse_header(header, self.line)?;

        let mut fixes = Vec::with_capacity(count);
        let mut first_error = None;
        for found in 0..count {
            let Some(row) = self.read_line()? else {
                return Err(ParseError::Truncated {
                    storm_id: id,
                    expected: count,
                    found,
                });
            };
            if first_error.is_some() {
                continue;
            }
            match parse_fix(&row) {
                Ok(fix) => fixes.push(fix),
                Err(kind) => {
                    first_error = Some(ParseError::MalformedRow {
                        line: self.line,
                        storm_id: id.clone(),
                        kind,
                    })
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::trace!(storm = %id, rows = count, "parsed storm");
                Ok(StormTrack {
                    id,
                    name,
                    fix_count: count,
                    fixes,
                })
            }
        }
    }
}

impl<R: BufRead + Seek> HurdatReader<R> {
    /// Move the cursor back to the first line
    pub fn rewind(&mut self) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(0))?;
        self.line = 0;
        Ok(())
    }

    /// Scan from the start of the source for the storm with the given id.
    /// `Ok(None)` means no header with that id exists.
    pub fn find_storm(&mut self, id: &str) -> Result<Option<StormTrack>, ParseError> {
        self.rewind()?;
        while let Some(line) = self.read_line()? {
            if header_id(&line) == Some(id) {
                return self.read_storm(&line).map(Some);
            }
        }
        Ok(None)
    }

    /// Look up `target_id` from the start, or read the next storm after the cursor
    pub fn parse_next(&mut self, target_id: Option<&str>) -> Result<Option<StormTrack>, ParseError> {
        match target_id {
            Some(id) => self.find_storm(id),
            None => self.next_storm(),
        }
    }
}

/// Iterator over storms; see [`HurdatReader::storms`]
pub struct Storms<'a, R> {
    reader: &'a mut HurdatReader<R>,
    done: bool,
}

impl<R: BufRead> Iterator for Storms<'_, R> {
    type Item = Result<StormTrack, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.reader.next_storm().transpose();
        // An I/O failure is not recoverable at a storm boundary
        if matches!(next, None | Some(Err(ParseError::Io(_)))) {
            self.done = true;
        }
        next
    }
}

fn split_fields(line: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() > 1 && fields.last() == Some(&"") {
        fields.pop();
    }
    fields
}

fn header_id(line: &str) -> Option<&str> {
    line.split(',').next().map(str::trim)
}

fn parse_header(line: &str, line_no: usize) -> Result<(String, String, usize), ParseError> {
    let fields = split_fields(line);
    let [id, name, count] = fields[..] else {
        return Err(ParseError::MalformedHeader {
            line: line_no,
            found: fields.len(),
        });
    };
    let count = count.parse().map_err(|_| ParseError::InvalidFixCount {
        line: line_no,
        storm_id: id.to_owned(),
        value: count.to_owned(),
    })?;
    Ok((id.to_owned(), name.to_owned(), count))
}

fn parse_timestamp(date: &str, time: &str) -> Result<NaiveDateTime, RowError> {
    fn digits(s: &str, range: std::ops::Range<usize>) -> Option<u32> {
        s.get(range)?.parse().ok()
    }

    let bad = || RowError::Timestamp {
        date: date.to_owned(),
        time: time.to_owned(),
    };
    if date.len() != 8 || time.len() != 4 || !(date.bytes().chain(time.bytes())).all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let year = digits(date, 0..4).ok_or_else(bad)?;
    let month = digits(date, 4..6).ok_or_else(bad)?;
    let day = digits(date, 6..8).ok_or_else(bad)?;
    let hour = digits(time, 0..2).ok_or_else(bad)?;
    let minute = digits(time, 2..4).ok_or_else(bad)?;

    let date = NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(bad)?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(bad)?;
    Ok(NaiveDateTime::new(date, time))
}

/// Zero-based field index of the first wind radius on a detail line
const FIRST_EXTENT_COLUMN: usize = 8;

fn parse_measurement(column: usize, value: &str) -> Result<Option<u16>, RowError> {
    let parsed: i64 = value.parse().map_err(|_| RowError::NotAnInteger {
        column,
        value: value.to_owned(),
    })?;
    measurement(column, parsed)
}

/// `None` for the sentinel; anything else must fit a `u16`
fn measurement(column: usize, value: i64) -> Result<Option<u16>, RowError> {
    if value == SENTINEL as i64 {
        return Ok(None);
    }
    u16::try_from(value)
        .map(Some)
        .map_err(|_| RowError::OutOfRange { column, value })
}

/// Parse one detail line
pub fn parse_fix(row: &str) -> Result<Fix, RowError> {
    let fields = split_fields(row);
    if !(20..=21).contains(&fields.len()) {
        return Err(RowError::FieldCount(fields.len()));
    }

    let numbers = fields[6..]
        .iter()
        .enumerate()
        .map(|(i, value)| parse_measurement(i + 6, value))
        .collect::<Result<Vec<_>, _>>()?;

    let timestamp = parse_timestamp(fields[0], fields[1])?;
    let position = Position::parse(fields[4], fields[5])?;

    let mut extents = [[None; 4]; 3];
    let first = FIRST_EXTENT_COLUMN - 6;
    for (i, v) in numbers[first..first + 12].iter().enumerate() {
        extents[i / 4][i % 4] = *v;
    }

    Ok(Fix {
        timestamp,
        record_identifier: RecordIdentifier::from_field(fields[2]),
        status: Status::from_code(fields[3]),
        position,
        max_wind: numbers[0],
        min_pressure: numbers[1],
        wind_extents: WindExtents(extents),
        max_wind_radius: numbers.get(14).copied().flatten(),
    })
}
