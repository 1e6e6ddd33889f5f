/*!
 * Timecode and mode model.
 *
 * A subtitle position is either an elapsed time (`Mode::Time`) or a frame
 * count (`Mode::Frame`) interpreted against a document-level frame rate.
 * Frame rates are exact rationals so that frame to time conversion is done in
 * integer arithmetic:
 *
 * - `to_time` computes `frame * den / num` seconds exactly and rounds once, to
 *   the nearest nanosecond (ties upward).
 * - `to_frame` rounds to the nearest frame, ties toward positive infinity, so
 *   `to_frame(to_time(f, r), r) == f` for every frame count and supported rate.
 *
 * Both terms of a rate fit in 32 bits, so the intermediate products of either
 * conversion fit in a `u128`. A result outside the `Duration` or `u64` range
 * is reported as `InvalidPosition`.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{Result, SubtitleError};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Highest accepted frame rate; keeps sub-nanosecond rounding below half a frame
const MAX_FRAME_RATE: u64 = 1_000_000;

/// Largest numerator or denominator of a reduced frame rate
const MAX_RATE_TERM: u64 = u32::MAX as u64;

/// How positions of a document are expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Elapsed time
    Time,
    /// Frame counts against a frame rate
    Frame,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Time => write!(f, "time"),
            Mode::Frame => write!(f, "frame"),
        }
    }
}

impl FromStr for Mode {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "time" => Ok(Mode::Time),
            "frame" => Ok(Mode::Frame),
            other => Err(SubtitleError::Unsupported(format!("unknown mode '{}'", other))),
        }
    }
}

/// Exact rational frame rate, always stored in lowest terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRate {
    numerator: u64,
    denominator: u64,
}

impl FrameRate {
    /// 23.976 frames per second, as written by most subtitle tools
    pub const FPS_23_976: FrameRate = FrameRate {
        numerator: 2997,
        denominator: 125,
    };

    /// Create a frame rate of `numerator / denominator` frames per second
    pub fn new(numerator: u64, denominator: u64) -> Result<Self> {
        if numerator == 0 || denominator == 0 {
            return Err(SubtitleError::InvalidFrameRate(format!(
                "{}/{} is not a positive rate",
                numerator, denominator
            )));
        }
        let divisor = gcd(numerator, denominator);
        let rate = Self {
            numerator: numerator / divisor,
            denominator: denominator / divisor,
        };
        if rate.numerator > MAX_RATE_TERM || rate.denominator > MAX_RATE_TERM {
            return Err(SubtitleError::InvalidFrameRate(format!(
                "{}/{} needs terms above {} once reduced",
                rate.numerator, rate.denominator, MAX_RATE_TERM
            )));
        }
        if rate.numerator / rate.denominator >= MAX_FRAME_RATE {
            return Err(SubtitleError::InvalidFrameRate(format!(
                "{} exceeds {} frames per second",
                rate, MAX_FRAME_RATE
            )));
        }
        Ok(rate)
    }

    /// Whole frames per second, e.g. 25
    pub fn integer(fps: u64) -> Result<Self> {
        Self::new(fps, 1)
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// Approximate floating point value, for display only
    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Exact decimal representation, or `None` when the decimal expansion
    /// does not terminate (e.g. 24000/1001)
    pub fn to_decimal_string(&self) -> Option<String> {
        let mut digits = 0u32;
        let mut scale: u128 = 1;
        while scale % self.denominator as u128 != 0 {
            digits += 1;
            scale *= 10;
            if digits > 18 {
                return None;
            }
        }
        let scaled = self.numerator as u128 * (scale / self.denominator as u128);
        let whole = scaled / scale;
        if digits == 0 {
            return Some(whole.to_string());
        }
        let fraction = format!("{:0width$}", scaled % scale, width = digits as usize);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            Some(whole.to_string())
        } else {
            Some(format!("{}.{}", whole, fraction))
        }
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal_string() {
            Some(decimal) => write!(f, "{}", decimal),
            None => write!(f, "{}/{}", self.numerator, self.denominator),
        }
    }
}

impl FromStr for FrameRate {
    type Err = SubtitleError;

    /// Accepts `25`, `23.976` or `24000/1001`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || SubtitleError::InvalidFrameRate(format!("'{}' is not a frame rate", s));

        if let Some((num, den)) = s.split_once('/') {
            let num: u64 = parse_digits(num.trim()).ok_or_else(invalid)?;
            let den: u64 = parse_digits(den.trim()).ok_or_else(invalid)?;
            return Self::new(num, den);
        }

        let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
        if whole.is_empty() || fraction.len() > 9 {
            return Err(invalid());
        }
        let whole = parse_digits(whole).ok_or_else(invalid)?;
        if fraction.is_empty() {
            if s.ends_with('.') {
                return Err(invalid());
            }
            return Self::new(whole, 1);
        }
        let fraction_value = parse_digits(fraction).ok_or_else(invalid)?;
        let scale = 10u64.pow(fraction.len() as u32);
        let numerator = whole
            .checked_mul(scale)
            .and_then(|n| n.checked_add(fraction_value))
            .ok_or_else(invalid)?;
        Self::new(numerator, scale)
    }
}

impl Serialize for FrameRate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FrameRate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a string made only of ASCII digits
fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Convert a frame count to elapsed time
pub fn to_time(frame: u64, rate: FrameRate) -> Result<Duration> {
    // nanos = frame * den * 1e9 / num, rounded half up
    let dividend = frame as u128 * rate.denominator as u128 * NANOS_PER_SEC;
    let divisor = rate.numerator as u128;
    let nanos = (2 * dividend + divisor) / (2 * divisor);
    duration_from_nanos(nanos).ok_or_else(|| {
        SubtitleError::InvalidPosition(format!("frame {} at {} fps is beyond the time range", frame, rate))
    })
}

/// Convert elapsed time to the nearest frame, ties toward positive infinity
pub fn to_frame(time: Duration, rate: FrameRate) -> Result<u64> {
    let dividend = time.as_nanos() * rate.numerator as u128;
    let divisor = rate.denominator as u128 * NANOS_PER_SEC;
    let frames = (2 * dividend + divisor) / (2 * divisor);
    u64::try_from(frames).map_err(|_| {
        SubtitleError::InvalidPosition(format!(
            "{}s at {} fps is beyond the frame range",
            time.as_secs(),
            rate
        ))
    })
}

/// `None` when the value does not fit a `Duration`
pub(crate) fn duration_from_nanos(nanos: u128) -> Option<Duration> {
    let secs = u64::try_from(nanos / NANOS_PER_SEC).ok()?;
    Some(Duration::new(secs, (nanos % NANOS_PER_SEC) as u32))
}

/// Split a duration into hours, minutes, seconds and nanoseconds
pub(crate) fn clock_parts(time: Duration) -> (u64, u64, u64, u32) {
    let secs = time.as_secs();
    (secs / 3600, (secs % 3600) / 60, secs % 60, time.subsec_nanos())
}

/// Round a duration to a multiple of `unit_nanos`, ties upward. At the very
/// top of the `Duration` range the value rounds down instead.
pub(crate) fn round_to_unit(time: Duration, unit_nanos: u128) -> Duration {
    let nanos = time.as_nanos();
    let units = (2 * nanos + unit_nanos) / (2 * unit_nanos);
    duration_from_nanos(units * unit_nanos)
        .or_else(|| duration_from_nanos(nanos / unit_nanos * unit_nanos))
        .unwrap_or(time)
}

/// Parse `H:MM:SS<sep>fraction` where the fraction has exactly `fraction_digits` digits
pub(crate) fn parse_clock(value: &str, separator: char, fraction_digits: usize) -> Option<Duration> {
    let (clock, fraction) = value.trim().rsplit_once(separator)?;
    if fraction.len() != fraction_digits {
        return None;
    }
    let fraction = parse_digits(fraction)?;
    let parts: Vec<&str> = clock.split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    let hours = parse_digits(parts[0])?;
    let minutes = parse_digits(parts[1])?;
    let seconds = parse_digits(parts[2])?;
    if minutes >= 60 || seconds >= 60 || parts[1].len() != 2 || parts[2].len() != 2 {
        return None;
    }
    let nanos = fraction as u128 * 10u128.pow(9 - fraction_digits as u32);
    let total = (hours as u128 * 3600 + minutes as u128 * 60 + seconds as u128) * NANOS_PER_SEC + nanos;
    duration_from_nanos(total)
}

/// A position on the timeline, in either mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// Elapsed time since the start of the video
    Time(Duration),
    /// Frame count since the start of the video
    Frame(u64),
}

/// Signed amount to move a position by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offset {
    Milliseconds(i64),
    Frames(i64),
}

impl Position {
    pub fn mode(&self) -> Mode {
        match self {
            Position::Time(_) => Mode::Time,
            Position::Frame(_) => Mode::Frame,
        }
    }

    pub fn as_time(&self) -> Option<Duration> {
        match self {
            Position::Time(time) => Some(*time),
            Position::Frame(_) => None,
        }
    }

    pub fn as_frame(&self) -> Option<u64> {
        match self {
            Position::Frame(frame) => Some(*frame),
            Position::Time(_) => None,
        }
    }

    /// Re-express the position in `target` mode
    pub fn convert(self, target: Mode, rate: FrameRate) -> Result<Position> {
        match (self, target) {
            (Position::Frame(frame), Mode::Time) => to_time(frame, rate).map(Position::Time),
            (Position::Time(time), Mode::Frame) => to_frame(time, rate).map(Position::Frame),
            (position, _) => Ok(position),
        }
    }

    /// Move the position by a signed offset of the same mode
    pub fn offset(self, by: Offset) -> Result<Position> {
        match (self, by) {
            (Position::Time(time), Offset::Milliseconds(ms)) => {
                let nanos = time.as_nanos() as i128 + ms as i128 * 1_000_000;
                if nanos < 0 {
                    return Err(SubtitleError::InvalidPosition(format!(
                        "shifting {} by {}ms goes below zero",
                        self, ms
                    )));
                }
                duration_from_nanos(nanos as u128).map(Position::Time).ok_or_else(|| {
                    SubtitleError::InvalidPosition(format!("shifting {} by {}ms leaves the time range", self, ms))
                })
            }
            (Position::Frame(frame), Offset::Frames(count)) => frame
                .checked_add_signed(count)
                .map(Position::Frame)
                .ok_or_else(|| {
                    SubtitleError::InvalidPosition(format!(
                        "shifting frame {} by {} leaves the frame range",
                        frame, count
                    ))
                }),
            _ => Err(SubtitleError::InvalidPosition(format!(
                "offset {:?} does not match {} mode",
                by,
                self.mode()
            ))),
        }
    }
}

impl PartialOrd for Position {
    /// Positions of different modes are not comparable
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Position::Time(a), Position::Time(b)) => a.partial_cmp(b),
            (Position::Frame(a), Position::Frame(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Time(time) => {
                let (h, m, s, nanos) = clock_parts(*time);
                write!(f, "{:02}:{:02}:{:02}.{:03}", h, m, s, nanos / 1_000_000)
            }
            Position::Frame(frame) => write!(f, "frame {}", frame),
        }
    }
}
