use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::errors::{GradebookError, GradebookResult};

/// A score quantity with 0.5 granularity, stored as a count of half points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Points(i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PointsError {
    #[error("not a decimal number")]
    Invalid,
    #[error("must be non-negative")]
    Negative,
    #[error("must be a multiple of 0.5")]
    NotHalfStep,
}

impl Points {
    pub const ZERO: Self = Self(0);

    pub const fn from_halves(halves: i64) -> Self {
        Self(halves)
    }

    pub const fn whole(points: i64) -> Self {
        Self(points * 2)
    }

    pub const fn halves(self) -> i64 {
        self.0
    }

    /// Converts a float that sits exactly on a half step.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let doubled = value * 2.0;
        if doubled.fract() != 0.0 || doubled.abs() > i64::MAX as f64 {
            return None;
        }
        Some(Self(doubled as i64))
    }

    /// Reads a persisted column, treating off-step values as corrupt data.
    pub(crate) fn from_stored(value: f64, column: &str) -> GradebookResult<Self> {
        Self::from_f64(value).ok_or_else(|| {
            GradebookError::internal(format!("{column} = {value}"), "Stored points are not on a 0.5 step")
        })
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 2.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Parses a plain decimal such as `2`, `1.5` or `3.50`.
    pub fn parse(raw: &str) -> Result<Self, PointsError> {
        let raw = raw.trim();
        let (negative, digits) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (digits, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(PointsError::Invalid);
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(PointsError::Invalid);
        }

        let whole: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| PointsError::Invalid)?
        };
        let half = match frac_part.trim_end_matches('0') {
            "" => 0,
            "5" => 1,
            _ => return Err(PointsError::NotHalfStep),
        };
        let halves =
            whole.checked_mul(2).and_then(|v| v.checked_add(half)).ok_or(PointsError::Invalid)?;

        if negative && halves != 0 {
            return Err(PointsError::Negative);
        }
        Ok(Self(halves))
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        if abs % 2 == 0 {
            write!(f, "{sign}{}", abs / 2)
        } else {
            write!(f, "{sign}{}.5", abs / 2)
        }
    }
}

impl Add for Points {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Points {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Points {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sum for Points {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::from_f64(value).ok_or_else(|| de::Error::custom("points must be a multiple of 0.5"))
    }
}
