//! The 16-axis relevance vector.
//!
//! Internally the scores are a fixed-size vector indexed by [`AXIS_NAMES`].
//! On disk they are a sparse JSON object: only non-zero axes are written, in
//! axis order, and any axis missing from the object reads back as `0.0`.
//!
//! ```text
//!  elemental (0-7):  fire water earth air light shadow life void
//!  mechanical (8-15): force binding ward sight mind time space fate
//! ```

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const AXIS_COUNT: usize = 16;

/// Axis names in storage order.
pub const AXIS_NAMES: [&str; AXIS_COUNT] = [
    "fire", "water", "earth", "air", "light", "shadow", "life", "void", "force", "binding",
    "ward", "sight", "mind", "time", "space", "fate",
];

/// Position of `name` in [`AXIS_NAMES`], if it is a known axis.
pub fn axis_index(name: &str) -> Option<usize> {
    AXIS_NAMES.iter().position(|axis| *axis == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisScores([f64; AXIS_COUNT]);

impl AxisScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(axis, value)` pairs. Fails on unknown axes or values outside `[0, 1]`.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut scores = Self::new();
        for (name, value) in pairs {
            scores = scores.with(name, value)?;
        }
        Ok(scores)
    }

    pub fn from_values(values: [f64; AXIS_COUNT]) -> Result<Self, String> {
        for (i, value) in values.iter().enumerate() {
            check_value(AXIS_NAMES[i], *value)?;
        }
        Ok(Self(values))
    }

    /// Returns a copy with `name` set to `value`.
    pub fn with(mut self, name: &str, value: f64) -> Result<Self, String> {
        let idx = axis_index(name).ok_or_else(|| format!("unknown axis '{name}'"))?;
        check_value(name, value)?;
        self.0[idx] = value;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        axis_index(name).map(|idx| self.0[idx])
    }

    pub fn value(&self, idx: usize) -> f64 {
        self.0[idx]
    }

    pub fn values(&self) -> &[f64; AXIS_COUNT] {
        &self.0
    }

    /// Non-zero axes in axis order.
    pub fn iter_nonzero(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        AXIS_NAMES
            .iter()
            .zip(self.0.iter())
            .filter(|(_, v)| **v != 0.0)
            .map(|(name, v)| (*name, *v))
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }
}

fn check_value(name: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(format!("axis '{name}' out of range [0, 1]: {value}"));
    }
    Ok(())
}

impl Serialize for AxisScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let count = self.iter_nonzero().count();
        let mut map = serializer.serialize_map(Some(count))?;
        for (name, value) in self.iter_nonzero() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AxisScores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SparseAxes;

        impl<'de> Visitor<'de> for SparseAxes {
            type Value = AxisScores;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of axis name to score in [0, 1]")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<AxisScores, A::Error> {
                let mut scores = AxisScores::new();
                while let Some((name, value)) = access.next_entry::<String, f64>()? {
                    scores = scores.with(&name, value).map_err(de::Error::custom)?;
                }
                Ok(scores)
            }
        }

        deserializer.deserialize_map(SparseAxes)
    }
}
