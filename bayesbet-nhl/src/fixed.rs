//! Fixed-precision rendering of floating-point fields.
//!
//! Every float that crosses the persistence boundary is written as a string with
//! [`DECIMALS`] decimal places, which keeps stored documents stable and diffable. Reading
//! accepts either such strings or plain JSON numbers.

use std::fmt::{Display, Formatter};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use bayesbet::normal::Normal;

pub const DECIMALS: usize = 5;

/// A float that serialises as a fixed-precision string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fixed(pub f64);

impl Display for Fixed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.*}", DECIMALS, self.0)
    }
}

impl Serialize for Fixed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Fixed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(Fixed(value)),
            Repr::Text(text) => text
                .trim()
                .parse()
                .map(Fixed)
                .map_err(|err| D::Error::custom(format!("invalid number '{text}': {err}"))),
        }
    }
}

/// For `f64` fields.
pub mod scalar {
    use super::*;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        Fixed(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Fixed::deserialize(deserializer)?.0)
    }
}

/// For `Vec<f64>` fields.
pub mod seq {
    use super::*;

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|&value| Fixed(value)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values = Vec::<Fixed>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|Fixed(value)| value).collect())
    }
}

/// For [`Normal`] fields, written as a `[mean, stddev]` pair.
pub mod normal {
    use super::*;

    pub fn serialize<S: Serializer>(normal: &Normal, serializer: S) -> Result<S::Ok, S::Error> {
        (Fixed(normal.mean), Fixed(normal.stddev)).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Normal, D::Error> {
        let (Fixed(mean), Fixed(stddev)) = <(Fixed, Fixed)>::deserialize(deserializer)?;
        if stddev < 0.0 {
            return Err(D::Error::custom(format!("negative standard deviation {stddev}")));
        }
        Ok(Normal::new(mean, stddev))
    }
}
