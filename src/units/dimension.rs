//! Physical dimensions attached to numeric items.
//!
//! A dimension is written the way keyword schemas spell it:
//! `"Pressure"`, `"LiquidSurfaceVolume/Time"`, `"Permeability*Length"`,
//! `"1/Pressure"` or `"1"` for dimensionless values.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{DeckError, Result};

/// A base physical measure with its own scale in every unit system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Measure {
    Length,
    Time,
    Density,
    Pressure,
    AbsoluteTemperature,
    Temperature,
    Viscosity,
    Permeability,
    LiquidSurfaceVolume,
    GasSurfaceVolume,
    ReservoirVolume,
    GeometricVolume,
    Transmissibility,
    Mass,
    Energy,
}

impl Measure {
    pub const ALL: [Measure; 15] = [
        Measure::Length,
        Measure::Time,
        Measure::Density,
        Measure::Pressure,
        Measure::AbsoluteTemperature,
        Measure::Temperature,
        Measure::Viscosity,
        Measure::Permeability,
        Measure::LiquidSurfaceVolume,
        Measure::GasSurfaceVolume,
        Measure::ReservoirVolume,
        Measure::GeometricVolume,
        Measure::Transmissibility,
        Measure::Mass,
        Measure::Energy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Measure::Length => "Length",
            Measure::Time => "Time",
            Measure::Density => "Density",
            Measure::Pressure => "Pressure",
            Measure::AbsoluteTemperature => "AbsoluteTemperature",
            Measure::Temperature => "Temperature",
            Measure::Viscosity => "Viscosity",
            Measure::Permeability => "Permeability",
            Measure::LiquidSurfaceVolume => "LiquidSurfaceVolume",
            Measure::GasSurfaceVolume => "GasSurfaceVolume",
            Measure::ReservoirVolume => "ReservoirVolume",
            Measure::GeometricVolume => "GeometricVolume",
            Measure::Transmissibility => "Transmissibility",
            Measure::Mass => "Mass",
            Measure::Energy => "Energy",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            // Older descriptors spell these differently.
            "Timestep" => Some(Measure::Time),
            "Volume" => Some(Measure::GeometricVolume),
            _ => Self::ALL.iter().copied().find(|m| m.name() == name),
        }
    }
}

/// A product of measures raised to integer powers.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    label: String,
    factors: Vec<(Measure, i32)>,
}

impl Dimension {
    /// The dimensionless quantity `"1"`.
    pub fn dimensionless() -> Self {
        Self {
            label: "1".to_string(),
            factors: Vec::new(),
        }
    }

    /// A dimension made of a single measure.
    pub fn of(measure: Measure) -> Self {
        Self {
            label: measure.name().to_string(),
            factors: vec![(measure, 1)],
        }
    }

    /// Parse a dimension string.
    ///
    /// `*` multiplies and `/` divides, evaluated left to right, so
    /// `A/B/C` is `A * B^-1 * C^-1`. The literal `1` is the identity.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DeckError::schema("empty dimension string"));
        }

        let mut factors: Vec<(Measure, i32)> = Vec::new();
        let mut sign = 1;
        let mut start = 0;
        let bytes = text.as_bytes();

        for i in 0..=bytes.len() {
            let at_end = i == bytes.len();
            if !at_end && bytes[i] != b'*' && bytes[i] != b'/' {
                continue;
            }

            let term = text[start..i].trim();
            match term {
                "1" => {}
                "" => {
                    return Err(DeckError::schema(format!(
                        "malformed dimension '{}'",
                        text
                    )))
                }
                name => {
                    let measure = Measure::from_name(name).ok_or_else(|| {
                        DeckError::schema(format!(
                            "unknown measure '{}' in dimension '{}'",
                            name, text
                        ))
                    })?;
                    add_factor(&mut factors, measure, sign);
                }
            }

            if !at_end {
                sign = if bytes[i] == b'/' { -1 } else { 1 };
                start = i + 1;
            }
        }

        Ok(Self {
            label: text.to_string(),
            factors,
        })
    }

    /// The dimension string as written in the schema.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Measures and their exponents.
    pub fn factors(&self) -> &[(Measure, i32)] {
        &self.factors
    }

    pub fn is_dimensionless(&self) -> bool {
        self.factors.is_empty()
    }

    /// The single measure this dimension consists of, if it is exactly one
    /// measure to the first power.
    pub fn single_measure(&self) -> Option<Measure> {
        match self.factors.as_slice() {
            [(measure, 1)] => Some(*measure),
            _ => None,
        }
    }
}

fn add_factor(factors: &mut Vec<(Measure, i32)>, measure: Measure, power: i32) {
    if let Some(entry) = factors.iter_mut().find(|(m, _)| *m == measure) {
        entry.1 += power;
    } else {
        factors.push((measure, power));
    }
    factors.retain(|(_, p)| *p != 0);
}

impl Serialize for Dimension {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_measure() {
        let dim = Dimension::parse("Pressure").unwrap();
        assert_eq!(dim.single_measure(), Some(Measure::Pressure));
        assert_eq!(dim.label(), "Pressure");
    }

    #[test]
    fn test_parse_dimensionless() {
        assert!(Dimension::parse("1").unwrap().is_dimensionless());
    }

    #[test]
    fn test_parse_rate() {
        let dim = Dimension::parse("LiquidSurfaceVolume/Time").unwrap();
        assert_eq!(
            dim.factors(),
            &[(Measure::LiquidSurfaceVolume, 1), (Measure::Time, -1)]
        );
        assert_eq!(dim.single_measure(), None);
    }

    #[test]
    fn test_parse_inverse_and_product() {
        let inverse = Dimension::parse("1/Pressure").unwrap();
        assert_eq!(inverse.factors(), &[(Measure::Pressure, -1)]);

        let kh = Dimension::parse("Permeability*Length").unwrap();
        assert_eq!(kh.factors().len(), 2);
    }

    #[test]
    fn test_parse_cancelling_factors() {
        let dim = Dimension::parse("Length/Length").unwrap();
        assert!(dim.is_dimensionless());
    }

    #[test]
    fn test_parse_legacy_names() {
        let dim = Dimension::parse("Timestep").unwrap();
        assert_eq!(dim.single_measure(), Some(Measure::Time));
    }

    #[test]
    fn test_parse_rejects_unknown_measure() {
        assert!(Dimension::parse("Furlong").is_err());
        assert!(Dimension::parse("Length//Time").is_err());
        assert!(Dimension::parse("").is_err());
    }
}
