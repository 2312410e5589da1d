//! Unit systems and conversion to canonical SI units.
//!
//! Every numeric item carries a [`Dimension`]. A [`UnitSystem`] knows, for
//! each base [`Measure`], the factor that turns one input unit into SI
//! units. Compound dimensions multiply the factors of their measures.

mod dimension;

pub use dimension::{Dimension, Measure};

use std::fmt;

use serde::{Deserialize, Serialize};

/// The unit conventions an input deck may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitSystemKind {
    Metric,
    Field,
    Lab,
    PvtM,
}

impl UnitSystemKind {
    /// The keyword that selects this system in a deck.
    pub fn keyword(self) -> &'static str {
        match self {
            UnitSystemKind::Metric => "METRIC",
            UnitSystemKind::Field => "FIELD",
            UnitSystemKind::Lab => "LAB",
            UnitSystemKind::PvtM => "PVT-M",
        }
    }

    pub fn from_keyword(name: &str) -> Option<Self> {
        match name {
            "METRIC" => Some(UnitSystemKind::Metric),
            "FIELD" => Some(UnitSystemKind::Field),
            "LAB" => Some(UnitSystemKind::Lab),
            "PVT-M" => Some(UnitSystemKind::PvtM),
            _ => None,
        }
    }
}

impl fmt::Display for UnitSystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

const DAY: f64 = 86400.0;
const HOUR: f64 = 3600.0;
const BAR: f64 = 1.0e5;
const ATM: f64 = 101325.0;
const PSIA: f64 = 6894.757293168361;
const FEET: f64 = 0.3048;
const POUND: f64 = 0.45359237;
const STB: f64 = 0.158987294928;
const CUBIC_FEET: f64 = FEET * FEET * FEET;
const CENTI_POISE: f64 = 1.0e-3;
const MILLI_DARCY: f64 = 9.869233e-16;
const KELVIN_OFFSET: f64 = 273.15;
const RANKINE_OFFSET: f64 = 255.3722222222222;
const BTU: f64 = 1054.3503;

/// Scale factors for one unit convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitSystem {
    kind: UnitSystemKind,
    #[serde(skip)]
    scales: [f64; 15],
    #[serde(skip)]
    temperature_offset: f64,
}

impl UnitSystem {
    pub fn new(kind: UnitSystemKind) -> Self {
        match kind {
            UnitSystemKind::Metric => Self::metric(),
            UnitSystemKind::Field => Self::field(),
            UnitSystemKind::Lab => Self::lab(),
            UnitSystemKind::PvtM => Self::pvt_m(),
        }
    }

    /// METRIC: metres, days, barsa, kg/m3, centipoise, millidarcy.
    pub fn metric() -> Self {
        Self::build(
            UnitSystemKind::Metric,
            MetricLike {
                length: 1.0,
                time: DAY,
                density: 1.0,
                pressure: BAR,
                absolute_temperature: 1.0,
                liquid_surface_volume: 1.0,
                gas_surface_volume: 1.0,
                reservoir_volume: 1.0,
                geometric_volume: 1.0,
                mass: 1.0,
                energy: 1.0e3,
            },
            KELVIN_OFFSET,
        )
    }

    /// FIELD: feet, days, psia, lb/ft3, stb, Mscf.
    pub fn field() -> Self {
        Self::build(
            UnitSystemKind::Field,
            MetricLike {
                length: FEET,
                time: DAY,
                density: POUND / CUBIC_FEET,
                pressure: PSIA,
                absolute_temperature: 5.0 / 9.0,
                liquid_surface_volume: STB,
                gas_surface_volume: 1000.0 * CUBIC_FEET,
                reservoir_volume: STB,
                geometric_volume: CUBIC_FEET,
                mass: POUND,
                energy: BTU,
            },
            RANKINE_OFFSET,
        )
    }

    /// LAB: centimetres, hours, atmospheres, g/cc.
    pub fn lab() -> Self {
        Self::build(
            UnitSystemKind::Lab,
            MetricLike {
                length: 0.01,
                time: HOUR,
                density: 1000.0,
                pressure: ATM,
                absolute_temperature: 1.0,
                liquid_surface_volume: 1.0e-6,
                gas_surface_volume: 1.0e-6,
                reservoir_volume: 1.0e-6,
                geometric_volume: 1.0e-6,
                mass: 1.0e-3,
                energy: 1.0,
            },
            KELVIN_OFFSET,
        )
    }

    /// PVT-M: METRIC with pressures in atmospheres.
    pub fn pvt_m() -> Self {
        Self::build(
            UnitSystemKind::PvtM,
            MetricLike {
                length: 1.0,
                time: DAY,
                density: 1.0,
                pressure: ATM,
                absolute_temperature: 1.0,
                liquid_surface_volume: 1.0,
                gas_surface_volume: 1.0,
                reservoir_volume: 1.0,
                geometric_volume: 1.0,
                mass: 1.0,
                energy: 1.0e3,
            },
            KELVIN_OFFSET,
        )
    }

    fn build(kind: UnitSystemKind, base: MetricLike, temperature_offset: f64) -> Self {
        let mut scales = [1.0; 15];
        for measure in Measure::ALL {
            scales[measure as usize] = match measure {
                Measure::Length => base.length,
                Measure::Time => base.time,
                Measure::Density => base.density,
                Measure::Pressure => base.pressure,
                Measure::AbsoluteTemperature | Measure::Temperature => {
                    base.absolute_temperature
                }
                Measure::Viscosity => CENTI_POISE,
                Measure::Permeability => MILLI_DARCY,
                Measure::LiquidSurfaceVolume => base.liquid_surface_volume,
                Measure::GasSurfaceVolume => base.gas_surface_volume,
                Measure::ReservoirVolume => base.reservoir_volume,
                Measure::GeometricVolume => base.geometric_volume,
                Measure::Transmissibility => {
                    CENTI_POISE * base.reservoir_volume / (base.time * base.pressure)
                }
                Measure::Mass => base.mass,
                Measure::Energy => base.energy,
            };
        }

        Self {
            kind,
            scales,
            temperature_offset,
        }
    }

    pub fn kind(&self) -> UnitSystemKind {
        self.kind
    }

    /// Factor from one input unit of `measure` to SI.
    pub fn scale(&self, measure: Measure) -> f64 {
        self.scales[measure as usize]
    }

    /// Combined factor for a compound dimension.
    pub fn dimension_scale(&self, dimension: &Dimension) -> f64 {
        dimension
            .factors()
            .iter()
            .map(|(measure, power)| self.scale(*measure).powi(*power))
            .product()
    }

    /// Additive offset, only non-zero for a lone relative temperature.
    pub fn offset(&self, dimension: &Dimension) -> f64 {
        match dimension.single_measure() {
            Some(Measure::Temperature) => self.temperature_offset,
            _ => 0.0,
        }
    }

    /// Convert a raw input value to SI.
    pub fn to_si(&self, dimension: &Dimension, raw: f64) -> f64 {
        self.dimension_scale(dimension) * raw + self.offset(dimension)
    }

    /// Convert an SI value back to this system's input units.
    pub fn from_si(&self, dimension: &Dimension, si: f64) -> f64 {
        (si - self.offset(dimension)) / self.dimension_scale(dimension)
    }
}

impl Default for UnitSystem {
    fn default() -> Self {
        Self::metric()
    }
}

struct MetricLike {
    length: f64,
    time: f64,
    density: f64,
    pressure: f64,
    absolute_temperature: f64,
    liquid_surface_volume: f64,
    gas_surface_volume: f64,
    reservoir_volume: f64,
    geometric_volume: f64,
    mass: f64,
    energy: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dim(text: &str) -> Dimension {
        Dimension::parse(text).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_metric_pressure() {
        let metric = UnitSystem::metric();
        assert_eq!(metric.to_si(&dim("Pressure"), 250.0), 250.0e5);
    }

    #[test]
    fn test_field_length_and_rate() {
        let field = UnitSystem::field();
        assert!(close(field.to_si(&dim("Length"), 10.0), 3.048));

        let rate = field.to_si(&dim("LiquidSurfaceVolume/Time"), 1.0);
        assert!(close(rate, STB / DAY));
    }

    #[test]
    fn test_temperature_offset_only_for_lone_temperature() {
        let metric = UnitSystem::metric();
        assert!(close(metric.to_si(&dim("Temperature"), 20.0), 293.15));
        assert!(close(metric.to_si(&dim("AbsoluteTemperature"), 20.0), 20.0));
        assert!(close(metric.to_si(&dim("Temperature/Time"), 1.0), 1.0 / DAY));
    }

    #[test]
    fn test_field_temperature() {
        let field = UnitSystem::field();
        let si = field.to_si(&dim("Temperature"), 32.0);
        assert!((si - 273.15).abs() < 1e-6);
    }

    #[test]
    fn test_from_si_inverts_to_si() {
        for system in [
            UnitSystem::metric(),
            UnitSystem::field(),
            UnitSystem::lab(),
            UnitSystem::pvt_m(),
        ] {
            let d = dim("Temperature");
            let back = system.from_si(&d, system.to_si(&d, 77.0));
            assert!(close(back, 77.0), "{}", system.kind());
        }
    }

    #[test]
    fn test_dimensionless_is_identity() {
        let lab = UnitSystem::lab();
        assert_eq!(lab.to_si(&Dimension::dimensionless(), 0.25), 0.25);
    }

    #[test]
    fn test_transmissibility_metric() {
        let metric = UnitSystem::metric();
        let expected = 1.0e-3 / (DAY * BAR);
        assert!(close(metric.scale(Measure::Transmissibility), expected));
    }

    #[test]
    fn test_pvt_m_uses_atmospheres() {
        let pvtm = UnitSystem::pvt_m();
        assert_eq!(pvtm.scale(Measure::Pressure), ATM);
        assert_eq!(pvtm.scale(Measure::Length), 1.0);
    }

    #[test]
    fn test_kind_keyword_round_trip() {
        for kind in [
            UnitSystemKind::Metric,
            UnitSystemKind::Field,
            UnitSystemKind::Lab,
            UnitSystemKind::PvtM,
        ] {
            assert_eq!(UnitSystemKind::from_keyword(kind.keyword()), Some(kind));
        }
        assert_eq!(UnitSystemKind::from_keyword("SI"), None);
    }
}
