//! Severity lattice for sky cover and flight category.
//!
//! Both are "worst wins" folds: the accumulator is only replaced by a
//! strictly more severe value.

use crate::types::{CloudCoverage, CloudLayer, FlightCategory};

pub trait Severity: Copy {
    fn severity(&self) -> u8;
}

impl Severity for CloudCoverage {
    fn severity(&self) -> u8 {
        match self {
            CloudCoverage::Skc | CloudCoverage::Clr | CloudCoverage::Nsc => 0,
            CloudCoverage::Few => 1,
            CloudCoverage::Sct => 2,
            CloudCoverage::Bkn => 3,
            CloudCoverage::Ovc => 4,
        }
    }
}

impl Severity for FlightCategory {
    fn severity(&self) -> u8 {
        *self as u8
    }
}

/// Max-severity reducer; ties keep the accumulator
pub fn worst<T: Severity>(acc: T, next: T) -> T {
    if next.severity() > acc.severity() {
        next
    } else {
        acc
    }
}

/// Overall sky cover of a layer list. `CLR` when there are no layers.
pub fn sky_coverage(layers: &[CloudLayer]) -> CloudCoverage {
    layers
        .iter()
        .map(|l| l.coverage)
        .reduce(worst)
        .unwrap_or_default()
}

pub fn category_from_visibility(statute_miles: f64) -> FlightCategory {
    if statute_miles < 1.0 {
        FlightCategory::Lifr
    } else if statute_miles < 3.0 {
        FlightCategory::Ifr
    } else if statute_miles < 5.0 {
        FlightCategory::Mvfr
    } else {
        FlightCategory::Vfr
    }
}

pub fn category_from_ceiling(feet: u32) -> FlightCategory {
    if feet < 500 {
        FlightCategory::Lifr
    } else if feet < 1000 {
        FlightCategory::Ifr
    } else if feet < 3000 {
        FlightCategory::Mvfr
    } else {
        FlightCategory::Vfr
    }
}

/// Lowest BKN/OVC base, or the vertical visibility when the sky is obscured
pub fn ceiling_feet(layers: &[CloudLayer], vertical_visibility_feet: Option<u32>) -> Option<u32> {
    layers
        .iter()
        .filter(|l| l.coverage.is_ceiling())
        .filter_map(|l| l.altitude_feet)
        .chain(vertical_visibility_feet)
        .min()
}

/// Flight category from visibility and ceiling; the worse of the two wins.
///
/// An unknown visibility contributes VFR.
pub fn classify(
    visibility_sm: Option<f64>,
    layers: &[CloudLayer],
    vertical_visibility_feet: Option<u32>,
) -> FlightCategory {
    let by_visibility = visibility_sm
        .map(category_from_visibility)
        .unwrap_or_default();
    let by_ceiling = ceiling_feet(layers, vertical_visibility_feet)
        .map(category_from_ceiling)
        .unwrap_or_default();
    worst(by_visibility, by_ceiling)
}
