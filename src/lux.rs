//! Conversion of raw counts into lux
//!
//! The resolution in lux per count follows from the gain and integration time. A quartic
//! correction compensates the non-linearity of the sensor at high illuminance.

use crate::register::{Gain, IntegrationTime};

/// Resolution at gain ×1 and 100 ms, in lux per count
const BASE_RESOLUTION: f64 = 0.0576;

// Calibration constants of the compensation polynomial
const C1: f64 = 1.0023;
const C2: f64 = 8.1488e-5;
const C3: f64 = -9.3924e-9;
const C4: f64 = 6.0135e-13;

impl Gain {
    /// Multiplier applied to the resolution at gain ×1
    pub const fn resolution_factor(&self) -> f64 {
        match self {
            Gain::X1 => 1.0,
            Gain::X2 => 0.5,
            Gain::Div4 => 4.0,
            Gain::Div8 => 8.0,
        }
    }
}

impl IntegrationTime {
    /// Resolution at gain ×1 for this integration time, in lux per count
    pub const fn lux_per_count(&self) -> f64 {
        match self {
            IntegrationTime::Ms25 => BASE_RESOLUTION * 4.0,
            IntegrationTime::Ms50 => BASE_RESOLUTION * 2.0,
            IntegrationTime::Ms100 => BASE_RESOLUTION,
            IntegrationTime::Ms200 => BASE_RESOLUTION / 2.0,
            IntegrationTime::Ms400 => BASE_RESOLUTION / 4.0,
            IntegrationTime::Ms800 => BASE_RESOLUTION / 8.0,
        }
    }
}

/// Lux per count for the given gain and integration time
pub fn resolution(gain: Gain, integration_time: IntegrationTime) -> f64 {
    return gain.resolution_factor() * integration_time.lux_per_count();
}

/// Applies the compensation polynomial to an uncorrected lux value
pub fn compensate(lux: f64) -> f64 {
    return lux * (C1 + lux * (C2 + lux * (C3 + lux * C4)));
}

/// Converts raw counts into compensated lux at the given resolution
pub fn scale_lux(raw: u16, resolution: f64) -> f64 {
    return compensate(raw as f64 * resolution);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn resolution_matches_datasheet_table() {
        let expected = [0.2304, 0.1152, 0.0576, 0.0288, 0.0144, 0.0072];
        for (itime, lux_per_count) in IntegrationTime::ALL.iter().zip(expected) {
            assert!(close(resolution(Gain::X1, *itime), lux_per_count));
        }
        assert!(close(resolution(Gain::X2, IntegrationTime::Ms100), 0.0288));
        assert!(close(resolution(Gain::Div4, IntegrationTime::Ms100), 0.2304));
        assert!(close(resolution(Gain::Div8, IntegrationTime::Ms25), 1.8432));
    }

    #[test]
    fn resolution_decreases_with_sensitivity() {
        let by_sensitivity = [Gain::Div8, Gain::Div4, Gain::X1, Gain::X2];
        for itime in IntegrationTime::ALL {
            for pair in by_sensitivity.windows(2) {
                assert!(resolution(pair[0], itime) > resolution(pair[1], itime));
            }
        }
        for gain in Gain::ALL {
            for pair in IntegrationTime::ALL.windows(2) {
                assert!(resolution(gain, pair[0]) > resolution(gain, pair[1]));
            }
        }
    }

    #[test]
    fn zero_counts_is_zero_lux() {
        assert_eq!(scale_lux(0, resolution(Gain::Div8, IntegrationTime::Ms25)), 0.0);
    }

    #[test]
    fn compensation_is_monotonic_over_full_range() {
        for gain in Gain::ALL {
            for itime in IntegrationTime::ALL {
                let res = resolution(gain, itime);
                let mut previous = 0.0;
                for raw in 0..=u16::MAX {
                    let lux = scale_lux(raw, res);
                    assert!(lux >= previous, "{:?} {:?} raw={}", gain, itime, raw);
                    previous = lux;
                }
            }
        }
    }

    #[test]
    fn polynomial_is_evaluated_as_given() {
        let lux0 = 1000.0;
        let expected = lux0 * (1.0023 + lux0 * (8.1488e-5 + lux0 * (-9.3924e-9 + lux0 * 6.0135e-13)));
        assert_eq!(compensate(lux0), expected);
        assert_eq!(scale_lux(1000, 1.0), expected);
    }
}
