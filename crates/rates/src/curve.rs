//! Utilization -> borrow APR curves

use lendrisk_core::Fixed;
use serde::{Deserialize, Serialize};

use crate::error::RateError;

/// Interior points a multipoint curve may carry
pub const MAX_CURVE_POINTS: usize = 5;

/// One `(utilization, rate)` knot of a multipoint curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub util: Fixed,
    pub rate: Fixed,
}

impl CurvePoint {
    pub fn new(util: Fixed, rate: Fixed) -> Self {
        Self { util, rate }
    }
}

/// Piecewise-linear borrow rate curve.
///
/// **Legacy**:
/// - `u <= optimal`: `base + u * (plateau - base) / optimal`
/// - `u > optimal`: `plateau + (u - optimal) * (max - plateau) / (1 - optimal)`
///
/// **Multipoint**: linear interpolation through `(0, zero_util_rate)`, the
/// interior `points`, and `(1, hundred_util_rate)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateCurve {
    Legacy {
        #[serde(default)]
        base_rate: Fixed,
        optimal_utilization: Fixed,
        plateau_rate: Fixed,
        max_rate: Fixed,
    },
    Multipoint {
        zero_util_rate: Fixed,
        hundred_util_rate: Fixed,
        points: Vec<CurvePoint>,
    },
}

impl RateCurve {
    pub fn legacy(optimal_utilization: Fixed, plateau_rate: Fixed, max_rate: Fixed) -> Self {
        RateCurve::Legacy {
            base_rate: Fixed::ZERO,
            optimal_utilization,
            plateau_rate,
            max_rate,
        }
    }

    /// Reject curves that could decrease as utilization grows
    pub fn validate(&self) -> Result<(), RateError> {
        match self {
            RateCurve::Legacy {
                base_rate,
                optimal_utilization,
                plateau_rate,
                max_rate,
            } => {
                if !optimal_utilization.is_positive() || *optimal_utilization > Fixed::ONE {
                    return Err(RateError::InvalidCurve(format!(
                        "optimal utilization must be in (0, 1], got {optimal_utilization}"
                    )));
                }
                if base_rate.is_negative() || base_rate > plateau_rate || plateau_rate > max_rate {
                    return Err(RateError::InvalidCurve(format!(
                        "rates must satisfy 0 <= base <= plateau <= max, got {base_rate}, {plateau_rate}, {max_rate}"
                    )));
                }
                Ok(())
            }
            RateCurve::Multipoint {
                zero_util_rate,
                hundred_util_rate,
                points,
            } => {
                if points.len() > MAX_CURVE_POINTS {
                    return Err(RateError::InvalidCurve(format!(
                        "at most {MAX_CURVE_POINTS} points, got {}",
                        points.len()
                    )));
                }
                if zero_util_rate.is_negative() {
                    return Err(RateError::InvalidCurve("negative zero-utilization rate".into()));
                }
                let mut prev = CurvePoint::new(Fixed::ZERO, *zero_util_rate);
                for point in points.iter().chain(std::iter::once(&CurvePoint::new(
                    Fixed::ONE,
                    *hundred_util_rate,
                ))) {
                    if point.util <= prev.util || point.util > Fixed::ONE {
                        return Err(RateError::InvalidCurve(format!(
                            "utilization knots must be strictly ascending in (0, 1), got {} after {}",
                            point.util, prev.util
                        )));
                    }
                    if point.rate < prev.rate {
                        return Err(RateError::InvalidCurve(format!(
                            "rate decreases from {} to {} at utilization {}",
                            prev.rate, point.rate, point.util
                        )));
                    }
                    prev = *point;
                }
                Ok(())
            }
        }
    }

    /// Borrow APR at `utilization`, clamped into `[0, 1]` first
    pub fn borrow_apr(&self, utilization: Fixed) -> Result<Fixed, RateError> {
        let u = utilization.clamp(Fixed::ZERO, Fixed::ONE);
        match self {
            RateCurve::Legacy {
                base_rate,
                optimal_utilization,
                plateau_rate,
                max_rate,
            } => {
                if u <= *optimal_utilization {
                    let rise = (u * (*plateau_rate - *base_rate)).checked_div(*optimal_utilization)?;
                    Ok(*base_rate + rise)
                } else {
                    let rise = ((u - *optimal_utilization) * (*max_rate - *plateau_rate))
                        .checked_div(Fixed::ONE - *optimal_utilization)?;
                    Ok(*plateau_rate + rise)
                }
            }
            RateCurve::Multipoint {
                zero_util_rate,
                hundred_util_rate,
                points,
            } => {
                let mut lo = CurvePoint::new(Fixed::ZERO, *zero_util_rate);
                let upper = CurvePoint::new(Fixed::ONE, *hundred_util_rate);
                for hi in points.iter().chain(std::iter::once(&upper)) {
                    if u <= hi.util {
                        return interpolate(lo, *hi, u);
                    }
                    lo = *hi;
                }
                Ok(*hundred_util_rate)
            }
        }
    }
}

fn interpolate(lo: CurvePoint, hi: CurvePoint, u: Fixed) -> Result<Fixed, RateError> {
    if hi.util == lo.util {
        return Ok(hi.rate);
    }
    let rise = ((u - lo.util) * (hi.rate - lo.rate)).checked_div(hi.util - lo.util)?;
    Ok(lo.rate + rise)
}
