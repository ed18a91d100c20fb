pub mod energy;
pub mod power;
pub mod rate;

use std::ops::{Div, Mul};

use serde::{Deserialize, Serialize};

/// Generic quantity with the dimensions tracked by the const parameters.
#[derive(
    Clone,
    Copy,
    Deserialize,
    PartialEq,
    PartialOrd,
    Serialize,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::From,
    derive_more::FromStr,
    derive_more::Neg,
    derive_more::Sub,
    derive_more::SubAssign,
    derive_more::Sum,
)]
pub struct Quantity<T, const POWER: isize, const TIME: isize, const COST: isize>(pub T);

impl<const POWER: isize, const TIME: isize, const COST: isize> Quantity<f64, POWER, TIME, COST> {
    pub const ZERO: Self = Self(0.0);

    /// Round to the given number of decimal places.
    #[must_use]
    pub fn round_to(self, n_decimals: u32) -> Self {
        let scale = 10_f64.powi(i32::try_from(n_decimals).unwrap_or(i32::MAX));
        Self((self.0 * scale).round() / scale)
    }
}

impl<T, const POWER: isize, const TIME: isize, const COST: isize> Mul<T>
    for Quantity<T, POWER, TIME, COST>
where
    T: Mul<T>,
{
    type Output = Quantity<T::Output, POWER, TIME, COST>;

    fn mul(self, rhs: T) -> Self::Output {
        Quantity(self.0 * rhs)
    }
}

impl<T, const POWER: isize, const TIME: isize, const COST: isize> Div<T>
    for Quantity<T, POWER, TIME, COST>
where
    T: Div<T>,
{
    type Output = Quantity<T::Output, POWER, TIME, COST>;

    fn div(self, rhs: T) -> Self::Output {
        Quantity(self.0 / rhs)
    }
}
