use std::fmt::{Debug, Display, Formatter};

use ordered_float::OrderedFloat;

use crate::quantity::Quantity;

/// Day-ahead market price in PLN per megawatt-hour, as published by PSE.
pub type MegawattHourRate = Quantity<f64, -1, -1, 1>;

impl MegawattHourRate {
    #[must_use]
    pub fn ordered(self) -> OrderedFloat<f64> {
        OrderedFloat(self.0)
    }
}

impl Display for MegawattHourRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} PLN/MWh", self.0)
    }
}

impl Debug for MegawattHourRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
