use std::fmt::{Debug, Display, Formatter};

use crate::quantity::Quantity;

pub type KilowattHours = Quantity<f64, 1, 1, 0>;

impl Default for KilowattHours {
    fn default() -> Self {
        Self(0.0)
    }
}

impl Display for KilowattHours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3} kWh", self.0)
    }
}

impl Debug for KilowattHours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}Wh", self.0 * 1000.0)
    }
}
