use std::fmt::{Debug, Formatter};

use chrono::{DateTime, TimeZone};

#[derive(Clone, Eq, PartialEq)]
#[must_use]
pub struct Interval<Tz: TimeZone> {
    /// Inclusive.
    pub start: DateTime<Tz>,

    /// Exclusive.
    pub end: DateTime<Tz>,
}

impl<Tz: TimeZone> Copy for Interval<Tz> where Tz::Offset: Copy {}

impl<Tz: TimeZone> Debug for Interval<Tz> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl<Tz: TimeZone> Interval<Tz> {
    pub const fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        Self { start, end }
    }
}
