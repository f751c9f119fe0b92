//! DOS date/time as stored in ZIP headers
//!
//! The 32-bit word packs, from the most significant bit down:
//!
//! ```text
//! YYYYYYYM MMMDDDDD HHHHHMMM MMMSSSSS
//! ```
//!
//! Years count from 1980 and seconds are stored halved, so encoding always
//! truncates to an even second.

use jiff::civil::DateTime;
use jiff::Zoned;

const MIN_YEAR: u16 = 1980;
const MAX_YEAR: u16 = 1980 + 0x7f;

/// Broken-down DOS timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DosDateTime {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl DosDateTime {
    /// Build a timestamp from calendar components
    ///
    /// Returns `None` when a component is out of range or the year cannot be
    /// represented (1980..=2107).
    pub fn from_components(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Option<Self> {
        let valid = (MIN_YEAR..=MAX_YEAR).contains(&year)
            && (1..=12).contains(&month)
            && (1..=31).contains(&day)
            && hour < 24
            && minute < 60
            && second < 60;
        valid.then_some(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Current local time, clamped into the DOS year range
    pub fn now() -> Self {
        Self::from(Zoned::now().datetime())
    }

    /// Decode a packed DOS date/time word
    ///
    /// No validation is done; archives written with a zero timestamp decode to
    /// month and day 0. Use [`DosDateTime::to_datetime`] to check validity.
    pub fn from_dos(dos: u32) -> Self {
        Self {
            year: ((dos >> 25) & 0x7f) as u16 + MIN_YEAR,
            month: ((dos >> 21) & 0x0f) as u8,
            day: ((dos >> 16) & 0x1f) as u8,
            hour: ((dos >> 11) & 0x1f) as u8,
            minute: ((dos >> 5) & 0x3f) as u8,
            second: ((dos & 0x1f) << 1) as u8,
        }
    }

    /// Pack into a DOS date/time word, dropping the odd second
    pub fn to_dos(&self) -> u32 {
        let mut dos = ((self.year - MIN_YEAR) as u32 & 0x7f) << 25;
        dos |= (self.month as u32 & 0x0f) << 21;
        dos |= (self.day as u32 & 0x1f) << 16;
        dos |= (self.hour as u32 & 0x1f) << 11;
        dos |= (self.minute as u32 & 0x3f) << 5;
        dos |= (self.second as u32 >> 1) & 0x1f;
        dos
    }

    /// Civil date/time, if the stored components form a real one
    pub fn to_datetime(&self) -> Option<DateTime> {
        DateTime::new(
            self.year as i16,
            self.month as i8,
            self.day as i8,
            self.hour as i8,
            self.minute as i8,
            self.second as i8,
            0,
        )
        .ok()
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }
}

impl From<DateTime> for DosDateTime {
    fn from(dt: DateTime) -> Self {
        let year = (dt.year().max(0) as u16).clamp(MIN_YEAR, MAX_YEAR);
        Self {
            year,
            month: dt.month() as u8,
            day: dt.day() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8,
        }
    }
}
