use chrono::{Datelike, NaiveDate};
use rocket::form::{self, FromFormField, ValueField};
use rocket::request::FromParam;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A calendar month, written `YYYY-MM` on the wire and in the database.
///
/// Ordering follows the calendar, so the text form also sorts correctly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (1..=9999).contains(&year) {
            Some(YearMonth { year, month })
        } else {
            None
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.day_clamped(31)
    }

    pub fn days_in_month(&self) -> u32 {
        self.next().first_day().pred_opt().map(|d| d.day()).unwrap_or(28)
    }

    /// The given day of this month, clamped to the month's length (31 → 28 in February).
    pub fn day_clamped(&self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.days_in_month());
        NaiveDate::from_ymd_opt(self.year, self.month, day).unwrap_or_else(|| self.first_day())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn next(&self) -> Self {
        self.add_months(1)
    }

    pub fn prev(&self) -> Self {
        self.add_months(-1)
    }

    pub fn add_months(&self, n: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + n;
        YearMonth {
            year: index.div_euclid(12),
            month: (index.rem_euclid(12) + 1) as u32,
        }
    }

    /// Whole months from `self` to `other`; negative when `other` is earlier.
    pub fn months_until(&self, other: YearMonth) -> i32 {
        (other.year - self.year) * 12 + (other.month as i32 - self.month as i32)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid month '{}', expected YYYY-MM", s);
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for YearMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl<'r> FromParam<'r> for YearMonth {
    type Error = String;

    fn from_param(param: &'r str) -> Result<Self, Self::Error> {
        param.parse()
    }
}

#[rocket::async_trait]
impl<'r> FromFormField<'r> for YearMonth {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        field
            .value
            .parse()
            .map_err(|e: String| form::Error::validation(e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_formats() {
        let m = ym("2024-02");
        assert_eq!(m.year(), 2024);
        assert_eq!(m.month(), 2);
        assert_eq!(m.to_string(), "2024-02");
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("2024-2".parse::<YearMonth>().is_err());
        assert!("garbage".parse::<YearMonth>().is_err());
    }

    #[test]
    fn month_arithmetic_crosses_years() {
        assert_eq!(ym("2024-12").next(), ym("2025-01"));
        assert_eq!(ym("2025-01").prev(), ym("2024-12"));
        assert_eq!(ym("2024-11").add_months(14), ym("2026-01"));
        assert_eq!(ym("2024-03").add_months(-15), ym("2022-12"));
        assert_eq!(ym("2024-11").months_until(ym("2025-02")), 3);
        assert_eq!(ym("2025-02").months_until(ym("2024-11")), -3);
    }

    #[test]
    fn clamps_days_to_month_length() {
        assert_eq!(ym("2024-02").days_in_month(), 29);
        assert_eq!(ym("2023-02").days_in_month(), 28);
        assert_eq!(
            ym("2023-02").day_clamped(31),
            NaiveDate::from_ymd_opt(2023, 2, 28).unwrap()
        );
        assert_eq!(ym("2024-04").last_day(), NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
        assert_eq!(ym("2024-12").last_day(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn serde_uses_text_form() {
        let m = ym("2026-10");
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"2026-10\"");
        let back: YearMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
