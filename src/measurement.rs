use std::fmt;

use chrono::{DateTime, TimeZone};

/// Whole seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub const fn secs(&self) -> i64 {
        self.0
    }

    /// The timestamp `secs` seconds before this one, or `None` if that falls
    /// outside the representable range.
    pub const fn checked_before(&self, secs: i64) -> Option<Self> {
        match self.0.checked_sub(secs) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    /// Rounds to the nearest whole second.
    fn from(dt: DateTime<Tz>) -> Self {
        Self((dt.timestamp_millis() + 500).div_euclid(1000))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// CO2 concentration in ppm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Co2(pub u16);

/// Temperature in °C.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature(pub f32);

/// Relative humidity in %.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeHumidity(pub f32);

impl fmt::Display for Co2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ppm", self.0)
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} °C", self.0)
    }
}

impl fmt::Display for RelativeHumidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} %", self.0)
    }
}

/// One timestamped reading. CO2 is always present; temperature and relative
/// humidity are either both present or both absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    timestamp: Timestamp,

    co2: Co2,

    climate: Option<(Temperature, RelativeHumidity)>,
}

impl Sample {
    pub fn new(
        timestamp: Timestamp,
        co2: Co2,
        temperature: Temperature,
        relative_humidity: RelativeHumidity,
    ) -> Self {
        Self {
            timestamp,
            co2,
            climate: Some((temperature, relative_humidity)),
        }
    }

    pub fn co2_only(timestamp: Timestamp, co2: Co2) -> Self {
        Self {
            timestamp,
            co2,
            climate: None,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn co2(&self) -> Co2 {
        self.co2
    }

    pub fn temperature(&self) -> Option<Temperature> {
        self.climate.map(|(t, _)| t)
    }

    pub fn relative_humidity(&self) -> Option<RelativeHumidity> {
        self.climate.map(|(_, h)| h)
    }

    /// Relative humidity as the ingestion backend expects it: a whole percent.
    pub fn rel_humidity_percent(&self) -> Option<i16> {
        self.relative_humidity().map(|h| h.0.round() as i16)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.timestamp, self.co2)?;
        if let Some((t, h)) = self.climate {
            write!(f, ", {t}, {h}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_timestamp_rounds_to_nearest_second() {
        let dt = DateTime::parse_from_rfc3339("2020-09-01T13:17:30.6+00:00").unwrap();
        assert_eq!(Timestamp::from(dt), Timestamp::from_secs(1598966251));

        let dt = Utc.timestamp_millis_opt(1_598_966_251_400).unwrap();
        assert_eq!(Timestamp::from(dt), Timestamp::from_secs(1598966251));
    }

    #[test]
    fn test_rel_humidity_percent_is_rounded() {
        let sample = Sample::new(
            Timestamp::from_secs(0),
            Co2(539),
            Temperature(19.3),
            RelativeHumidity(85.1),
        );
        assert_eq!(sample.rel_humidity_percent(), Some(85));

        let sample = Sample::co2_only(Timestamp::from_secs(0), Co2(400));
        assert_eq!(sample.rel_humidity_percent(), None);
    }

    #[test]
    fn test_rel_humidity_percent_keeps_out_of_range_values() {
        // OY1012 humidity spans -25.0 to 384.5 %
        let low = Sample::new(
            Timestamp::from_secs(0),
            Co2(400),
            Temperature(20.0),
            RelativeHumidity(-25.0),
        );
        assert_eq!(low.rel_humidity_percent(), Some(-25));

        let high = Sample::new(
            Timestamp::from_secs(0),
            Co2(400),
            Temperature(20.0),
            RelativeHumidity(384.5),
        );
        assert_eq!(high.rel_humidity_percent(), Some(385));
    }

    #[test]
    fn test_checked_before() {
        let ts = Timestamp::from_secs(1000);
        assert_eq!(ts.checked_before(178), Some(Timestamp::from_secs(822)));
        assert_eq!(Timestamp::from_secs(i64::MIN).checked_before(1), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Co2(450).to_string(), "450 ppm");
        assert_eq!(Temperature(20.5).to_string(), "20.5 °C");
        assert_eq!(RelativeHumidity(55.0).to_string(), "55 %");
    }
}
