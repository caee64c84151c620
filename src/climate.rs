//! Hourly climate records and the period the engine consumes.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Categorical weather band of an hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherClass {
    Cold,
    Cool,
    Normal,
    Warm,
    Hot,
}

impl WeatherClass {
    /// Band used when a record does not carry its own classification.
    /// Below 15 °C adults neither fly, bite nor oviposit.
    pub fn classify(temperature: f64) -> Self {
        if temperature < 15.0 {
            WeatherClass::Cold
        } else if temperature < 20.0 {
            WeatherClass::Cool
        } else if temperature < 27.0 {
            WeatherClass::Normal
        } else if temperature < 32.0 {
            WeatherClass::Warm
        } else {
            WeatherClass::Hot
        }
    }
}

/// Activity band of the day. Feeding and mating concentrate in the
/// twilight bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    MorningTwilight,
    Daytime,
    EveningTwilight,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=9 => TimeOfDay::MorningTwilight,
            10..=16 => TimeOfDay::Daytime,
            17..=20 => TimeOfDay::EveningTwilight,
            _ => TimeOfDay::Night,
        }
    }

    pub fn is_twilight(self) -> bool {
        matches!(self, TimeOfDay::MorningTwilight | TimeOfDay::EveningTwilight)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hour {
    pub timestamp: NaiveDateTime,
    /// Degrees Celsius.
    pub temperature: f64,
    /// km/h.
    #[serde(default)]
    pub wind_speed: f64,
    /// Degrees clockwise from north.
    #[serde(default)]
    pub wind_direction: f64,
    pub weather: WeatherClass,
}

impl Hour {
    pub fn new(timestamp: NaiveDateTime, temperature: f64, weather: WeatherClass) -> Self {
        Self {
            timestamp,
            temperature,
            wind_speed: 0.0,
            wind_direction: 0.0,
            weather,
        }
    }

    pub fn with_wind(mut self, speed_kmh: f64, direction_deg: f64) -> Self {
        self.wind_speed = speed_kmh;
        self.wind_direction = direction_deg;
        self
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_hour(self.timestamp.hour())
    }
}

/// Shape of a record as read from disk; the weather band is optional there.
#[derive(Debug, Deserialize)]
struct HourRecord {
    timestamp: NaiveDateTime,
    temperature: f64,
    #[serde(default)]
    wind_speed: f64,
    #[serde(default)]
    wind_direction: f64,
    #[serde(default)]
    weather: Option<WeatherClass>,
}

impl From<HourRecord> for Hour {
    fn from(record: HourRecord) -> Self {
        Hour {
            timestamp: record.timestamp,
            temperature: record.temperature,
            wind_speed: record.wind_speed,
            wind_direction: record.wind_direction,
            weather: record
                .weather
                .unwrap_or_else(|| WeatherClass::classify(record.temperature)),
        }
    }
}

/// Validated, non-empty, time-ordered sequence of hours.
#[derive(Debug, Clone)]
pub struct Period {
    hours: Vec<Hour>,
}

impl Period {
    pub fn new(hours: Vec<Hour>) -> Result<Self, ConfigError> {
        if hours.is_empty() {
            return Err(ConfigError::EmptyPeriod);
        }
        for (index, hour) in hours.iter().enumerate() {
            if !hour.temperature.is_finite() {
                return Err(ConfigError::MalformedHour {
                    index,
                    reason: "temperature is not a finite number".into(),
                });
            }
            if !hour.wind_speed.is_finite() || hour.wind_speed < 0.0 {
                return Err(ConfigError::MalformedHour {
                    index,
                    reason: format!("invalid wind speed {}", hour.wind_speed),
                });
            }
            if !hour.wind_direction.is_finite() {
                return Err(ConfigError::MalformedHour {
                    index,
                    reason: "wind direction is not a finite number".into(),
                });
            }
            if index > 0 && hour.timestamp <= hours[index - 1].timestamp {
                return Err(ConfigError::MalformedHour {
                    index,
                    reason: format!(
                        "timestamp {} does not follow {}",
                        hour.timestamp,
                        hours[index - 1].timestamp
                    ),
                });
            }
        }
        Ok(Self { hours })
    }

    /// `count` identical hours starting at `start`.
    pub fn constant(
        start: NaiveDateTime,
        count: usize,
        temperature: f64,
        weather: WeatherClass,
    ) -> Result<Self, ConfigError> {
        let hours = (0..count)
            .map(|offset| Hour::new(start + Duration::hours(offset as i64), temperature, weather))
            .collect();
        Self::new(hours)
    }

    /// Sinusoidal daily cycle peaking at 15:00, classified per hour.
    pub fn diurnal(
        start: NaiveDateTime,
        days: usize,
        mean_temperature: f64,
        amplitude: f64,
    ) -> Result<Self, ConfigError> {
        let hours = (0..days * 24)
            .map(|offset| {
                let timestamp = start + Duration::hours(offset as i64);
                let phase = (timestamp.hour() as f64 - 15.0) / 24.0 * std::f64::consts::TAU;
                let temperature = mean_temperature + amplitude * phase.cos();
                Hour::new(timestamp, temperature, WeatherClass::classify(temperature))
            })
            .collect();
        Self::new(hours)
    }

    /// Reads a JSON array of hourly records.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read climate file {}", path.display()))?;
        let records: Vec<HourRecord> = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        let period = Self::new(records.into_iter().map(Hour::from).collect())
            .with_context(|| format!("Invalid climate period in {}", path.display()))?;
        Ok(period)
    }

    pub fn hours(&self) -> &[Hour] {
        &self.hours
    }

    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }
}
