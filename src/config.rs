//! Tunables of the lifecycle model shared by the engine and the population.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which adult behaviour is simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdultModel {
    /// Feeding, insemination, temperature-banded gonotrophic cycle and flight.
    #[default]
    Full,
    /// Fixed 3-4 day laying cycle for any female above 18 °C.
    Simple,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegulationConfig {
    /// Length of a regulation period; quotas are computed once per stage and
    /// group in each period.
    #[serde(default = "default_period_hours")]
    pub period_hours: u64,
    /// Multiplier on the stage mortality rates. Zero disables regulation.
    #[serde(default = "default_mortality_scale")]
    pub mortality_scale: f64,
}

fn default_period_hours() -> u64 {
    24
}

fn default_mortality_scale() -> f64 {
    1.0
}

impl Default for RegulationConfig {
    fn default() -> Self {
        Self {
            period_hours: default_period_hours(),
            mortality_scale: default_mortality_scale(),
        }
    }
}

impl RegulationConfig {
    pub fn disabled() -> Self {
        Self {
            mortality_scale: 0.0,
            ..Self::default()
        }
    }

    /// Regulation period a tick belongs to.
    pub fn period_of(&self, tick: u64) -> u64 {
        tick / self.period_hours.max(1)
    }

    /// Converts a daily mortality rate into the rate over one regulation
    /// period, after scaling.
    pub fn period_rate(&self, daily_rate: f64) -> f64 {
        let daily = (daily_rate * self.mortality_scale).clamp(0.0, 1.0);
        if daily == 0.0 {
            return 0.0;
        }
        let days = self.period_hours as f64 / 24.0;
        1.0 - (1.0 - daily).powf(days)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    #[serde(default)]
    pub adult_model: AdultModel,
    #[serde(default)]
    pub regulation: RegulationConfig,
    /// Side of the grid cell individuals are grouped by, in metres.
    #[serde(default = "default_resolution")]
    pub location_resolution_m: f64,
}

fn default_resolution() -> f64 {
    1.0
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            adult_model: AdultModel::default(),
            regulation: RegulationConfig::default(),
            location_resolution_m: default_resolution(),
        }
    }
}

impl LifecycleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.location_resolution_m.is_finite() && self.location_resolution_m > 0.0) {
            return Err(ConfigError::InvalidResolution(self.location_resolution_m));
        }
        if self.regulation.period_hours == 0 {
            return Err(ConfigError::ZeroRegulationPeriod);
        }
        let scale = self.regulation.mortality_scale;
        if !(scale.is_finite() && scale >= 0.0) {
            return Err(ConfigError::InvalidMortalityScale(scale));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
